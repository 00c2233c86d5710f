use crate::domain::{CampaignKey, CanonicalFilters, now_timestamp};
use crate::entities::{prelude::*, search_cursors};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel, QueryFilter};
use tracing::debug;

/// Repository for search cursor rows.
///
/// Every mutation is conditional on the `version` the caller read, so two
/// requests racing on one campaign cannot both apply a write: the loser sees
/// `None`/`false` and decides what to do.
pub struct CursorRepository {
    conn: DatabaseConnection,
}

pub struct NewCursor<'a> {
    pub key: &'a CampaignKey,
    pub app_id: &'a str,
    pub brand_id: &'a str,
    pub filters: &'a CanonicalFilters,
}

impl CursorRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn find(&self, key: &CampaignKey) -> Result<Option<search_cursors::Model>, DbErr> {
        SearchCursors::find()
            .filter(search_cursors::Column::OrganizationId.eq(&key.organization_id))
            .filter(search_cursors::Column::CampaignId.eq(&key.campaign_id))
            .one(&self.conn)
            .await
    }

    /// Inserts a fresh cursor at page 1.
    ///
    /// Fails with a unique-constraint violation when another request created
    /// the cursor for the same campaign first.
    pub async fn create(&self, new: NewCursor<'_>) -> Result<search_cursors::Model, DbErr> {
        let now = now_timestamp();
        let model = search_cursors::Model {
            id: uuid::Uuid::new_v4().to_string(),
            organization_id: new.key.organization_id.clone(),
            campaign_id: new.key.campaign_id.clone(),
            app_id: new.app_id.to_string(),
            brand_id: new.brand_id.to_string(),
            filter_params: new.filters.as_str().to_string(),
            current_page: 1,
            total_entries: 0,
            exhausted: false,
            version: 0,
            created_at: now.clone(),
            updated_at: now,
        };

        SearchCursors::insert(model.clone().into_active_model())
            .exec(&self.conn)
            .await?;

        debug!(cursor_id = %model.id, campaign = %new.key, "Created search cursor");
        Ok(model)
    }

    /// Replaces the filters and rewinds to page 1, clearing exhaustion.
    ///
    /// Returns `None` if the row changed since `cursor` was read.
    pub async fn reset(
        &self,
        cursor: &search_cursors::Model,
        filters: &CanonicalFilters,
    ) -> Result<Option<search_cursors::Model>, DbErr> {
        let now = now_timestamp();

        let result = SearchCursors::update_many()
            .col_expr(
                search_cursors::Column::FilterParams,
                Expr::value(filters.as_str()),
            )
            .col_expr(search_cursors::Column::CurrentPage, Expr::value(1))
            .col_expr(search_cursors::Column::TotalEntries, Expr::value(0i64))
            .col_expr(search_cursors::Column::Exhausted, Expr::value(false))
            .col_expr(
                search_cursors::Column::Version,
                Expr::col(search_cursors::Column::Version).add(1),
            )
            .col_expr(search_cursors::Column::UpdatedAt, Expr::value(now.clone()))
            .filter(search_cursors::Column::Id.eq(&cursor.id))
            .filter(search_cursors::Column::Version.eq(cursor.version))
            .exec(&self.conn)
            .await?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        Ok(Some(search_cursors::Model {
            filter_params: filters.as_str().to_string(),
            current_page: 1,
            total_entries: 0,
            exhausted: false,
            version: cursor.version + 1,
            updated_at: now,
            ..cursor.clone()
        }))
    }

    /// Records the outcome of a fetched page.
    ///
    /// Returns `false` if another request advanced or reset the cursor in
    /// the meantime; nothing is written in that case.
    pub async fn advance(
        &self,
        cursor: &search_cursors::Model,
        next_page: i32,
        total_entries: i64,
        exhausted: bool,
    ) -> Result<bool, DbErr> {
        let result = SearchCursors::update_many()
            .col_expr(search_cursors::Column::CurrentPage, Expr::value(next_page))
            .col_expr(
                search_cursors::Column::TotalEntries,
                Expr::value(total_entries),
            )
            .col_expr(search_cursors::Column::Exhausted, Expr::value(exhausted))
            .col_expr(
                search_cursors::Column::Version,
                Expr::col(search_cursors::Column::Version).add(1),
            )
            .col_expr(
                search_cursors::Column::UpdatedAt,
                Expr::value(now_timestamp()),
            )
            .filter(search_cursors::Column::Id.eq(&cursor.id))
            .filter(search_cursors::Column::Version.eq(cursor.version))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }
}
