use crate::domain::now_timestamp;
use crate::entities::{prelude::*, searches};
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, IntoActiveModel};

/// Audit trail of executed searches. Nothing reads these back.
pub struct SearchRepository {
    conn: DatabaseConnection,
}

pub struct NewSearch<'a> {
    pub organization_id: &'a str,
    pub campaign_id: Option<&'a str>,
    pub app_id: &'a str,
    pub brand_id: &'a str,
    pub request_params: &'a str,
    pub page: i32,
    pub people_count: usize,
    pub total_entries: i64,
    pub response_raw: String,
}

impl SearchRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn record(&self, new: NewSearch<'_>) -> Result<searches::Model, DbErr> {
        let model = searches::Model {
            id: uuid::Uuid::new_v4().to_string(),
            organization_id: new.organization_id.to_string(),
            campaign_id: new.campaign_id.map(str::to_string),
            app_id: new.app_id.to_string(),
            brand_id: new.brand_id.to_string(),
            request_params: new.request_params.to_string(),
            page: new.page,
            people_count: i32::try_from(new.people_count).unwrap_or(i32::MAX),
            total_entries: new.total_entries,
            response_raw: new.response_raw,
            created_at: now_timestamp(),
        };

        Searches::insert(model.clone().into_active_model())
            .exec(&self.conn)
            .await?;

        Ok(model)
    }
}
