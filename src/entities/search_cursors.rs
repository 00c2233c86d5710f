use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "search_cursors")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub organization_id: String,

    pub campaign_id: String,

    pub app_id: String,

    pub brand_id: String,

    /// Canonical JSON of the filters that produced this cursor.
    #[sea_orm(column_type = "Text")]
    pub filter_params: String,

    /// Next page to request, 1-based.
    pub current_page: i32,

    /// Last `total_entries` reported by the provider.
    pub total_entries: i64,

    pub exhausted: bool,

    /// Bumped on every write; updates are conditional on the version read.
    pub version: i32,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
