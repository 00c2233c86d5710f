use sea_orm::entity::prelude::*;

/// Write-only audit row, one per executed search call.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "searches")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub organization_id: String,
    pub campaign_id: Option<String>,
    pub app_id: String,
    pub brand_id: String,
    #[sea_orm(column_type = "Text")]
    pub request_params: String,
    pub page: i32,
    pub people_count: i32,
    pub total_entries: i64,
    #[sea_orm(column_type = "Text")]
    pub response_raw: String,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
