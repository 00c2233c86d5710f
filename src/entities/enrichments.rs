use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "enrichments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub organization_id: String,
    pub campaign_id: Option<String>,
    pub search_id: Option<String>,
    pub app_id: String,
    pub brand_id: String,

    pub external_person_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub email_status: Option<String>,
    pub title: Option<String>,
    pub headline: Option<String>,
    pub seniority: Option<String>,
    pub linkedin_url: Option<String>,
    pub twitter_url: Option<String>,
    pub github_url: Option<String>,
    pub facebook_url: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,

    pub organization_name: Option<String>,
    pub organization_domain: Option<String>,
    pub organization_website_url: Option<String>,
    pub organization_industry: Option<String>,
    pub organization_size: Option<i64>,
    pub organization_revenue: Option<f64>,
    pub organization_revenue_printed: Option<String>,
    pub organization_total_funding: Option<f64>,
    pub organization_latest_funding_stage: Option<String>,
    pub organization_founded_year: Option<i32>,
    pub organization_linkedin_url: Option<String>,
    pub organization_twitter_url: Option<String>,
    pub organization_facebook_url: Option<String>,
    pub organization_city: Option<String>,
    pub organization_state: Option<String>,
    pub organization_country: Option<String>,
    /// JSON array of technology names.
    #[sea_orm(column_type = "Text", nullable)]
    pub organization_technologies: Option<String>,

    /// Provider payload for this person; `organization` is always an object.
    #[sea_orm(column_type = "Text")]
    pub response_raw: String,

    /// Cost-tracking run that billed this record, attached once.
    pub enrichment_run_id: Option<String>,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
