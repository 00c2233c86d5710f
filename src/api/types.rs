use crate::entities::{enrichments, search_cursors};
use crate::models::Person;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Machine-readable code for errors callers branch on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: None,
            details: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            code: None,
            details: None,
        }
    }

    #[must_use]
    pub const fn with_code(mut self, code: Option<&'static str>) -> Self {
        self.code = code;
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: Vec<String>) -> Self {
        if !details.is_empty() {
            self.details = Some(details);
        }
        self
    }
}

// Requests

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchNextRequest {
    pub campaign_id: Option<String>,
    pub app_id: Option<String>,
    pub brand_id: Option<String>,
    pub run_id: Option<String>,
    /// Kept loose so malformed filters surface as a validation error.
    pub search_params: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub app_id: Option<String>,
    pub brand_id: Option<String>,
    pub run_id: Option<String>,
    pub campaign_id: Option<String>,
    pub page: Option<u32>,
    pub search_params: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichRequest {
    pub external_person_id: Option<String>,
    pub app_id: Option<String>,
    pub brand_id: Option<String>,
    pub run_id: Option<String>,
    pub campaign_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchItem {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub organization_domain: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    #[serde(flatten)]
    pub item: MatchItem,
    pub app_id: Option<String>,
    pub brand_id: Option<String>,
    pub run_id: Option<String>,
    pub campaign_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkMatchRequest {
    #[serde(default)]
    pub items: Vec<MatchItem>,
    pub app_id: Option<String>,
    pub brand_id: Option<String>,
    pub run_id: Option<String>,
    pub campaign_id: Option<String>,
}

// Responses

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PeoplePageDto {
    pub people: Vec<Person>,
    pub done: bool,
    pub total_entries: i64,
    /// The page these people came from; absent when nothing was fetched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i32>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentResultDto {
    pub enrichment_id: Option<String>,
    pub person: Option<Person>,
    pub cached: bool,
}

impl EnrichmentResultDto {
    #[must_use]
    pub const fn not_found() -> Self {
        Self {
            enrichment_id: None,
            person: None,
            cached: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorDto {
    pub campaign_id: String,
    pub current_page: i32,
    pub total_entries: i64,
    pub exhausted: bool,
    pub filters: serde_json::Value,
    pub created_at: String,
    pub updated_at: String,
}

impl From<search_cursors::Model> for CursorDto {
    fn from(model: search_cursors::Model) -> Self {
        let filters =
            serde_json::from_str(&model.filter_params).unwrap_or(serde_json::Value::Null);
        Self {
            campaign_id: model.campaign_id,
            current_page: model.current_page,
            total_entries: model.total_entries,
            exhausted: model.exhausted,
            filters,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentDto {
    pub id: String,
    pub campaign_id: Option<String>,
    pub search_id: Option<String>,
    pub external_person_id: Option<String>,
    pub email: Option<String>,
    pub enrichment_run_id: Option<String>,
    pub created_at: String,
    pub person: serde_json::Value,
}

impl From<enrichments::Model> for EnrichmentDto {
    fn from(model: enrichments::Model) -> Self {
        let person = serde_json::from_str(&model.response_raw).unwrap_or(serde_json::Value::Null);
        Self {
            id: model.id,
            campaign_id: model.campaign_id,
            search_id: model.search_id,
            external_person_id: model.external_person_id,
            email: model.email,
            enrichment_run_id: model.enrichment_run_id,
            created_at: model.created_at,
            person,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthDto {
    pub status: &'static str,
    pub version: &'static str,
}
