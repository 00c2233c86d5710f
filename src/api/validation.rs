use super::ApiError;
use super::types::MatchItem;
use crate::domain::RunContext;
use crate::models::{MatchQuery, SearchParams};

/// Collects every missing required field before failing the request.
#[derive(Debug, Default)]
pub struct Required {
    missing: Vec<String>,
}

impl Required {
    pub fn field(&mut self, name: &str, value: Option<&str>) -> String {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => v.to_string(),
            None => {
                self.missing.push(format!("{name} is required"));
                String::new()
            }
        }
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_details(self.missing))
        }
    }
}

/// Run-scoping fields every billable request carries.
pub struct RunScope<'a> {
    pub app_id: Option<&'a str>,
    pub brand_id: Option<&'a str>,
    pub run_id: Option<&'a str>,
    pub campaign_id: Option<&'a str>,
}

pub fn run_context(
    organization_id: &str,
    scope: &RunScope<'_>,
    campaign_required: bool,
    required: &mut Required,
) -> RunContext {
    let app_id = required.field("appId", scope.app_id);
    let brand_id = required.field("brandId", scope.brand_id);
    let parent_run_id = required.field("runId", scope.run_id);
    let campaign_id = if campaign_required {
        Some(required.field("campaignId", scope.campaign_id))
    } else {
        scope
            .campaign_id
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
    };

    RunContext {
        organization_id: organization_id.to_string(),
        parent_run_id,
        app_id,
        brand_id,
        campaign_id,
    }
}

pub fn match_query(item: &MatchItem, prefix: &str, required: &mut Required) -> MatchQuery {
    MatchQuery {
        first_name: required.field(&format!("{prefix}firstName"), item.first_name.as_deref()),
        last_name: required.field(&format!("{prefix}lastName"), item.last_name.as_deref()),
        organization_domain: required.field(
            &format!("{prefix}organizationDomain"),
            item.organization_domain.as_deref(),
        ),
    }
}

/// Parses `searchParams`; unknown keys and wrong types are rejected.
pub fn search_params(value: serde_json::Value) -> Result<SearchParams, ApiError> {
    if !value.is_object() {
        return Err(ApiError::validation("searchParams must be an object"));
    }

    let params: SearchParams = serde_json::from_value(value)
        .map_err(|e| ApiError::validation(format!("Invalid searchParams: {e}")))?;

    if params.is_empty() {
        return Err(ApiError::validation(
            "searchParams must contain at least one filter",
        ));
    }
    Ok(params)
}

pub fn validate_bulk_size(len: usize, limit: usize) -> Result<(), ApiError> {
    if len == 0 {
        return Err(ApiError::validation("items must contain at least one entry"));
    }
    if len > limit {
        return Err(ApiError::validation(format!(
            "items cannot contain more than {limit} entries (got {len})"
        )));
    }
    Ok(())
}
