use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use std::sync::Arc;

use super::context::OrganizationId;
use super::types::{
    BulkMatchRequest, EnrichRequest, EnrichmentDto, EnrichmentResultDto, MatchRequest,
};
use super::validation::{self, Required, RunScope};
use super::{ApiError, ApiResponse, AppState};

/// `POST /api/enrichments/enrich`
pub async fn enrich(
    State(state): State<Arc<AppState>>,
    OrganizationId(organization_id): OrganizationId,
    payload: Result<Json<EnrichRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<EnrichmentResultDto>>, ApiError> {
    let Json(request) = payload?;

    let mut required = Required::default();
    let person_id = required.field("externalPersonId", request.external_person_id.as_deref());
    let ctx = validation::run_context(
        &organization_id,
        &RunScope {
            app_id: request.app_id.as_deref(),
            brand_id: request.brand_id.as_deref(),
            run_id: request.run_id.as_deref(),
            campaign_id: request.campaign_id.as_deref(),
        },
        false,
        &mut required,
    );
    required.finish()?;

    let result = state.lead_service().enrich_person(&ctx, &person_id).await?;
    Ok(Json(ApiResponse::success(result)))
}

/// `POST /api/enrichments/match`
pub async fn match_person(
    State(state): State<Arc<AppState>>,
    OrganizationId(organization_id): OrganizationId,
    payload: Result<Json<MatchRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<EnrichmentResultDto>>, ApiError> {
    let Json(request) = payload?;

    let mut required = Required::default();
    let query = validation::match_query(&request.item, "", &mut required);
    let ctx = validation::run_context(
        &organization_id,
        &RunScope {
            app_id: request.app_id.as_deref(),
            brand_id: request.brand_id.as_deref(),
            run_id: request.run_id.as_deref(),
            campaign_id: request.campaign_id.as_deref(),
        },
        false,
        &mut required,
    );
    required.finish()?;

    let result = state.lead_service().match_person(&ctx, &query).await?;
    Ok(Json(ApiResponse::success(result)))
}

/// Matches up to `provider.bulk_match_limit` people in one call.
///
/// # Endpoint
/// `POST /api/enrichments/bulk-match`
///
/// Cache hits are answered locally; the rest go upstream in a single bulk
/// request. The response array lines up with `items`.
pub async fn bulk_match(
    State(state): State<Arc<AppState>>,
    OrganizationId(organization_id): OrganizationId,
    payload: Result<Json<BulkMatchRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Vec<EnrichmentResultDto>>>, ApiError> {
    let Json(request) = payload?;

    let limit = state.config().read().await.provider.bulk_match_limit;
    validation::validate_bulk_size(request.items.len(), limit)?;

    let mut required = Required::default();
    let queries: Vec<_> = request
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| validation::match_query(item, &format!("items[{i}]."), &mut required))
        .collect();
    let ctx = validation::run_context(
        &organization_id,
        &RunScope {
            app_id: request.app_id.as_deref(),
            brand_id: request.brand_id.as_deref(),
            run_id: request.run_id.as_deref(),
            campaign_id: request.campaign_id.as_deref(),
        },
        false,
        &mut required,
    );
    required.finish()?;

    let results = state.lead_service().bulk_match(&ctx, &queries).await?;
    Ok(Json(ApiResponse::success(results)))
}

/// `GET /api/enrichments/{id}`
pub async fn get_enrichment(
    State(state): State<Arc<AppState>>,
    OrganizationId(organization_id): OrganizationId,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<EnrichmentDto>>, ApiError> {
    let record = state
        .lead_service()
        .get_enrichment(&organization_id, &id)
        .await?;
    Ok(Json(ApiResponse::success(record)))
}
