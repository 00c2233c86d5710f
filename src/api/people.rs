//! People search endpoints.
//!
//! Handlers validate and scope the request; all pagination, persistence and
//! billing happens in [`crate::services::LeadService`].

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use std::sync::Arc;

use super::context::OrganizationId;
use super::types::{CursorDto, FetchNextRequest, PeoplePageDto, SearchRequest};
use super::validation::{self, Required, RunScope};
use super::{ApiError, ApiResponse, AppState};

/// Returns the next page of people for a campaign's search cursor.
///
/// # Endpoint
/// `POST /api/people/next`
///
/// `searchParams` starts or resets the cursor; omit it to continue. Fails
/// with `NO_CURSOR` when there is nothing to continue.
pub async fn fetch_next(
    State(state): State<Arc<AppState>>,
    OrganizationId(organization_id): OrganizationId,
    payload: Result<Json<FetchNextRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<PeoplePageDto>>, ApiError> {
    let Json(request) = payload?;

    let mut required = Required::default();
    let ctx = validation::run_context(
        &organization_id,
        &RunScope {
            app_id: request.app_id.as_deref(),
            brand_id: request.brand_id.as_deref(),
            run_id: request.run_id.as_deref(),
            campaign_id: request.campaign_id.as_deref(),
        },
        true,
        &mut required,
    );
    required.finish()?;

    let params = request
        .search_params
        .map(validation::search_params)
        .transpose()?;

    let page = state.lead_service().fetch_next_page(&ctx, params).await?;
    Ok(Json(ApiResponse::success(page)))
}

/// One-off search at an explicit page, outside any cursor.
///
/// # Endpoint
/// `POST /api/people/search`
pub async fn search(
    State(state): State<Arc<AppState>>,
    OrganizationId(organization_id): OrganizationId,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<PeoplePageDto>>, ApiError> {
    let Json(request) = payload?;

    let mut required = Required::default();
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

    let params = request
        .search_params
        .ok_or_else(|| ApiError::validation("searchParams is required"))
        .and_then(validation::search_params)?;

    let page = state
        .lead_service()
        .search_page(&ctx, params, request.page.unwrap_or(1))
        .await?;
    Ok(Json(ApiResponse::success(page)))
}

/// `GET /api/people/cursor/{campaign_id}`
pub async fn get_cursor(
    State(state): State<Arc<AppState>>,
    OrganizationId(organization_id): OrganizationId,
    Path(campaign_id): Path<String>,
) -> Result<Json<ApiResponse<CursorDto>>, ApiError> {
    let cursor = state
        .lead_service()
        .get_cursor(&organization_id, &campaign_id)
        .await?;
    Ok(Json(ApiResponse::success(cursor)))
}
