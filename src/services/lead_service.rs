//! Domain service for lead search and enrichment.
//!
//! Owns cursor pagination, the enrichment cache, persistence of returned
//! people and the billing protocol wrapped around every paid upstream call.

use crate::api::types::{CursorDto, EnrichmentDto, EnrichmentResultDto, PeoplePageDto};
use crate::clients::{KeysError, RunOperation, RunsError, UpstreamError};
use crate::domain::RunContext;
use crate::models::{MatchQuery, SearchParams};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LeadError {
    #[error("Validation error: {0}")]
    Validation(String),

    /// Distinct from [`LeadError::Validation`] so callers can tell they need
    /// to resend filters.
    #[error("No search cursor for campaign {campaign_id}; supply searchParams to start one")]
    NoCursor { campaign_id: String },

    #[error("No {provider} API key configured for this organization")]
    ProviderKeyMissing { provider: String },

    #[error("Key service error: {0}")]
    KeyService(String),

    #[error("Upstream people API error: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("Cost tracking failed while {operation}: {message}")]
    Billing {
        operation: RunOperation,
        message: String,
    },

    #[error("Search cursor for campaign {campaign_id} was advanced concurrently")]
    CursorConflict { campaign_id: String },

    #[error("{0} not found")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for LeadError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<serde_json::Error> for LeadError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<RunsError> for LeadError {
    fn from(err: RunsError) -> Self {
        Self::Billing {
            operation: err.operation(),
            message: err.to_string(),
        }
    }
}

impl From<KeysError> for LeadError {
    fn from(err: KeysError) -> Self {
        match err {
            KeysError::NotConfigured { provider, .. } => Self::ProviderKeyMissing { provider },
            other => Self::KeyService(other.to_string()),
        }
    }
}

/// Search and enrichment operations exposed over HTTP.
///
/// Every method that reaches the paid provider bills through a child run of
/// `ctx.parent_run_id`; a billing failure after a successful upstream call
/// fails the whole operation.
#[async_trait::async_trait]
pub trait LeadService: Send + Sync {
    /// Fetches the next page for the campaign in `ctx`.
    ///
    /// `params` starts a cursor, resets it when they differ from the stored
    /// filters, or is ignored when equal.
    ///
    /// # Errors
    ///
    /// - [`LeadError::NoCursor`] when there is no cursor and no `params`
    /// - [`LeadError::Upstream`] if the provider rejects the search
    /// - [`LeadError::Billing`] if the search could not be charged
    /// - [`LeadError::CursorConflict`] if another request advanced the cursor first
    async fn fetch_next_page(
        &self,
        ctx: &RunContext,
        params: Option<SearchParams>,
    ) -> Result<PeoplePageDto, LeadError>;

    /// One-off search at an explicit page; leaves cursors untouched.
    async fn search_page(
        &self,
        ctx: &RunContext,
        params: SearchParams,
        page: u32,
    ) -> Result<PeoplePageDto, LeadError>;

    async fn get_cursor(
        &self,
        organization_id: &str,
        campaign_id: &str,
    ) -> Result<CursorDto, LeadError>;

    /// Enriches a provider person id, answering from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns [`LeadError::Billing`] if a person with an email was found but
    /// the charge failed; the persisted record still carries the run id.
    async fn enrich_person(
        &self,
        ctx: &RunContext,
        person_id: &str,
    ) -> Result<EnrichmentResultDto, LeadError>;

    async fn match_person(
        &self,
        ctx: &RunContext,
        query: &MatchQuery,
    ) -> Result<EnrichmentResultDto, LeadError>;

    /// Results line up with `queries` by position.
    async fn bulk_match(
        &self,
        ctx: &RunContext,
        queries: &[MatchQuery],
    ) -> Result<Vec<EnrichmentResultDto>, LeadError>;

    async fn get_enrichment(
        &self,
        organization_id: &str,
        id: &str,
    ) -> Result<EnrichmentDto, LeadError>;
}
