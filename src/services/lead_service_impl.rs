//! `SeaORM`-backed implementation of [`LeadService`].

use crate::api::types::{CursorDto, EnrichmentDto, EnrichmentResultDto, PeoplePageDto};
use crate::clients::{KeyStore, PeopleApi, RunTracker, SearchPage, UpstreamError};
use crate::config::Config;
use crate::db::{NewCursor, NewSearch, RecordScope, Store};
use crate::domain::{CampaignKey, CanonicalFilters, CostKind, RunContext};
use crate::entities::{search_cursors, searches};
use crate::models::{MatchQuery, Person, SearchParams};
use crate::services::billing::CostReporter;
use crate::services::enrichment_cache::{CacheKey, CachedEnrichment, EnrichmentCache};
use crate::services::lead_service::{LeadError, LeadService};
use crate::services::pagination::{CursorPlan, PaginationSettings, page_outcome, plan_cursor};
use async_trait::async_trait;
use futures::future::try_join_all;
use sea_orm::SqlErr;
use std::sync::Arc;
use tracing::{debug, info, warn};

const TASK_FETCH_NEXT: &str = "fetch-next-page";
const TASK_SEARCH: &str = "search-people";
const TASK_ENRICH: &str = "enrich-person";
const TASK_MATCH: &str = "match-person";
const TASK_BULK_MATCH: &str = "bulk-match-people";

#[derive(Debug, Clone)]
pub struct LeadServiceSettings {
    pub provider_name: String,
    pub service_name: String,
    pub pagination: PaginationSettings,
    pub freshness_months: u32,
    pub bulk_match_limit: usize,
}

impl LeadServiceSettings {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            provider_name: config.provider.provider_name.clone(),
            service_name: config.runs.service_name.clone(),
            pagination: PaginationSettings {
                page_size: config.provider.page_size,
                max_pages: config.provider.max_pages,
            },
            freshness_months: config.cache.freshness_months,
            bulk_match_limit: config.provider.bulk_match_limit,
        }
    }
}

pub struct DefaultLeadService {
    store: Store,
    people: Arc<dyn PeopleApi>,
    keys: Arc<dyn KeyStore>,
    billing: CostReporter,
    cache: EnrichmentCache,
    settings: LeadServiceSettings,
}

impl DefaultLeadService {
    #[must_use]
    pub fn new(
        store: Store,
        people: Arc<dyn PeopleApi>,
        keys: Arc<dyn KeyStore>,
        runs: Arc<dyn RunTracker>,
        settings: LeadServiceSettings,
    ) -> Self {
        let billing = CostReporter::new(
            runs,
            settings.service_name.clone(),
            settings.provider_name.clone(),
        );
        let cache = EnrichmentCache::new(store.clone(), settings.freshness_months);

        Self {
            store,
            people,
            keys,
            billing,
            cache,
            settings,
        }
    }

    async fn provider_key(&self, organization_id: &str) -> Result<String, LeadError> {
        self.keys
            .provider_key(organization_id, &self.settings.provider_name)
            .await
            .map_err(|e| {
                warn!(
                    organization_id,
                    provider = %self.settings.provider_name,
                    error = %e,
                    "Provider key lookup failed"
                );
                LeadError::from(e)
            })
    }

    /// Turns the stored cursor (if any) and the incoming filters into the
    /// cursor row this request should search from.
    async fn resolve_cursor(
        &self,
        ctx: &RunContext,
        key: &CampaignKey,
        incoming: Option<CanonicalFilters>,
    ) -> Result<search_cursors::Model, LeadError> {
        let existing = self.store.find_cursor(key).await?;
        settle_cursor(&self.store, ctx, key, existing, incoming).await
    }

    async fn search_upstream(
        &self,
        api_key: &str,
        params: &SearchParams,
        page: u32,
    ) -> Result<SearchPage, LeadError> {
        metrics::counter!("upstream_calls_total", "operation" => "search").increment(1);
        let result = self
            .people
            .search(api_key, params, page, self.settings.pagination.page_size)
            .await
            .inspect_err(|e| warn!(page, error = %e, "Upstream search failed"))?;

        debug!(
            page,
            returned = result.people.len(),
            total = result.total_entries,
            "Upstream search returned"
        );
        Ok(result)
    }

    async fn record_search(
        &self,
        ctx: &RunContext,
        request_params: &str,
        page: i32,
        result: &SearchPage,
        total_entries: i64,
    ) -> Result<searches::Model, LeadError> {
        let response_raw = serde_json::json!({
            "people": result.people.iter().map(Person::raw_snapshot).collect::<Vec<_>>(),
            "total_entries": result.total_entries,
        })
        .to_string();

        let search = self
            .store
            .record_search(NewSearch {
                organization_id: &ctx.organization_id,
                campaign_id: ctx.campaign_id.as_deref(),
                app_id: &ctx.app_id,
                brand_id: &ctx.brand_id,
                request_params,
                page,
                people_count: result.people.len(),
                total_entries,
                response_raw,
            })
            .await?;
        Ok(search)
    }

    async fn persist_search_people(
        &self,
        ctx: &RunContext,
        search_id: &str,
        people: &[Person],
    ) -> Result<(), LeadError> {
        let scope = RecordScope {
            organization_id: &ctx.organization_id,
            campaign_id: ctx.campaign_id.as_deref(),
            app_id: &ctx.app_id,
            brand_id: &ctx.brand_id,
            search_id: Some(search_id),
        };
        self.store.insert_enrichments(&scope, people).await?;
        Ok(())
    }

    /// Persists a single found person and bills it if it has an email.
    ///
    /// The run id is attached to the record before the cost is posted.
    async fn persist_and_bill(
        &self,
        ctx: &RunContext,
        person: Person,
        kind: CostKind,
        task_name: &str,
    ) -> Result<EnrichmentResultDto, LeadError> {
        let record = self.store.insert_enrichment(&direct_scope(ctx), &person).await?;

        if person.has_email() {
            let run_id = self.billing.open_run(ctx, task_name).await?;
            self.store.attach_enrichment_run(&record.id, &run_id).await?;
            self.billing.charge_and_complete(&run_id, kind, 1).await?;
        } else {
            debug!(record_id = %record.id, "Person has no email, not billed");
        }

        Ok(EnrichmentResultDto {
            enrichment_id: Some(record.id),
            person: Some(person),
            cached: false,
        })
    }

    fn validate_bulk(&self, queries: &[MatchQuery]) -> Result<(), LeadError> {
        if queries.is_empty() {
            return Err(LeadError::Validation(
                "items must contain at least one entry".to_string(),
            ));
        }
        if queries.len() > self.settings.bulk_match_limit {
            return Err(LeadError::Validation(format!(
                "items cannot contain more than {} entries",
                self.settings.bulk_match_limit
            )));
        }
        Ok(())
    }
}

/// Applies the cursor plan for `existing` (as read by this request).
///
/// `existing` may already be stale; a lost creation race re-reads the
/// winning row and plans again against it.
async fn settle_cursor(
    store: &Store,
    ctx: &RunContext,
    key: &CampaignKey,
    existing: Option<search_cursors::Model>,
    incoming: Option<CanonicalFilters>,
) -> Result<search_cursors::Model, LeadError> {
    let plan = plan_cursor(existing, incoming).ok_or_else(|| LeadError::NoCursor {
        campaign_id: key.campaign_id.clone(),
    })?;

    match plan {
        CursorPlan::Create(filters) => {
            let created = store
                .create_cursor(NewCursor {
                    key,
                    app_id: &ctx.app_id,
                    brand_id: &ctx.brand_id,
                    filters: &filters,
                })
                .await;

            match created {
                Ok(cursor) => {
                    info!(campaign = %key, "Started search cursor");
                    Ok(cursor)
                }
                Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                    debug!(campaign = %key, "Lost cursor creation race, using existing row");
                    let winner = store
                        .find_cursor(key)
                        .await?
                        .ok_or_else(|| LeadError::Database(e.to_string()))?;
                    match plan_cursor(Some(winner), Some(filters)) {
                        Some(CursorPlan::Reset { cursor, filters }) => {
                            reset_cursor(store, key, &cursor, &filters).await
                        }
                        Some(CursorPlan::Resume(cursor)) => Ok(cursor),
                        _ => Err(LeadError::CursorConflict {
                            campaign_id: key.campaign_id.clone(),
                        }),
                    }
                }
                Err(e) => Err(e.into()),
            }
        }
        CursorPlan::Reset { cursor, filters } => {
            reset_cursor(store, key, &cursor, &filters).await
        }
        CursorPlan::Resume(cursor) => Ok(cursor),
    }
}

async fn reset_cursor(
    store: &Store,
    key: &CampaignKey,
    cursor: &search_cursors::Model,
    filters: &CanonicalFilters,
) -> Result<search_cursors::Model, LeadError> {
    info!(
        campaign = %key,
        previous_page = cursor.current_page,
        "Search filters changed, resetting cursor"
    );
    store
        .reset_cursor(cursor, filters)
        .await?
        .ok_or_else(|| LeadError::CursorConflict {
            campaign_id: key.campaign_id.clone(),
        })
}

fn direct_scope(ctx: &RunContext) -> RecordScope<'_> {
    RecordScope {
        organization_id: &ctx.organization_id,
        campaign_id: ctx.campaign_id.as_deref(),
        app_id: &ctx.app_id,
        brand_id: &ctx.brand_id,
        search_id: None,
    }
}

fn cached_result(hit: CachedEnrichment) -> EnrichmentResultDto {
    EnrichmentResultDto {
        enrichment_id: Some(hit.record_id),
        person: Some(hit.person),
        cached: true,
    }
}

#[async_trait]
impl LeadService for DefaultLeadService {
    async fn fetch_next_page(
        &self,
        ctx: &RunContext,
        params: Option<SearchParams>,
    ) -> Result<PeoplePageDto, LeadError> {
        let campaign_id = ctx
            .campaign_id
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| LeadError::Validation("campaignId is required".to_string()))?;
        let key = CampaignKey::new(&ctx.organization_id, campaign_id);

        let incoming = params
            .as_ref()
            .map(CanonicalFilters::from_params)
            .transpose()?;
        let cursor = self.resolve_cursor(ctx, &key, incoming).await?;

        if cursor.exhausted {
            debug!(campaign = %key, "Cursor exhausted, skipping upstream call");
            return Ok(PeoplePageDto {
                people: Vec::new(),
                done: true,
                total_entries: cursor.total_entries,
                page: None,
            });
        }

        let params = CanonicalFilters::from_stored(cursor.filter_params.clone()).to_params()?;
        let page = u32::try_from(cursor.current_page.max(1)).unwrap_or(1);
        let api_key = self.provider_key(&ctx.organization_id).await?;
        let result = self.search_upstream(&api_key, &params, page).await?;

        let outcome = page_outcome(
            cursor.current_page,
            result.people.len(),
            result.total_entries,
            cursor.total_entries,
            self.settings.pagination,
        );
        let advanced = self
            .store
            .advance_cursor(
                &cursor,
                outcome.next_page,
                outcome.total_entries,
                outcome.done,
            )
            .await?;

        let search = self
            .record_search(
                ctx,
                &cursor.filter_params,
                cursor.current_page,
                &result,
                outcome.total_entries,
            )
            .await?;

        if advanced {
            self.persist_search_people(ctx, &search.id, &result.people)
                .await?;
        }

        // The provider charged for the call whether or not the page is delivered.
        self.billing
            .bill(ctx, TASK_FETCH_NEXT, CostKind::Search, 1)
            .await?;

        if !advanced {
            warn!(
                campaign = %key,
                page = cursor.current_page,
                "Cursor advanced concurrently, dropping page"
            );
            return Err(LeadError::CursorConflict {
                campaign_id: key.campaign_id,
            });
        }

        info!(
            campaign = %key,
            page = cursor.current_page,
            returned = result.people.len(),
            total = outcome.total_entries,
            done = outcome.done,
            "Fetched next page"
        );

        Ok(PeoplePageDto {
            people: result.people,
            done: outcome.done,
            total_entries: outcome.total_entries,
            page: Some(cursor.current_page),
        })
    }

    async fn search_page(
        &self,
        ctx: &RunContext,
        params: SearchParams,
        page: u32,
    ) -> Result<PeoplePageDto, LeadError> {
        if page == 0 || page > self.settings.pagination.max_pages {
            return Err(LeadError::Validation(format!(
                "page must be between 1 and {}",
                self.settings.pagination.max_pages
            )));
        }

        let filters = CanonicalFilters::from_params(&params)?;
        let api_key = self.provider_key(&ctx.organization_id).await?;
        let result = self.search_upstream(&api_key, &params, page).await?;

        let current_page = i32::try_from(page).unwrap_or(i32::MAX);
        let outcome = page_outcome(
            current_page,
            result.people.len(),
            result.total_entries,
            0,
            self.settings.pagination,
        );

        let search = self
            .record_search(
                ctx,
                filters.as_str(),
                current_page,
                &result,
                outcome.total_entries,
            )
            .await?;
        self.persist_search_people(ctx, &search.id, &result.people)
            .await?;
        self.billing
            .bill(ctx, TASK_SEARCH, CostKind::Search, 1)
            .await?;

        Ok(PeoplePageDto {
            people: result.people,
            done: outcome.done,
            total_entries: outcome.total_entries,
            page: Some(current_page),
        })
    }

    async fn get_cursor(
        &self,
        organization_id: &str,
        campaign_id: &str,
    ) -> Result<CursorDto, LeadError> {
        let key = CampaignKey::new(organization_id, campaign_id);
        self.store
            .find_cursor(&key)
            .await?
            .map(CursorDto::from)
            .ok_or_else(|| {
                LeadError::NotFound(format!("Search cursor for campaign {campaign_id}"))
            })
    }

    async fn enrich_person(
        &self,
        ctx: &RunContext,
        person_id: &str,
    ) -> Result<EnrichmentResultDto, LeadError> {
        if let Some(hit) = self.cache.lookup(CacheKey::PersonId(person_id)).await? {
            return Ok(cached_result(hit));
        }

        let api_key = self.provider_key(&ctx.organization_id).await?;
        metrics::counter!("upstream_calls_total", "operation" => "enrich").increment(1);
        let person = self
            .people
            .enrich(&api_key, person_id)
            .await
            .inspect_err(|e| warn!(person_id, error = %e, "Upstream enrich failed"))?;

        let Some(person) = person else {
            debug!(person_id, "Provider has no such person");
            return Ok(EnrichmentResultDto::not_found());
        };

        self.persist_and_bill(ctx, person, CostKind::Enrich, TASK_ENRICH)
            .await
    }

    async fn match_person(
        &self,
        ctx: &RunContext,
        query: &MatchQuery,
    ) -> Result<EnrichmentResultDto, LeadError> {
        if let Some(hit) = self.cache.lookup(CacheKey::NameDomain(query)).await? {
            return Ok(cached_result(hit));
        }

        let api_key = self.provider_key(&ctx.organization_id).await?;
        metrics::counter!("upstream_calls_total", "operation" => "match").increment(1);
        let person = self
            .people
            .match_person(&api_key, query)
            .await
            .inspect_err(|e| warn!(error = %e, "Upstream match failed"))?;

        let Some(person) = person else {
            return Ok(EnrichmentResultDto::not_found());
        };

        self.persist_and_bill(ctx, person, CostKind::Match, TASK_MATCH)
            .await
    }

    async fn bulk_match(
        &self,
        ctx: &RunContext,
        queries: &[MatchQuery],
    ) -> Result<Vec<EnrichmentResultDto>, LeadError> {
        self.validate_bulk(queries)?;

        let lookups = queries
            .iter()
            .map(|q| self.cache.lookup(CacheKey::NameDomain(q)));
        let hits = try_join_all(lookups).await?;

        let mut results: Vec<Option<EnrichmentResultDto>> =
            hits.into_iter().map(|hit| hit.map(cached_result)).collect();
        let misses: Vec<usize> = results
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.is_none().then_some(i))
            .collect();

        if misses.is_empty() {
            debug!(count = queries.len(), "Bulk match served entirely from cache");
            return Ok(results.into_iter().flatten().collect());
        }

        let miss_queries: Vec<MatchQuery> = misses.iter().map(|&i| queries[i].clone()).collect();
        let api_key = self.provider_key(&ctx.organization_id).await?;
        metrics::counter!("upstream_calls_total", "operation" => "bulk_match").increment(1);
        let matches = self
            .people
            .bulk_match(&api_key, &miss_queries)
            .await
            .inspect_err(|e| {
                warn!(count = miss_queries.len(), error = %e, "Upstream bulk match failed");
            })?;

        if matches.len() != miss_queries.len() {
            return Err(UpstreamError::UnexpectedPayload(format!(
                "bulk match returned {} results for {} queries",
                matches.len(),
                miss_queries.len()
            ))
            .into());
        }

        let scope = direct_scope(ctx);
        let mut billable: Vec<String> = Vec::new();
        for (index, matched) in misses.into_iter().zip(matches) {
            let result = match matched {
                Some(person) => {
                    let record = self.store.insert_enrichment(&scope, &person).await?;
                    if person.has_email() {
                        billable.push(record.id.clone());
                    }
                    EnrichmentResultDto {
                        enrichment_id: Some(record.id),
                        person: Some(person),
                        cached: false,
                    }
                }
                None => EnrichmentResultDto::not_found(),
            };
            results[index] = Some(result);
        }

        if !billable.is_empty() {
            let run_id = self.billing.open_run(ctx, TASK_BULK_MATCH).await?;
            for record_id in &billable {
                self.store.attach_enrichment_run(record_id, &run_id).await?;
            }
            let quantity = u32::try_from(billable.len()).unwrap_or(u32::MAX);
            self.billing
                .charge_and_complete(&run_id, CostKind::Match, quantity)
                .await?;
        }

        info!(
            total = queries.len(),
            upstream = miss_queries.len(),
            billed = billable.len(),
            "Bulk match complete"
        );

        Ok(results.into_iter().flatten().collect())
    }

    async fn get_enrichment(
        &self,
        organization_id: &str,
        id: &str,
    ) -> Result<EnrichmentDto, LeadError> {
        self.store
            .get_enrichment(id)
            .await?
            .filter(|record| record.organization_id == organization_id)
            .map(EnrichmentDto::from)
            .ok_or_else(|| LeadError::NotFound(format!("Enrichment {id}")))
    }
}
