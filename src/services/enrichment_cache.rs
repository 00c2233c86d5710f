//! Read-through view over previously persisted enrichment records.

use crate::db::{Store, person_from_record};
use crate::domain::db_timestamp;
use crate::entities::enrichments;
use crate::models::{MatchQuery, Person};
use chrono::{DateTime, Months, Utc};
use sea_orm::DbErr;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub enum CacheKey<'a> {
    PersonId(&'a str),
    NameDomain(&'a MatchQuery),
}

/// A fresh record that answers a lookup without an upstream call.
#[derive(Debug, Clone)]
pub struct CachedEnrichment {
    pub record_id: String,
    pub person: Person,
}

#[derive(Clone)]
pub struct EnrichmentCache {
    store: Store,
    freshness_months: u32,
}

impl EnrichmentCache {
    #[must_use]
    pub const fn new(store: Store, freshness_months: u32) -> Self {
        Self {
            store,
            freshness_months,
        }
    }

    /// Oldest `created_at` still considered fresh at `now`.
    #[must_use]
    pub fn fresh_since(&self, now: DateTime<Utc>) -> String {
        let cutoff = now
            .checked_sub_months(Months::new(self.freshness_months))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        db_timestamp(cutoff)
    }

    pub async fn lookup(&self, key: CacheKey<'_>) -> Result<Option<CachedEnrichment>, DbErr> {
        let since = self.fresh_since(Utc::now());

        let record = match key {
            CacheKey::PersonId(person_id) => {
                self.store
                    .find_fresh_enrichment_by_person(person_id, &since)
                    .await?
            }
            CacheKey::NameDomain(query) => {
                self.store
                    .find_fresh_enrichment_by_match(query, &since)
                    .await?
            }
        };

        let outcome = if record.is_some() { "hit" } else { "miss" };
        metrics::counter!("enrichment_cache_total", "outcome" => outcome).increment(1);

        let Some(record) = record else {
            return Ok(None);
        };

        debug!(record_id = %record.id, "Enrichment cache hit");
        Ok(Some(Self::hydrate(record)))
    }

    fn hydrate(record: enrichments::Model) -> CachedEnrichment {
        // The columns are authoritative if the snapshot predates a schema change.
        let person = person_from_record(&record).unwrap_or_else(|_| Person {
            id: record.external_person_id.clone(),
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            name: record.full_name.clone(),
            email: record.email.clone(),
            email_status: record.email_status.clone(),
            title: record.title.clone(),
            linkedin_url: record.linkedin_url.clone(),
            ..Person::default()
        });

        CachedEnrichment {
            record_id: record.id,
            person,
        }
    }
}
