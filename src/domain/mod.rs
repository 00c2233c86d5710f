//! Domain primitives shared by the search, enrichment and billing layers.

pub mod filters;

pub use filters::CanonicalFilters;

use std::fmt;

/// Caller-supplied scoping for any billable operation.
///
/// Every unit of paid upstream work is charged against a child run created
/// under `parent_run_id`; the remaining fields are forwarded to the
/// cost-tracking service verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    pub organization_id: String,
    pub parent_run_id: String,
    pub app_id: String,
    pub brand_id: String,
    pub campaign_id: Option<String>,
}

/// Identifies one durable search cursor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CampaignKey {
    pub organization_id: String,
    pub campaign_id: String,
}

impl CampaignKey {
    #[must_use]
    pub fn new(organization_id: impl Into<String>, campaign_id: impl Into<String>) -> Self {
        Self {
            organization_id: organization_id.into(),
            campaign_id: campaign_id.into(),
        }
    }
}

impl fmt::Display for CampaignKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.organization_id, self.campaign_id)
    }
}

/// Billable line item kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostKind {
    Search,
    Enrich,
    Match,
}

impl CostKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Enrich => "enrich",
            Self::Match => "match",
        }
    }
}

impl fmt::Display for CostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Formats a timestamp the way every table stores it.
///
/// Fixed microsecond precision with a `Z` suffix keeps lexical order equal
/// to chronological order, which the freshness filters rely on.
#[must_use]
pub fn db_timestamp(at: chrono::DateTime<chrono::Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

#[must_use]
pub fn now_timestamp() -> String {
    db_timestamp(chrono::Utc::now())
}

/// Reduces a domain or website URL to a lowercase host without `www.`.
///
/// Stored records and incoming match queries both go through this, so
/// `www.acme.io`, `Acme.io` and `https://acme.io/about` share one key.
#[must_use]
pub fn normalize_domain(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let parsed = url::Url::parse(raw)
        .ok()
        .filter(|u| u.host_str().is_some())
        .or_else(|| url::Url::parse(&format!("https://{raw}")).ok())?;
    let host = parsed.host_str()?.to_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}
