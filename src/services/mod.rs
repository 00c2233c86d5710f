pub mod billing;
pub use billing::CostReporter;

pub mod enrichment_cache;
pub use enrichment_cache::{CacheKey, CachedEnrichment, EnrichmentCache};

pub mod pagination;
pub use pagination::{CursorPlan, PageOutcome, PaginationSettings, page_outcome, plan_cursor};

pub mod lead_service;
pub use lead_service::{LeadError, LeadService};

pub mod lead_service_impl;
pub use lead_service_impl::{DefaultLeadService, LeadServiceSettings};
