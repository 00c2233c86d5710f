//! Cursor resolution and page-doneness rules for campaign searches.
//!
//! Both functions are pure; [`super::lead_service_impl`] wires them to the
//! store and the people API.

use crate::domain::CanonicalFilters;
use crate::entities::search_cursors;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationSettings {
    pub page_size: u32,
    pub max_pages: u32,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            page_size: 25,
            max_pages: 500,
        }
    }
}

/// What to do with the stored cursor before searching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorPlan {
    /// No cursor yet; start one at page 1 with these filters.
    Create(CanonicalFilters),
    /// Filters drifted; rewind the existing cursor in place.
    Reset {
        cursor: search_cursors::Model,
        filters: CanonicalFilters,
    },
    /// Continue from the stored page (and stored exhaustion).
    Resume(search_cursors::Model),
}

/// Returns `None` when there is no cursor and no filters to start one.
#[must_use]
pub fn plan_cursor(
    existing: Option<search_cursors::Model>,
    incoming: Option<CanonicalFilters>,
) -> Option<CursorPlan> {
    match (existing, incoming) {
        (None, None) => None,
        (None, Some(filters)) => Some(CursorPlan::Create(filters)),
        (Some(cursor), None) => Some(CursorPlan::Resume(cursor)),
        (Some(cursor), Some(filters)) => {
            if cursor.filter_params == filters.as_str() {
                Some(CursorPlan::Resume(cursor))
            } else {
                Some(CursorPlan::Reset { cursor, filters })
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageOutcome {
    pub next_page: i32,
    pub total_entries: i64,
    pub done: bool,
}

/// Decides whether the page just fetched was the last one.
///
/// An empty page keeps the previously known total if the provider reports
/// zero for it, so the exhausted cursor still carries a meaningful total.
#[must_use]
pub fn page_outcome(
    current_page: i32,
    returned: usize,
    reported_total: u64,
    previous_total: i64,
    settings: PaginationSettings,
) -> PageOutcome {
    let reported = i64::try_from(reported_total).unwrap_or(i64::MAX);
    let total_entries = if returned == 0 && reported == 0 {
        previous_total
    } else {
        reported
    };

    let next_page = current_page.saturating_add(1);
    let page_size = i64::from(settings.page_size.max(1));
    let total_pages = (total_entries + page_size - 1) / page_size;

    let done = returned == 0
        || i64::from(next_page) > total_pages
        || i64::from(next_page) > i64::from(settings.max_pages);

    PageOutcome {
        next_page,
        total_entries,
        done,
    }
}
