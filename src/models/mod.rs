pub mod lenient;
pub mod person;
pub mod search;

pub use person::{MatchQuery, Organization, Person};
pub use search::{RevenueRange, SearchParams};
