pub mod cursor;
pub mod enrichment;
pub mod search;
