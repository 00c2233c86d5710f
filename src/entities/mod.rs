pub mod prelude;

pub mod enrichments;
pub mod search_cursors;
pub mod searches;
