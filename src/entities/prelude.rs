pub use super::enrichments::Entity as Enrichments;
pub use super::search_cursors::Entity as SearchCursors;
pub use super::searches::Entity as Searches;
