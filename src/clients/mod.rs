pub mod keys;
pub mod people;
pub mod runs;

pub use keys::{KeyServiceClient, KeyStore, KeysError};
pub use people::{PeopleApi, PeopleClient, SearchPage, UpstreamError};
pub use runs::{CostLine, NewRun, RunOperation, RunStatus, RunTracker, RunsClient, RunsError};
