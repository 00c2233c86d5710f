use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::clients::{KeyServiceClient, KeyStore, PeopleApi, PeopleClient, RunTracker, RunsClient};
use crate::config::Config;
use crate::db::Store;
use crate::services::{DefaultLeadService, LeadService, LeadServiceSettings};

/// Build a shared HTTP client with reasonable defaults for API calls.
/// Every collaborator client reuses it so connections are pooled.
fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .user_agent(concat!("prospectr/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub lead_service: Arc<dyn LeadService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let provider_http = build_shared_http_client(config.provider.request_timeout_seconds)?;
        let keys_http = build_shared_http_client(config.keys.request_timeout_seconds)?;
        let runs_http = build_shared_http_client(config.runs.request_timeout_seconds)?;

        let people = Arc::new(PeopleClient::with_shared_client(
            provider_http,
            config.provider.base_url.clone(),
        ));
        let keys = Arc::new(KeyServiceClient::with_shared_client(
            keys_http,
            config.keys.base_url.clone(),
            config.keys.api_key.clone(),
        ));
        let runs = Arc::new(RunsClient::with_shared_client(
            runs_http,
            config.runs.base_url.clone(),
            config.runs.api_key.clone(),
        ));

        Ok(Self::with_collaborators(config, store, people, keys, runs))
    }

    /// Wires the service graph around caller-supplied collaborators.
    #[must_use]
    pub fn with_collaborators(
        config: Config,
        store: Store,
        people: Arc<dyn PeopleApi>,
        keys: Arc<dyn KeyStore>,
        runs: Arc<dyn RunTracker>,
    ) -> Self {
        let settings = LeadServiceSettings::from_config(&config);
        let lead_service = Arc::new(DefaultLeadService::new(
            store.clone(),
            people,
            keys,
            runs,
            settings,
        )) as Arc<dyn LeadService>;

        Self {
            config: Arc::new(RwLock::new(config)),
            store,
            lead_service,
        }
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
