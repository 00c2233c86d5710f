use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub provider: ProviderConfig,

    pub keys: KeyServiceConfig,

    pub runs: RunsServiceConfig,

    pub cache: CacheConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/prospectr.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 7420,
            cors_allowed_origins: vec!["http://localhost:7420".to_string()],
        }
    }
}

/// The third-party people-data API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,

    /// Provider name passed to the key service and used to prefix cost names.
    pub provider_name: String,

    pub request_timeout_seconds: u64,

    /// Results per search page.
    pub page_size: u32,

    /// Hard ceiling on pages walked by one cursor.
    pub max_pages: u32,

    /// Maximum items accepted by one bulk match request.
    pub bulk_match_limit: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.apollo.io/api".to_string(),
            provider_name: "apollo".to_string(),
            request_timeout_seconds: 30,
            page_size: 25,
            max_pages: 500,
            bulk_match_limit: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyServiceConfig {
    pub base_url: String,

    #[serde(skip_serializing)]
    pub api_key: String,

    pub request_timeout_seconds: u64,
}

impl Default for KeyServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:7401".to_string(),
            api_key: String::new(),
            request_timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunsServiceConfig {
    pub base_url: String,

    #[serde(skip_serializing)]
    pub api_key: String,

    /// `serviceName` reported on every run this service creates.
    pub service_name: String,

    pub request_timeout_seconds: u64,
}

impl Default for RunsServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:7402".to_string(),
            api_key: String::new(),
            service_name: "prospectr".to_string(),
            request_timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long an enrichment with an email answers repeat lookups.
    pub freshness_months: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            freshness_months: 12,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,

    pub loki_labels: std::collections::HashMap<String, String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let mut labels = std::collections::HashMap::new();
        labels.insert("app".to_string(), "prospectr".to_string());

        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
            loki_labels: labels,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                let mut config = Self::load_from_path(path)?;
                config.apply_env_overrides();
                return Ok(config);
            }
        }

        info!("No config file found, using defaults");
        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Secrets and the database URL may come from the environment instead of the file.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("PROSPECTR_KEYS_API_KEY") {
            self.keys.api_key = key;
        }
        if let Some(key) = lookup("PROSPECTR_RUNS_API_KEY") {
            self.runs.api_key = key;
        }
        if let Some(url) = lookup("PROSPECTR_DATABASE_URL") {
            self.general.database_path = url;
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("prospectr").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".prospectr").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.provider.base_url.is_empty() {
            anyhow::bail!("provider.base_url cannot be empty");
        }

        if self.keys.base_url.is_empty() {
            anyhow::bail!("keys.base_url cannot be empty");
        }

        if self.runs.base_url.is_empty() {
            anyhow::bail!("runs.base_url cannot be empty");
        }

        if self.provider.page_size == 0 {
            anyhow::bail!("provider.page_size must be > 0");
        }

        if self.provider.max_pages == 0 {
            anyhow::bail!("provider.max_pages must be > 0");
        }

        if self.provider.bulk_match_limit == 0 {
            anyhow::bail!("provider.bulk_match_limit must be > 0");
        }

        Ok(())
    }
}
