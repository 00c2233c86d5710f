use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum KeysError {
    #[error("no {provider} key configured for organization {organization_id}")]
    NotConfigured {
        provider: String,
        organization_id: String,
    },

    #[error("key service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("key service request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Resolves the decrypted provider API key for an organization.
#[async_trait]
pub trait KeyStore: Send + Sync {
    async fn provider_key(&self, organization_id: &str, provider: &str)
    -> Result<String, KeysError>;
}

#[derive(Debug, Deserialize)]
struct DecryptedKey {
    key: String,
}

#[derive(Clone)]
pub struct KeyServiceClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl KeyServiceClient {
    #[must_use]
    pub fn with_shared_client(
        client: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl KeyStore for KeyServiceClient {
    async fn provider_key(
        &self,
        organization_id: &str,
        provider: &str,
    ) -> Result<String, KeysError> {
        let url = format!("{}/internal/keys/{provider}/decrypt", self.base_url);

        debug!(organization_id, provider, "Fetching provider key");

        let response = self
            .client
            .get(&url)
            .query(&[("orgId", organization_id)])
            .header("X-Api-Key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(KeysError::NotConfigured {
                provider: provider.to_string(),
                organization_id: organization_id.to_string(),
            });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(KeysError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: DecryptedKey = response.json().await?;
        Ok(body.key)
    }
}
