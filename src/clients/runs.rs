//! Client for the sibling run/cost-tracking service.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewRun {
    pub parent_run_id: String,
    pub service_name: String,
    pub task_name: String,
    pub organization_id: String,
    pub app_id: String,
    pub brand_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CostLine {
    pub cost_name: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Completed,
    Failed,
}

/// The step of the run protocol a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOperation {
    Create,
    AddCosts,
    Update,
}

impl fmt::Display for RunOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Create => "creating run",
            Self::AddCosts => "posting costs",
            Self::Update => "updating run status",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum RunsError {
    #[error("runs service failed while {operation}: {status} {message}")]
    Status {
        operation: RunOperation,
        status: u16,
        message: String,
    },

    #[error("runs service unreachable while {operation}: {source}")]
    Transport {
        operation: RunOperation,
        #[source]
        source: reqwest::Error,
    },
}

impl RunsError {
    #[must_use]
    pub const fn operation(&self) -> RunOperation {
        match self {
            Self::Status { operation, .. } | Self::Transport { operation, .. } => *operation,
        }
    }
}

#[async_trait]
pub trait RunTracker: Send + Sync {
    /// Returns the id of the created run.
    async fn create_run(&self, run: &NewRun) -> Result<String, RunsError>;

    async fn add_costs(&self, run_id: &str, costs: &[CostLine]) -> Result<(), RunsError>;

    async fn update_run(&self, run_id: &str, status: RunStatus) -> Result<(), RunsError>;
}

#[derive(Debug, Deserialize)]
struct CreatedRun {
    id: String,
}

#[derive(Serialize)]
struct CostsBody<'a> {
    items: &'a [CostLine],
}

#[derive(Serialize)]
struct StatusBody {
    status: RunStatus,
}

#[derive(Clone)]
pub struct RunsClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RunsClient {
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

    async fn check(
        operation: RunOperation,
        response: Result<reqwest::Response, reqwest::Error>,
    ) -> Result<reqwest::Response, RunsError> {
        let response = response.map_err(|source| RunsError::Transport { operation, source })?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(RunsError::Status {
            operation,
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl RunTracker for RunsClient {
    async fn create_run(&self, run: &NewRun) -> Result<String, RunsError> {
        let url = format!("{}/v1/runs", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("X-Api-Key", &self.api_key)
            .json(run)
            .send()
            .await;

        let response = Self::check(RunOperation::Create, response).await?;
        let created: CreatedRun =
            response
                .json()
                .await
                .map_err(|source| RunsError::Transport {
                    operation: RunOperation::Create,
                    source,
                })?;

        debug!(run_id = %created.id, task = %run.task_name, "Created run");
        Ok(created.id)
    }

    async fn add_costs(&self, run_id: &str, costs: &[CostLine]) -> Result<(), RunsError> {
        let url = format!("{}/v1/runs/{run_id}/costs", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("X-Api-Key", &self.api_key)
            .json(&CostsBody { items: costs })
            .send()
            .await;

        Self::check(RunOperation::AddCosts, response).await?;
        Ok(())
    }

    async fn update_run(&self, run_id: &str, status: RunStatus) -> Result<(), RunsError> {
        let url = format!("{}/v1/runs/{run_id}", self.base_url);
        let response = self
            .client
            .patch(&url)
            .header("X-Api-Key", &self.api_key)
            .json(&StatusBody { status })
            .send()
            .await;

        Self::check(RunOperation::Update, response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_run_wire_format() {
        let run = NewRun {
            parent_run_id: "parent".to_string(),
            service_name: "prospectr".to_string(),
            task_name: "fetch-next-page".to_string(),
            organization_id: "org".to_string(),
            app_id: "app".to_string(),
            brand_id: "brand".to_string(),
            campaign_id: None,
        };

        let value = serde_json::to_value(&run).unwrap();
        assert_eq!(value["parentRunId"], "parent");
        assert_eq!(value["taskName"], "fetch-next-page");
        assert!(value.get("campaignId").is_none());
    }

    #[test]
    fn test_status_wire_format() {
        let body = StatusBody {
            status: RunStatus::Completed,
        };
        assert_eq!(serde_json::to_value(&body).unwrap(), json!({"status": "completed"}));
    }

    #[test]
    fn test_operation_display() {
        assert_eq!(RunOperation::AddCosts.to_string(), "posting costs");
    }
}
