//! Run/cost reporting against the sibling cost-tracking service.
//!
//! Billing is mandatory once a chargeable upstream call has happened: every
//! failure here is returned to the caller, never logged and dropped. A run
//! whose cost posting fails is left uncompleted so it shows up as dangling
//! in the tracking service.

use crate::clients::{CostLine, NewRun, RunStatus, RunTracker, RunsError};
use crate::domain::{CostKind, RunContext};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct CostReporter {
    runs: Arc<dyn RunTracker>,
    service_name: String,
    cost_prefix: String,
}

impl CostReporter {
    #[must_use]
    pub fn new(
        runs: Arc<dyn RunTracker>,
        service_name: impl Into<String>,
        cost_prefix: impl Into<String>,
    ) -> Self {
        Self {
            runs,
            service_name: service_name.into(),
            cost_prefix: cost_prefix.into(),
        }
    }

    /// Cost line name for a kind, e.g. `apollo-search`.
    #[must_use]
    pub fn cost_name(&self, kind: CostKind) -> String {
        if self.cost_prefix.is_empty() {
            kind.as_str().to_string()
        } else {
            format!("{}-{}", self.cost_prefix, kind.as_str())
        }
    }

    /// Creates a child run under the caller's parent run.
    pub async fn open_run(&self, ctx: &RunContext, task_name: &str) -> Result<String, RunsError> {
        let run = NewRun {
            parent_run_id: ctx.parent_run_id.clone(),
            service_name: self.service_name.clone(),
            task_name: task_name.to_string(),
            organization_id: ctx.organization_id.clone(),
            app_id: ctx.app_id.clone(),
            brand_id: ctx.brand_id.clone(),
            campaign_id: ctx.campaign_id.clone(),
        };

        self.runs.create_run(&run).await.inspect_err(|e| {
            warn!(task = task_name, error = %e, "Failed to create billing run");
        })
    }

    /// Posts one cost line on `run_id`, then marks the run completed.
    pub async fn charge_and_complete(
        &self,
        run_id: &str,
        kind: CostKind,
        quantity: u32,
    ) -> Result<(), RunsError> {
        let cost_name = self.cost_name(kind);
        let lines = [CostLine {
            cost_name: cost_name.clone(),
            quantity,
        }];

        self.runs.add_costs(run_id, &lines).await.inspect_err(|e| {
            warn!(run_id, cost = %cost_name, error = %e, "Failed to post cost line");
        })?;

        metrics::counter!("cost_lines_posted_total", "cost" => kind.as_str()).increment(1);

        self.runs
            .update_run(run_id, RunStatus::Completed)
            .await
            .inspect_err(|e| {
                warn!(run_id, error = %e, "Failed to complete billing run");
            })?;

        debug!(run_id, cost = %cost_name, quantity, "Run charged and completed");
        Ok(())
    }

    /// Opens a run and charges it in one go; for work with nothing to link.
    pub async fn bill(
        &self,
        ctx: &RunContext,
        task_name: &str,
        kind: CostKind,
        quantity: u32,
    ) -> Result<String, RunsError> {
        let run_id = self.open_run(ctx, task_name).await?;
        self.charge_and_complete(&run_id, kind, quantity).await?;
        Ok(run_id)
    }
}
