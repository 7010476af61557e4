// ABOUTME: Run outcome notification: the report payload and the notifier seam.
// ABOUTME: Delivery is best-effort; failures are logged and never alter the run.

use crate::pipeline::{PipelineRun, RunStatus};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

mod webhook;
pub use webhook::WebhookNotifier;

/// Errors from notification delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("webhook request failed: {0}")]
    Delivery(String),

    #[error("webhook returned status {0}")]
    Rejected(u16),
}

/// Outcome payload for one finished run.
///
/// Carries everything a chat message or audit hook needs. Secret values
/// never appear here.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub service: String,
    pub environment: String,
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failing_step: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Set when the rollout deadline expired before a terminal state was
    /// observed; distinguishes "unconfirmed" from "confirmed bad".
    pub timed_out: bool,
    pub branch: String,
    pub commit: String,
    pub host: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

impl RunReport {
    pub fn for_run(run: &PipelineRun, channel: Option<String>) -> Self {
        Self {
            service: run.service().to_string(),
            environment: run.environment().to_string(),
            status: run.status(),
            failing_step: run.failing_step().map(|step| step.name.to_string()),
            detail: run.failing_step().and_then(|step| step.detail.clone()),
            timed_out: run.timed_out(),
            branch: run.trigger().branch.clone(),
            commit: run.trigger().commit.clone(),
            host: gethostname::gethostname().to_string_lossy().into_owned(),
            duration_secs: run
                .duration()
                .map(|d| d.num_milliseconds() as f64 / 1000.0),
            channel,
        }
    }

    /// Report for a run that failed before any step executed, such as an
    /// unreachable container engine. No step carries the cause, so the
    /// error text travels in `detail`.
    pub fn for_setup_failure(
        run: &PipelineRun,
        error: impl fmt::Display,
        channel: Option<String>,
    ) -> Self {
        Self {
            detail: Some(error.to_string()),
            ..Self::for_run(run, channel)
        }
    }
}

/// Delivery seam for run reports.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, report: &RunReport) -> Result<(), NotifyError>;
}
