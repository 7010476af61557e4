// ABOUTME: Run record types: PipelineRun, StepResult, and their status enums.
// ABOUTME: Mutation goes through guarded transitions; terminal runs are immutable.

use crate::pipeline::trigger::TriggerEvent;
use crate::types::{RunId, ServiceName};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Overall status of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Running,
    Skipped,
    Succeeded,
    Failed,
}

impl RunStatus {
    /// Terminal statuses never change again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunStatus::Skipped | RunStatus::Succeeded | RunStatus::Failed
        )
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Pending => "pending",
            RunStatus::Running => "running",
            RunStatus::Skipped => "skipped",
            RunStatus::Succeeded => "succeeded",
            RunStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// The four pipeline steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepName {
    Resolve,
    Build,
    Publish,
    Rollout,
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepName::Resolve => "resolve",
            StepName::Build => "build",
            StepName::Publish => "publish",
            StepName::Rollout => "rollout",
        };
        write!(f, "{s}")
    }
}

/// Status of a single executed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Running,
    Succeeded,
    Failed,
    TimedOut,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepStatus::Running => "running",
            StepStatus::Succeeded => "succeeded",
            StepStatus::Failed => "failed",
            StepStatus::TimedOut => "timed out",
        };
        write!(f, "{s}")
    }
}

/// Outcome record for one executed step.
///
/// Detail text carries error detail or per-destination publish outcomes.
/// It never contains secret values.
#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    pub name: StepName,
    pub status: StepStatus,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// One end-to-end execution of the deploy sequence.
///
/// The run starts `Pending`, moves to `Running` when execution begins, and
/// ends in exactly one of `Skipped`, `Succeeded`, or `Failed`. All mutators
/// are no-ops once the run is terminal.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRun {
    id: RunId,
    service: ServiceName,
    environment: String,
    trigger: TriggerEvent,
    steps: Vec<StepResult>,
    status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    skip_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    finished_at: Option<DateTime<Utc>>,
}

impl PipelineRun {
    pub fn new(
        service: ServiceName,
        environment: impl Into<String>,
        trigger: TriggerEvent,
    ) -> Self {
        Self {
            id: RunId::generate(),
            service,
            environment: environment.into(),
            trigger,
            steps: Vec::new(),
            status: RunStatus::Pending,
            skip_reason: None,
            started_at: None,
            finished_at: None,
        }
    }

    pub fn id(&self) -> RunId {
        self.id
    }

    pub fn service(&self) -> &ServiceName {
        &self.service
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn trigger(&self) -> &TriggerEvent {
        &self.trigger
    }

    pub fn steps(&self) -> &[StepResult] {
        &self.steps
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn skip_reason(&self) -> Option<&str> {
        self.skip_reason.as_deref()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Wall-clock duration, once the run has both timestamps.
    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.started_at, self.finished_at) {
            (Some(started), Some(finished)) => Some(finished - started),
            _ => None,
        }
    }

    /// The first recorded step that did not succeed.
    pub fn failing_step(&self) -> Option<&StepResult> {
        self.steps
            .iter()
            .find(|step| step.status != StepStatus::Succeeded)
    }

    pub fn timed_out(&self) -> bool {
        self.steps
            .iter()
            .any(|step| step.status == StepStatus::TimedOut)
    }

    /// Begin execution. Only a pending run can start.
    pub fn start(&mut self) {
        if self.status == RunStatus::Pending {
            self.status = RunStatus::Running;
            self.started_at = Some(Utc::now());
        }
    }

    /// Mark a pending run as filtered out. A skipped run records zero steps.
    pub fn skip(&mut self, reason: impl Into<String>) {
        if self.status == RunStatus::Pending {
            self.status = RunStatus::Skipped;
            self.skip_reason = Some(reason.into());
            self.finished_at = Some(Utc::now());
        }
    }

    /// Record that a step has begun.
    pub fn start_step(&mut self, name: StepName) {
        if self.status != RunStatus::Running {
            return;
        }
        self.steps.push(StepResult {
            name,
            status: StepStatus::Running,
            started_at: Utc::now(),
            finished_at: None,
            detail: None,
        });
    }

    /// Close the most recent running step with the given name.
    pub fn finish_step(&mut self, name: StepName, status: StepStatus, detail: Option<String>) {
        if self.status.is_terminal() {
            return;
        }
        if let Some(step) = self
            .steps
            .iter_mut()
            .rev()
            .find(|step| step.name == name && step.status == StepStatus::Running)
        {
            step.status = status;
            step.finished_at = Some(Utc::now());
            step.detail = detail;
        }
    }

    /// Finalize a running run with a terminal status.
    pub fn finalize(&mut self, status: RunStatus) {
        if self.status != RunStatus::Running || !status.is_terminal() {
            return;
        }
        self.status = status;
        self.finished_at = Some(Utc::now());
    }
}
