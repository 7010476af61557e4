// ABOUTME: Pipeline engine: run records, typestate execution, and orchestration.
// ABOUTME: One PipelineRun walks resolve, build, publish, rollout, then notifies.

mod controller;
mod error;
mod orchestrator;
mod run;
mod state;
mod transitions;
mod trigger;

pub use controller::{RolloutOutcome, watch_rollout};
pub use error::{ErrorClass, StepError};
pub use orchestrator::execute;
pub use run::{PipelineRun, RunStatus, StepName, StepResult, StepStatus};
pub use state::{Built, Filtered, Published, Resolved, RolledOut};
pub use transitions::{Exec, TransitionResult};
pub use trigger::TriggerEvent;
