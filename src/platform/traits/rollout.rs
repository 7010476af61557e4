// ABOUTME: Rollout trait for the container platform.
// ABOUTME: Apply an artifact to a deployment and observe convergence.

use crate::types::{ArtifactRef, DeploymentId, ServiceName};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;

/// Desired state for one deployment update.
///
/// `env` carries resolved secret values, so `Debug` prints keys only.
#[derive(Clone)]
pub struct RolloutSpec {
    pub deployment: DeploymentId,
    pub service: ServiceName,
    pub artifact: ArtifactRef,
    pub env: HashMap<String, String>,
    pub labels: HashMap<String, String>,
}

impl fmt::Debug for RolloutSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut env_keys: Vec<&str> = self.env.keys().map(String::as_str).collect();
        env_keys.sort_unstable();
        f.debug_struct("RolloutSpec")
            .field("deployment", &self.deployment)
            .field("service", &self.service)
            .field("artifact", &self.artifact)
            .field("env_keys", &env_keys)
            .field("labels", &self.labels)
            .finish()
    }
}

/// Platform-observed state of a deployment's rollout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RolloutStatus {
    /// Still converging: containers starting or health checks pending.
    Progressing,
    /// Converged: the deployment serves the applied artifact.
    Available,
    /// Confirmed bad: the platform reports the rollout cannot succeed.
    Failed(String),
}

/// Rollout operations: apply an artifact, then poll for convergence.
#[async_trait]
pub trait RolloutOps: Send + Sync {
    /// Start updating the deployment to the artifact in the spec.
    async fn apply_artifact(&self, spec: &RolloutSpec) -> Result<(), RolloutError>;

    /// Observe the deployment's current rollout state.
    async fn rollout_status(&self, deployment: &DeploymentId)
    -> Result<RolloutStatus, RolloutError>;
}

/// Errors from rollout operations.
#[derive(Debug, thiserror::Error)]
pub enum RolloutError {
    #[error("deployment not found: {0}")]
    NotFound(String),

    #[error("engine unavailable: {0}")]
    Engine(String),

    #[error("rollout operation failed: {0}")]
    Failed(String),
}
