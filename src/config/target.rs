// ABOUTME: Per-target overrides layered on top of the base pipeline config.
// ABOUTME: Each target names the deployment it rolls out and the secrets it needs.

use crate::config::{EnvValue, RetryConfig, RolloutConfig, WatchConfig};
use crate::types::{DeploymentId, SecretName};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize)]
pub struct Target {
    /// Name of the deployment the rollout controller updates.
    pub deployment: DeploymentId,

    #[serde(default)]
    pub secrets: Vec<SecretName>,

    #[serde(default)]
    pub env: HashMap<String, EnvValue>,

    /// Extra image tags pushed for this target besides the commit tag.
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub watch: Option<WatchConfig>,

    #[serde(default)]
    pub rollout: Option<RolloutConfig>,

    #[serde(default)]
    pub retry: Option<RetryConfig>,
}
