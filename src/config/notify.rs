// ABOUTME: Notification configuration for run outcome delivery.
// ABOUTME: Webhook URL comes through EnvValue so it stays out of committed config.

use crate::config::EnvValue;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    pub webhook: EnvValue,

    #[serde(default)]
    pub channel: Option<String>,

    /// Send a notification on success as well as on failure.
    #[serde(default = "default_on_success")]
    pub on_success: bool,
}

fn default_on_success() -> bool {
    true
}
