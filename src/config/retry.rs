// ABOUTME: Retry configuration for transient infrastructure failures.
// ABOUTME: Exponential backoff bounded by attempt count and delay cap.

use serde::Deserialize;
use std::time::Duration;

/// Retry budget for operations against flaky infrastructure.
///
/// `max_retries` counts retries after the first attempt, so an
/// operation runs at most `max_retries + 1` times.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_initial_delay", with = "humantime_serde")]
    pub initial_delay: Duration,

    #[serde(default = "default_max_delay", with = "humantime_serde")]
    pub max_delay: Duration,
}

impl RetryConfig {
    /// Delay before retry number `attempt` (zero-based), doubling each
    /// time and capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(2)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}
