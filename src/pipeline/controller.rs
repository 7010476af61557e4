// ABOUTME: Rollout controller: applies an artifact, then polls to a terminal outcome.
// ABOUTME: Deadline expiry aborts polling, not the rollout itself.

use crate::platform::{RolloutError, RolloutOps, RolloutSpec, RolloutStatus};
use std::time::Duration;
use tokio::time::Instant;

/// Terminal outcome of watching one rollout.
///
/// `TimedOut` means the deadline expired before the platform reported a
/// terminal state. It is not a failure verdict: the rollout may still
/// converge afterwards, which is exactly why it is reported separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RolloutOutcome {
    Succeeded,
    Failed(String),
    TimedOut,
}

/// Apply the artifact once, then poll status until terminal or deadline.
///
/// Status probes that fail with anything other than `NotFound` are logged
/// and retried on the next interval; the deadline bounds the whole watch.
pub async fn watch_rollout<R>(
    platform: &R,
    spec: &RolloutSpec,
    timeout: Duration,
    poll_interval: Duration,
) -> RolloutOutcome
where
    R: RolloutOps + ?Sized,
{
    if let Err(e) = platform.apply_artifact(spec).await {
        return RolloutOutcome::Failed(e.to_string());
    }

    let deadline = Instant::now() + timeout;
    loop {
        match platform.rollout_status(&spec.deployment).await {
            Ok(RolloutStatus::Available) => return RolloutOutcome::Succeeded,
            Ok(RolloutStatus::Failed(reason)) => return RolloutOutcome::Failed(reason),
            Ok(RolloutStatus::Progressing) => {}
            Err(RolloutError::NotFound(what)) => {
                return RolloutOutcome::Failed(format!("deployment disappeared: {what}"));
            }
            Err(e) => {
                tracing::warn!("Rollout status probe failed: {}", e);
            }
        }

        if Instant::now() >= deadline {
            return RolloutOutcome::TimedOut;
        }
        tokio::time::sleep(poll_interval).await;
    }
}
