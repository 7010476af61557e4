// ABOUTME: Unified step error with SNAFU pattern.
// ABOUTME: Classifies collaborator failures for retry, reporting, and alerts.

use crate::platform::{BuildError, PushError};
use crate::secrets::VaultError;
use snafu::Snafu;
use std::time::Duration;

/// Unified error for a failed pipeline step.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StepError {
    #[snafu(display("resolving secrets failed: {source}"))]
    Resolve { source: VaultError },

    #[snafu(display("building image failed: {source}"))]
    Build { source: BuildError },

    #[snafu(display("publishing artifact failed: {source}"))]
    Publish { source: PushError },

    #[snafu(display("rollout failed: {reason}"))]
    RolloutFailed { reason: String },

    #[snafu(display("rollout not confirmed within {elapsed:?}"))]
    RolloutTimedOut { elapsed: Duration },

    #[snafu(display("{source}"))]
    Config { source: crate::error::Error },
}

/// Error class for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Network or service flakiness; retried within the policy bound.
    TransientInfra,
    /// Missing or invalid configuration; the message names the item.
    Configuration,
    /// The build engine rejected or could not complete the build.
    Build,
    /// The registry rejected the artifact (not transport, not auth).
    Publish,
    /// The platform reported a confirmed bad terminal state.
    Rollout,
    /// The rollout deadline expired before a terminal state was observed.
    RolloutTimeout,
}

impl StepError {
    /// Returns the error class for programmatic handling.
    pub fn class(&self) -> ErrorClass {
        match self {
            StepError::Resolve { source } => match source {
                VaultError::Unavailable(_) => ErrorClass::TransientInfra,
                VaultError::SecretMissing(_) | VaultError::Denied(_) | VaultError::Malformed(_) => {
                    ErrorClass::Configuration
                }
            },
            StepError::Build { source } => match source {
                BuildError::Engine(_) => ErrorClass::TransientInfra,
                BuildError::Context(_) => ErrorClass::Configuration,
                BuildError::Failed(_) | BuildError::DigestUnavailable(_) => ErrorClass::Build,
            },
            StepError::Publish { source } => match source {
                PushError::Unavailable(_) => ErrorClass::TransientInfra,
                PushError::AuthenticationFailed(_) => ErrorClass::Configuration,
                PushError::Failed(_) => ErrorClass::Publish,
            },
            StepError::RolloutFailed { .. } => ErrorClass::Rollout,
            StepError::RolloutTimedOut { .. } => ErrorClass::RolloutTimeout,
            StepError::Config { .. } => ErrorClass::Configuration,
        }
    }
}

impl From<VaultError> for StepError {
    fn from(source: VaultError) -> Self {
        StepError::Resolve { source }
    }
}

impl From<BuildError> for StepError {
    fn from(source: BuildError) -> Self {
        StepError::Build { source }
    }
}

impl From<PushError> for StepError {
    fn from(source: PushError) -> Self {
        StepError::Publish { source }
    }
}

impl From<crate::error::Error> for StepError {
    fn from(source: crate::error::Error) -> Self {
        StepError::Config { source }
    }
}
