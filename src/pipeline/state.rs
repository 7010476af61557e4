// ABOUTME: Pipeline execution state types for the type state pattern.
// ABOUTME: Each state carries exactly the data later steps are allowed to see.

use crate::secrets::SecretBundle;
use crate::types::ArtifactRef;

/// Initial state: the trigger passed the target's filter.
/// Available actions: `resolve_credentials()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Filtered;

/// Secrets resolved: the bundle is in hand for build auth and rollout env.
/// Available actions: `build_image()`
#[derive(Debug)]
pub struct Resolved {
    pub(crate) secrets: SecretBundle,
}

/// Image built: the artifact exists on the build engine.
/// Available actions: `publish()`
#[derive(Debug)]
pub struct Built {
    pub(crate) secrets: SecretBundle,
    pub(crate) artifact: ArtifactRef,
}

/// Artifact published: every destination accepted the push.
/// Available actions: `run_rollout()`
#[derive(Debug)]
pub struct Published {
    pub(crate) secrets: SecretBundle,
    pub(crate) artifact: ArtifactRef,
}

/// Rollout confirmed: the deployment serves the new artifact.
/// Available actions: `finish()`
#[derive(Debug, Clone, Copy, Default)]
pub struct RolledOut;
