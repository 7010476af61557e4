// ABOUTME: Registry publish trait for the container platform.
// ABOUTME: Tag an artifact under a destination reference and push it.

use super::shared_types::RegistryAuth;
use crate::types::{ArtifactRef, ImageRef};
use async_trait::async_trait;

/// Registry operations: tag and push.
#[async_trait]
pub trait RegistryPush: Send + Sync {
    /// Apply a destination reference to a built artifact.
    async fn tag_image(
        &self,
        artifact: &ArtifactRef,
        reference: &ImageRef,
    ) -> Result<(), PushError>;

    /// Push a tagged reference to its registry.
    async fn push_image(
        &self,
        reference: &ImageRef,
        auth: Option<&RegistryAuth>,
    ) -> Result<(), PushError>;
}

/// Errors from registry operations.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("authentication failed for registry: {0}")]
    AuthenticationFailed(String),

    #[error("registry unavailable: {0}")]
    Unavailable(String),

    #[error("push failed: {0}")]
    Failed(String),
}

impl PushError {
    /// Transport blips are retried per destination; rejections are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, PushError::Unavailable(_))
    }
}
