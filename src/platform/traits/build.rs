// ABOUTME: Image build trait for the container platform.
// ABOUTME: Turns a build context directory into an addressable artifact.

use crate::types::{ArtifactRef, ImageRef};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;

/// What to build and how to tag the result.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Directory whose contents form the build context.
    pub context: PathBuf,
    /// Dockerfile path relative to the context root.
    pub dockerfile: String,
    /// Primary tag applied to the built image.
    pub tag: ImageRef,
    /// Build arguments, already resolved to plain strings.
    pub args: HashMap<String, String>,
    /// Labels stamped onto the image.
    pub labels: HashMap<String, String>,
}

/// Image build: context in, digest out.
#[async_trait]
pub trait ImageBuild: Send + Sync {
    /// Build an image and return the artifact it produced.
    async fn build_image(&self, request: &BuildRequest) -> Result<ArtifactRef, BuildError>;
}

/// Errors from image builds.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("build context unavailable: {0}")]
    Context(String),

    #[error("build failed: {0}")]
    Failed(String),

    #[error("built image has no digest: {0}")]
    DigestUnavailable(String),

    #[error("engine unavailable: {0}")]
    Engine(String),
}

impl BuildError {
    /// A failed build is never retried; a flaky engine connection is.
    pub fn is_transient(&self) -> bool {
        matches!(self, BuildError::Engine(_))
    }
}
