// ABOUTME: Immutable reference to a built container image.
// ABOUTME: Couples the content digest with the reference it was built as.

use super::image_ref::ImageRef;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DigestError {
    #[error("digest cannot be empty")]
    Empty,

    #[error("digest must be of the form 'algorithm:hex', got '{0}'")]
    MissingAlgorithm(String),

    #[error("digest hex part contains invalid character: '{0}'")]
    InvalidChar(char),
}

/// A content digest such as `sha256:41b2…`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Digest(String);

impl Digest {
    pub fn parse(input: &str) -> Result<Self, DigestError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(DigestError::Empty);
        }
        let Some((algo, hex)) = input.split_once(':') else {
            return Err(DigestError::MissingAlgorithm(input.to_string()));
        };
        if algo.is_empty() || hex.is_empty() {
            return Err(DigestError::MissingAlgorithm(input.to_string()));
        }
        if let Some(bad) = hex.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(DigestError::InvalidChar(bad));
        }
        Ok(Self(input.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Digest::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Immutable identifier of a built image.
///
/// Produced by the image builder, consumed by the registry publisher and the
/// rollout controller. The digest is the content-addressable image id; the
/// reference is the tag the build was labeled with. Rolling out by digest
/// means a concurrent re-tag cannot change what a run deploys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    digest: Digest,
    reference: ImageRef,
}

impl ArtifactRef {
    pub fn new(digest: Digest, reference: ImageRef) -> Self {
        Self { digest, reference }
    }

    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    pub fn reference(&self) -> &ImageRef {
        &self.reference
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.reference, self.digest)
    }
}
