// ABOUTME: Container image reference parsing for registry destinations.
// ABOUTME: Handles repo, registry/repo:tag, and digest-pinned forms.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageRefError {
    #[error("image reference cannot be empty")]
    Empty,

    #[error("image reference contains invalid character: '{0}'")]
    InvalidChar(char),

    #[error("image reference has an empty tag")]
    EmptyTag,

    #[error("image reference has an empty name component")]
    EmptyName,
}

/// A parsed container image reference: `[registry/]name[:tag][@digest]`.
///
/// Publish destinations are derived by re-tagging the target repository, so
/// the type keeps registry, name, tag, and digest apart instead of carrying
/// one opaque string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRef {
    registry: Option<String>,
    name: String,
    tag: Option<String>,
    digest: Option<String>,
}

impl ImageRef {
    pub fn parse(input: &str) -> Result<Self, ImageRefError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ImageRefError::Empty);
        }
        if let Some(bad) = input
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && !"/:.-_@".contains(*c))
        {
            return Err(ImageRefError::InvalidChar(bad));
        }

        // Digest comes last and is delimited by '@'.
        let (rest, digest) = match input.split_once('@') {
            Some((rest, d)) => (rest, Some(d.to_string())),
            None => (input, None),
        };

        // The first path component is a registry host when it contains a dot
        // or a port, or is "localhost"; otherwise it is part of the name.
        let (registry, name_and_tag) = match rest.split_once('/') {
            Some((head, tail))
                if head.contains('.') || head.contains(':') || head == "localhost" =>
            {
                (Some(head.to_string()), tail)
            }
            _ => (None, rest),
        };

        // A colon in the remainder separates the tag; the registry port was
        // already stripped above, so any ':' here belongs to the tag.
        let (name, tag) = match name_and_tag.rsplit_once(':') {
            Some((_, t)) if t.is_empty() => return Err(ImageRefError::EmptyTag),
            Some((n, t)) => (n, Some(t.to_string())),
            None => (name_and_tag, None),
        };

        if name.is_empty() {
            return Err(ImageRefError::EmptyName);
        }

        // An untagged, undigested reference means "latest".
        let tag = match (&tag, &digest) {
            (None, None) => Some("latest".to_string()),
            _ => tag,
        };

        Ok(Self {
            registry,
            name: name.to_string(),
            tag,
            digest,
        })
    }

    pub fn registry(&self) -> Option<&str> {
        self.registry.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }

    /// The reference without tag or digest: `[registry/]name`.
    pub fn repository(&self) -> String {
        match &self.registry {
            Some(r) => format!("{}/{}", r, self.name),
            None => self.name.clone(),
        }
    }

    /// Same repository, different tag. Drops any digest pin.
    pub fn with_tag(&self, tag: &str) -> ImageRef {
        ImageRef {
            registry: self.registry.clone(),
            name: self.name.clone(),
            tag: Some(tag.to_string()),
            digest: None,
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.repository())?;
        if let Some(tag) = &self.tag {
            write!(f, ":{}", tag)?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{}", digest)?;
        }
        Ok(())
    }
}

impl Serialize for ImageRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ImageRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ImageRef::parse(&s).map_err(serde::de::Error::custom)
    }
}
