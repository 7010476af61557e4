// ABOUTME: Validated name of the service a pipeline deploys.
// ABOUTME: RFC 1123 label rules so the name is safe in image and deployment names.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceNameError {
    #[error("service name cannot be empty")]
    Empty,

    #[error("service name exceeds maximum length of 63 characters")]
    TooLong,

    #[error("service name cannot start or end with a hyphen")]
    EdgeHyphen,

    #[error("invalid character in service name: '{0}' (lowercase alphanumerics and '-' only)")]
    InvalidChar(char),
}

/// The deployable component's name, e.g. `legal-api`.
///
/// The name ends up in image repositories, deployment object names, and
/// notification payloads, so it is restricted to a DNS label up front.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceName(String);

impl ServiceName {
    pub fn new(value: &str) -> Result<Self, ServiceNameError> {
        if value.is_empty() {
            return Err(ServiceNameError::Empty);
        }
        if value.len() > 63 {
            return Err(ServiceNameError::TooLong);
        }
        if value.starts_with('-') || value.ends_with('-') {
            return Err(ServiceNameError::EdgeHyphen);
        }
        if let Some(bad) = value
            .chars()
            .find(|c| !c.is_ascii_lowercase() && !c.is_ascii_digit() && *c != '-')
        {
            return Err(ServiceNameError::InvalidChar(bad));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for ServiceName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ServiceName {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ServiceName::new(&s).map_err(serde::de::Error::custom)
    }
}
