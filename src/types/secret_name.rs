// ABOUTME: Validated vault secret names.
// ABOUTME: Environment-variable style so resolved values can be injected directly.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecretNameError {
    #[error("secret name cannot be empty")]
    Empty,

    #[error("secret name exceeds maximum length of 128 characters")]
    TooLong,

    #[error("secret name cannot start with a digit")]
    LeadingDigit,

    #[error("invalid character in secret name: '{0}' (alphanumerics and '_' only)")]
    InvalidChar(char),
}

/// Name of a secret as listed in target configuration, e.g. `DATABASE_URL`.
///
/// Names double as environment variable keys when the rollout injects them,
/// so they follow environment variable naming rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecretName(String);

impl SecretName {
    pub fn new(value: &str) -> Result<Self, SecretNameError> {
        if value.is_empty() {
            return Err(SecretNameError::Empty);
        }
        if value.len() > 128 {
            return Err(SecretNameError::TooLong);
        }
        if value.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            return Err(SecretNameError::LeadingDigit);
        }
        if let Some(bad) = value
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && *c != '_')
        {
            return Err(SecretNameError::InvalidChar(bad));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SecretName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for SecretName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecretName {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        SecretName::new(&s).map_err(serde::de::Error::custom)
    }
}
