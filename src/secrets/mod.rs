// ABOUTME: Secret resolution types and the vault access trait.
// ABOUTME: Values are wrapped so they cannot leak through Debug or logs.

mod http;
mod resolver;

pub use http::VaultClient;
pub use resolver::resolve_secrets;

use crate::types::SecretName;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;

/// A resolved secret value.
///
/// No `Display` impl and a redacting `Debug` impl, so the only way the
/// plaintext leaves this type is an explicit [`SecretValue::expose`].
#[derive(Clone, PartialEq, Eq)]
pub struct SecretValue(String);

impl SecretValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretValue(<redacted>)")
    }
}

/// All secrets resolved for one pipeline run, keyed by name.
#[derive(Clone, Default)]
pub struct SecretBundle {
    values: HashMap<SecretName, SecretValue>,
}

impl SecretBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: SecretName, value: SecretValue) {
        self.values.insert(name, value);
    }

    pub fn get(&self, name: &SecretName) -> Option<&SecretValue> {
        self.values.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &SecretName> {
        self.values.keys()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for SecretBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.values.keys().map(SecretName::as_str).collect();
        names.sort_unstable();
        f.debug_struct("SecretBundle")
            .field("names", &names)
            .finish()
    }
}

/// Errors from secret stores. Messages carry secret names, never values.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("vault unavailable: {0}")]
    Unavailable(String),

    #[error("secret not found: {0}")]
    SecretMissing(SecretName),

    #[error("access denied for secret: {0}")]
    Denied(SecretName),

    #[error("malformed payload for secret: {0}")]
    Malformed(SecretName),
}

impl VaultError {
    /// Transient errors are worth retrying; the rest indicate
    /// misconfiguration and fail the run immediately.
    pub fn is_transient(&self) -> bool {
        matches!(self, VaultError::Unavailable(_))
    }
}

/// Read access to a secret store.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch a single secret by name.
    async fn fetch(&self, name: &SecretName) -> Result<SecretValue, VaultError>;
}
