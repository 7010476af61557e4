// ABOUTME: Shared types used across platform trait definitions.
// ABOUTME: Registry credentials carry the password as a redacted SecretValue.

use crate::secrets::SecretValue;

/// Registry authentication credentials.
///
/// The password field is a [`SecretValue`], so deriving `Debug` here is
/// safe: it prints redacted.
#[derive(Debug, Clone)]
pub struct RegistryAuth {
    /// Username.
    pub username: String,
    /// Password or token.
    pub password: SecretValue,
    /// Registry server (e.g., "ghcr.io").
    pub server: Option<String>,
}
