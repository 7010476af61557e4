// ABOUTME: Vault KV v2 client over HTTP.
// ABOUTME: Maps transport and status errors onto the VaultError taxonomy.

use crate::config::VaultConfig;
use crate::error::{Result, without_url};
use crate::secrets::{SecretStore, SecretValue, VaultError};
use crate::types::SecretName;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Reads secrets from a Vault KV v2 mount.
///
/// Each secret name maps to one KV entry at
/// `<url>/v1/<mount>/data/<name>` whose payload holds the plaintext
/// under the `value` key.
pub struct VaultClient {
    client: reqwest::Client,
    base_url: String,
    mount: String,
    token: SecretValue,
}

impl VaultClient {
    pub fn new(config: &VaultConfig) -> Result<Self> {
        let token = SecretValue::new(config.token.resolve()?);
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| crate::error::Error::InvalidConfig(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            mount: config.mount.clone(),
            token,
        })
    }

    fn secret_url(&self, name: &SecretName) -> String {
        format!("{}/v1/{}/data/{}", self.base_url, self.mount, name)
    }
}

impl fmt::Debug for VaultClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultClient")
            .field("base_url", &self.base_url)
            .field("mount", &self.mount)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct KvReadResponse {
    data: KvReadData,
}

#[derive(Deserialize)]
struct KvReadData {
    data: HashMap<String, String>,
}

#[async_trait]
impl SecretStore for VaultClient {
    async fn fetch(&self, name: &SecretName) -> std::result::Result<SecretValue, VaultError> {
        let response = self
            .client
            .get(self.secret_url(name))
            .header("X-Vault-Token", self.token.expose())
            .send()
            .await
            .map_err(|e| VaultError::Unavailable(without_url(e)))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => return Err(VaultError::SecretMissing(name.clone())),
            StatusCode::FORBIDDEN => return Err(VaultError::Denied(name.clone())),
            status if status.is_server_error() => {
                return Err(VaultError::Unavailable(format!(
                    "vault returned {status} for {name}"
                )));
            }
            status => {
                return Err(VaultError::Unavailable(format!(
                    "unexpected status {status} for {name}"
                )));
            }
        }

        let body: KvReadResponse = response
            .json()
            .await
            .map_err(|_| VaultError::Malformed(name.clone()))?;

        body.data
            .data
            .get("value")
            .map(SecretValue::new)
            .ok_or_else(|| VaultError::Malformed(name.clone()))
    }
}
