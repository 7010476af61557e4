// ABOUTME: Resolves the full secret set for a run before any step executes.
// ABOUTME: Transient vault failures retry under the run's shared backoff policy.

use crate::config::RetryConfig;
use crate::retry::with_retries;
use crate::secrets::{SecretBundle, SecretStore, VaultError};
use crate::types::SecretName;

/// Fetch every named secret, failing fast on the first unresolvable one.
///
/// Names are fetched in the order given so error reporting is
/// deterministic. A name that keeps failing transiently past the retry
/// budget surfaces its last error.
pub async fn resolve_secrets<S>(
    store: &S,
    names: &[SecretName],
    retry: &RetryConfig,
) -> Result<SecretBundle, VaultError>
where
    S: SecretStore + ?Sized,
{
    let mut bundle = SecretBundle::new();
    for name in names {
        let value = with_retries(
            &format!("Fetching secret {name}"),
            retry,
            VaultError::is_transient,
            || store.fetch(name),
        )
        .await?;
        bundle.insert(name.clone(), value);
    }
    Ok(bundle)
}
