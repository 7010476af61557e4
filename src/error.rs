// ABOUTME: Application-wide error types for slipway.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("unknown target: {0}")]
    UnknownTarget(String),

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("container engine error: {0}")]
    Engine(String),

    #[error("notification setup failed: {0}")]
    Notify(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// reqwest errors can echo the full request URL, and request URLs here
/// carry vault secret paths and webhook tokens. Strip the URL and keep
/// the transport cause.
pub(crate) fn without_url(err: reqwest::Error) -> String {
    let err = err.without_url();
    match std::error::Error::source(&err) {
        Some(inner) => format!("{err}: {inner}"),
        None => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn transport_errors_lose_the_request_url() {
        let err = reqwest::Client::new()
            .get("http://127.0.0.1:1/hooks/T000/secret-token")
            .send()
            .await
            .unwrap_err();

        let message = without_url(err);
        assert!(!message.contains("secret-token"));
        assert!(!message.contains("http://"));
    }
}
