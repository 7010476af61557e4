// ABOUTME: JSON webhook notifier: POSTs the run report to a configured URL.
// ABOUTME: Webhook URLs embed tokens, so they stay out of Debug and errors.

use super::{Notifier, NotifyError, RunReport};
use crate::error::without_url;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl fmt::Debug for WebhookNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookNotifier").finish_non_exhaustive()
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, report: &RunReport) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .json(report)
            .send()
            .await
            .map_err(|e| NotifyError::Delivery(without_url(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected(status.as_u16()));
        }
        Ok(())
    }
}
