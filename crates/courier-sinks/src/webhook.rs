//! HTTP webhook client backed by `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use courier_core::error::ErrorKind;
use courier_core::traits::WebhookClient;
use courier_core::{AppError, AppResult};

/// Shared outbound HTTP client for messenger webhooks.
#[derive(Debug, Clone)]
pub struct HttpWebhookClient {
    client: reqwest::Client,
}

impl HttpWebhookClient {
    /// Client with a bounded request timeout.
    pub fn new(timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    "Could not build the webhook http client.",
                    err,
                )
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl WebhookClient for HttpWebhookClient {
    async fn post_json(&self, url: &str, payload: &serde_json::Value) -> AppResult<()> {
        debug!("POST webhook '{url}'");
        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|err| {
                AppError::with_source(
                    ErrorKind::Connection,
                    format!("The webhook request to '{url}' failed."),
                    err,
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::external(format!(
                "The webhook '{url}' answered with status {status}."
            )));
        }
        Ok(())
    }
}
