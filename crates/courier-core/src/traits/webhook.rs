//! Webhook client trait.

use async_trait::async_trait;

use crate::result::AppResult;

/// Posts JSON envelopes to chat-bot webhook URLs.
#[async_trait]
pub trait WebhookClient: Send + Sync + std::fmt::Debug {
    /// POST the payload to the URL. A non-2xx response is an error.
    async fn post_json(&self, url: &str, payload: &serde_json::Value) -> AppResult<()>;
}
