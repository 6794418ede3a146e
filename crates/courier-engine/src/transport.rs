//! Placeholder collaborators used when no real transport is wired in.
//!
//! A distributor always carries a full collaborator set; deployments that
//! never deliver via a given channel keep these defaults, and any report
//! that does address the channel gets a clear configuration error result
//! instead of a panic or a silent skip.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use courier_core::model::settings::{ConnectionConfig, FtpSettings, MailServerSettings};
use courier_core::traits::{
    CatalogSession, FtpSession, FtpTransport, MailSession, MailTransport, SessionFactory,
    WebhookClient,
};
use courier_core::{AppError, AppResult};

/// Session factory used when no catalog endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredSessionFactory;

#[async_trait]
impl SessionFactory for UnconfiguredSessionFactory {
    async fn open(&self, config: &ConnectionConfig) -> AppResult<Arc<dyn CatalogSession>> {
        Err(AppError::configuration(format!(
            "No catalog client is configured for '{}'.",
            config.server_uri
        )))
    }
}

/// FTP transport used when no FTP client is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredFtpTransport;

#[async_trait]
impl FtpTransport for UnconfiguredFtpTransport {
    async fn connect(&self, settings: &FtpSettings) -> AppResult<Box<dyn FtpSession>> {
        Err(AppError::configuration(format!(
            "No FTP client is configured for '{}'.",
            settings.host
        )))
    }
}

/// Mail transport used when no SMTP client is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredMailTransport;

#[async_trait]
impl MailTransport for UnconfiguredMailTransport {
    async fn connect(
        &self,
        server: &MailServerSettings,
        _client_certs: &[PathBuf],
    ) -> AppResult<Box<dyn MailSession>> {
        Err(AppError::configuration(format!(
            "No SMTP client is configured for '{}'.",
            server.host
        )))
    }
}

/// Webhook client used when outbound HTTP is not wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredWebhookClient;

#[async_trait]
impl WebhookClient for UnconfiguredWebhookClient {
    async fn post_json(&self, url: &str, _payload: &serde_json::Value) -> AppResult<()> {
        Err(AppError::configuration(format!(
            "No webhook client is configured for '{url}'."
        )))
    }
}
