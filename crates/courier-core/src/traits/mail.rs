//! Mail transport traits.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;

use crate::model::settings::MailServerSettings;
use crate::result::AppResult;

/// One attachment of an outgoing message.
#[derive(Debug, Clone)]
pub struct MailAttachment {
    /// Attachment filename presented to the recipient.
    pub filename: String,
    /// Raw file bytes.
    pub data: Bytes,
}

/// A fully assembled outgoing message.
#[derive(Debug, Clone)]
pub struct OutgoingMail {
    /// Sender address.
    pub from: String,
    /// Validated primary recipients.
    pub to: Vec<String>,
    /// Validated carbon-copy recipients.
    pub cc: Vec<String>,
    /// Validated blind-carbon-copy recipients.
    pub bcc: Vec<String>,
    /// Message subject.
    pub subject: String,
    /// Message body.
    pub body: String,
    /// Whether the body is HTML.
    pub html: bool,
    /// Attachments.
    pub attachments: Vec<MailAttachment>,
}

/// Opens SMTP sessions. One session is reused for every consolidated
/// message bound for the same server.
#[async_trait]
pub trait MailTransport: Send + Sync + std::fmt::Debug {
    /// Connect to the given server. The password in `server` is already
    /// decrypted (and base64-decoded where configured) by the caller.
    /// `client_certs` lists certificate files for client-cert auth.
    async fn connect(
        &self,
        server: &MailServerSettings,
        client_certs: &[PathBuf],
    ) -> AppResult<Box<dyn MailSession>>;
}

/// An established SMTP session.
#[async_trait]
pub trait MailSession: Send {
    /// Send one message.
    async fn send(&mut self, mail: &OutgoingMail) -> AppResult<()>;
}
