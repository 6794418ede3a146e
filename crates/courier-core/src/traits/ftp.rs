//! FTP transport traits.

use async_trait::async_trait;
use bytes::Bytes;

use crate::model::settings::FtpSettings;
use crate::result::AppResult;

/// Opens FTP sessions. One session is established per report.
#[async_trait]
pub trait FtpTransport: Send + Sync + std::fmt::Debug {
    /// Connect using host/port/credentials/encryption settings. The
    /// password in `settings` is already decrypted by the caller.
    async fn connect(&self, settings: &FtpSettings) -> AppResult<Box<dyn FtpSession>>;
}

/// An established FTP session.
#[async_trait]
pub trait FtpSession: Send {
    /// Whether a remote file exists.
    async fn exists(&mut self, remote: &str) -> AppResult<bool>;

    /// Delete a remote file. "Not found" is not an error.
    async fn delete(&mut self, remote: &str) -> AppResult<()>;

    /// Create a remote directory recursively if missing.
    async fn ensure_dir(&mut self, remote_dir: &str) -> AppResult<()>;

    /// Upload bytes to a remote file, replacing any existing content.
    async fn upload(&mut self, remote: &str, data: Bytes) -> AppResult<()>;
}
