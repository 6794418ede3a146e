//! Content-catalog session traits.
//!
//! A catalog session is the shared external connection leased per sink
//! dispatch. It resolves virtual `lib://` library paths for the file sink
//! and exposes the hub repository for the hub sink.

use std::sync::Arc;

use async_trait::async_trait;

use crate::model::settings::ConnectionConfig;
use crate::result::AppResult;
use crate::traits::hub::HubRepository;

/// Resolves virtual library paths against the external catalog.
#[async_trait]
pub trait LibraryPathResolver: Send + Sync + std::fmt::Debug {
    /// Resolve a `lib://connection/relative` target into a real filesystem
    /// directory. Must fail loudly if the named data connection cannot be
    /// found.
    async fn resolve_library_path(&self, target: &str) -> AppResult<String>;
}

/// A leased catalog session: path resolution plus hub repository access.
pub trait CatalogSession: LibraryPathResolver + HubRepository {}

impl<T: LibraryPathResolver + HubRepository> CatalogSession for T {}

/// Opens catalog sessions from connection configuration.
#[async_trait]
pub trait SessionFactory: Send + Sync + std::fmt::Debug {
    /// Open (or re-open) a session for the given connection config.
    async fn open(&self, config: &ConnectionConfig) -> AppResult<Arc<dyn CatalogSession>>;
}
