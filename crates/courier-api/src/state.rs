//! Application state shared across all handlers.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use courier_core::config::AppConfig;
use courier_engine::Distributor;

/// State passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// The distribution engine.
    pub distributor: Arc<Distributor>,
    /// Canceled on server shutdown; every distribution run derives its
    /// cancellation token from this one.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, distributor: Arc<Distributor>) -> Self {
        Self {
            config,
            distributor,
            shutdown: CancellationToken::new(),
        }
    }
}
