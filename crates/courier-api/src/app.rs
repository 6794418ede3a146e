//! Server bootstrap: wires state and router into a running Axum app.

use std::sync::Arc;

use tracing::info;

use courier_core::config::AppConfig;
use courier_core::{AppError, AppResult};
use courier_engine::Distributor;

use crate::router::build_router;
use crate::state::AppState;

/// Run the HTTP facade until shutdown.
pub async fn run_server(config: Arc<AppConfig>, distributor: Arc<Distributor>) -> AppResult<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, distributor);
    let shutdown = state.shutdown.clone();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|err| AppError::connection(format!("Could not bind '{addr}': {err}")))?;
    info!("Report Courier is listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown signal received");
            }
            shutdown.cancel();
        })
        .await
        .map_err(|err| AppError::internal(format!("Server error: {err}")))?;
    Ok(())
}
