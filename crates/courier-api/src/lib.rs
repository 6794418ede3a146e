//! # courier-api
//!
//! HTTP facade for Report Courier built on Axum.
//!
//! Exposes job-result upload (`POST /api/distribute/{id}`) and a liveness
//! endpoint (`GET /api/health`), plus the error mapping from domain
//! errors to HTTP responses.

pub mod app;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use app::run_server;
pub use state::AppState;
