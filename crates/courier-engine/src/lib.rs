//! # courier-engine
//!
//! The distribution fan-out engine: resolves per-report delivery
//! configuration, dispatches every report to its activated sinks, pools
//! catalog connections, and aggregates the heterogeneous outcomes into
//! one normalized result document.

pub mod distributor;
pub mod normalize;
pub mod pool;
pub mod settings;
pub mod state;
pub mod transport;

pub use distributor::{Distributor, DistributorBuilder};
pub use pool::ConnectionManager;
