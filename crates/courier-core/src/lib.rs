//! # courier-core
//!
//! Core crate for Report Courier. Contains the domain model (job results,
//! reports, delivery settings, delivery results), configuration schemas,
//! the collaborator traits for external systems (content catalog, hub
//! repository, FTP, SMTP, webhooks), credential decryption, and the
//! unified error system.
//!
//! This crate has **no** internal dependencies on other Courier crates.

pub mod config;
pub mod crypto;
pub mod error;
pub mod model;
pub mod result;
pub mod traits;

pub use error::AppError;
pub use result::AppResult;
