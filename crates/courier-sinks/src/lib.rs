//! # courier-sinks
//!
//! Delivery sink adapters for Report Courier: file-system copy, FTP
//! upload, hub publish, consolidated mail, and messenger webhooks.
//!
//! Every adapter is a failure boundary: it catches all errors internally
//! and translates them into [`courier_core::model::DeliveryResult`]
//! records. One sink failing for one report never prevents other sinks,
//! paths, or reports from being attempted.

pub mod file;
pub mod ftp;
pub mod hub;
pub mod mail;
pub mod messenger;
pub mod name;
pub mod webhook;

/// Per-job context handed to every adapter invocation.
///
/// Adapters never mutate the job itself; the orchestrator downgrades the
/// job status centrally when an adapter reports a failure.
#[derive(Debug, Clone)]
pub struct TaskContext {
    /// Task name used in every result record.
    pub task_name: String,
    /// Upper-cased upstream status, used as the report state of
    /// successful results.
    pub report_state: String,
}

impl TaskContext {
    /// Context for a job with the given name and formatted status.
    pub fn new(task_name: impl Into<String>, report_state: impl Into<String>) -> Self {
        Self {
            task_name: task_name.into(),
            report_state: report_state.into(),
        }
    }
}
