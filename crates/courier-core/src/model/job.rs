//! Job results produced by the upstream reporting job.

use std::path::Path;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of one upstream reporting task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    /// The report was generated successfully.
    Success,
    /// The report was generated with warnings; it is still delivered.
    Warning,
    /// Report generation failed.
    Error,
    /// Report generation failed and was retried unsuccessfully.
    #[serde(rename = "RETRYERROR")]
    RetryError,
    /// The task was not active.
    Inactive,
    /// The task was aborted.
    Abort,
    /// Any status this version does not know about.
    #[serde(other)]
    Unknown,
}

impl TaskStatus {
    /// Upper-cased status name as used in delivery result records.
    pub fn as_report_state(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::RetryError => "RETRYERROR",
            Self::Inactive => "INACTIVE",
            Self::Abort => "ABORT",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// One generated artifact set belonging to a [`JobResult`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Logical report name.
    #[serde(default)]
    pub name: String,
    /// Output paths written by the reporting job.
    #[serde(default)]
    pub paths: Vec<String>,
    /// Raw file payloads, keyed by filename.
    ///
    /// Paths and data are not guaranteed to be co-ordered by every
    /// producer; use [`Report::file_data`] for filename-keyed lookup.
    #[serde(default)]
    pub data: Vec<FileData>,
    /// Opaque per-destination delivery configuration document.
    #[serde(default)]
    pub distribute: Option<serde_json::Value>,
}

impl Report {
    /// Look up the payload for an output path by its filename.
    pub fn file_data(&self, path: &str) -> Option<&FileData> {
        let filename = Path::new(path).file_name()?.to_str()?;
        self.data.iter().find(|f| f.filename == filename)
    }
}

/// A report file payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    /// Original filename of the generated file.
    pub filename: String,
    /// Raw file bytes.
    #[serde(default)]
    pub data: Bytes,
}

/// Result of one upstream reporting task, the unit of a distribution batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    /// Upstream task identifier.
    #[serde(default)]
    pub task_id: Option<Uuid>,
    /// Task name used for result grouping; assigned by the orchestrator
    /// when empty.
    #[serde(default)]
    pub task_name: String,
    /// Task status.
    pub status: TaskStatus,
    /// Captured upstream exception message, if any.
    #[serde(default)]
    pub exception: Option<String>,
    /// Generated reports, in producer order.
    #[serde(default)]
    pub reports: Vec<Report>,
}

impl JobResult {
    /// Human-readable failure cause, falling back to a generic message.
    pub fn exception_message(&self, fallback: &str) -> String {
        self.exception
            .clone()
            .unwrap_or_else(|| fallback.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        let status: TaskStatus = serde_json::from_str("\"RETRYERROR\"").unwrap();
        assert_eq!(status, TaskStatus::RetryError);
        let status: TaskStatus = serde_json::from_str("\"SUCCESS\"").unwrap();
        assert_eq!(status, TaskStatus::Success);
    }

    #[test]
    fn test_unknown_status_is_tolerated() {
        let status: TaskStatus = serde_json::from_str("\"SOMETHING_NEW\"").unwrap();
        assert_eq!(status, TaskStatus::Unknown);
    }

    #[test]
    fn test_file_data_lookup_by_filename() {
        let report = Report {
            name: "sales".to_string(),
            paths: vec!["/tmp/out/b.xlsx".to_string(), "/tmp/out/a.pdf".to_string()],
            data: vec![
                FileData {
                    filename: "a.pdf".to_string(),
                    data: Bytes::from_static(b"pdf"),
                },
                FileData {
                    filename: "b.xlsx".to_string(),
                    data: Bytes::from_static(b"xlsx"),
                },
            ],
            distribute: None,
        };

        // Lookup is by filename, not by index.
        let found = report.file_data("/tmp/out/b.xlsx").unwrap();
        assert_eq!(found.data, Bytes::from_static(b"xlsx"));
        assert!(report.file_data("/tmp/out/missing.csv").is_none());
    }
}
