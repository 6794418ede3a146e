//! Delivery result records emitted by a distribution pass.
//!
//! One record is appended per (job, report, sink) attempt, plus synthetic
//! records for skipped jobs and for reports with no activated sink, so the
//! consumer never sees silence for a submitted item. The variants form a
//! closed tagged union serialized with a `distributionMode` label.

use serde::{Deserialize, Serialize};

/// Fields shared by every delivery result variant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultFields {
    /// Task name of the originating job.
    pub task_name: String,
    /// Whether the attempt succeeded.
    pub success: bool,
    /// Human-readable outcome message.
    pub message: String,
    /// Report name (or merged report names for consolidated mail).
    #[serde(default)]
    pub report_name: String,
    /// Normalized report state: "ERROR" or the upstream status upper-cased.
    pub report_state: String,
}

impl ResultFields {
    /// Common fields for a successful attempt.
    pub fn ok(
        task_name: impl Into<String>,
        report_name: impl Into<String>,
        report_state: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            task_name: task_name.into(),
            success: true,
            message: message.into(),
            report_name: report_name.into(),
            report_state: report_state.into(),
        }
    }

    /// Common fields for a failed attempt; the report state is "ERROR".
    pub fn error(
        task_name: impl Into<String>,
        report_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            task_name: task_name.into(),
            success: false,
            message: message.into(),
            report_name: report_name.into(),
            report_state: "ERROR".to_string(),
        }
    }
}

/// One delivery outcome record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "distributionMode")]
pub enum DeliveryResult {
    /// File-system copy outcome.
    #[serde(rename = "File System", rename_all = "camelCase")]
    File {
        /// Shared result fields.
        #[serde(flatten)]
        common: ResultFields,
        /// Destination path the file was written to.
        #[serde(skip_serializing_if = "Option::is_none")]
        copy_path: Option<String>,
    },
    /// FTP upload outcome.
    #[serde(rename = "FTP", rename_all = "camelCase")]
    Ftp {
        /// Shared result fields.
        #[serde(flatten)]
        common: ResultFields,
        /// Remote file location.
        #[serde(skip_serializing_if = "Option::is_none")]
        ftp_path: Option<String>,
    },
    /// Hub publish outcome.
    #[serde(rename = "Hub", rename_all = "camelCase")]
    Hub {
        /// Shared result fields.
        #[serde(flatten)]
        common: ResultFields,
        /// Download link of the published content.
        #[serde(skip_serializing_if = "Option::is_none")]
        link: Option<String>,
        /// Absolute download link including scheme and host.
        #[serde(skip_serializing_if = "Option::is_none")]
        full_link: Option<String>,
    },
    /// Mail delivery outcome.
    #[serde(rename = "Mail", rename_all = "camelCase")]
    Mail {
        /// Shared result fields.
        #[serde(flatten)]
        common: ResultFields,
        /// Comma-joined recipient list.
        #[serde(skip_serializing_if = "Option::is_none")]
        to: Option<String>,
        /// Message subject.
        #[serde(skip_serializing_if = "Option::is_none")]
        subject: Option<String>,
    },
    /// Messenger webhook outcome.
    #[serde(rename = "Messenger", rename_all = "camelCase")]
    Messenger {
        /// Shared result fields.
        #[serde(flatten)]
        common: ResultFields,
    },
    /// Synthetic record for a report with no activated sink.
    #[serde(rename = "Distribution", rename_all = "camelCase")]
    Distribution {
        /// Shared result fields.
        #[serde(flatten)]
        common: ResultFields,
    },
    /// Synthetic record for a skipped or failed job.
    #[serde(rename = "Error", rename_all = "camelCase")]
    Error {
        /// Shared result fields.
        #[serde(flatten)]
        common: ResultFields,
    },
}

impl DeliveryResult {
    /// Shared fields of any variant.
    pub fn common(&self) -> &ResultFields {
        match self {
            Self::File { common, .. }
            | Self::Ftp { common, .. }
            | Self::Hub { common, .. }
            | Self::Mail { common, .. }
            | Self::Messenger { common }
            | Self::Distribution { common }
            | Self::Error { common } => common,
        }
    }

    /// Mutable shared fields of any variant.
    pub fn common_mut(&mut self) -> &mut ResultFields {
        match self {
            Self::File { common, .. }
            | Self::Ftp { common, .. }
            | Self::Hub { common, .. }
            | Self::Mail { common, .. }
            | Self::Messenger { common }
            | Self::Distribution { common }
            | Self::Error { common } => common,
        }
    }

    /// Task name this record belongs to.
    pub fn task_name(&self) -> &str {
        &self.common().task_name
    }

    /// Whether the attempt succeeded.
    pub fn success(&self) -> bool {
        self.common().success
    }

    /// Normalized report state.
    pub fn report_state(&self) -> &str {
        &self.common().report_state
    }

    /// Overwrite the normalized report state (used by the normalizer).
    pub fn set_report_state(&mut self, state: impl Into<String>) {
        self.common_mut().report_state = state.into();
    }
}
