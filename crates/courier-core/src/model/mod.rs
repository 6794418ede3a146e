//! Domain model for Report Courier.
//!
//! Job results and reports come from the upstream reporting job; delivery
//! settings are decoded from each report's delivery-configuration document;
//! delivery results are what a distribution pass emits.

pub mod job;
pub mod outcome;
pub mod settings;

pub use job::{FileData, JobResult, Report, TaskStatus};
pub use outcome::{DeliveryResult, ResultFields};
pub use settings::{
    ActivationProbe, ConnectionConfig, Credentials, DistributeMode, FileSettings,
    FtpEncryptionMode, FtpSettings, HubSettings, MailBodyType, MailServerSettings, MailSettings,
    MessengerKind, MessengerSettings, SinkType, SslThumbprint,
};
