//! Collaborator traits for external systems.
//!
//! The wire protocols themselves (catalog round-trips, hub REST, FTP, SMTP,
//! webhooks) are out of scope for the distribution core; these traits are
//! the capability interfaces the core invokes. The traits are defined here
//! in `courier-core` and implemented (or mocked) in the leaf crates.

pub mod catalog;
pub mod ftp;
pub mod hub;
pub mod mail;
pub mod webhook;

pub use catalog::{CatalogSession, LibraryPathResolver, SessionFactory};
pub use ftp::{FtpSession, FtpTransport};
pub use hub::{ContentReference, ContentTag, ContentUpload, HubContent, HubRepository};
pub use mail::{MailAttachment, MailSession, MailTransport, OutgoingMail};
pub use webhook::WebhookClient;
