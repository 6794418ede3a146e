//! Typed per-destination delivery settings.
//!
//! Each variant is decoded from one key of a report's delivery-configuration
//! document. Decoding is lenient: missing fields fall back to defaults, and
//! the resolver skips (with a warning) any sink whose value fails to decode.

use serde::{Deserialize, Deserializer, Serialize};

/// Destination kind discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SinkType {
    /// E-mail delivery.
    Mail,
    /// File-system / network-share copy.
    File,
    /// Content-hub publish.
    Hub,
    /// FTP/FTPS upload.
    Ftp,
    /// Chat-bot webhook notification.
    Messenger,
}

impl std::fmt::Display for SinkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mail => write!(f, "mail"),
            Self::File => write!(f, "file"),
            Self::Hub => write!(f, "hub"),
            Self::Ftp => write!(f, "ftp"),
            Self::Messenger => write!(f, "messenger"),
        }
    }
}

/// Conflict policy for existing destination content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistributeMode {
    /// Fail if the target already exists.
    #[default]
    #[serde(rename = "CREATEONLY", alias = "createonly")]
    CreateOnly,
    /// Always replace existing content.
    #[serde(rename = "OVERRIDE", alias = "override")]
    Override,
    /// Purge prior matching content owned by the same principal, then
    /// behave as create-only for the remainder of the run.
    #[serde(rename = "DELETEALLFIRST", alias = "deleteallfirst")]
    DeleteAllFirst,
}

impl std::fmt::Display for DistributeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreateOnly => write!(f, "CREATEONLY"),
            Self::Override => write!(f, "OVERRIDE"),
            Self::DeleteAllFirst => write!(f, "DELETEALLFIRST"),
        }
    }
}

/// Result of probing one configuration key: which sink it addresses and
/// whether it is switched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationProbe {
    /// Destination kind derived from the configuration key.
    pub sink: SinkType,
    /// Whether the sink is activated. Defaults to `true` when the `active`
    /// field is absent: a sink runs unless explicitly disabled.
    pub active: bool,
}

/// Key/value credential pair for a catalog connection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// Credential name (e.g. cookie or header name).
    #[serde(default)]
    pub key: String,
    /// Credential value, possibly stored encrypted.
    #[serde(default)]
    pub value: String,
}

/// A pinned certificate thumbprint for one host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SslThumbprint {
    /// URL the thumbprint applies to.
    #[serde(default)]
    pub url: String,
    /// Hex thumbprint, colons and spaces ignored.
    #[serde(default)]
    pub thumbprint: String,
}

/// Connection settings for the external content catalog / hub endpoint.
///
/// The certificate validation policy travels with the connection config and
/// is handed to each network client at construction; there is no ambient
/// global validation state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    /// Server base URI.
    #[serde(default)]
    pub server_uri: String,
    /// Catalog application/workspace identifier.
    #[serde(default)]
    pub app: Option<String>,
    /// Session credentials.
    #[serde(default)]
    pub credentials: Option<Credentials>,
    /// Whether to verify server certificates.
    #[serde(default = "default_true")]
    pub ssl_verify: bool,
    /// Pinned thumbprints accepted in addition to the system trust store.
    #[serde(default)]
    pub ssl_valid_thumbprints: Vec<SslThumbprint>,
}

impl ConnectionConfig {
    /// Stable key identifying this connection for pooling purposes.
    pub fn pool_key(&self) -> String {
        format!(
            "{}|{}",
            self.server_uri,
            self.app.as_deref().unwrap_or_default()
        )
    }
}

/// File-copy sink settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSettings {
    /// Whether the sink is activated.
    #[serde(default = "default_true")]
    pub active: bool,
    /// Target directory, usually a `lib://` library path.
    #[serde(default)]
    pub target: Option<String>,
    /// Conflict policy.
    #[serde(default)]
    pub mode: DistributeMode,
    /// Catalog connections used to resolve the library path.
    #[serde(default, deserialize_with = "one_or_many")]
    pub connections: Vec<ConnectionConfig>,
}

/// FTP encryption mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum FtpEncryptionMode {
    /// Plain FTP.
    #[default]
    None,
    /// Implicit FTPS.
    Implicit,
    /// Explicit FTPS (AUTH TLS).
    Explicit,
    /// Try explicit, fall back to plain.
    Auto,
}

/// FTP/FTPS sink settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FtpSettings {
    /// Whether the sink is activated.
    #[serde(default = "default_true")]
    pub active: bool,
    /// FTP server host.
    #[serde(default)]
    pub host: String,
    /// FTP server port.
    #[serde(default = "default_ftp_port")]
    pub port: u16,
    /// Login name.
    #[serde(default)]
    pub username: String,
    /// Password, possibly stored encrypted.
    #[serde(default)]
    pub password: String,
    /// Transport encryption mode.
    #[serde(default)]
    pub encryption_mode: FtpEncryptionMode,
    /// Accept any server certificate when `true`.
    #[serde(default)]
    pub use_ssl: bool,
    /// Remote target directory.
    #[serde(default)]
    pub remote_path: Option<String>,
    /// Conflict policy.
    #[serde(default)]
    pub mode: DistributeMode,
}

/// Hub-publish sink settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubSettings {
    /// Whether the sink is activated.
    #[serde(default = "default_true")]
    pub active: bool,
    /// Owner principal the published content is assigned to.
    #[serde(default)]
    pub owner: Option<String>,
    /// Shared content type label.
    #[serde(default = "default_shared_content_type")]
    pub shared_content_type: String,
    /// Conflict policy.
    #[serde(default)]
    pub mode: DistributeMode,
    /// Catalog connections used to reach the hub endpoint.
    #[serde(default, deserialize_with = "one_or_many")]
    pub connections: Vec<ConnectionConfig>,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            active: true,
            owner: None,
            shared_content_type: default_shared_content_type(),
            mode: DistributeMode::default(),
            connections: Vec::new(),
        }
    }
}

/// Mail body content type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MailBodyType {
    /// Plain text; the literal token `{n}` becomes a newline.
    #[default]
    Text,
    /// Passed through as HTML.
    Html,
    /// Converted from Markdown to HTML before sending.
    Markdown,
}

/// SMTP server settings attached to a mail sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailServerSettings {
    /// SMTP host.
    #[serde(default)]
    pub host: String,
    /// Sender address.
    #[serde(default)]
    pub from: String,
    /// SMTP port.
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// Login name; empty means anonymous relay.
    #[serde(default)]
    pub username: String,
    /// Password, possibly stored encrypted and/or base64-encoded.
    #[serde(default)]
    pub password: String,
    /// Use TLS for the SMTP session.
    #[serde(default)]
    pub use_ssl: bool,
    /// Load `mailcert.*` client certificates from the credentials directory.
    #[serde(default)]
    pub use_certificate: bool,
    /// Decode the stored password from base64 before use.
    #[serde(default)]
    pub use_base64_password: bool,
    /// Pause in seconds before each send to this server.
    #[serde(default)]
    pub send_delay: u64,
}

impl Default for MailServerSettings {
    fn default() -> Self {
        Self {
            host: String::new(),
            from: String::new(),
            port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
            use_ssl: false,
            use_certificate: false,
            use_base64_password: false,
            send_delay: 0,
        }
    }
}

/// Mail sink settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailSettings {
    /// Whether the sink is activated.
    #[serde(default = "default_true")]
    pub active: bool,
    /// Mail subject.
    #[serde(default)]
    pub subject: Option<String>,
    /// Mail body, interpreted per `mail_type`.
    #[serde(default)]
    pub message: Option<String>,
    /// Attach the report files when `true`.
    #[serde(default = "default_true")]
    pub send_attachment: bool,
    /// Body content type.
    #[serde(default)]
    pub mail_type: MailBodyType,
    /// `;`-delimited primary recipients.
    #[serde(default)]
    pub to: Option<String>,
    /// `;`-delimited carbon-copy recipients.
    #[serde(default)]
    pub cc: Option<String>,
    /// `;`-delimited blind-carbon-copy recipients.
    #[serde(default)]
    pub bcc: Option<String>,
    /// SMTP server to deliver through.
    #[serde(default)]
    pub mail_server: Option<MailServerSettings>,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            active: true,
            subject: None,
            message: None,
            send_attachment: true,
            mail_type: MailBodyType::default(),
            to: None,
            cc: None,
            bcc: None,
            mail_server: None,
        }
    }
}

impl MailSettings {
    /// Consolidation key: two mail settings with an identical key are merged
    /// into a single outgoing message (exact match, case-sensitive).
    pub fn group_key(&self) -> String {
        format!(
            "{}|{}|{}/{}/{}",
            self.subject.as_deref().unwrap_or_default().trim(),
            self.message.as_deref().unwrap_or_default().trim(),
            self.to.as_deref().unwrap_or_default(),
            self.cc.as_deref().unwrap_or_default(),
            self.bcc.as_deref().unwrap_or_default(),
        )
    }
}

/// Chat-bot target flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessengerKind {
    /// Card-style HTML rendering.
    #[serde(rename = "MICROSOFTTEAMS", alias = "TEAMS")]
    MicrosoftTeams,
    /// Line-based plain-text rendering.
    #[serde(rename = "SLACK")]
    Slack,
}

/// Messenger (webhook) sink settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessengerSettings {
    /// Whether the sink is activated.
    #[serde(default = "default_true")]
    pub active: bool,
    /// Target flavor.
    pub messenger: MessengerKind,
    /// Webhook URL the summary is posted to.
    pub url: String,
}

/// Accept either a single object or an array of objects.
///
/// Historical configuration documents wrote `connections` both ways.
fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        One(T),
        Many(Vec<T>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}

fn default_true() -> bool {
    true
}

fn default_ftp_port() -> u16 {
    21
}

fn default_smtp_port() -> u16 {
    25
}

fn default_shared_content_type() -> String {
    "report".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_aliases() {
        let mode: DistributeMode = serde_json::from_str("\"DELETEALLFIRST\"").unwrap();
        assert_eq!(mode, DistributeMode::DeleteAllFirst);
        let mode: DistributeMode = serde_json::from_str("\"override\"").unwrap();
        assert_eq!(mode, DistributeMode::Override);
    }

    #[test]
    fn test_file_settings_defaults() {
        let settings: FileSettings = serde_json::from_str("{}").unwrap();
        assert!(settings.active);
        assert_eq!(settings.mode, DistributeMode::CreateOnly);
        assert!(settings.target.is_none());
        assert!(settings.connections.is_empty());
    }

    #[test]
    fn test_connections_single_object_or_array() {
        let json = r#"{"connections": {"serverUri": "https://catalog.local"}}"#;
        let settings: FileSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.connections.len(), 1);

        let json = r#"{"connections": [{"serverUri": "a"}, {"serverUri": "b"}]}"#;
        let settings: FileSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.connections.len(), 2);
    }

    #[test]
    fn test_mail_settings_default_matches_empty_document() {
        let decoded: MailSettings = serde_json::from_str("{}").unwrap();
        let constructed = MailSettings::default();
        assert!(constructed.active);
        assert!(constructed.send_attachment);
        assert_eq!(decoded.active, constructed.active);
        assert_eq!(decoded.send_attachment, constructed.send_attachment);
        assert_eq!(decoded.mail_type, constructed.mail_type);
    }

    #[test]
    fn test_mail_group_key_ignores_surrounding_whitespace() {
        let a = MailSettings {
            subject: Some(" Weekly ".to_string()),
            message: Some("body".to_string()),
            to: Some("x@example.com".to_string()),
            ..Default::default()
        };
        let b = MailSettings {
            subject: Some("Weekly".to_string()),
            message: Some("body ".to_string()),
            to: Some("x@example.com".to_string()),
            ..Default::default()
        };
        assert_eq!(a.group_key(), b.group_key());

        let c = MailSettings {
            bcc: Some("hidden@example.com".to_string()),
            ..a.clone()
        };
        assert_ne!(a.group_key(), c.group_key());
    }
}
