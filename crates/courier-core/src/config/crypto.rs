//! Credential decryption configuration.

use serde::{Deserialize, Serialize};

/// Settings for credential decryption and client certificates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CryptoConfig {
    /// Path to the private key used to decrypt stored credentials.
    /// When absent, decryption is disabled and cipher texts pass through
    /// unchanged.
    #[serde(default)]
    pub private_key_path: Option<String>,
    /// Directory searched for `mailcert.*` client certificates.
    #[serde(default = "default_credentials_dir")]
    pub credentials_dir: String,
}

fn default_credentials_dir() -> String {
    ".".to_string()
}
