//! Credential decryption interface.
//!
//! Decryption fails closed: when no key is configured or a value cannot be
//! decrypted, the original text is returned unchanged. The actual cipher
//! implementation is an external collaborator; this crate only ships the
//! passthrough used when no key is configured.

use serde_json::Value;

/// Decrypts stored credential strings.
pub trait Decryptor: Send + Sync + std::fmt::Debug {
    /// Decrypt a single value, returning the input unchanged on failure.
    fn decrypt(&self, cipher_text: &str) -> String;
}

/// Decryptor used when no private key is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughDecryptor;

impl Decryptor for PassthroughDecryptor {
    fn decrypt(&self, cipher_text: &str) -> String {
        cipher_text.to_string()
    }
}

/// Decrypt every string leaf of a delivery-configuration document in place.
///
/// Arrays and nested objects are walked recursively; non-string leaves are
/// left untouched.
pub fn resolve_document(decryptor: &dyn Decryptor, value: &mut Value) {
    match value {
        Value::String(s) => {
            *s = decryptor.decrypt(s);
        }
        Value::Array(items) => {
            for item in items {
                resolve_document(decryptor, item);
            }
        }
        Value::Object(map) => {
            for (_, item) in map.iter_mut() {
                resolve_document(decryptor, item);
            }
        }
        _ => {}
    }
}
