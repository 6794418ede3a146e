//! Delivery-configuration resolver.
//!
//! A report's delivery document is a key-to-config mapping with one key
//! per destination. Keys address a sink by prefix (`mail`, `file`, `hub`,
//! `ftp`, `messenger`), so producers may write `mail1` or `ftp_backup`.
//! Unknown keys are skipped with a warning; an activated key whose value
//! does not decode is a configuration error for that sink alone.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use courier_core::model::{ActivationProbe, SinkType};
use courier_core::{AppError, AppResult};

/// Probe every key of a delivery document, in document order.
///
/// The `active` flag defaults to `true`: a sink runs unless explicitly
/// disabled.
pub fn probe_sinks(doc: &Value) -> Vec<(String, ActivationProbe)> {
    let Some(map) = doc.as_object() else {
        warn!("The delivery configuration is not an object and was skipped");
        return Vec::new();
    };

    let mut probes = Vec::with_capacity(map.len());
    for (key, value) in map {
        let Some(sink) = sink_for_key(key) else {
            warn!("The delivery type '{key}' is unknown and was skipped");
            continue;
        };
        let active = value
            .get("active")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        debug!("Found delivery key '{key}' ({sink}, active: {active})");
        probes.push((key.clone(), ActivationProbe { sink, active }));
    }
    probes
}

/// Sink kind addressed by a configuration key, by case-insensitive prefix.
fn sink_for_key(key: &str) -> Option<SinkType> {
    let key = key.trim().to_lowercase();
    if key.starts_with("mail") {
        Some(SinkType::Mail)
    } else if key.starts_with("file") {
        Some(SinkType::File)
    } else if key.starts_with("hub") {
        Some(SinkType::Hub)
    } else if key.starts_with("ftp") {
        Some(SinkType::Ftp)
    } else if key.starts_with("messenger") {
        Some(SinkType::Messenger)
    } else {
        None
    }
}

/// Decode the settings value of one delivery key.
///
/// A value that does not match the expected shape is a configuration
/// error; the caller records it as an error result for this sink and
/// continues with the others.
pub fn decode_sink<T: DeserializeOwned>(key: &str, doc: &Value) -> AppResult<T> {
    let value = doc.get(key).ok_or_else(|| {
        AppError::configuration(format!("The delivery key '{key}' is missing."))
    })?;
    serde_json::from_value(value.clone()).map_err(|err| {
        warn!("The settings for delivery key '{key}' could not be decoded: {err}");
        AppError::configuration(format!(
            "The settings for delivery key '{key}' could not be decoded: {err}"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::model::{FileSettings, MailSettings};
    use serde_json::json;

    #[test]
    fn test_probes_keep_document_order_and_default_active() {
        let doc = json!({
            "mail": {"to": "a@example.com"},
            "file1": {"active": false, "target": "lib://conn/out"},
            "ftp": {"active": true, "host": "ftp.example.com"},
        });

        let probes = probe_sinks(&doc);

        assert_eq!(probes.len(), 3);
        assert_eq!(probes[0].0, "mail");
        assert_eq!(probes[0].1.sink, SinkType::Mail);
        assert!(probes[0].1.active);
        assert_eq!(probes[1].1.sink, SinkType::File);
        assert!(!probes[1].1.active);
        assert_eq!(probes[2].1.sink, SinkType::Ftp);
    }

    #[test]
    fn test_unknown_keys_are_skipped() {
        let doc = json!({
            "carrierpigeon": {"active": true},
            "hub": {},
        });

        let probes = probe_sinks(&doc);

        assert_eq!(probes.len(), 1);
        assert_eq!(probes[0].1.sink, SinkType::Hub);
    }

    #[test]
    fn test_prefix_matches_numbered_keys() {
        let doc = json!({
            "mail1": {},
            "mail_backup": {},
            "messenger2": {"messenger": "SLACK", "url": "https://x"},
        });

        let probes = probe_sinks(&doc);

        assert_eq!(probes[0].1.sink, SinkType::Mail);
        assert_eq!(probes[1].1.sink, SinkType::Mail);
        assert_eq!(probes[2].1.sink, SinkType::Messenger);
    }

    #[test]
    fn test_decode_failure_is_a_configuration_error() {
        let doc = json!({
            "file": {"target": 42},
            "mail": {"subject": "ok"},
        });

        let err = decode_sink::<FileSettings>("file", &doc).unwrap_err();
        assert_eq!(err.kind, courier_core::error::ErrorKind::Configuration);
        assert!(err.message.contains("'file'"));
        let mail: MailSettings = decode_sink("mail", &doc).unwrap();
        assert_eq!(mail.subject.as_deref(), Some("ok"));
    }
}
