//! Filename helpers shared by the sink adapters.

use std::path::Path;

/// Characters that are invalid in filenames on at least one supported OS.
const INVALID_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Replace every OS-invalid filename character with `_`, preserving length.
pub fn normalize_report_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_control() || INVALID_FILENAME_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// Destination filename for one output path of a report.
///
/// When the report has more than one output path, each file carries a
/// 1-based ordinal suffix so multi-format exports do not collide.
pub fn target_filename(report_name: &str, path: &str, ordinal: Option<usize>) -> String {
    let base = normalize_report_name(report_name);
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    match ordinal {
        Some(n) => format!("{base}_{n}{ext}"),
        None => format!("{base}{ext}"),
    }
}

/// Hub content name for one file of a report: `base (EXT)`.
///
/// The uppercased extension keeps multi-format exports of the same report
/// on distinct hub entries.
pub fn hub_content_name(report_name: &str, filename: &str) -> String {
    let base = Path::new(report_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(report_name);
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_uppercase();
    format!("{base} ({ext})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_replaces_invalid_chars() {
        assert_eq!(normalize_report_name("report/name:1"), "report_name_1");
        // Length is preserved, one underscore per invalid character.
        assert_eq!(normalize_report_name("a<>b").len(), 4);
        assert_eq!(normalize_report_name("plain name"), "plain name");
    }

    #[test]
    fn test_target_filename_with_and_without_ordinal() {
        assert_eq!(
            target_filename("sales", "/tmp/x/report.pdf", None),
            "sales.pdf"
        );
        assert_eq!(
            target_filename("sales", "/tmp/x/report.xlsx", Some(2)),
            "sales_2.xlsx"
        );
        assert_eq!(target_filename("sales", "/tmp/noext", None), "sales");
    }

    #[test]
    fn test_hub_content_name() {
        assert_eq!(hub_content_name("sales", "report.pdf"), "sales (PDF)");
        assert_eq!(
            hub_content_name("sales.pdf", "report.xlsx"),
            "sales (XLSX)"
        );
    }
}
