//! Naming rules for files in the shared upload directory.
//!
//! Uploaded files are stored as `<unix millis>_<original base name>` and
//! served under [`PUBLIC_PREFIX`]. Derived files sit next to their source.

use std::path::Path;

/// URL prefix under which the upload directory is served.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// Prefix for trimmed copies of live uploads.
pub const TRIMMED_PREFIX: &str = "trimmed_";

/// Prefix for snapshot stills extracted from live uploads.
pub const SNAPSHOT_PREFIX: &str = "snapshot_";

/// Fallback when a multipart part carries no usable file name.
const FALLBACK_NAME: &str = "upload.bin";

/// Strip directories and unsafe characters from a client-supplied file name.
///
/// Only the last path component is kept (both `/` and `\` separators), and
/// anything other than ASCII alphanumerics, `.`, `-`, `_` becomes `_`.
pub fn sanitize_file_name(original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Stored name for a fresh upload received at `millis` (unix epoch ms).
pub fn stored_file_name(original: &str, millis: i64) -> String {
    format!("{millis}_{}", sanitize_file_name(original))
}

/// Name of the trimmed copy derived from `stored_name`.
pub fn trimmed_file_name(stored_name: &str) -> String {
    format!("{TRIMMED_PREFIX}{stored_name}")
}

/// Name of the snapshot still derived from `stored_name`.
pub fn snapshot_file_name(stored_name: &str) -> String {
    format!("{SNAPSHOT_PREFIX}{stored_name}.jpg")
}

/// Public URL for a file inside the upload directory.
pub fn public_url(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    format!("{PUBLIC_PREFIX}/{name}")
}
