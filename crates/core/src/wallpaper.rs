//! Wallpaper kinds, upload titles, and batch validation.
//!
//! A wallpaper group holds either still images (`static`) or short video
//! loops (`live`). Titles arrive from the upload form as a loosely typed
//! list that pairs positionally with the uploaded files.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

/// `static` kind identifier as stored in `wallpaper_groups.kind`.
pub const KIND_STATIC: &str = "static";

/// `live` kind identifier as stored in `wallpaper_groups.kind`.
pub const KIND_LIVE: &str = "live";

/// Media type of a wallpaper group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WallpaperKind {
    /// Still images, stored as uploaded.
    #[default]
    Static,
    /// Video wallpapers, trimmed and given a snapshot on upload.
    Live,
}

impl WallpaperKind {
    /// Database / wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Static => KIND_STATIC,
            Self::Live => KIND_LIVE,
        }
    }

    /// Parse the `type` form field.
    ///
    /// An absent or blank value means `static`, matching the column default.
    pub fn parse(value: Option<&str>) -> Result<Self, CoreError> {
        match value.map(str::trim) {
            None | Some("") => Ok(Self::Static),
            Some(KIND_STATIC) => Ok(Self::Static),
            Some(KIND_LIVE) => Ok(Self::Live),
            Some(other) => Err(CoreError::Validation(format!(
                "Invalid wallpaper type '{other}'. Must be one of: {KIND_STATIC}, {KIND_LIVE}"
            ))),
        }
    }
}

impl std::fmt::Display for WallpaperKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Titles
// ---------------------------------------------------------------------------

/// Flatten raw `titles` form values into one ordered list.
///
/// Each raw value is either a JSON-encoded array of strings, a JSON string,
/// or plain text. Repeated form fields concatenate in arrival order.
pub fn parse_titles<S: AsRef<str>>(raw_values: &[S]) -> Vec<String> {
    let mut titles = Vec::new();
    for raw in raw_values {
        let raw = raw.as_ref();
        match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(serde_json::Value::Array(values)) => {
                titles.extend(values.into_iter().map(|v| match v {
                    serde_json::Value::String(s) => s,
                    serde_json::Value::Null => String::new(),
                    other => other.to_string(),
                }));
            }
            Ok(serde_json::Value::String(s)) => titles.push(s),
            _ => titles.push(raw.to_string()),
        }
    }
    titles
}

/// Resolve the stored title for the file at `index`.
///
/// Uses `titles[index]` when present and non-blank, otherwise the file's
/// base name with its extension stripped.
pub fn resolve_title(titles: &[String], index: usize, original_name: &str) -> String {
    match titles.get(index).map(|t| t.trim()) {
        Some(title) if !title.is_empty() => title.to_string(),
        _ => file_stem(original_name),
    }
}

/// Base name of `name` without directories or extension.
fn file_stem(name: &str) -> String {
    let path = Path::new(name);
    path.file_stem()
        .or_else(|| path.file_name())
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| name.to_string())
}

// ---------------------------------------------------------------------------
// Batch validation
// ---------------------------------------------------------------------------

/// Check the required upload fields before anything is persisted.
///
/// Returns the `(main_category_id, sub_category_id)` pair on success.
pub fn validate_upload_batch(
    main_category_id: Option<DbId>,
    sub_category_id: Option<DbId>,
    file_count: usize,
) -> Result<(DbId, DbId), CoreError> {
    let (Some(main), Some(sub)) = (main_category_id, sub_category_id) else {
        return Err(CoreError::Validation(
            "Missing category: mainCategory and subCategory are required".into(),
        ));
    };
    if file_count == 0 {
        return Err(CoreError::Validation("No files uploaded".into()));
    }
    Ok((main, sub))
}

/// Parse a category id form field. Blank values count as absent.
pub fn parse_category_id(field: &str, value: Option<&str>) -> Result<Option<DbId>, CoreError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse::<DbId>().map(Some).map_err(|_| {
            CoreError::Validation(format!("{field} must be a numeric id, got '{raw}'"))
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
