use crate::lecturecam_core::dates::{from_epoch_millis, get_current_time, parse_iso};
use crate::lecturecam_core::error::{LecturecamError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

/// Image extensions (lowercase) that get a sidecar.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Extension of the metadata sidecar written next to each image.
pub const SIDECAR_EXTENSION: &str = "json";

/// Name used when a sidecar is missing or carries no name.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Per-photo metadata, stored as `<stem>.json` next to `<stem>.jpg`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    pub name: String,
    pub folder: String,
    pub session: String,
    #[serde(with = "time::serde::rfc3339")]
    pub time: OffsetDateTime,
    pub note: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

/// Sidecar as found on disk. Older sidecars may lack fields, or carry the
/// capture time as epoch milliseconds instead of an ISO string.
#[derive(Deserialize, Debug, Default)]
struct RawMetadata {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    folder: Option<String>,
    #[serde(default)]
    session: Option<String>,
    #[serde(default)]
    time: Option<Value>,
    #[serde(default)]
    note: Option<String>,
    #[serde(default)]
    subject: Option<String>,
}

impl Metadata {
    /// Metadata used when a photo has no readable sidecar.
    pub fn fallback(folder: &str) -> Self {
        Metadata {
            name: UNKNOWN_NAME.to_string(),
            folder: folder.to_string(),
            session: String::new(),
            time: get_current_time(),
            note: String::new(),
            subject: None,
        }
    }

    fn from_raw(raw: RawMetadata, folder: &str) -> Self {
        let time = raw
            .time
            .as_ref()
            .and_then(value_to_time)
            .unwrap_or_else(get_current_time);

        Metadata {
            name: raw
                .name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
            folder: raw.folder.unwrap_or_else(|| folder.to_string()),
            session: raw.session.unwrap_or_default(),
            time,
            note: raw.note.unwrap_or_default(),
            subject: raw.subject.filter(|s| !s.is_empty()),
        }
    }
}

fn value_to_time(v: &Value) -> Option<OffsetDateTime> {
    match v {
        Value::String(s) => match parse_iso(s) {
            Ok(t) => Some(t),
            Err(e) => {
                log::warn!("Unreadable sidecar time: {}", e);
                None
            }
        },
        Value::Number(n) => n.as_i64().map(from_epoch_millis),
        _ => None,
    }
}

/// Check if a file is an image that this library manages.
pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Path of the sidecar belonging to an image.
///
/// Example: `photos/Math/IMG_001.jpg` -> `photos/Math/IMG_001.json`
pub fn sidecar_path_for(image_path: &Path) -> PathBuf {
    image_path.with_extension(SIDECAR_EXTENSION)
}

/// Name of the folder a file lives in, used as the default `folder` field.
fn containing_folder(path: &Path) -> String {
    path.parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string()
}

/// Read a sidecar. A missing file is reported as `MissingSidecar`.
pub fn read_metadata(sidecar_path: &Path) -> Result<Metadata> {
    if !sidecar_path.is_file() {
        return Err(LecturecamError::MissingSidecar(sidecar_path.to_path_buf()));
    }
    let content = fs::read_to_string(sidecar_path)?;
    let raw: RawMetadata = serde_json::from_str(&content)?;
    Ok(Metadata::from_raw(raw, &containing_folder(sidecar_path)))
}

/// Read a sidecar, substituting defaults when it is absent or unreadable.
pub fn read_metadata_or_default(sidecar_path: &Path) -> Metadata {
    match read_metadata(sidecar_path) {
        Ok(metadata) => metadata,
        Err(LecturecamError::MissingSidecar(path)) => {
            log::debug!("No sidecar at {}, using defaults", path.display());
            Metadata::fallback(&containing_folder(sidecar_path))
        }
        Err(e) => {
            log::warn!(
                "Failed to read sidecar {}: {}. Using defaults.",
                sidecar_path.display(),
                e
            );
            Metadata::fallback(&containing_folder(sidecar_path))
        }
    }
}

/// Persist a sidecar as pretty-printed JSON, replacing the whole file.
pub fn write_metadata(sidecar_path: &Path, metadata: &Metadata) -> Result<()> {
    let json = serde_json::to_string_pretty(metadata)?;
    fs::write(sidecar_path, json)?;
    Ok(())
}

/// Read-merge-write: load what is there (or defaults), apply `f`, write back.
pub fn update_metadata<F>(sidecar_path: &Path, f: F) -> Result<Metadata>
where
    F: FnOnce(&mut Metadata),
{
    let mut metadata = read_metadata_or_default(sidecar_path);
    f(&mut metadata);
    write_metadata(sidecar_path, &metadata)?;
    Ok(metadata)
}
