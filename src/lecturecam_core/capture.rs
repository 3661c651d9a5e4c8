use crate::lecturecam_core::dates::{get_current_time, get_local_tz};
use crate::lecturecam_core::error::{LecturecamError, Result};
use exiftool::ExifTool;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// Date format used in EXIF data.
const EXIF_DATE_FORMAT: &[FormatItem] =
    format_description!("[year]:[month]:[day] [hour]:[minute]:[second]");

const EXIF_OFFSET_FORMAT: &[FormatItem] = format_description!("[offset_hour]:[offset_minute]");

/// The EXIF fields that can tell when a photo was taken.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "PascalCase")]
struct CaptureExif {
    #[serde(default)]
    date_time_original: String,
    #[serde(default)]
    create_date: String,
    #[serde(default)]
    offset_time_original: Option<String>,
    #[serde(default)]
    offset_time: Option<String>,
}

/// Parse an EXIF date string with optional timezone offset.
fn parse_exif_date(date_str: &str, offset_str: Option<&str>) -> Result<OffsetDateTime> {
    if date_str.is_empty() {
        return Err(LecturecamError::InvalidDateFormat("empty date".to_string()));
    }

    let date_time = PrimitiveDateTime::parse(date_str, EXIF_DATE_FORMAT)
        .map_err(|e| LecturecamError::InvalidDateFormat(e.to_string()))?;

    let offset = match offset_str {
        Some(o) if !o.is_empty() => {
            UtcOffset::parse(o, EXIF_OFFSET_FORMAT).unwrap_or_else(|_| get_local_tz())
        }
        _ => get_local_tz(),
    };

    Ok(date_time.assume_offset(offset))
}

fn exif_capture_time(path: &Path) -> Option<OffsetDateTime> {
    let mut exiftool = match ExifTool::new() {
        Ok(tool) => tool,
        Err(e) => {
            log::debug!("ExifTool not available: {}", e);
            return None;
        }
    };

    let exif: CaptureExif = match exiftool.read_metadata(path, &[]) {
        Ok(exif) => exif,
        Err(e) => {
            log::warn!("Failed to read EXIF for {}: {}", path.display(), e);
            return None;
        }
    };

    parse_exif_date(&exif.date_time_original, exif.offset_time_original.as_deref())
        .or_else(|_| parse_exif_date(&exif.create_date, exif.offset_time.as_deref()))
        .ok()
}

/// When a photo was taken: EXIF capture date, else file modification time,
/// else now.
pub fn capture_time(path: &Path) -> OffsetDateTime {
    if let Some(taken) = exif_capture_time(path) {
        return taken;
    }

    fs::metadata(path)
        .and_then(|m| m.modified())
        .map(|t| OffsetDateTime::from(t).to_offset(get_local_tz()))
        .unwrap_or_else(|_| {
            log::warn!(
                "Could not determine capture time for {}, using current time",
                path.display()
            );
            get_current_time()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_parse_exif_date() {
        let parsed = parse_exif_date("2024:01:01 09:30:00", Some("+01:00")).unwrap();
        assert_eq!(parsed, datetime!(2024-01-01 08:30:00 UTC));
    }

    #[test]
    fn test_parse_empty_date() {
        assert!(parse_exif_date("", None).is_err());
        assert!(parse_exif_date("garbage", None).is_err());
    }

    #[test]
    fn test_capture_time_falls_back_to_mtime() {
        let temp_dir = assert_fs::TempDir::new().unwrap();
        let path = temp_dir.path().join("not-really.jpg");
        fs::write(&path, b"not an image").unwrap();

        let before = OffsetDateTime::now_utc() - time::Duration::minutes(5);
        let taken = capture_time(&path);
        assert!(taken > before);
    }
}
