//! Device calendar access.

use crate::lecturecam_core::calendar::event::{
    DateRange, EventSource, NATIVE_COLOR, NATIVE_ID_PREFIX, UnifiedEvent,
};
use crate::lecturecam_core::error::{LecturecamError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use time::OffsetDateTime;

/// An event as the device calendar reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeEvent {
    pub id: String,
    pub title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub start_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_date: OffsetDateTime,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub calendar_id: String,
}

impl From<NativeEvent> for UnifiedEvent {
    fn from(event: NativeEvent) -> Self {
        UnifiedEvent {
            id: format!("{}{}", NATIVE_ID_PREFIX, event.id),
            original_id: event.id,
            title: event.title,
            start_date: event.start_date,
            end_date: event.end_date,
            source: EventSource::Native,
            color: Some(NATIVE_COLOR.to_string()),
            location: event.location,
            notes: event.notes,
            calendar_id: Some(event.calendar_id).filter(|c| !c.is_empty()),
        }
    }
}

/// Read access to the device's calendars.
pub trait NativeCalendar {
    /// Events from the given calendars overlapping `range`.
    /// Returns `CalendarPermissionDenied` when access is refused.
    fn fetch_events(&self, calendar_ids: &[String], range: &DateRange) -> Result<Vec<NativeEvent>>;
}

/// Used when no device calendar is configured; behaves like a refused permission.
pub struct NoNativeCalendar;

impl NativeCalendar for NoNativeCalendar {
    fn fetch_events(&self, _calendar_ids: &[String], _range: &DateRange) -> Result<Vec<NativeEvent>> {
        Err(LecturecamError::CalendarPermissionDenied)
    }
}

/// Device calendars exported as one JSON array of events per calendar,
/// stored as `<dir>/<calendar id>.json`.
pub struct DirectoryCalendar {
    dir: PathBuf,
}

impl DirectoryCalendar {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirectoryCalendar { dir: dir.into() }
    }

    /// Ids of every calendar present in the directory.
    pub fn calendar_ids(&self) -> Result<Vec<String>> {
        if !self.dir.is_dir() {
            return Err(LecturecamError::CalendarUnavailable(format!(
                "{} is not a directory",
                self.dir.display()
            )));
        }
        let mut ids: Vec<String> = fs::read_dir(&self.dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        ids.sort();
        Ok(ids)
    }
}

impl NativeCalendar for DirectoryCalendar {
    fn fetch_events(&self, calendar_ids: &[String], range: &DateRange) -> Result<Vec<NativeEvent>> {
        if !self.dir.is_dir() {
            return Err(LecturecamError::CalendarUnavailable(format!(
                "{} is not a directory",
                self.dir.display()
            )));
        }

        let mut events = Vec::new();
        for calendar_id in calendar_ids {
            let path = self.dir.join(format!("{}.json", calendar_id));
            if !path.is_file() {
                log::debug!("Calendar '{}' not found at {}", calendar_id, path.display());
                continue;
            }
            let content = fs::read_to_string(&path)?;
            let parsed: Vec<NativeEvent> = match serde_json::from_str(&content) {
                Ok(parsed) => parsed,
                Err(e) => {
                    log::warn!("Skipping unreadable calendar {}: {}", path.display(), e);
                    continue;
                }
            };
            for mut event in parsed {
                if !range.overlaps(&event.start_date, &event.end_date) {
                    continue;
                }
                event.calendar_id = calendar_id.clone();
                events.push(event);
            }
        }
        Ok(events)
    }
}
