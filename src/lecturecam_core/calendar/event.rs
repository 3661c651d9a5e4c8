//! Calendar event shape shared by every event source.

use crate::lecturecam_core::dates::day_bounds;
use crate::lecturecam_core::error::{LecturecamError, Result};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, UtcOffset};

pub const NATIVE_ID_PREFIX: &str = "native_";
pub const LOCAL_ID_PREFIX: &str = "local_";
pub const REMOTE_ID_PREFIX: &str = "remote_";

pub const NATIVE_COLOR: &str = "#4285F4";
pub const LOCAL_COLOR: &str = "#F4B400";
pub const REMOTE_COLOR: &str = "#0F9D58";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventSource {
    Native,
    Local,
    Remote,
}

impl EventSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventSource::Native => "NATIVE",
            EventSource::Local => "LOCAL",
            EventSource::Remote => "REMOTE",
        }
    }
}

impl std::fmt::Display for EventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An event normalized from any source.
///
/// `id` is namespaced by source (`native_*`, `local_*`, `remote_*`) and is only
/// used to de-duplicate; `original_id` is the key the originating source knows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedEvent {
    pub id: String,
    pub original_id: String,
    pub title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub start_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_date: OffsetDateTime,
    pub source: EventSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_id: Option<String>,
}

impl UnifiedEvent {
    /// True if `at` falls in `[start_date, end_date)`.
    pub fn contains(&self, at: &OffsetDateTime) -> bool {
        self.start_date <= *at && *at < self.end_date
    }

    pub fn overlaps(&self, range: &DateRange) -> bool {
        range.overlaps(&self.start_date, &self.end_date)
    }
}

/// Half-open time window `[start, end)` used for calendar queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

impl DateRange {
    pub fn new(start: OffsetDateTime, end: OffsetDateTime) -> Result<Self> {
        if end < start {
            return Err(LecturecamError::Argument(format!(
                "Date range ends ({}) before it starts ({})",
                end, start
            )));
        }
        Ok(DateRange { start, end })
    }

    /// Whole days `first..=last` at the given offset.
    pub fn for_days(first: Date, last: Date, offset: UtcOffset) -> Result<Self> {
        let (start, _) = day_bounds(first, offset);
        let (_, end) = day_bounds(last, offset);
        DateRange::new(start, end)
    }

    /// True if `[start, end)` intersects the range. Zero-length spans count
    /// when their instant lies inside it.
    pub fn overlaps(&self, start: &OffsetDateTime, end: &OffsetDateTime) -> bool {
        *start < self.end && (*end > self.start || *start >= self.start)
    }

    /// The day containing `at`, in `at`'s own offset.
    pub fn day_of(at: &OffsetDateTime) -> Self {
        let (start, end) = day_bounds(at.date(), at.offset());
        DateRange { start, end }
    }
}
