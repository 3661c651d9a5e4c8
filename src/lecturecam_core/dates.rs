use crate::lecturecam_core::error::{LecturecamError, Result};
use time::format_description::FormatItem;
use time::format_description::well_known::{Iso8601, Rfc3339};
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

/// Session names default to the capture day, e.g. `2024-01-01`.
pub const SESSION_DATE_FORMAT: &[FormatItem] = format_description!("[year]-[month]-[day]");

/// Short human-readable form for listings.
const DISPLAY_FORMAT: &[FormatItem] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

pub fn get_local_tz() -> UtcOffset {
    OffsetDateTime::now_local()
        .map(|dt| dt.offset())
        .unwrap_or_else(|_| {
            log::debug!("Failed to get local offset, using UTC instead.");
            UtcOffset::UTC
        })
}

/// Get the current local time, falling back to UTC if local time cannot be determined.
pub fn get_current_time() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// Parse an ISO-8601 timestamp. RFC 3339 is tried first since that is what
/// every writer in this crate produces.
pub fn parse_iso(value: &str) -> Result<OffsetDateTime> {
    let value = value.trim();
    OffsetDateTime::parse(value, &Rfc3339)
        .or_else(|_| OffsetDateTime::parse(value, &Iso8601::DEFAULT))
        .map_err(|e| LecturecamError::InvalidDateFormat(format!("'{}': {}", value, e)))
}

pub fn format_iso(date: &OffsetDateTime) -> String {
    date.format(&Rfc3339)
        .unwrap_or_else(|_| date.to_offset(UtcOffset::UTC).to_string())
}

/// `YYYY-MM-DD HH:MM` in the local timezone.
pub fn format_display(date: &OffsetDateTime) -> String {
    date.to_offset(get_local_tz())
        .format(DISPLAY_FORMAT)
        .unwrap_or_else(|_| format_iso(date))
}

pub fn to_epoch_millis(date: &OffsetDateTime) -> i64 {
    (date.unix_timestamp_nanos() / 1_000_000) as i64
}

pub fn from_epoch_millis(millis: i64) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp_nanos(millis as i128 * 1_000_000)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

/// Default session name for a photo taken at `date`.
pub fn session_name_for(date: &OffsetDateTime) -> String {
    date.format(SESSION_DATE_FORMAT)
        .unwrap_or_else(|_| date.date().to_string())
}

/// Parse a `YYYY-MM-DD` day.
pub fn parse_day(value: &str) -> Result<Date> {
    Date::parse(value.trim(), SESSION_DATE_FORMAT)
        .map_err(|e| LecturecamError::InvalidDateFormat(format!("'{}': {}", value, e)))
}

/// Start and end instants of `day` at the given offset.
pub fn day_bounds(day: Date, offset: UtcOffset) -> (OffsetDateTime, OffsetDateTime) {
    let start = PrimitiveDateTime::new(day, Time::MIDNIGHT).assume_offset(offset);
    (start, start + Duration::days(1))
}

/// Parse a date filter like `2024-01-01` or `2024-01-01..2024-01-31` into an
/// inclusive day span.
pub fn parse_day_span(value: &str) -> Result<(Date, Date)> {
    if let Some((first, last)) = value.split_once("..") {
        let first = parse_day(first)?;
        let last = parse_day(last)?;
        if last < first {
            return Err(LecturecamError::Argument(format!(
                "Date range '{}' ends before it starts",
                value
            )));
        }
        return Ok((first, last));
    }
    let day = parse_day(value)?;
    Ok((day, day))
}
