use crate::lecturecam_core::calendar::UnifiedEvent;
use crate::lecturecam_core::layout::{UNORGANIZED_FOLDER, sanitize_folder_name};
use time::OffsetDateTime;

/// First event in `events` whose `[start, end)` contains `capture_time`.
///
/// `events` is expected in ascending start order, so when events overlap
/// the earliest-starting one wins.
pub fn matching_event<'e>(
    capture_time: &OffsetDateTime,
    events: &'e [UnifiedEvent],
) -> Option<&'e UnifiedEvent> {
    events.iter().find(|e| e.contains(capture_time))
}

/// Destination folder for a photo taken at `capture_time`: the title of the
/// event in session, made safe for use as a directory name, or
/// `Unorganized` when nothing matches.
pub fn classify(capture_time: &OffsetDateTime, events: &[UnifiedEvent]) -> String {
    match matching_event(capture_time, events) {
        Some(event) => {
            log::debug!(
                "{} falls in '{}' ({})",
                capture_time,
                event.title,
                event.id
            );
            sanitize_folder_name(&event.title)
        }
        None => UNORGANIZED_FOLDER.to_string(),
    }
}

/// Map a classified name onto an existing folder that differs only in case,
/// so "math class" and "Math Class" land in the same directory.
pub fn resolve_folder_name(classified: &str, existing_folders: &[String]) -> String {
    let wanted = classified.to_lowercase();
    existing_folders
        .iter()
        .find(|f| f.to_lowercase() == wanted)
        .cloned()
        .unwrap_or_else(|| classified.to_string())
}
