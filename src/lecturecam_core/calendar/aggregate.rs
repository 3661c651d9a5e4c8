//! Merges native, stored and backend events into one schedule.

use crate::lecturecam_core::calendar::event::{DateRange, UnifiedEvent};
use crate::lecturecam_core::calendar::local::LocalEventStore;
use crate::lecturecam_core::calendar::native::NativeCalendar;
use crate::lecturecam_core::calendar::remote::RemoteBackend;
use crate::lecturecam_core::error::LecturecamError;
use std::collections::HashSet;

/// A logged-in backend.
pub struct RemoteSource<'a> {
    pub backend: &'a dyn RemoteBackend,
    pub token: String,
}

/// Everything the aggregator reads from.
pub struct EventSources<'a> {
    pub native: &'a dyn NativeCalendar,
    /// Native calendars the user opted into.
    pub calendar_ids: Vec<String>,
    pub local: LocalEventStore<'a>,
    pub remote: Option<RemoteSource<'a>>,
}

impl EventSources<'_> {
    /// Native events for the range. Refused or failing access contributes nothing.
    pub fn native_events(&self, range: &DateRange) -> Vec<UnifiedEvent> {
        match self.native.fetch_events(&self.calendar_ids, range) {
            Ok(events) => events.into_iter().map(UnifiedEvent::from).collect(),
            Err(LecturecamError::CalendarPermissionDenied) => {
                log::debug!("Native calendar access denied, skipping device events");
                Vec::new()
            }
            Err(e) => {
                log::warn!("Failed to read native calendar: {}", e);
                Vec::new()
            }
        }
    }

    /// Backend events overlapping the range. The backend is queried without a
    /// date filter; failures contribute nothing.
    pub fn remote_events(&self, range: &DateRange) -> Vec<UnifiedEvent> {
        let Some(remote) = &self.remote else {
            return Vec::new();
        };
        match remote.backend.fetch_events(&remote.token) {
            Ok(events) => events
                .into_iter()
                .map(UnifiedEvent::from)
                .filter(|e| e.overlaps(range))
                .collect(),
            Err(e) => {
                log::warn!("Failed to fetch backend events: {}", e);
                Vec::new()
            }
        }
    }

    /// The merged schedule for `range`, ascending by start time.
    pub fn load(&self, range: &DateRange) -> Vec<UnifiedEvent> {
        let native = self.native_events(range);
        let stored = self.local.in_range(range);
        let remote = self.remote_events(range);
        log::debug!(
            "Loaded {} native, {} stored and {} backend events",
            native.len(),
            stored.len(),
            remote.len()
        );
        merge_events(native, stored, remote)
    }
}

/// De-duplicate by `id` and sort by start.
///
/// On an id clash the earlier group wins: native, then stored, then backend.
/// A stored copy of a backend event therefore shadows the fresh fetch, since
/// it may hold an edit not yet pushed.
pub fn merge_events(
    native: Vec<UnifiedEvent>,
    stored: Vec<UnifiedEvent>,
    remote: Vec<UnifiedEvent>,
) -> Vec<UnifiedEvent> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut merged = Vec::with_capacity(native.len() + stored.len() + remote.len());

    for event in native.into_iter().chain(stored).chain(remote) {
        if seen.insert(event.id.clone()) {
            merged.push(event);
        }
    }

    merged.sort_by(|a, b| a.start_date.cmp(&b.start_date));
    merged
}
