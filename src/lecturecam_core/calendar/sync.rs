//! Mirrors the local event store to the backend.

use crate::lecturecam_core::calendar::event::{EventSource, UnifiedEvent};
use crate::lecturecam_core::calendar::local::LocalEventStore;
use crate::lecturecam_core::calendar::remote::{EventPayload, RemoteBackend};
use crate::lecturecam_core::error::{LecturecamError, Result};
use time::OffsetDateTime;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub pushed: usize,
    pub failed: usize,
    pub refreshed: usize,
}

/// Upload every pending local event. Each success is rewritten locally as the
/// backend's copy; failures stay pending for the next run.
pub fn push_pending(
    local: &LocalEventStore,
    backend: &dyn RemoteBackend,
    token: &str,
) -> Result<SyncReport> {
    let mut report = SyncReport::default();

    for event in local.pending() {
        match backend.create_event(token, &EventPayload::from(&event)) {
            Ok(created) => {
                local.mark_synced(&event.id, &created.id)?;
                log::info!("Pushed '{}' as backend event {}", event.title, created.id);
                report.pushed += 1;
            }
            Err(LecturecamError::NotAuthenticated) => return Err(LecturecamError::NotAuthenticated),
            Err(e) => {
                log::warn!("Failed to push '{}': {}", event.title, e);
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

/// Push pending events, then replace cached backend copies with a fresh fetch.
/// Cached copies the backend no longer has are dropped.
pub fn sync(local: &LocalEventStore, backend: &dyn RemoteBackend, token: &str) -> Result<SyncReport> {
    let mut report = push_pending(local, backend, token)?;

    let fresh: Vec<UnifiedEvent> = backend
        .fetch_events(token)?
        .into_iter()
        .map(UnifiedEvent::from)
        .collect();

    for stale in local
        .all()
        .into_iter()
        .filter(|e| e.source == EventSource::Remote)
        .filter(|e| !fresh.iter().any(|f| f.id == e.id))
    {
        local.delete(&stale.id)?;
    }

    local.upsert(&fresh)?;
    report.refreshed = fresh.len();
    Ok(report)
}

/// Field changes for an existing event. `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct EventChanges {
    pub title: Option<String>,
    pub start_date: Option<OffsetDateTime>,
    pub end_date: Option<OffsetDateTime>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

impl EventChanges {
    fn apply(self, event: &mut UnifiedEvent) {
        if let Some(title) = self.title {
            event.title = title;
        }
        if let Some(start) = self.start_date {
            event.start_date = start;
        }
        if let Some(end) = self.end_date {
            event.end_date = end;
        }
        if let Some(location) = self.location {
            event.location = Some(location).filter(|l| !l.is_empty());
        }
        if let Some(notes) = self.notes {
            event.notes = Some(notes).filter(|n| !n.is_empty());
        }
    }
}

/// Edit an event through the source that owns it. A backend event is updated
/// on the backend first and its response replaces the cached copy.
pub fn edit_event(
    local: &LocalEventStore,
    backend: Option<(&dyn RemoteBackend, &str)>,
    event: &UnifiedEvent,
    changes: EventChanges,
) -> Result<UnifiedEvent> {
    let mut edited = event.clone();
    changes.apply(&mut edited);
    if edited.end_date < edited.start_date {
        return Err(LecturecamError::Argument(format!(
            "'{}' would end before it starts",
            edited.title
        )));
    }

    match event.source {
        EventSource::Local => {
            local.upsert(std::slice::from_ref(&edited))?;
            Ok(edited)
        }
        EventSource::Remote => {
            let (backend, token) = backend.ok_or(LecturecamError::NotAuthenticated)?;
            let updated: UnifiedEvent = backend
                .update_event(token, &event.original_id, &EventPayload::from(&edited))?
                .into();
            local.upsert(std::slice::from_ref(&updated))?;
            Ok(updated)
        }
        EventSource::Native => Err(LecturecamError::Argument(format!(
            "'{}' belongs to the device calendar and cannot be edited here",
            event.title
        ))),
    }
}

/// Delete an event through the source that owns it.
pub fn delete_event(
    local: &LocalEventStore,
    backend: Option<(&dyn RemoteBackend, &str)>,
    event: &UnifiedEvent,
) -> Result<()> {
    match event.source {
        EventSource::Local => {
            local.delete(&event.id)?;
        }
        EventSource::Remote => {
            let (backend, token) = backend.ok_or(LecturecamError::NotAuthenticated)?;
            backend.delete_event(token, &event.original_id)?;
            local.delete(&event.id)?;
        }
        EventSource::Native => {
            return Err(LecturecamError::Argument(format!(
                "'{}' belongs to the device calendar and cannot be deleted here",
                event.title
            )));
        }
    }
    Ok(())
}
