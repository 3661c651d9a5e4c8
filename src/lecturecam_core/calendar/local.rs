//! App-owned events kept in the key-value store: events created on this
//! device that are still pending upload, and cached copies of backend events.

use crate::lecturecam_core::calendar::event::{
    DateRange, EventSource, LOCAL_COLOR, LOCAL_ID_PREFIX, REMOTE_COLOR, REMOTE_ID_PREFIX,
    UnifiedEvent,
};
use crate::lecturecam_core::database::Database;
use crate::lecturecam_core::dates::{get_current_time, to_epoch_millis};
use crate::lecturecam_core::error::Result;
use crate::lecturecam_core::settings::LOCAL_EVENTS_KEY;
use time::OffsetDateTime;

/// Fields of an event the user is creating.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub start_date: OffsetDateTime,
    pub end_date: OffsetDateTime,
    pub location: Option<String>,
    pub notes: Option<String>,
}

pub struct LocalEventStore<'a> {
    db: &'a Database,
}

impl<'a> LocalEventStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        LocalEventStore { db }
    }

    pub fn all(&self) -> Vec<UnifiedEvent> {
        self.db.get_json(LOCAL_EVENTS_KEY).unwrap_or_default()
    }

    fn save(&self, events: &[UnifiedEvent]) -> Result<()> {
        self.db.set_json(LOCAL_EVENTS_KEY, events)
    }

    pub fn in_range(&self, range: &DateRange) -> Vec<UnifiedEvent> {
        self.all().into_iter().filter(|e| e.overlaps(range)).collect()
    }

    /// Events created here that the backend has not seen yet.
    pub fn pending(&self) -> Vec<UnifiedEvent> {
        self.all()
            .into_iter()
            .filter(|e| e.source == EventSource::Local)
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<UnifiedEvent> {
        self.all().into_iter().find(|e| e.id == id)
    }

    /// Store a new pending event with a fresh `local_<millis>` id.
    pub fn add(&self, new_event: NewEvent) -> Result<UnifiedEvent> {
        let mut events = self.all();

        let mut stamp = to_epoch_millis(&get_current_time());
        while events
            .iter()
            .any(|e| e.id == format!("{}{}", LOCAL_ID_PREFIX, stamp))
        {
            stamp += 1;
        }

        let event = UnifiedEvent {
            id: format!("{}{}", LOCAL_ID_PREFIX, stamp),
            original_id: stamp.to_string(),
            title: new_event.title,
            start_date: new_event.start_date,
            end_date: new_event.end_date,
            source: EventSource::Local,
            color: Some(LOCAL_COLOR.to_string()),
            location: new_event.location,
            notes: new_event.notes,
            calendar_id: None,
        };
        events.push(event.clone());
        self.save(&events)?;
        log::info!("Added local event '{}' ({})", event.title, event.id);
        Ok(event)
    }

    /// Apply `f` to the stored event with `id`. Returns the updated event,
    /// or `None` if there is no such event.
    pub fn update<F>(&self, id: &str, f: F) -> Result<Option<UnifiedEvent>>
    where
        F: FnOnce(&mut UnifiedEvent),
    {
        let mut events = self.all();
        let Some(event) = events.iter_mut().find(|e| e.id == id) else {
            return Ok(None);
        };
        f(event);
        let updated = event.clone();
        self.save(&events)?;
        Ok(Some(updated))
    }

    pub fn delete(&self, id: &str) -> Result<bool> {
        let mut events = self.all();
        let before = events.len();
        events.retain(|e| e.id != id);
        if events.len() == before {
            return Ok(false);
        }
        self.save(&events)?;
        Ok(true)
    }

    /// Turn a pending local event into the cached copy of the backend event
    /// it was uploaded as.
    pub fn mark_synced(&self, local_id: &str, backend_id: &str) -> Result<bool> {
        let updated = self.update(local_id, |e| {
            e.id = format!("{}{}", REMOTE_ID_PREFIX, backend_id);
            e.original_id = backend_id.to_string();
            e.source = EventSource::Remote;
            e.color = Some(REMOTE_COLOR.to_string());
        })?;
        Ok(updated.is_some())
    }

    /// Insert or replace cached events by id.
    pub fn upsert(&self, incoming: &[UnifiedEvent]) -> Result<()> {
        let mut events = self.all();
        for event in incoming {
            match events.iter_mut().find(|e| e.id == event.id) {
                Some(existing) => *existing = event.clone(),
                None => events.push(event.clone()),
            }
        }
        self.save(&events)
    }
}
