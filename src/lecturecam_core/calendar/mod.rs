pub mod aggregate;
pub mod event;
pub mod local;
pub mod native;
pub mod remote;
pub mod sync;

pub use aggregate::{EventSources, RemoteSource, merge_events};
pub use event::{DateRange, EventSource, UnifiedEvent};
pub use local::{LocalEventStore, NewEvent};
pub use native::{DirectoryCalendar, NativeCalendar, NativeEvent, NoNativeCalendar};
pub use remote::{BackendEvent, EventPayload, HttpBackend, RemoteBackend};
pub use sync::{EventChanges, SyncReport, delete_event, edit_event, push_pending, sync};
