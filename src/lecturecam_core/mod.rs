pub mod cache;
pub mod calendar;
pub mod capture;
pub mod classify;
pub mod cli;
pub mod database;
pub mod dates;
pub mod error;
pub mod layout;
pub mod library;
pub mod organizer;
pub mod output;
pub mod search;
pub mod settings;
pub mod sidecar;

pub use cache::{PhotoCache, PhotoRecord, RecordPatch};
pub use cli::{Cli, Commands, OutputFormat};
pub use database::Database;
pub use error::{LecturecamError, Result};
pub use library::{Library, PhotoRef, native_calendar, remote_backend};
pub use organizer::{DeleteOutcome, MoveOutcome, OrganizeReport, SaveOptions};
pub use sidecar::Metadata;
