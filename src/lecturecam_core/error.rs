use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LecturecamError {
    // Storage errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] rusqlite_migration::Error),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Filesystem errors
    #[error("Directory walker error: {0}")]
    Walkdir(#[from] walkdir::Error),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    // Library errors
    #[error("Library already exists at {0}")]
    LibraryExists(PathBuf),

    #[error("Library not found at {0}")]
    LibraryNotFound(PathBuf),

    #[error("Invalid library: missing database at {0}")]
    InvalidLibrary(PathBuf),

    // Folder and photo errors
    #[error("A folder named '{0}' already exists")]
    FolderExists(String),

    #[error("Folder '{0}' does not exist")]
    FolderNotFound(String),

    #[error("No sidecar metadata at {0}")]
    MissingSidecar(PathBuf),

    #[error("Could not move image {path}: {reason}")]
    MoveFailed { path: PathBuf, reason: String },

    #[error("Date parsing error: {0}")]
    InvalidDateFormat(String),

    // Calendar errors
    #[error("Calendar access denied")]
    CalendarPermissionDenied,

    #[error("Calendar unavailable: {0}")]
    CalendarUnavailable(String),

    #[error("Remote error: {0}")]
    Remote(String),

    #[error("Not logged in")]
    NotAuthenticated,

    // Generic errors
    #[error("Argument error: {0}")]
    Argument(String),

    #[error("{0}")]
    Other(String),
}

impl LecturecamError {
    pub fn move_failed(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        LecturecamError::MoveFailed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for lecturecam operations.
pub type Result<T> = std::result::Result<T, LecturecamError>;
