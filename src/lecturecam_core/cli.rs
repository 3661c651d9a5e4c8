use clap::{Parser, Subcommand, ValueEnum};
use simplelog::LevelFilter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Organize lecture photos into folders by class schedule")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable file logging to lecturecam.log
    #[arg(long = "log", global = true)]
    pub log: bool,

    /// Log level for file logging (debug, info, warn, error)
    #[arg(long, default_value_t = LevelFilter::Debug, global = true)]
    pub log_level: LevelFilter,

    /// Base URL of the calendar backend
    #[arg(long, env = "LECTURECAM_BACKEND", global = true)]
    pub backend: Option<String>,

    /// Directory of exported device calendars (<calendar id>.json files)
    #[arg(long, env = "LECTURECAM_CALENDAR_DIR", global = true)]
    pub calendar_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new lecturecam library
    Create {
        /// Path for the new library (will be created if it doesn't exist)
        #[arg(required = true)]
        library_dir: PathBuf,
    },

    /// List folders
    Folders {
        #[arg(required = true)]
        library_dir: PathBuf,
    },

    /// Create an empty folder
    CreateFolder {
        #[arg(required = true)]
        library_dir: PathBuf,

        #[arg(required = true)]
        name: String,
    },

    /// Rename a folder, updating every photo in it
    RenameFolder {
        #[arg(required = true)]
        library_dir: PathBuf,

        #[arg(required = true)]
        old_name: String,

        #[arg(required = true)]
        new_name: String,
    },

    /// List the sessions of a folder, newest first
    Sessions {
        #[arg(required = true)]
        library_dir: PathBuf,

        #[arg(required = true)]
        folder: String,
    },

    /// List the photos of a folder
    List {
        #[arg(required = true)]
        library_dir: PathBuf,

        #[arg(required = true)]
        folder: String,

        /// Only photos of this session
        #[arg(long)]
        session: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },

    /// Add a photo to the library, filing it by the class in session when it was taken
    Capture {
        #[arg(required = true)]
        library_dir: PathBuf,

        /// Image to add (jpg, jpeg or png)
        #[arg(required = true)]
        image: PathBuf,

        /// Capture time (RFC 3339). Defaults to the EXIF date, then the file time
        #[arg(long)]
        time: Option<String>,

        /// Folder to file into instead of the classified one
        #[arg(long)]
        folder: Option<String>,

        /// Session name. Defaults to the capture date
        #[arg(long)]
        session: Option<String>,

        /// Display name. Defaults to the file name
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        note: Option<String>,

        #[arg(long)]
        subject: Option<String>,
    },

    /// Move a photo to another folder and/or session
    Move {
        #[arg(required = true)]
        library_dir: PathBuf,

        /// Folder the photo is in now
        #[arg(required = true)]
        folder: String,

        /// Image file name, e.g. IMG_001.jpg
        #[arg(required = true)]
        file: String,

        /// Destination folder
        #[arg(required = true)]
        target_folder: String,

        /// Destination session. Defaults to the photo's current session
        #[arg(long)]
        session: Option<String>,
    },

    /// Set the note of a photo
    Note {
        #[arg(required = true)]
        library_dir: PathBuf,

        #[arg(required = true)]
        folder: String,

        #[arg(required = true)]
        file: String,

        /// New note text (empty clears it)
        #[arg(required = true)]
        note: String,
    },

    /// Delete a photo and its metadata
    Delete {
        #[arg(required = true)]
        library_dir: PathBuf,

        #[arg(required = true)]
        folder: String,

        #[arg(required = true)]
        file: String,
    },

    /// Drop cached photo lists so the next listing rescans the disk
    Refresh {
        #[arg(required = true)]
        library_dir: PathBuf,
    },

    /// Search photo names, notes, subjects and sessions
    Search {
        #[arg(required = true)]
        library_dir: PathBuf,

        #[arg(required = true)]
        query: String,

        /// Restrict the search to one folder
        #[arg(long)]
        folder: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Paths)]
        output: OutputFormat,
    },

    /// Show which folder a photo taken at a given time would be filed into
    Classify {
        #[arg(required = true)]
        library_dir: PathBuf,

        /// Time to classify (RFC 3339). Defaults to now
        #[arg(long)]
        time: Option<String>,
    },

    /// File every photo in Unorganized whose capture time now matches an event
    Organize {
        #[arg(required = true)]
        library_dir: PathBuf,
    },

    /// Show the merged schedule
    Schedule {
        #[arg(required = true)]
        library_dir: PathBuf,

        /// Day or day range (YYYY-MM-DD or YYYY-MM-DD..YYYY-MM-DD). Defaults to today
        #[arg(long)]
        date: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },

    /// Add an event to the local schedule
    AddEvent {
        #[arg(required = true)]
        library_dir: PathBuf,

        #[arg(required = true)]
        title: String,

        /// Start time (RFC 3339)
        #[arg(long, required = true)]
        start: String,

        /// End time (RFC 3339)
        #[arg(long, required = true)]
        end: String,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Change a local or backend event
    EditEvent {
        #[arg(required = true)]
        library_dir: PathBuf,

        /// Event id as shown by `schedule`
        #[arg(required = true)]
        id: String,

        #[arg(long)]
        title: Option<String>,

        /// New start time (RFC 3339)
        #[arg(long)]
        start: Option<String>,

        /// New end time (RFC 3339)
        #[arg(long)]
        end: Option<String>,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Delete a local or backend event by id
    DeleteEvent {
        #[arg(required = true)]
        library_dir: PathBuf,

        /// Event id as shown by `schedule`, e.g. local_1704096000000
        #[arg(required = true)]
        id: String,
    },

    /// List device calendars, or choose which ones feed the schedule
    Calendars {
        #[arg(required = true)]
        library_dir: PathBuf,

        /// Calendar ids to use, comma-separated
        #[arg(long, value_delimiter = ',')]
        select: Option<Vec<String>>,
    },

    /// Log in to the calendar backend
    Login {
        #[arg(required = true)]
        library_dir: PathBuf,

        #[arg(long, required = true)]
        username: String,

        #[arg(long, env = "LECTURECAM_PASSWORD", required = true)]
        password: String,
    },

    /// Forget the saved backend login
    Logout {
        #[arg(required = true)]
        library_dir: PathBuf,
    },

    /// Upload pending local events and refresh backend events
    Sync {
        #[arg(required = true)]
        library_dir: PathBuf,
    },
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// One file path (or event id) per line
    Paths,
    /// JSON output
    Json,
    /// Detailed table format
    Table,
}
