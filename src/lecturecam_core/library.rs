use crate::lecturecam_core::cache::{PhotoCache, PhotoRecord};
use crate::lecturecam_core::calendar::{
    DirectoryCalendar, EventSources, HttpBackend, LocalEventStore, NativeCalendar,
    NoNativeCalendar, RemoteBackend, RemoteSource,
};
use crate::lecturecam_core::database::Database;
use crate::lecturecam_core::error::{LecturecamError, Result};
use crate::lecturecam_core::layout::{self, PHOTOS_DIR};
use crate::lecturecam_core::settings;
use std::fs;
use std::path::{Component, Path, PathBuf};

const DB_FILE_NAME: &str = "lecturecam.db";

/// A photo library: a `photos/` tree plus the key-value store holding the
/// photo list caches, calendar selection and login.
pub struct Library {
    root: PathBuf,
    db: Database,
}

/// Where one photo lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoRef {
    pub folder: String,
    pub image_path: PathBuf,
}

impl PhotoRef {
    pub fn file_name(&self) -> &str {
        self.image_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    pub fn uri(&self) -> String {
        self.image_path.to_string_lossy().into_owned()
    }
}

impl Library {
    /// Create a new library at the specified directory.
    pub fn create(dir: &Path) -> Result<Self> {
        if dir.exists() {
            if dir.join(DB_FILE_NAME).exists() {
                return Err(LecturecamError::LibraryExists(dir.to_path_buf()));
            }
        } else {
            fs::create_dir_all(dir)?;
        }

        fs::create_dir_all(dir.join(PHOTOS_DIR))?;

        let db = Database::new(&dir.join(DB_FILE_NAME))?;
        log::info!("Created library at {}", dir.display());

        // photo uris embed the root, so keep one spelling of it
        Ok(Library {
            root: dir.canonicalize()?,
            db,
        })
    }

    /// Open an existing library.
    pub fn open(dir: &Path) -> Result<Self> {
        if !dir.exists() {
            return Err(LecturecamError::LibraryNotFound(dir.to_path_buf()));
        }

        let db_path = dir.join(DB_FILE_NAME);
        if !db_path.exists() {
            return Err(LecturecamError::InvalidLibrary(dir.to_path_buf()));
        }

        fs::create_dir_all(dir.join(PHOTOS_DIR))?;
        let db = Database::new(&db_path)?;

        Ok(Library {
            root: dir.canonicalize()?,
            db,
        })
    }

    /// Get the library root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one subdirectory per folder.
    pub fn photos_root(&self) -> PathBuf {
        self.root.join(PHOTOS_DIR)
    }

    pub fn folder_dir(&self, folder: &str) -> PathBuf {
        self.photos_root().join(folder)
    }

    /// Get a reference to the database.
    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn cache(&self) -> PhotoCache<'_> {
        PhotoCache::new(&self.db)
    }

    pub fn local_events(&self) -> LocalEventStore<'_> {
        LocalEventStore::new(&self.db)
    }

    pub fn folders(&self) -> Result<Vec<String>> {
        layout::list_folders(&self.photos_root())
    }

    pub fn sessions(&self, folder: &str) -> Result<Vec<String>> {
        layout::list_sessions(&self.photos_root(), folder)
    }

    /// Photos of a folder, from the cache when populated, otherwise from a
    /// filesystem scan that then populates the cache.
    pub fn load_photos(&self, folder: &str) -> Result<Vec<PhotoRecord>> {
        let cache = self.cache();
        if let Some(records) = cache.get(folder) {
            log::debug!("Cache hit for '{}' ({} photos)", folder, records.len());
            return Ok(records);
        }
        let records = layout::scan_folder(&self.photos_root(), folder)?;
        cache.set(folder, &records)?;
        Ok(records)
    }

    /// Photos of a folder, optionally restricted to one session.
    pub fn photos_in(&self, folder: &str, session: Option<&str>) -> Result<Vec<PhotoRecord>> {
        let records = self.load_photos(folder)?;
        Ok(match session {
            Some(session) => records
                .into_iter()
                .filter(|r| r.session.as_deref() == Some(session))
                .collect(),
            None => records,
        })
    }

    /// Locate a photo by folder and file name. The name must be a bare file
    /// name, not a path.
    pub fn photo(&self, folder: &str, file_name: &str) -> Result<PhotoRef> {
        let mut components = Path::new(file_name).components();
        if !matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        ) {
            return Err(LecturecamError::Argument(format!(
                "'{}' is not a file name",
                file_name
            )));
        }
        let image_path = self.folder_dir(folder).join(file_name);
        if !image_path.is_file() {
            return Err(LecturecamError::PathNotFound(image_path));
        }
        Ok(PhotoRef {
            folder: folder.to_string(),
            image_path,
        })
    }

    /// Locate a photo by the uri stored in its cache record.
    pub fn photo_from_uri(&self, uri: &str) -> Result<PhotoRef> {
        let image_path = PathBuf::from(uri);
        let folder = image_path
            .parent()
            .filter(|p| p.parent() == Some(self.photos_root().as_path()))
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                LecturecamError::Argument(format!("{} is not a photo in this library", uri))
            })?
            .to_string();
        Ok(PhotoRef { folder, image_path })
    }

    /// Calendar sources for this library. The native calendar is the
    /// exported-calendar directory when given; the backend is only used when
    /// a URL is configured and a session is saved.
    pub fn event_sources<'a>(
        &'a self,
        native: &'a dyn NativeCalendar,
        backend: Option<&'a dyn RemoteBackend>,
    ) -> EventSources<'a> {
        let remote = backend.and_then(|backend| {
            settings::auth_session(&self.db).map(|session| RemoteSource {
                backend,
                token: session.token,
            })
        });

        EventSources {
            native,
            calendar_ids: settings::calendar_ids(&self.db),
            local: self.local_events(),
            remote,
        }
    }
}

/// Pick the native calendar implementation for an optional export directory.
pub fn native_calendar(dir: Option<&Path>) -> Box<dyn NativeCalendar> {
    match dir {
        Some(dir) => Box::new(DirectoryCalendar::new(dir)),
        None => Box::new(NoNativeCalendar),
    }
}

/// Backend client for an optional base URL.
pub fn remote_backend(url: Option<&str>) -> Option<HttpBackend> {
    url.map(HttpBackend::new)
}
