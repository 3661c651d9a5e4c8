use crate::lecturecam_core::cache::{PhotoRecord, RecordPatch};
use crate::lecturecam_core::calendar::{DateRange, EventSources, UnifiedEvent};
use crate::lecturecam_core::capture::capture_time;
use crate::lecturecam_core::classify::{classify, resolve_folder_name};
use crate::lecturecam_core::dates::{from_epoch_millis, get_local_tz, session_name_for};
use crate::lecturecam_core::error::{LecturecamError, Result};
use crate::lecturecam_core::layout::{self, UNORGANIZED_FOLDER, record_for, validate_folder_name};
use crate::lecturecam_core::library::{Library, PhotoRef};
use crate::lecturecam_core::sidecar::{
    Metadata, is_image, read_metadata, read_metadata_or_default, sidecar_path_for,
    update_metadata, write_metadata,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use time::{Date, OffsetDateTime};

/// Result of a move request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Target equals the current folder and session; nothing was touched.
    NoChange,
    /// The photo's new location.
    Moved(PhotoRef),
}

/// Where the viewer should go after a delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The view is empty now.
    NavigateAway,
    /// Show `remaining[index]` next.
    Advance {
        index: usize,
        remaining: Vec<PhotoRecord>,
    },
}

/// Overrides for [`save_photo`]. Anything left `None` is derived from the
/// image and the calendar.
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    pub time: Option<OffsetDateTime>,
    pub folder: Option<String>,
    pub session: Option<String>,
    pub name: Option<String>,
    pub note: Option<String>,
    pub subject: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SavedPhoto {
    pub photo: PhotoRef,
    pub metadata: Metadata,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OrganizeReport {
    pub examined: usize,
    pub moved: usize,
    pub unmatched: usize,
    pub failed: usize,
}

/// Clear the cache entries of every folder touched by a mutation. The files
/// are already changed at this point, so a failure here is only logged.
fn invalidate(lib: &Library, folders: &[&str]) {
    let cache = lib.cache();
    for folder in folders {
        if let Err(e) = cache.clear(folder) {
            log::error!("Failed to clear photo cache for '{}': {}", folder, e);
        }
    }
}

/// Create a folder. Fails with `FolderExists` if one with the same name,
/// ignoring case, is already there.
pub fn create_folder(lib: &Library, name: &str) -> Result<String> {
    let name = validate_folder_name(name)?;
    if let Some(existing) = layout::find_folder_ci(&lib.photos_root(), &name)? {
        return Err(LecturecamError::FolderExists(existing));
    }
    layout::create_folder(&lib.photos_root(), &name)?;
    Ok(name)
}

/// Rename a folder and rewrite the `folder` field of every sidecar in it.
///
/// Renaming onto a different existing folder is refused and leaves both
/// untouched. Changing only the case of the name is allowed.
pub fn rename_folder(lib: &Library, old_name: &str, new_name: &str) -> Result<()> {
    let old_name = validate_folder_name(old_name)?;
    let old_name = old_name.as_str();
    let new_name = validate_folder_name(new_name)?;
    let old_dir = lib.folder_dir(old_name);
    if !old_dir.is_dir() {
        return Err(LecturecamError::FolderNotFound(old_name.to_string()));
    }
    if old_name == new_name {
        return Ok(());
    }
    if let Some(existing) = layout::find_folder_ci(&lib.photos_root(), &new_name)? {
        if existing != old_name {
            return Err(LecturecamError::FolderExists(existing));
        }
    }

    let new_dir = lib.folder_dir(&new_name);
    fs::rename(&old_dir, &new_dir)?;
    log::info!("Renamed folder '{}' to '{}'", old_name, new_name);

    let mut failed = 0;
    for sidecar in layout::list_sidecars(&new_dir)? {
        // a broken sidecar is left alone rather than replaced with defaults
        let result = read_metadata(&sidecar).and_then(|mut metadata| {
            metadata.folder = new_name.clone();
            write_metadata(&sidecar, &metadata)
        });
        if let Err(e) = result {
            log::error!("Failed to update sidecar {}: {}", sidecar.display(), e);
            failed += 1;
        }
    }

    invalidate(lib, &[old_name, new_name.as_str()]);

    if failed > 0 {
        return Err(LecturecamError::Other(format!(
            "Renamed '{}' to '{}' but {} sidecar(s) could not be updated",
            old_name, new_name, failed
        )));
    }
    Ok(())
}

/// Stage `metadata` as the sidecar of `dest_image`, rename the image onto it
/// and drop the old sidecar. A failed rename removes the staged sidecar again.
fn relocate(image: &Path, dest_image: &Path, metadata: &Metadata) -> Result<()> {
    let old_sidecar = sidecar_path_for(image);
    let dest_sidecar = sidecar_path_for(dest_image);

    write_metadata(&dest_sidecar, metadata)
        .map_err(|e| LecturecamError::move_failed(&dest_sidecar, e))?;

    if let Err(e) = fs::rename(image, dest_image) {
        if let Err(cleanup) = fs::remove_file(&dest_sidecar) {
            log::error!(
                "Failed to remove staged sidecar {}: {}",
                dest_sidecar.display(),
                cleanup
            );
        }
        return Err(LecturecamError::move_failed(image, e));
    }

    if old_sidecar.exists() {
        if let Err(e) = fs::remove_file(&old_sidecar) {
            log::warn!("Orphan sidecar left at {}: {}", old_sidecar.display(), e);
        }
    }
    Ok(())
}

/// Move a photo to another folder and/or session.
///
/// The image and its sidecar keep their file names. A name collision at the
/// destination is reported before anything is touched. Between folders the
/// move runs in two steps: the rewritten sidecar is staged next to the
/// destination, then the image rename commits it. If that rename fails the
/// staged sidecar is removed again; if only the old sidecar cannot be removed
/// afterwards it is left behind as an orphan and logged.
pub fn move_photo(
    lib: &Library,
    photo: &PhotoRef,
    target_folder: &str,
    target_session: &str,
) -> Result<MoveOutcome> {
    let target_folder = validate_folder_name(target_folder)?;
    let target_folder = resolve_folder_name(&target_folder, &lib.folders()?);
    let old_sidecar = sidecar_path_for(&photo.image_path);
    let mut metadata = read_metadata_or_default(&old_sidecar);

    if target_folder == photo.folder && target_session == metadata.session {
        log::debug!("{} is already in {}/{}", photo.uri(), target_folder, target_session);
        return Ok(MoveOutcome::NoChange);
    }

    if !photo.image_path.is_file() {
        return Err(LecturecamError::move_failed(&photo.image_path, "image not found"));
    }

    let dest_dir = lib.folder_dir(&target_folder);
    fs::create_dir_all(&dest_dir).map_err(|e| LecturecamError::move_failed(&dest_dir, e))?;

    metadata.folder = target_folder.clone();
    metadata.session = target_session.to_string();

    if target_folder == photo.folder {
        write_metadata(&old_sidecar, &metadata)
            .map_err(|e| LecturecamError::move_failed(&photo.image_path, e))?;
        invalidate(lib, &[photo.folder.as_str()]);
        log::info!("Moved {} to session '{}'", photo.file_name(), target_session);
        return Ok(MoveOutcome::Moved(photo.clone()));
    }

    let dest_image = dest_dir.join(photo.file_name());
    let dest_sidecar = sidecar_path_for(&dest_image);
    if dest_image.exists() || dest_sidecar.exists() {
        return Err(LecturecamError::move_failed(
            &photo.image_path,
            format!("'{}' already exists in '{}'", photo.file_name(), target_folder),
        ));
    }

    relocate(&photo.image_path, &dest_image, &metadata)?;

    invalidate(lib, &[photo.folder.as_str(), target_folder.as_str()]);
    log::info!(
        "Moved {} from '{}' to '{}'",
        photo.file_name(),
        photo.folder,
        target_folder
    );

    Ok(MoveOutcome::Moved(PhotoRef {
        folder: target_folder,
        image_path: dest_image,
    }))
}

fn remove_if_present(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// Delete `view[index]` (image and sidecar, each only if present) and tell
/// the viewer what to show next.
pub fn delete_photo(lib: &Library, view: &[PhotoRecord], index: usize) -> Result<DeleteOutcome> {
    let record = view.get(index).ok_or_else(|| {
        LecturecamError::Argument(format!(
            "No photo at position {} (view holds {})",
            index,
            view.len()
        ))
    })?;
    let photo = lib.photo_from_uri(&record.uri)?;

    let sidecar = sidecar_path_for(&photo.image_path);
    let removed = remove_if_present(&photo.image_path).and_then(|_| remove_if_present(&sidecar));
    // the listing is stale as soon as the image is gone, even if the sidecar stays
    invalidate(lib, &[photo.folder.as_str()]);
    removed?;
    log::info!("Deleted {}", photo.uri());

    let mut remaining = view.to_vec();
    remaining.remove(index);
    if remaining.is_empty() {
        return Ok(DeleteOutcome::NavigateAway);
    }
    let index = index.min(remaining.len() - 1);
    Ok(DeleteOutcome::Advance { index, remaining })
}

/// Replace a photo's note in its sidecar and in the cached listing.
pub fn update_note(lib: &Library, photo: &PhotoRef, note: &str) -> Result<Metadata> {
    let metadata = update_metadata(&sidecar_path_for(&photo.image_path), |m| {
        m.note = note.to_string();
    })?;

    let patch = RecordPatch {
        note: Some(note.to_string()),
        ..Default::default()
    };
    if !lib.cache().update(&photo.folder, &photo.uri(), patch)? {
        log::debug!("{} not cached, note saved to sidecar only", photo.uri());
    }
    Ok(metadata)
}

/// First free `<stem>.<ext>`, `<stem>-2.<ext>`, ... in `dir`, counting a
/// name as taken when either the image or its sidecar exists.
fn unique_destination(dir: &Path, stem: &str, extension: &str) -> PathBuf {
    let mut candidate = dir.join(format!("{}.{}", stem, extension));
    let mut n = 2;
    while candidate.exists() || sidecar_path_for(&candidate).exists() {
        candidate = dir.join(format!("{}-{}.{}", stem, n, extension));
        n += 1;
    }
    candidate
}

/// Copy a captured image into the library with a fresh sidecar.
///
/// Unless overridden, the folder comes from the calendar event running at
/// capture time and the session is the capture date.
pub fn save_photo(
    lib: &Library,
    sources: &EventSources,
    source: &Path,
    options: SaveOptions,
) -> Result<SavedPhoto> {
    if !source.is_file() {
        return Err(LecturecamError::PathNotFound(source.to_path_buf()));
    }
    if !is_image(source) {
        return Err(LecturecamError::Argument(format!(
            "{} is not a supported image",
            source.display()
        )));
    }

    let time = options.time.unwrap_or_else(|| capture_time(source));
    let folder = match options.folder {
        Some(folder) => validate_folder_name(&folder)?,
        None => {
            let events = sources.load(&DateRange::day_of(&time));
            classify(&time, &events)
        }
    };
    let folder = resolve_folder_name(&folder, &lib.folders()?);
    layout::create_folder(&lib.photos_root(), &folder)?;

    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("photo")
        .to_string();
    let extension = source
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("jpg")
        .to_lowercase();
    let dest_image = unique_destination(&lib.folder_dir(&folder), &stem, &extension);

    let metadata = Metadata {
        name: options.name.unwrap_or(stem),
        folder: folder.clone(),
        session: options.session.unwrap_or_else(|| session_name_for(&time)),
        time,
        note: options.note.unwrap_or_default(),
        subject: options.subject.filter(|s| !s.is_empty()),
    };

    fs::copy(source, &dest_image)?;
    if let Err(e) = write_metadata(&sidecar_path_for(&dest_image), &metadata) {
        // keep every image paired with a sidecar
        if let Err(cleanup) = fs::remove_file(&dest_image) {
            log::error!("Failed to remove {}: {}", dest_image.display(), cleanup);
        }
        return Err(e);
    }

    lib.cache().add(&folder, record_for(&dest_image, &metadata))?;
    log::info!("Saved {} to '{}'", dest_image.display(), folder);

    Ok(SavedPhoto {
        photo: PhotoRef {
            folder,
            image_path: dest_image,
        },
        metadata,
    })
}

/// Re-run classification for everything in `Unorganized` and move the
/// photos that now fall inside an event. Events are fetched once per day.
pub fn organize_unorganized(lib: &Library, sources: &EventSources) -> Result<OrganizeReport> {
    let records = layout::scan_folder(&lib.photos_root(), UNORGANIZED_FOLDER)?;
    let mut report = OrganizeReport {
        examined: records.len(),
        ..Default::default()
    };
    if records.is_empty() {
        return Ok(report);
    }

    let bar_style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    let bar = ProgressBar::new(records.len() as u64).with_style(bar_style);
    bar.set_message("Organizing photos");

    let local_tz = get_local_tz();
    let mut events_by_day: HashMap<Date, Vec<UnifiedEvent>> = HashMap::new();

    for record in &records {
        bar.inc(1);
        let taken = from_epoch_millis(record.timestamp).to_offset(local_tz);
        let events = events_by_day
            .entry(taken.date())
            .or_insert_with(|| sources.load(&DateRange::day_of(&taken)));

        let target = classify(&taken, events);
        if target == UNORGANIZED_FOLDER {
            report.unmatched += 1;
            continue;
        }

        let session = record.session.clone().unwrap_or_default();
        let result = lib
            .photo_from_uri(&record.uri)
            .and_then(|photo| move_photo(lib, &photo, &target, &session));
        match result {
            Ok(MoveOutcome::Moved(_)) => report.moved += 1,
            Ok(MoveOutcome::NoChange) => report.unmatched += 1,
            Err(e) => {
                log::error!("Failed to organize {}: {}", record.uri, e);
                report.failed += 1;
            }
        }
    }

    bar.finish_with_message("Organize complete");
    log::info!(
        "Organized {} of {} photos ({} unmatched, {} failed)",
        report.moved,
        report.examined,
        report.unmatched,
        report.failed
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lecturecam_core::calendar::{EventSource, LocalEventStore, NoNativeCalendar};
    use crate::lecturecam_core::dates::parse_iso;
    use time::macros::datetime;

    fn add_photo(lib: &Library, folder: &str, file: &str, session: &str) -> PhotoRef {
        let dir = lib.folder_dir(folder);
        fs::create_dir_all(&dir).unwrap();
        let image_path = dir.join(file);
        fs::write(&image_path, b"\xFF\xD8\xFF\xE0").unwrap();
        write_metadata(
            &sidecar_path_for(&image_path),
            &Metadata {
                name: file.to_string(),
                folder: folder.to_string(),
                session: session.to_string(),
                time: datetime!(2024-01-01 08:30:00 UTC),
                note: "keep me".to_string(),
                subject: Some("Algebra".to_string()),
            },
        )
        .unwrap();
        PhotoRef {
            folder: folder.to_string(),
            image_path,
        }
    }

    fn sources<'a>(lib: &'a Library, native: &'a NoNativeCalendar) -> EventSources<'a> {
        EventSources {
            native,
            calendar_ids: Vec::new(),
            local: LocalEventStore::new(lib.database()),
            remote: None,
        }
    }

    fn local_event(lib: &Library, title: &str, start: &str, end: &str) {
        let event = UnifiedEvent {
            id: format!("local_{}", title.len()),
            original_id: format!("local_{}", title.len()),
            title: title.to_string(),
            start_date: parse_iso(start).unwrap(),
            end_date: parse_iso(end).unwrap(),
            source: EventSource::Local,
            color: None,
            location: None,
            notes: None,
            calendar_id: None,
        };
        lib.local_events().upsert(&[event]).unwrap();
    }

    #[test]
    fn test_move_between_folders() {
        let temp_dir = assert_fs::TempDir::new().unwrap();
        let lib = Library::create(temp_dir.path()).unwrap();
        let photo = add_photo(&lib, "Unorganized", "a.jpg", "2024-01-01");
        fs::create_dir_all(lib.folder_dir("Math Class")).unwrap();
        lib.load_photos("Unorganized").unwrap();
        lib.load_photos("Math Class").unwrap();

        let outcome = move_photo(&lib, &photo, "Math Class", "2024-01-01").unwrap();
        let MoveOutcome::Moved(moved) = outcome else {
            panic!("expected a move");
        };

        assert_eq!(moved.folder, "Math Class");
        assert!(moved.image_path.is_file());
        assert!(!photo.image_path.exists());
        assert!(!sidecar_path_for(&photo.image_path).exists());

        let metadata = read_metadata(&sidecar_path_for(&moved.image_path)).unwrap();
        assert_eq!(metadata.folder, "Math Class");
        assert_eq!(metadata.note, "keep me");
        assert_eq!(metadata.subject.as_deref(), Some("Algebra"));

        assert!(lib.cache().get("Unorganized").is_none());
        assert!(lib.cache().get("Math Class").is_none());
    }

    #[test]
    fn test_move_to_same_place_is_no_change() {
        let temp_dir = assert_fs::TempDir::new().unwrap();
        let lib = Library::create(temp_dir.path()).unwrap();
        let photo = add_photo(&lib, "Math", "a.jpg", "2024-01-01");
        lib.load_photos("Math").unwrap();

        let outcome = move_photo(&lib, &photo, "Math", "2024-01-01").unwrap();
        assert_eq!(outcome, MoveOutcome::NoChange);
        assert!(photo.image_path.is_file());
        assert!(lib.cache().get("Math").is_some());
    }

    #[test]
    fn test_move_to_new_session_rewrites_sidecar_in_place() {
        let temp_dir = assert_fs::TempDir::new().unwrap();
        let lib = Library::create(temp_dir.path()).unwrap();
        let photo = add_photo(&lib, "Math", "a.jpg", "2024-01-01");

        let outcome = move_photo(&lib, &photo, "Math", "Week 2").unwrap();
        assert_eq!(outcome, MoveOutcome::Moved(photo.clone()));
        assert_eq!(lib.sessions("Math").unwrap(), vec!["Week 2"]);
    }

    #[test]
    fn test_move_refuses_to_overwrite() {
        let temp_dir = assert_fs::TempDir::new().unwrap();
        let lib = Library::create(temp_dir.path()).unwrap();
        let photo = add_photo(&lib, "Math", "a.jpg", "s");
        add_photo(&lib, "History", "a.jpg", "s");

        let result = move_photo(&lib, &photo, "History", "s");
        assert!(matches!(result, Err(LecturecamError::MoveFailed { .. })));
        assert!(photo.image_path.is_file());
        assert!(sidecar_path_for(&photo.image_path).is_file());
    }

    #[test]
    fn test_failed_commit_removes_staged_sidecar() {
        let temp_dir = assert_fs::TempDir::new().unwrap();
        let lib = Library::create(temp_dir.path()).unwrap();
        let photo = add_photo(&lib, "Math", "a.jpg", "s");
        // a non-empty directory where the image should land makes the rename fail
        let dest_image = lib.folder_dir("History").join("a.jpg");
        fs::create_dir_all(dest_image.join("inner")).unwrap();
        let metadata = read_metadata(&sidecar_path_for(&photo.image_path)).unwrap();

        let result = relocate(&photo.image_path, &dest_image, &metadata);
        assert!(matches!(result, Err(LecturecamError::MoveFailed { .. })));
        assert!(!sidecar_path_for(&dest_image).exists());
        assert!(photo.image_path.is_file());
        assert_eq!(
            read_metadata(&sidecar_path_for(&photo.image_path)).unwrap().folder,
            "Math"
        );
    }

    #[test]
    fn test_undeletable_old_sidecar_is_left_as_orphan() {
        let temp_dir = assert_fs::TempDir::new().unwrap();
        let lib = Library::create(temp_dir.path()).unwrap();
        let photo = add_photo(&lib, "Math", "a.jpg", "s");
        let old_sidecar = sidecar_path_for(&photo.image_path);
        let mut metadata = read_metadata(&old_sidecar).unwrap();
        fs::remove_file(&old_sidecar).unwrap();
        fs::create_dir(&old_sidecar).unwrap();

        fs::create_dir_all(lib.folder_dir("History")).unwrap();
        let dest_image = lib.folder_dir("History").join("a.jpg");
        metadata.folder = "History".to_string();
        relocate(&photo.image_path, &dest_image, &metadata).unwrap();

        assert!(dest_image.is_file());
        assert_eq!(
            read_metadata(&sidecar_path_for(&dest_image)).unwrap().folder,
            "History"
        );
        assert!(old_sidecar.is_dir());
    }

    #[test]
    fn test_move_onto_folder_of_other_case() {
        let temp_dir = assert_fs::TempDir::new().unwrap();
        let lib = Library::create(temp_dir.path()).unwrap();
        let photo = add_photo(&lib, "Unorganized", "a.jpg", "s");
        fs::create_dir_all(lib.folder_dir("Math Class")).unwrap();

        let MoveOutcome::Moved(moved) = move_photo(&lib, &photo, "math class", "s").unwrap() else {
            panic!("expected a move");
        };
        assert_eq!(moved.folder, "Math Class");
        assert_eq!(lib.folders().unwrap(), vec!["Math Class", "Unorganized"]);
    }

    #[test]
    fn test_create_folder_rejects_case_collision() {
        let temp_dir = assert_fs::TempDir::new().unwrap();
        let lib = Library::create(temp_dir.path()).unwrap();
        assert_eq!(create_folder(&lib, "Math").unwrap(), "Math");
        assert!(matches!(
            create_folder(&lib, "math"),
            Err(LecturecamError::FolderExists(name)) if name == "Math"
        ));
        assert!(create_folder(&lib, "   ").is_err());
    }

    #[test]
    fn test_rename_folder_rewrites_sidecars() {
        let temp_dir = assert_fs::TempDir::new().unwrap();
        let lib = Library::create(temp_dir.path()).unwrap();
        add_photo(&lib, "Math", "a.jpg", "s");
        add_photo(&lib, "Math", "b.jpg", "s");
        lib.load_photos("Math").unwrap();

        rename_folder(&lib, "Math", "Calculus").unwrap();

        assert_eq!(lib.folders().unwrap(), vec!["Calculus"]);
        for sidecar in layout::list_sidecars(&lib.folder_dir("Calculus")).unwrap() {
            assert_eq!(read_metadata(&sidecar).unwrap().folder, "Calculus");
        }
        assert!(lib.cache().get("Math").is_none());
    }

    #[test]
    fn test_rename_onto_existing_folder_is_rejected() {
        let temp_dir = assert_fs::TempDir::new().unwrap();
        let lib = Library::create(temp_dir.path()).unwrap();
        let math = add_photo(&lib, "Math", "a.jpg", "s");
        add_photo(&lib, "History", "b.jpg", "s");

        assert!(matches!(
            rename_folder(&lib, "Math", "History"),
            Err(LecturecamError::FolderExists(_))
        ));
        assert_eq!(lib.folders().unwrap(), vec!["History", "Math"]);
        assert!(math.image_path.is_file());
        assert_eq!(
            read_metadata(&sidecar_path_for(&math.image_path)).unwrap().folder,
            "Math"
        );

        assert!(matches!(
            rename_folder(&lib, "Physics", "Chemistry"),
            Err(LecturecamError::FolderNotFound(_))
        ));
    }

    #[test]
    fn test_rename_refuses_paths_outside_photos() {
        let temp_dir = assert_fs::TempDir::new().unwrap();
        let lib = Library::create(temp_dir.path()).unwrap();
        add_photo(&lib, "Math", "a.jpg", "s");

        for old in [".", "..", "../photos", ""] {
            assert!(
                matches!(rename_folder(&lib, old, "Moved"), Err(LecturecamError::Argument(_))),
                "{} should be rejected",
                old
            );
        }
        assert!(lib.photos_root().is_dir());
        assert_eq!(lib.folders().unwrap(), vec!["Math"]);
    }

    #[test]
    fn test_rename_case_only() {
        let temp_dir = assert_fs::TempDir::new().unwrap();
        let lib = Library::create(temp_dir.path()).unwrap();
        add_photo(&lib, "math", "a.jpg", "s");

        rename_folder(&lib, "math", "Math").unwrap();
        assert_eq!(lib.folders().unwrap(), vec!["Math"]);
    }

    #[test]
    fn test_delete_only_photo_navigates_away() {
        let temp_dir = assert_fs::TempDir::new().unwrap();
        let lib = Library::create(temp_dir.path()).unwrap();
        let photo = add_photo(&lib, "Math", "a.jpg", "s");
        let view = lib.load_photos("Math").unwrap();

        let outcome = delete_photo(&lib, &view, 0).unwrap();
        assert_eq!(outcome, DeleteOutcome::NavigateAway);
        assert!(!photo.image_path.exists());
        assert!(!sidecar_path_for(&photo.image_path).exists());
        assert!(lib.cache().get("Math").is_none());
    }

    #[test]
    fn test_delete_one_of_two_advances() {
        let temp_dir = assert_fs::TempDir::new().unwrap();
        let lib = Library::create(temp_dir.path()).unwrap();
        add_photo(&lib, "Math", "a.jpg", "s");
        add_photo(&lib, "Math", "b.jpg", "s");
        let view = lib.load_photos("Math").unwrap();

        let DeleteOutcome::Advance { index, remaining } = delete_photo(&lib, &view, 1).unwrap()
        else {
            panic!("expected to advance");
        };
        assert_eq!(index, 0);
        assert_eq!(remaining, vec![view[0].clone()]);
        assert_eq!(lib.load_photos("Math").unwrap().len(), 1);
    }

    #[test]
    fn test_delete_without_sidecar() {
        let temp_dir = assert_fs::TempDir::new().unwrap();
        let lib = Library::create(temp_dir.path()).unwrap();
        let photo = add_photo(&lib, "Math", "a.jpg", "s");
        fs::remove_file(sidecar_path_for(&photo.image_path)).unwrap();
        let view = lib.load_photos("Math").unwrap();

        assert_eq!(delete_photo(&lib, &view, 0).unwrap(), DeleteOutcome::NavigateAway);
        assert!(delete_photo(&lib, &view, 5).is_err());
    }

    #[test]
    fn test_delete_clears_cache_when_sidecar_removal_fails() {
        let temp_dir = assert_fs::TempDir::new().unwrap();
        let lib = Library::create(temp_dir.path()).unwrap();
        let photo = add_photo(&lib, "Math", "a.jpg", "s");
        add_photo(&lib, "Math", "b.jpg", "s");
        let view = lib.load_photos("Math").unwrap();
        let index = view
            .iter()
            .position(|r| r.uri == photo.uri())
            .unwrap();

        let sidecar = sidecar_path_for(&photo.image_path);
        fs::remove_file(&sidecar).unwrap();
        fs::create_dir(&sidecar).unwrap();

        assert!(delete_photo(&lib, &view, index).is_err());
        assert!(!photo.image_path.exists());
        assert!(lib.cache().get("Math").is_none());
        let uris: Vec<String> = lib
            .load_photos("Math")
            .unwrap()
            .into_iter()
            .map(|r| r.uri)
            .collect();
        assert!(!uris.contains(&photo.uri()));
    }

    #[test]
    fn test_update_note_patches_cache() {
        let temp_dir = assert_fs::TempDir::new().unwrap();
        let lib = Library::create(temp_dir.path()).unwrap();
        let photo = add_photo(&lib, "Math", "a.jpg", "s");
        lib.load_photos("Math").unwrap();

        let metadata = update_note(&lib, &photo, "see slide 4").unwrap();
        assert_eq!(metadata.note, "see slide 4");
        assert_eq!(metadata.subject.as_deref(), Some("Algebra"));
        assert_eq!(
            lib.cache().get("Math").unwrap()[0].note.as_deref(),
            Some("see slide 4")
        );
    }

    #[test]
    fn test_clearing_note_matches_rescan() {
        let temp_dir = assert_fs::TempDir::new().unwrap();
        let lib = Library::create(temp_dir.path()).unwrap();
        let photo = add_photo(&lib, "Math", "a.jpg", "s");
        lib.load_photos("Math").unwrap();

        update_note(&lib, &photo, "").unwrap();
        let cached = lib.cache().get("Math").unwrap();
        assert_eq!(cached[0].note, None);
        assert_eq!(cached, layout::scan_folder(&lib.photos_root(), "Math").unwrap());
    }

    #[test]
    fn test_save_photo_classifies_by_calendar() {
        let temp_dir = assert_fs::TempDir::new().unwrap();
        let lib = Library::create(&temp_dir.path().join("lib")).unwrap();
        let source = temp_dir.path().join("IMG_1.jpg");
        fs::write(&source, b"\xFF\xD8\xFF\xE0").unwrap();
        local_event(&lib, "Math Class", "2024-01-01T08:00:00Z", "2024-01-01T10:00:00Z");

        let native = NoNativeCalendar;
        let sources = sources(&lib, &native);
        let options = SaveOptions {
            time: Some(datetime!(2024-01-01 08:30:00 UTC)),
            ..Default::default()
        };
        let saved = save_photo(&lib, &sources, &source, options.clone()).unwrap();
        assert_eq!(saved.photo.folder, "Math Class");
        assert_eq!(saved.metadata.session, session_name_for(&datetime!(2024-01-01 08:30:00 UTC)));
        assert_eq!(saved.metadata.name, "IMG_1");
        assert!(sidecar_path_for(&saved.photo.image_path).is_file());

        let again = save_photo(&lib, &sources, &source, options).unwrap();
        assert_eq!(again.photo.file_name(), "IMG_1-2.jpg");
    }

    #[test]
    fn test_save_photo_without_event_goes_to_unorganized() {
        let temp_dir = assert_fs::TempDir::new().unwrap();
        let lib = Library::create(&temp_dir.path().join("lib")).unwrap();
        let source = temp_dir.path().join("IMG_2.JPG");
        fs::write(&source, b"\xFF\xD8\xFF\xE0").unwrap();
        lib.load_photos(UNORGANIZED_FOLDER).unwrap();

        let native = NoNativeCalendar;
        let sources = sources(&lib, &native);
        let saved = save_photo(
            &lib,
            &sources,
            &source,
            SaveOptions {
                time: Some(datetime!(2024-01-01 12:00:00 UTC)),
                note: Some("board".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(saved.photo.folder, UNORGANIZED_FOLDER);
        assert_eq!(saved.photo.file_name(), "IMG_2.jpg");
        let cached = lib.cache().get(UNORGANIZED_FOLDER).unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].note.as_deref(), Some("board"));

        let not_image = temp_dir.path().join("notes.txt");
        fs::write(&not_image, "x").unwrap();
        assert!(save_photo(&lib, &sources, &not_image, SaveOptions::default()).is_err());
    }

    #[test]
    fn test_organize_unorganized() {
        let temp_dir = assert_fs::TempDir::new().unwrap();
        let lib = Library::create(temp_dir.path()).unwrap();
        // add_photo stamps 08:30 UTC
        let matched = add_photo(&lib, UNORGANIZED_FOLDER, "a.jpg", "2024-01-01");
        let other = lib.folder_dir(UNORGANIZED_FOLDER).join("b.jpg");
        fs::write(&other, b"\xFF\xD8").unwrap();
        write_metadata(
            &sidecar_path_for(&other),
            &Metadata {
                time: datetime!(2024-01-01 12:00:00 UTC),
                ..Metadata::fallback(UNORGANIZED_FOLDER)
            },
        )
        .unwrap();
        local_event(&lib, "Math Class", "2024-01-01T08:00:00Z", "2024-01-01T10:00:00Z");

        let native = NoNativeCalendar;
        let report = organize_unorganized(&lib, &sources(&lib, &native)).unwrap();
        assert_eq!(
            report,
            OrganizeReport {
                examined: 2,
                moved: 1,
                unmatched: 1,
                failed: 0
            }
        );
        assert!(!matched.image_path.exists());
        assert!(lib.folder_dir("Math Class").join("a.jpg").is_file());
        assert!(other.is_file());
    }
}
