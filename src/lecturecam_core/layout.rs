use crate::lecturecam_core::cache::PhotoRecord;
use crate::lecturecam_core::dates::to_epoch_millis;
use crate::lecturecam_core::error::{LecturecamError, Result};
use crate::lecturecam_core::sidecar::{
    Metadata, SIDECAR_EXTENSION, is_image, read_metadata, read_metadata_or_default,
    sidecar_path_for,
};
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directory under the library root that holds one subdirectory per folder.
pub const PHOTOS_DIR: &str = "photos";

/// Destination for photos that match no calendar event.
pub const UNORGANIZED_FOLDER: &str = "Unorganized";

const MAX_FOLDER_NAME_LEN: usize = 100;

/// Sorted names of all folders under `photos_root`.
pub fn list_folders(photos_root: &Path) -> Result<Vec<String>> {
    if !photos_root.is_dir() {
        return Ok(Vec::new());
    }

    let mut folders = Vec::new();
    for entry in WalkDir::new(photos_root).min_depth(1).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            folders.push(name.to_string());
        }
    }
    folders.sort();
    Ok(folders)
}

/// Existing folder whose name matches `name` ignoring case.
pub fn find_folder_ci(photos_root: &Path, name: &str) -> Result<Option<String>> {
    let wanted = name.to_lowercase();
    Ok(list_folders(photos_root)?
        .into_iter()
        .find(|f| f.to_lowercase() == wanted))
}

/// Create a folder unless one with the same name (ignoring case) exists.
/// Returns whether a directory was created.
pub fn create_folder(photos_root: &Path, name: &str) -> Result<bool> {
    if let Some(existing) = find_folder_ci(photos_root, name)? {
        log::debug!("Folder '{}' already exists as '{}'", name, existing);
        return Ok(false);
    }
    fs::create_dir_all(photos_root.join(name))?;
    log::info!("Created folder '{}'", name);
    Ok(true)
}

/// Image files directly inside a folder directory, sorted by path.
pub fn list_images(folder_dir: &Path) -> Result<Vec<PathBuf>> {
    list_files(folder_dir, is_image)
}

/// Sidecar files directly inside a folder directory, sorted by path.
pub fn list_sidecars(folder_dir: &Path) -> Result<Vec<PathBuf>> {
    list_files(folder_dir, |p| {
        p.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(SIDECAR_EXTENSION))
    })
}

fn list_files(folder_dir: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
    if !folder_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files: Vec<PathBuf> = WalkDir::new(folder_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| keep(p.as_path()))
        .collect();
    files.sort();
    Ok(files)
}

/// Distinct session names recorded in a folder's sidecars, newest first
/// when sessions are `YYYY-MM-DD` dates. Unreadable sidecars are skipped.
pub fn list_sessions(photos_root: &Path, folder: &str) -> Result<Vec<String>> {
    let sidecars = list_sidecars(&photos_root.join(folder))?;

    let sessions: BTreeSet<String> = sidecars
        .par_iter()
        .filter_map(|path| match read_metadata(path) {
            Ok(metadata) => Some(metadata.session),
            Err(e) => {
                log::debug!("Skipping sidecar {}: {}", path.display(), e);
                None
            }
        })
        .filter(|s| !s.is_empty())
        .collect();

    Ok(sessions.into_iter().rev().collect())
}

/// Build the listing entry for an image from its metadata.
pub fn record_for(image_path: &Path, metadata: &Metadata) -> PhotoRecord {
    PhotoRecord {
        uri: image_path.to_string_lossy().into_owned(),
        name: metadata.name.clone(),
        timestamp: to_epoch_millis(&metadata.time),
        note: Some(metadata.note.clone()).filter(|n| !n.is_empty()),
        subject: metadata.subject.clone(),
        session: Some(metadata.session.clone()).filter(|s| !s.is_empty()),
    }
}

/// Full filesystem scan of one folder, newest capture first.
/// A missing folder scans as empty.
pub fn scan_folder(photos_root: &Path, folder: &str) -> Result<Vec<PhotoRecord>> {
    let images = list_images(&photos_root.join(folder))?;

    let mut records: Vec<PhotoRecord> = images
        .par_iter()
        .map(|image| {
            let metadata = read_metadata_or_default(&sidecar_path_for(image));
            record_for(image, &metadata)
        })
        .collect();

    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.uri.cmp(&b.uri)));
    log::debug!("Scanned {} photos in '{}'", records.len(), folder);
    Ok(records)
}

/// Turn an event title into something usable as a directory name.
pub fn sanitize_folder_name(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => ' ',
            c => c,
        })
        .collect();

    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed: String = collapsed
        .trim_start_matches('.')
        .chars()
        .take(MAX_FOLDER_NAME_LEN)
        .collect();
    let trimmed = trimmed.trim();

    if trimmed.is_empty() {
        UNORGANIZED_FOLDER.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Validate a folder name typed by the user.
pub fn validate_folder_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LecturecamError::Argument(
            "Folder name cannot be empty".to_string(),
        ));
    }
    if name != sanitize_folder_name(name) {
        return Err(LecturecamError::Argument(format!(
            "'{}' is not a valid folder name",
            name
        )));
    }
    Ok(name.to_string())
}
