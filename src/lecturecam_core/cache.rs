use crate::lecturecam_core::database::Database;
use crate::lecturecam_core::error::Result;
use crate::lecturecam_core::settings::PHOTO_CACHE_PREFIX;
use serde::{Deserialize, Serialize};

/// Lightweight listing entry for one photo. Identity is `uri`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRecord {
    pub uri: String,
    pub name: String,
    /// Capture time, epoch milliseconds.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
}

/// Field changes merged into a cached record. An empty note or session
/// clears the field, as a rescan of the sidecar would.
#[derive(Debug, Clone, Default)]
pub struct RecordPatch {
    pub uri: Option<String>,
    pub name: Option<String>,
    pub note: Option<String>,
    pub subject: Option<String>,
    pub session: Option<String>,
}

impl RecordPatch {
    fn apply(self, record: &mut PhotoRecord) {
        if let Some(uri) = self.uri {
            record.uri = uri;
        }
        if let Some(name) = self.name {
            record.name = name;
        }
        if let Some(note) = self.note {
            record.note = Some(note).filter(|n| !n.is_empty());
        }
        if let Some(subject) = self.subject {
            record.subject = Some(subject);
        }
        if let Some(session) = self.session {
            record.session = Some(session).filter(|s| !s.is_empty());
        }
    }
}

pub fn cache_key(folder: &str) -> String {
    format!("{}{}", PHOTO_CACHE_PREFIX, folder)
}

/// Per-folder photo lists kept in the key-value store, newest first.
///
/// The cache never refreshes itself: anything that changes a folder on disk
/// must either update the entry through this type or `clear` it.
pub struct PhotoCache<'a> {
    db: &'a Database,
}

impl<'a> PhotoCache<'a> {
    pub fn new(db: &'a Database) -> Self {
        PhotoCache { db }
    }

    /// Cached list for `folder`, or `None` on a miss.
    pub fn get(&self, folder: &str) -> Option<Vec<PhotoRecord>> {
        self.db.get_json(&cache_key(folder))
    }

    pub fn set(&self, folder: &str, records: &[PhotoRecord]) -> Result<()> {
        self.db.set_json(&cache_key(folder), records)
    }

    /// Prepend a record to a populated entry; an entry with the same uri is
    /// replaced. An absent entry stays absent, since a list holding only this
    /// record would hide the rest of the folder. Returns whether it was added.
    pub fn add(&self, folder: &str, record: PhotoRecord) -> Result<bool> {
        let Some(mut records) = self.get(folder) else {
            return Ok(false);
        };
        records.retain(|r| r.uri != record.uri);
        records.insert(0, record);
        self.set(folder, &records)?;
        Ok(true)
    }

    pub fn clear(&self, folder: &str) -> Result<()> {
        log::debug!("Clearing photo cache for '{}'", folder);
        self.db.remove_item(&cache_key(folder))
    }

    /// Drop every folder's cache entry.
    pub fn clear_all(&self) -> Result<usize> {
        let keys = self.db.keys_with_prefix(PHOTO_CACHE_PREFIX)?;
        for key in &keys {
            self.db.remove_item(key)?;
        }
        Ok(keys.len())
    }

    /// Patch a record in place. Returns false if the folder is not cached or
    /// holds no record with that uri.
    pub fn update(&self, folder: &str, uri: &str, patch: RecordPatch) -> Result<bool> {
        let Some(mut records) = self.get(folder) else {
            return Ok(false);
        };
        let Some(record) = records.iter_mut().find(|r| r.uri == uri) else {
            return Ok(false);
        };
        patch.apply(record);
        self.set(folder, &records)?;
        Ok(true)
    }

    /// Move a record from one folder's list to the front of another's,
    /// merging `patch` on the way. If the record is not cached under
    /// `old_folder` nothing is written and false is returned; if
    /// `new_folder` is not cached the record only leaves the old list.
    pub fn move_between(
        &self,
        old_folder: &str,
        new_folder: &str,
        uri: &str,
        patch: RecordPatch,
    ) -> Result<bool> {
        let Some(mut old_records) = self.get(old_folder) else {
            return Ok(false);
        };
        let Some(pos) = old_records.iter().position(|r| r.uri == uri) else {
            return Ok(false);
        };

        let mut record = old_records.remove(pos);
        patch.apply(&mut record);

        if old_folder == new_folder {
            old_records.insert(0, record);
            return self.set(old_folder, &old_records).map(|_| true);
        }

        self.set(old_folder, &old_records)?;
        self.add(new_folder, record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(uri: &str, timestamp: i64) -> PhotoRecord {
        PhotoRecord {
            uri: uri.to_string(),
            name: uri.to_string(),
            timestamp,
            note: None,
            subject: None,
            session: Some("2024-01-01".to_string()),
        }
    }

    #[test]
    fn test_set_then_get_preserves_order() {
        let db = Database::in_memory().unwrap();
        let cache = PhotoCache::new(&db);
        assert!(cache.get("Math").is_none());

        // deliberately not sorted by timestamp
        let records = vec![record("b.jpg", 1), record("a.jpg", 3), record("c.jpg", 2)];
        cache.set("Math", &records).unwrap();
        assert_eq!(cache.get("Math").unwrap(), records);
    }

    #[test]
    fn test_add_prepends_and_dedups() {
        let db = Database::in_memory().unwrap();
        let cache = PhotoCache::new(&db);
        assert!(!cache.add("Math", record("a.jpg", 1)).unwrap());
        assert!(cache.get("Math").is_none());

        cache.set("Math", &[]).unwrap();
        assert!(cache.add("Math", record("a.jpg", 1)).unwrap());
        cache.add("Math", record("b.jpg", 0)).unwrap();
        cache.add("Math", record("a.jpg", 5)).unwrap();

        let uris: Vec<String> = cache.get("Math").unwrap().into_iter().map(|r| r.uri).collect();
        assert_eq!(uris, vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn test_clear_returns_to_miss() {
        let db = Database::in_memory().unwrap();
        let cache = PhotoCache::new(&db);
        cache.set("Math", &[record("a.jpg", 1)]).unwrap();
        cache.set("History", &[]).unwrap();

        cache.clear("Math").unwrap();
        assert!(cache.get("Math").is_none());
        assert_eq!(cache.get("History"), Some(vec![]));

        assert_eq!(cache.clear_all().unwrap(), 1);
        assert!(cache.get("History").is_none());
    }

    #[test]
    fn test_update_patches_in_place() {
        let db = Database::in_memory().unwrap();
        let cache = PhotoCache::new(&db);
        cache
            .set("Math", &[record("a.jpg", 2), record("b.jpg", 1)])
            .unwrap();

        let patch = RecordPatch {
            note: Some("midterm".to_string()),
            ..Default::default()
        };
        assert!(cache.update("Math", "b.jpg", patch).unwrap());

        let records = cache.get("Math").unwrap();
        assert_eq!(records[1].uri, "b.jpg");
        assert_eq!(records[1].note.as_deref(), Some("midterm"));

        let clear = RecordPatch {
            note: Some(String::new()),
            ..Default::default()
        };
        assert!(cache.update("Math", "b.jpg", clear).unwrap());
        assert_eq!(cache.get("Math").unwrap()[1].note, None);

        assert!(!cache.update("Math", "zzz.jpg", RecordPatch::default()).unwrap());
        assert!(!cache.update("Physics", "a.jpg", RecordPatch::default()).unwrap());
    }

    #[test]
    fn test_move_between() {
        let db = Database::in_memory().unwrap();
        let cache = PhotoCache::new(&db);
        cache
            .set("Math", &[record("Math/a.jpg", 2), record("Math/b.jpg", 1)])
            .unwrap();
        cache.set("History", &[record("History/c.jpg", 9)]).unwrap();

        let patch = RecordPatch {
            uri: Some("History/a.jpg".to_string()),
            session: Some("Week 3".to_string()),
            ..Default::default()
        };
        assert!(cache.move_between("Math", "History", "Math/a.jpg", patch).unwrap());

        let math = cache.get("Math").unwrap();
        assert_eq!(math.len(), 1);
        assert_eq!(math[0].uri, "Math/b.jpg");

        let history = cache.get("History").unwrap();
        assert_eq!(history[0].uri, "History/a.jpg");
        assert_eq!(history[0].session.as_deref(), Some("Week 3"));
        assert_eq!(history[1].uri, "History/c.jpg");
    }

    #[test]
    fn test_move_between_uncached_source_does_not_propagate() {
        let db = Database::in_memory().unwrap();
        let cache = PhotoCache::new(&db);
        cache.set("History", &[record("History/c.jpg", 9)]).unwrap();

        let moved = cache
            .move_between("Math", "History", "Math/a.jpg", RecordPatch::default())
            .unwrap();
        assert!(!moved);
        assert_eq!(cache.get("History").unwrap().len(), 1);
        assert!(cache.get("Math").is_none());
    }
}
