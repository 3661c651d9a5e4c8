use crate::lecturecam_core::cache::PhotoRecord;
use crate::lecturecam_core::error::{LecturecamError, Result};
use crate::lecturecam_core::library::Library;
use fuzzy_match_flex::{partial_ratio, ratio};
use serde::Serialize;

/// Minimum similarity for a fuzzy hit.
const FUZZY_THRESHOLD: f32 = 0.7;

/// Queries shorter than this only match as substrings; fuzzy scores on one
/// or two letters match almost anything.
const MIN_FUZZY_QUERY_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Fuzzy,
    Exact,
}

/// A photo matching a search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub folder: String,
    pub kind: MatchKind,
    #[serde(flatten)]
    pub record: PhotoRecord,
}

/// The text fields of a record that take part in search.
fn searchable_fields(record: &PhotoRecord) -> impl Iterator<Item = &str> {
    [
        Some(record.name.as_str()),
        record.note.as_deref(),
        record.subject.as_deref(),
        record.session.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|f| !f.is_empty())
}

/// Similarity of a query to one field. `partial_ratio` scores the shorter
/// argument against each word of the longer one, so it is only used when the
/// field is strictly longer; for equal lengths it scores a string against itself.
fn fuzzy_score(query: &str, field: &str) -> f32 {
    if field.len() > query.len() {
        partial_ratio(field, query, None)
    } else {
        ratio(query, field, None)
    }
}

fn match_record(query: &str, record: &PhotoRecord) -> Option<MatchKind> {
    if searchable_fields(record).any(|f| f.to_lowercase().contains(query)) {
        return Some(MatchKind::Exact);
    }
    if query.chars().count() < MIN_FUZZY_QUERY_LEN {
        return None;
    }
    searchable_fields(record)
        .any(|f| fuzzy_score(query, &f.to_lowercase()) >= FUZZY_THRESHOLD)
        .then_some(MatchKind::Fuzzy)
}

/// Search photo names, notes, subjects and sessions, in one folder or all of
/// them. Substring matches come first, then fuzzy ones, each newest first.
pub fn search(lib: &Library, query: &str, folder: Option<&str>) -> Result<Vec<SearchHit>> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Err(LecturecamError::Argument(
            "Search query cannot be empty".to_string(),
        ));
    }

    let folders = match folder {
        Some(folder) => vec![folder.to_string()],
        None => lib.folders()?,
    };

    let mut hits = Vec::new();
    for folder in folders {
        for record in lib.load_photos(&folder)? {
            if let Some(kind) = match_record(&query, &record) {
                hits.push(SearchHit {
                    folder: folder.clone(),
                    kind,
                    record,
                });
            }
        }
    }

    hits.sort_by(|a, b| {
        b.kind
            .cmp(&a.kind)
            .then_with(|| b.record.timestamp.cmp(&a.record.timestamp))
    });
    log::debug!("Search for '{}' found {} photos", query, hits.len());
    Ok(hits)
}
