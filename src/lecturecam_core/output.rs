use crate::lecturecam_core::cache::PhotoRecord;
use crate::lecturecam_core::calendar::UnifiedEvent;
use crate::lecturecam_core::cli::OutputFormat;
use crate::lecturecam_core::dates::{format_display, from_epoch_millis};
use crate::lecturecam_core::search::SearchHit;

const RULE_WIDTH: usize = 78;

/// Format a folder listing for output.
pub fn format_photos(records: &[PhotoRecord], format: &OutputFormat) -> String {
    match format {
        OutputFormat::Paths => records
            .iter()
            .map(|r| r.uri.clone())
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Json => {
            serde_json::to_string_pretty(records).unwrap_or_else(|_| "[]".to_string())
        }
        OutputFormat::Table => {
            let mut output = String::new();
            output.push_str(&format!(
                "{:<30} {:<12} {:<16} {}\n",
                "Name", "Session", "Taken", "Note"
            ));
            output.push_str(&format!("{}\n", "─".repeat(RULE_WIDTH)));
            for r in records {
                output.push_str(&format!(
                    "{:<30} {:<12} {:<16} {}\n",
                    truncate_str(&r.name, 30),
                    truncate_str(r.session.as_deref().unwrap_or("-"), 12),
                    format_display(&from_epoch_millis(r.timestamp)),
                    r.note.as_deref().unwrap_or("")
                ));
            }
            output.push_str(&format!("\nTotal: {} photos", records.len()));
            output
        }
    }
}

/// Format search results for output.
pub fn format_hits(hits: &[SearchHit], format: &OutputFormat) -> String {
    match format {
        OutputFormat::Paths => hits
            .iter()
            .map(|h| h.record.uri.clone())
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Json => {
            serde_json::to_string_pretty(hits).unwrap_or_else(|_| "[]".to_string())
        }
        OutputFormat::Table => {
            let mut output = String::new();
            output.push_str(&format!(
                "{:<20} {:<30} {:<16} {}\n",
                "Folder", "Name", "Taken", "Note"
            ));
            output.push_str(&format!("{}\n", "─".repeat(RULE_WIDTH)));
            for h in hits {
                output.push_str(&format!(
                    "{:<20} {:<30} {:<16} {}\n",
                    truncate_str(&h.folder, 20),
                    truncate_str(&h.record.name, 30),
                    format_display(&from_epoch_millis(h.record.timestamp)),
                    h.record.note.as_deref().unwrap_or("")
                ));
            }
            output.push_str(&format!("\nTotal: {} photos", hits.len()));
            output
        }
    }
}

/// Format a schedule for output.
pub fn format_events(events: &[UnifiedEvent], format: &OutputFormat) -> String {
    match format {
        OutputFormat::Paths => events
            .iter()
            .map(|e| e.id.clone())
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Json => {
            serde_json::to_string_pretty(events).unwrap_or_else(|_| "[]".to_string())
        }
        OutputFormat::Table => {
            let mut output = String::new();
            output.push_str(&format!(
                "{:<16} {:<16} {:<30} {:<7} {}\n",
                "Start", "End", "Title", "Source", "Id"
            ));
            output.push_str(&format!("{}\n", "─".repeat(RULE_WIDTH)));
            for e in events {
                output.push_str(&format!(
                    "{:<16} {:<16} {:<30} {:<7} {}\n",
                    format_display(&e.start_date),
                    format_display(&e.end_date),
                    truncate_str(&e.title, 30),
                    e.source.as_str(),
                    e.id
                ));
            }
            output.push_str(&format!("\nTotal: {} events", events.len()));
            output
        }
    }
}

fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}
