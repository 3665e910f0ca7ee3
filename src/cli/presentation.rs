//! CLI presentation: text and JSON rendering of command results.

use crate::document::SymlinkEntry;
use crate::error::ApiError;
use chrono::{TimeZone, Utc};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;

fn format_mtime(seconds: i64) -> String {
    match Utc.timestamp_opt(seconds, 0).single() {
        Some(time) if seconds > 0 => time.to_rfc3339(),
        _ => "-".to_string(),
    }
}

/// Render a directory's symlinks as a table or a JSON array.
pub fn format_symlink_list(
    entries: &[(String, SymlinkEntry)],
    format: &str,
) -> Result<String, ApiError> {
    match format {
        "json" => {
            let rows: Vec<serde_json::Value> = entries
                .iter()
                .map(|(name, entry)| {
                    serde_json::json!({
                        "name": name,
                        "target": entry.target,
                        "mtime": entry.modified_at,
                    })
                })
                .collect();
            serde_json::to_string_pretty(&rows)
                .map_err(|e| ApiError::InvalidArgument(format!("Failed to render JSON: {}", e)))
        }
        "text" => {
            if entries.is_empty() {
                return Ok("No symlinks".to_string());
            }
            let mut table = Table::new();
            table.load_preset(UTF8_BORDERS_ONLY);
            table.set_header(vec!["Name", "Target", "Modified"]);
            for (name, entry) in entries {
                table.add_row(vec![
                    name.clone(),
                    entry.target.clone(),
                    format_mtime(entry.modified_at),
                ]);
            }
            Ok(table.to_string())
        }
        other => Err(ApiError::InvalidArgument(format!(
            "Unknown format '{}' (expected 'text' or 'json')",
            other
        ))),
    }
}

/// Render a raw document body; absent documents print as a note.
pub fn format_document_raw(body: Option<&[u8]>) -> String {
    match body {
        Some(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        None => "No symlink metadata document".to_string(),
    }
}
