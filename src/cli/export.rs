use anyhow::{Context as _, Result};
use serde::Serialize;
use std::path::Path;

use crate::config::KbaseConfig;
use crate::knowledge::types::{Context, KnowledgeEntry};
use crate::knowledge::{contexts, entries, now_timestamp};

/// Export format: all entries and contexts.
#[derive(Debug, Serialize)]
struct ExportData {
    exported_at: String,
    entries: Vec<KnowledgeEntry>,
    contexts: Vec<Context>,
}

/// Export all entries and contexts as JSON to `output`, or stdout when `None`.
pub fn export(config: &KbaseConfig, output: Option<&Path>) -> Result<()> {
    let db_path = config.resolved_db_path();
    let conn = crate::db::open_database(&db_path)?;

    let data = ExportData {
        exported_at: now_timestamp(),
        entries: entries::all_entries(&conn)?,
        contexts: contexts::all_contexts(&conn)?,
    };

    let json = serde_json::to_string_pretty(&data)?;
    match output {
        Some(path) => std::fs::write(path, &json)
            .with_context(|| format!("failed to write export to {}", path.display()))?,
        None => println!("{json}"),
    }

    eprintln!(
        "Exported {} entries and {} contexts.",
        data.entries.len(),
        data.contexts.len()
    );

    Ok(())
}
