//! Entry store: create, read, partial update, and delete of knowledge entries.
//!
//! Writes that return the stored row (create, update) run the write and the
//! read-back inside one transaction so no other writer can interleave.

use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::error::require_non_empty;
use super::types::{EntryPatch, KnowledgeEntry, NewEntry};
use super::{now_timestamp, KnowledgeError, Result};

/// Column list matching [`entry_from_row`].
pub(crate) const ENTRY_COLUMNS: &str =
    "id, category, title, content, tags, metadata, created_at, updated_at";

/// Map a row selected with [`ENTRY_COLUMNS`] to an entry.
pub(crate) fn entry_from_row(row: &Row) -> rusqlite::Result<KnowledgeEntry> {
    Ok(KnowledgeEntry {
        id: row.get(0)?,
        category: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        tags: json_column(row, 4)?,
        metadata: json_column(row, 5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// Decode a JSON text column. NULL decodes as the type's default.
fn json_column<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: serde::de::DeserializeOwned + Default,
{
    let raw: Option<String> = row.get(idx)?;
    match raw {
        Some(text) => serde_json::from_str(&text)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))),
        None => Ok(T::default()),
    }
}

/// Insert a new entry and return it as stored.
pub fn create_entry(conn: &mut Connection, entry: &NewEntry) -> Result<KnowledgeEntry> {
    require_non_empty("category", &entry.category)?;
    require_non_empty("title", &entry.title)?;
    require_non_empty("content", &entry.content)?;

    let tags_json = serde_json::to_string(&entry.tags)?;
    let metadata_json = serde_json::to_string(&entry.metadata)?;
    let now = now_timestamp();

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO knowledge_entries (category, title, content, tags, metadata, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        params![
            entry.category,
            entry.title,
            entry.content,
            tags_json,
            metadata_json,
            now,
        ],
    )?;
    let id = tx.last_insert_rowid();
    let stored = fetch_entry(&tx, id)?
        .ok_or_else(|| KnowledgeError::not_found(format!("Entry with ID {id} not found")))?;
    tx.commit()?;

    tracing::debug!(id, category = %stored.category, "entry created");
    Ok(stored)
}

/// Fetch an entry, or `None` if the id does not exist.
pub fn fetch_entry(conn: &Connection, id: i64) -> Result<Option<KnowledgeEntry>> {
    let entry = conn
        .query_row(
            &format!("SELECT {ENTRY_COLUMNS} FROM knowledge_entries WHERE id = ?1"),
            params![id],
            entry_from_row,
        )
        .optional()?;
    Ok(entry)
}

/// Fetch an entry, failing with `NotFound` if the id does not exist.
pub fn get_entry(conn: &Connection, id: i64) -> Result<KnowledgeEntry> {
    fetch_entry(conn, id)?
        .ok_or_else(|| KnowledgeError::not_found(format!("Entry with ID {id} not found")))
}

/// Apply a partial update and return the entry as stored afterwards.
///
/// An empty patch is rejected before the id is looked up. `updated_at` is
/// refreshed on every successful update, whatever the patch contains.
pub fn update_entry(conn: &mut Connection, id: i64, patch: &EntryPatch) -> Result<KnowledgeEntry> {
    if patch.is_empty() {
        return Err(KnowledgeError::validation("No updates provided"));
    }

    let mut assignments: Vec<&str> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(category) = &patch.category {
        require_non_empty("category", category)?;
        assignments.push("category = ?");
        values.push(Value::Text(category.clone()));
    }
    if let Some(title) = &patch.title {
        require_non_empty("title", title)?;
        assignments.push("title = ?");
        values.push(Value::Text(title.clone()));
    }
    if let Some(content) = &patch.content {
        require_non_empty("content", content)?;
        assignments.push("content = ?");
        values.push(Value::Text(content.clone()));
    }
    if let Some(tags) = &patch.tags {
        assignments.push("tags = ?");
        values.push(Value::Text(serde_json::to_string(tags)?));
    }
    if let Some(metadata) = &patch.metadata {
        assignments.push("metadata = ?");
        values.push(Value::Text(serde_json::to_string(metadata)?));
    }

    values.push(Value::Text(now_timestamp()));
    values.push(Value::Integer(id));
    let sql = format!(
        "UPDATE knowledge_entries SET {}, updated_at = ? WHERE id = ?",
        assignments.join(", ")
    );

    let tx = conn.transaction()?;
    let changed = tx.execute(&sql, params_from_iter(values))?;
    if changed == 0 {
        return Err(KnowledgeError::not_found(format!("Entry with ID {id} not found")));
    }
    let stored = fetch_entry(&tx, id)?
        .ok_or_else(|| KnowledgeError::not_found(format!("Entry with ID {id} not found")))?;
    tx.commit()?;

    tracing::debug!(id, fields = assignments.len(), "entry updated");
    Ok(stored)
}

/// Delete an entry. Returns the number of rows removed (0 or 1); a missing id
/// is not an error.
pub fn delete_entry(conn: &Connection, id: i64) -> Result<usize> {
    let deleted = conn.execute("DELETE FROM knowledge_entries WHERE id = ?1", params![id])?;
    tracing::debug!(id, deleted, "entry delete");
    Ok(deleted)
}

/// Every entry, oldest id first. Used by export.
pub fn all_entries(conn: &Connection) -> Result<Vec<KnowledgeEntry>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS} FROM knowledge_entries ORDER BY id"
    ))?;
    let entries = stmt
        .query_map([], entry_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn sample() -> NewEntry {
        NewEntry {
            category: "tech".into(),
            title: "WAL mode".into(),
            content: "Enables concurrent reads".into(),
            tags: vec!["sqlite".into(), "db".into()],
            metadata: serde_json::json!({"source": "docs", "nested": {"n": 1}})
                .as_object()
                .cloned()
                .unwrap(),
        }
    }

    #[test]
    fn create_returns_full_entry() {
        let mut conn = db::open_memory_database().unwrap();
        let entry = create_entry(&mut conn, &sample()).unwrap();

        assert!(entry.id > 0);
        assert_eq!(entry.title, "WAL mode");
        assert_eq!(entry.tags, vec!["sqlite", "db"]);
        assert_eq!(entry.metadata["nested"]["n"], 1);
        assert_eq!(entry.created_at, entry.updated_at);
    }

    #[test]
    fn create_rejects_empty_required_fields() {
        let mut conn = db::open_memory_database().unwrap();
        for field in ["category", "title", "content"] {
            let mut entry = sample();
            match field {
                "category" => entry.category.clear(),
                "title" => entry.title.clear(),
                _ => entry.content.clear(),
            }
            let err = create_entry(&mut conn, &entry).unwrap_err();
            assert!(matches!(err, KnowledgeError::Validation(_)), "{field}: {err}");
        }

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM knowledge_entries", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0, "nothing should be written on validation failure");
    }

    #[test]
    fn ids_are_fresh() {
        let mut conn = db::open_memory_database().unwrap();
        let a = create_entry(&mut conn, &sample()).unwrap();
        let b = create_entry(&mut conn, &sample()).unwrap();
        assert!(b.id > a.id);
    }

    #[test]
    fn get_missing_is_not_found() {
        let conn = db::open_memory_database().unwrap();
        let err = get_entry(&conn, 42).unwrap_err();
        assert!(matches!(err, KnowledgeError::NotFound(_)));
        assert_eq!(err.to_string(), "Entry with ID 42 not found");
    }

    #[test]
    fn empty_patch_rejected_even_for_missing_id() {
        let mut conn = db::open_memory_database().unwrap();
        let err = update_entry(&mut conn, 999, &EntryPatch::default()).unwrap_err();
        assert!(matches!(err, KnowledgeError::Validation(_)));
    }

    #[test]
    fn update_missing_is_not_found() {
        let mut conn = db::open_memory_database().unwrap();
        let patch = EntryPatch {
            title: Some("new".into()),
            ..Default::default()
        };
        let err = update_entry(&mut conn, 999, &patch).unwrap_err();
        assert!(matches!(err, KnowledgeError::NotFound(_)));
    }

    #[test]
    fn update_rejects_blanking_a_required_field() {
        let mut conn = db::open_memory_database().unwrap();
        let entry = create_entry(&mut conn, &sample()).unwrap();
        let patch = EntryPatch {
            content: Some(String::new()),
            ..Default::default()
        };
        let err = update_entry(&mut conn, entry.id, &patch).unwrap_err();
        assert!(matches!(err, KnowledgeError::Validation(_)));
        assert_eq!(get_entry(&conn, entry.id).unwrap(), entry);
    }

    #[test]
    fn update_replaces_tags_and_metadata() {
        let mut conn = db::open_memory_database().unwrap();
        let entry = create_entry(&mut conn, &sample()).unwrap();
        let patch = EntryPatch {
            tags: Some(vec!["rust".into()]),
            metadata: Some(serde_json::Map::new()),
            ..Default::default()
        };
        let updated = update_entry(&mut conn, entry.id, &patch).unwrap();
        assert_eq!(updated.tags, vec!["rust"]);
        assert!(updated.metadata.is_empty());
        assert_eq!(updated.title, entry.title);
    }

    #[test]
    fn delete_is_idempotent() {
        let mut conn = db::open_memory_database().unwrap();
        let entry = create_entry(&mut conn, &sample()).unwrap();
        assert_eq!(delete_entry(&conn, entry.id).unwrap(), 1);
        assert_eq!(delete_entry(&conn, entry.id).unwrap(), 0);
        assert!(fetch_entry(&conn, entry.id).unwrap().is_none());
    }

    #[test]
    fn deleted_ids_are_not_reused() {
        let mut conn = db::open_memory_database().unwrap();
        let first = create_entry(&mut conn, &sample()).unwrap();
        delete_entry(&conn, first.id).unwrap();
        let second = create_entry(&mut conn, &sample()).unwrap();
        assert!(second.id > first.id);
    }

    #[test]
    fn null_json_columns_decode_as_empty() {
        let conn = db::open_memory_database().unwrap();
        // Rows written by older tools may carry NULL tags/metadata
        conn.execute_batch(
            "CREATE TEMP TABLE legacy AS SELECT * FROM knowledge_entries WHERE 0;",
        )
        .unwrap();
        conn.execute(
            "INSERT INTO legacy (id, category, title, content, tags, metadata, created_at, updated_at) \
             VALUES (1, 'c', 't', 'b', NULL, NULL, 'x', 'x')",
            [],
        )
        .unwrap();
        let entry = conn
            .query_row(
                &format!("SELECT {ENTRY_COLUMNS} FROM legacy WHERE id = 1"),
                [],
                entry_from_row,
            )
            .unwrap();
        assert!(entry.tags.is_empty());
        assert!(entry.metadata.is_empty());
    }
}
