//! Context store: named groupings of entry ids, resolved on demand.
//!
//! Contexts are exposed as `context://<name>` resources. Their entry ids are
//! not foreign keys: resolving silently drops ids whose entries were deleted.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use super::entries::{entry_from_row, ENTRY_COLUMNS};
use super::error::require_non_empty;
use super::types::{Context, KnowledgeEntry};
use super::{now_timestamp, KnowledgeError, Result};

/// URI scheme prefix for context resources.
pub const CONTEXT_URI_PREFIX: &str = "context://";

/// Returned by [`upsert_context`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextSummary {
    pub name: String,
    /// Number of ids recorded, not the number that currently resolve.
    pub entry_count: usize,
}

/// One addressable context, as listed in resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextListing {
    pub name: String,
    pub description: Option<String>,
}

impl ContextListing {
    pub fn uri(&self) -> String {
        context_uri(&self.name)
    }
}

/// A context together with the entries it currently resolves to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedContext {
    pub context: Context,
    pub entries: Vec<KnowledgeEntry>,
}

/// Build the resource URI for a context name.
pub fn context_uri(name: &str) -> String {
    format!("{CONTEXT_URI_PREFIX}{name}")
}

/// Extract the context name from a `context://` URI.
pub fn parse_context_uri(uri: &str) -> Option<&str> {
    uri.strip_prefix(CONTEXT_URI_PREFIX)
        .filter(|name| !name.is_empty())
}

fn context_from_row(row: &Row) -> rusqlite::Result<Context> {
    let ids_json: String = row.get(2)?;
    let entry_ids = serde_json::from_str(&ids_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Context {
        name: row.get(0)?,
        description: row.get(1)?,
        entry_ids,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

const CONTEXT_COLUMNS: &str = "name, description, entry_ids, created_at, updated_at";

/// Create or wholesale replace the context called `name`.
pub fn upsert_context(
    conn: &Connection,
    name: &str,
    description: Option<&str>,
    entry_ids: &[i64],
) -> Result<ContextSummary> {
    require_non_empty("name", name)?;

    let ids_json = serde_json::to_string(entry_ids)?;
    let now = now_timestamp();

    conn.execute(
        "INSERT OR REPLACE INTO contexts (name, description, entry_ids, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![name, description, ids_json, now],
    )?;

    tracing::debug!(name, entry_count = entry_ids.len(), "context saved");
    Ok(ContextSummary {
        name: name.to_string(),
        entry_count: entry_ids.len(),
    })
}

/// All contexts by name.
pub fn list_contexts(conn: &Connection) -> Result<Vec<ContextListing>> {
    let mut stmt = conn.prepare("SELECT name, description FROM contexts ORDER BY name")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ContextListing {
                name: row.get(0)?,
                description: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Fetch a context record without resolving its entries.
pub fn get_context(conn: &Connection, name: &str) -> Result<Context> {
    conn.query_row(
        &format!("SELECT {CONTEXT_COLUMNS} FROM contexts WHERE name = ?1"),
        params![name],
        context_from_row,
    )
    .optional()?
    .ok_or_else(|| KnowledgeError::not_found(format!("Context {name} not found")))
}

/// Every context record, by name. Used by export.
pub fn all_contexts(conn: &Connection) -> Result<Vec<Context>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CONTEXT_COLUMNS} FROM contexts ORDER BY name"
    ))?;
    let rows = stmt
        .query_map([], context_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Look up a context and fetch the entries it references that still exist.
///
/// Entries come back in `entry_ids` order; a repeated id appears once. Both
/// reads run in one transaction.
pub fn resolve_context(conn: &mut Connection, name: &str) -> Result<ResolvedContext> {
    let tx = conn.transaction()?;
    let context = get_context(&tx, name)?;

    if context.entry_ids.is_empty() {
        tx.commit()?;
        return Ok(ResolvedContext {
            context,
            entries: Vec::new(),
        });
    }

    let ids_json = serde_json::to_string(&context.entry_ids)?;
    let mut by_id: HashMap<i64, KnowledgeEntry> = {
        let mut stmt = tx.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM knowledge_entries \
             WHERE id IN (SELECT value FROM json_each(?1))"
        ))?;
        let rows = stmt
            .query_map(params![ids_json], entry_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(|entry| (entry.id, entry)).collect()
    };
    tx.commit()?;

    let mut seen = HashSet::new();
    let entries: Vec<KnowledgeEntry> = context
        .entry_ids
        .iter()
        .filter(|id| seen.insert(**id))
        .filter_map(|id| by_id.remove(id))
        .collect();

    tracing::debug!(
        name,
        referenced = context.entry_ids.len(),
        resolved = entries.len(),
        "context resolved"
    );
    Ok(ResolvedContext { context, entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::knowledge::entries::{create_entry, delete_entry};
    use crate::knowledge::types::NewEntry;

    fn add(conn: &mut Connection, title: &str) -> i64 {
        create_entry(
            conn,
            &NewEntry {
                category: "tech".into(),
                title: title.into(),
                content: "body".into(),
                ..Default::default()
            },
        )
        .unwrap()
        .id
    }

    #[test]
    fn uri_round_trip() {
        assert_eq!(context_uri("db-notes"), "context://db-notes");
        assert_eq!(parse_context_uri("context://db-notes"), Some("db-notes"));
        assert_eq!(parse_context_uri("context://"), None);
        assert_eq!(parse_context_uri("file:///etc/passwd"), None);
    }

    #[test]
    fn upsert_rejects_empty_name() {
        let conn = db::open_memory_database().unwrap();
        let err = upsert_context(&conn, "", None, &[]).unwrap_err();
        assert!(matches!(err, KnowledgeError::Validation(_)));
    }

    #[test]
    fn upsert_reports_recorded_count() {
        let conn = db::open_memory_database().unwrap();
        // Ids need not exist
        let summary = upsert_context(&conn, "ghosts", Some("nothing here"), &[100, 200]).unwrap();
        assert_eq!(summary.entry_count, 2);

        let ctx = get_context(&conn, "ghosts").unwrap();
        assert_eq!(ctx.entry_ids, vec![100, 200]);
        assert_eq!(ctx.description.as_deref(), Some("nothing here"));
    }

    #[test]
    fn upsert_replaces_description_too() {
        let conn = db::open_memory_database().unwrap();
        upsert_context(&conn, "c", Some("first"), &[1]).unwrap();
        upsert_context(&conn, "c", None, &[]).unwrap();

        let ctx = get_context(&conn, "c").unwrap();
        assert!(ctx.description.is_none());
        assert!(ctx.entry_ids.is_empty());
        assert_eq!(list_contexts(&conn).unwrap().len(), 1);
    }

    #[test]
    fn resolve_missing_is_not_found() {
        let mut conn = db::open_memory_database().unwrap();
        let err = resolve_context(&mut conn, "nope").unwrap_err();
        assert!(matches!(err, KnowledgeError::NotFound(_)));
    }

    #[test]
    fn resolve_preserves_id_order_and_drops_repeats() {
        let mut conn = db::open_memory_database().unwrap();
        let a = add(&mut conn, "a");
        let b = add(&mut conn, "b");
        let c = add(&mut conn, "c");
        upsert_context(&conn, "ordered", None, &[c, a, c, b]).unwrap();

        let resolved = resolve_context(&mut conn, "ordered").unwrap();
        let ids: Vec<i64> = resolved.entries.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![c, a, b]);
        assert_eq!(resolved.context.entry_ids.len(), 4);
    }

    #[test]
    fn resolve_skips_deleted_entries() {
        let mut conn = db::open_memory_database().unwrap();
        let a = add(&mut conn, "a");
        let b = add(&mut conn, "b");
        upsert_context(&conn, "pair", None, &[a, b]).unwrap();
        delete_entry(&conn, a).unwrap();

        let resolved = resolve_context(&mut conn, "pair").unwrap();
        assert_eq!(resolved.entries.len(), 1);
        assert_eq!(resolved.entries[0].id, b);
    }

    #[test]
    fn list_is_sorted_by_name() {
        let conn = db::open_memory_database().unwrap();
        upsert_context(&conn, "zeta", None, &[]).unwrap();
        upsert_context(&conn, "alpha", Some("first"), &[]).unwrap();

        let listed = list_contexts(&conn).unwrap();
        let names: Vec<&str> = listed.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        assert_eq!(listed[0].uri(), "context://alpha");
    }
}
