//! SQL DDL for the knowledge store.
//!
//! Defines `knowledge_entries`, `contexts`, and `schema_meta`. All DDL uses
//! `IF NOT EXISTS` for idempotent initialization.

use rusqlite::Connection;

/// Schema DDL for the core tables.
///
/// `tags`, `metadata`, and `entry_ids` hold JSON text. Timestamps are fixed-width
/// RFC 3339 strings so lexical order matches chronological order.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS knowledge_entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    category TEXT NOT NULL CHECK(length(category) > 0),
    title TEXT NOT NULL CHECK(length(title) > 0),
    content TEXT NOT NULL CHECK(length(content) > 0),
    tags TEXT NOT NULL DEFAULT '[]',
    metadata TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_entries_category ON knowledge_entries(category);
CREATE INDEX IF NOT EXISTS idx_entries_tags ON knowledge_entries(tags);
CREATE INDEX IF NOT EXISTS idx_entries_title ON knowledge_entries(title);
CREATE INDEX IF NOT EXISTS idx_entries_created_at ON knowledge_entries(created_at DESC);
-- Matches the search ordering
CREATE INDEX IF NOT EXISTS idx_entries_updated_at ON knowledge_entries(updated_at DESC, id DESC);

-- Named groupings of entry ids; ids are not foreign keys
CREATE TABLE IF NOT EXISTS contexts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT UNIQUE NOT NULL CHECK(length(name) > 0),
    description TEXT,
    entry_ids TEXT NOT NULL DEFAULT '[]',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    // Set initial schema version if not already present
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}
