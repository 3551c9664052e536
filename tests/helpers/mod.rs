#![allow(dead_code)]

use kbase::db;
use kbase::knowledge::entries::create_entry;
use kbase::knowledge::types::NewEntry;
use rusqlite::{params, Connection};

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    db::open_memory_database().unwrap()
}

/// Insert an entry with fixed content. Returns its id.
pub fn insert_entry(conn: &mut Connection, category: &str, title: &str, tags: &[&str]) -> i64 {
    create_entry(
        conn,
        &NewEntry {
            category: category.to_string(),
            title: title.to_string(),
            content: format!("Notes about {title}"),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        },
    )
    .unwrap()
    .id
}

/// Overwrite an entry's `updated_at` so ordering tests don't depend on the clock.
pub fn set_updated_at(conn: &Connection, id: i64, ts: &str) {
    conn.execute(
        "UPDATE knowledge_entries SET updated_at = ?1 WHERE id = ?2",
        params![ts, id],
    )
    .unwrap();
}

/// Overwrite an entry's `created_at`.
pub fn set_created_at(conn: &Connection, id: i64, ts: &str) {
    conn.execute(
        "UPDATE knowledge_entries SET created_at = ?1 WHERE id = ?2",
        params![ts, id],
    )
    .unwrap();
}
