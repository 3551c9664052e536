use chrono::{Duration, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use super::{format_timestamp, Result};

/// Entries per category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: u64,
}

/// Number of entries carrying a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: u64,
}

/// Response from store_stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_entries: u64,
    pub distinct_categories: u64,
    pub total_contexts: u64,
    /// Entries created within the trailing 7×24h window.
    pub recent_entries_7d: u64,
}

/// Length of the "recent" window used by [`store_stats`].
const RECENT_WINDOW_DAYS: i64 = 7;

/// Categories by entry count, most used first; ties by name.
pub fn list_categories(conn: &Connection) -> Result<Vec<CategoryCount>> {
    let mut stmt = conn.prepare(
        "SELECT category, COUNT(*) AS n FROM knowledge_entries \
         GROUP BY category ORDER BY n DESC, category ASC",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(CategoryCount {
                category: row.get(0)?,
                count: row.get::<_, i64>(1)? as u64,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Tags by number of entries carrying them, most used first; ties by name.
///
/// A tag repeated inside one entry counts once for that entry.
pub fn list_tags(conn: &Connection) -> Result<Vec<TagCount>> {
    let mut stmt = conn.prepare(
        "SELECT t.value AS tag, COUNT(DISTINCT e.id) AS n \
         FROM knowledge_entries AS e, json_each(e.tags) AS t \
         WHERE t.type = 'text' \
         GROUP BY t.value ORDER BY n DESC, tag ASC",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(TagCount {
                tag: row.get(0)?,
                count: row.get::<_, i64>(1)? as u64,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Compute store statistics in a single statement.
pub fn store_stats(conn: &Connection) -> Result<StoreStats> {
    let cutoff = format_timestamp(Utc::now() - Duration::days(RECENT_WINDOW_DAYS));

    let stats = conn.query_row(
        "SELECT COUNT(*), \
                COUNT(DISTINCT category), \
                (SELECT COUNT(*) FROM contexts), \
                COUNT(CASE WHEN created_at > ?1 THEN 1 END) \
         FROM knowledge_entries",
        params![cutoff],
        |row| {
            Ok(StoreStats {
                total_entries: row.get::<_, i64>(0)? as u64,
                distinct_categories: row.get::<_, i64>(1)? as u64,
                total_contexts: row.get::<_, i64>(2)? as u64,
                recent_entries_7d: row.get::<_, i64>(3)? as u64,
            })
        },
    )?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[test]
    fn empty_store_has_zero_stats() {
        let conn = db::open_memory_database().unwrap();
        let stats = store_stats(&conn).unwrap();
        assert_eq!(
            stats,
            StoreStats {
                total_entries: 0,
                distinct_categories: 0,
                total_contexts: 0,
                recent_entries_7d: 0,
            }
        );
        assert!(list_categories(&conn).unwrap().is_empty());
        assert!(list_tags(&conn).unwrap().is_empty());
    }

    #[test]
    fn non_string_tag_values_are_skipped() {
        let conn = db::open_memory_database().unwrap();
        conn.execute(
            "INSERT INTO knowledge_entries (category, title, content, tags, created_at, updated_at) \
             VALUES ('c', 't', 'b', '[\"ok\", 3, null]', 'x', 'x')",
            [],
        )
        .unwrap();
        let tags = list_tags(&conn).unwrap();
        assert_eq!(
            tags,
            vec![TagCount {
                tag: "ok".into(),
                count: 1
            }]
        );
    }
}
