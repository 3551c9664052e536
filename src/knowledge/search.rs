//! Query engine: filtered, bounded, ordered retrieval of entries.
//!
//! Criteria combine with AND. Within `tags` the match is OR: an entry matches
//! when it carries any of the requested tags. Results are ordered by
//! `updated_at` descending, ties broken by `id` descending.

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

use super::entries::{entry_from_row, ENTRY_COLUMNS};
use super::types::KnowledgeEntry;
use super::{KnowledgeError, Result};

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// A search request. Empty strings and an empty tag list count as absent.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Case-insensitive substring matched against title or content.
    pub text: Option<String>,
    /// Exact category match.
    pub category: Option<String>,
    /// Entry matches if it carries any of these.
    pub tags: Vec<String>,
    /// Must be within `1..=MAX_LIMIT`.
    pub limit: i64,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            text: None,
            category: None,
            tags: Vec::new(),
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Run a search. Out-of-range limits are rejected, never clamped.
pub fn search_entries(conn: &Connection, query: &SearchQuery) -> Result<Vec<KnowledgeEntry>> {
    if !(1..=MAX_LIMIT).contains(&query.limit) {
        return Err(KnowledgeError::validation(format!(
            "limit must be between 1 and {MAX_LIMIT}, got {}",
            query.limit
        )));
    }

    let mut sql = format!("SELECT {ENTRY_COLUMNS} FROM knowledge_entries WHERE 1=1");
    let mut values: Vec<Value> = Vec::new();

    if let Some(text) = query.text.as_deref().filter(|t| !t.is_empty()) {
        sql.push_str(" AND (title LIKE ? ESCAPE '\\' OR content LIKE ? ESCAPE '\\')");
        let pattern = format!("%{}%", escape_like(text));
        values.push(Value::Text(pattern.clone()));
        values.push(Value::Text(pattern));
    }

    if let Some(category) = query.category.as_deref().filter(|c| !c.is_empty()) {
        sql.push_str(" AND category = ?");
        values.push(Value::Text(category.to_string()));
    }

    if !query.tags.is_empty() {
        let placeholders = vec!["?"; query.tags.len()].join(", ");
        sql.push_str(&format!(
            " AND EXISTS (SELECT 1 FROM json_each(knowledge_entries.tags) AS t WHERE t.value IN ({placeholders}))"
        ));
        values.extend(query.tags.iter().cloned().map(Value::Text));
    }

    sql.push_str(" ORDER BY updated_at DESC, id DESC LIMIT ?");
    values.push(Value::Integer(query.limit));

    let mut stmt = conn.prepare(&sql)?;
    let entries = stmt
        .query_map(params_from_iter(values), entry_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    tracing::debug!(
        matched = entries.len(),
        text = ?query.text,
        category = ?query.category,
        tags = query.tags.len(),
        "search complete"
    );
    Ok(entries)
}

/// Escape `LIKE` wildcards so user text matches literally (escape char `\`).
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::knowledge::entries::create_entry;
    use crate::knowledge::types::NewEntry;

    fn add(conn: &mut Connection, title: &str, content: &str) -> KnowledgeEntry {
        create_entry(
            conn,
            &NewEntry {
                category: "notes".into(),
                title: title.into(),
                content: content.into(),
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn escape_like_escapes_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn percent_in_query_matches_literally() {
        let mut conn = db::open_memory_database().unwrap();
        add(&mut conn, "Discount", "50% off everything");
        add(&mut conn, "Other", "500 items");

        let query = SearchQuery {
            text: Some("50%".into()),
            ..Default::default()
        };
        let results = search_entries(&conn, &query).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Discount");
    }

    #[test]
    fn text_match_is_case_insensitive_on_title_or_content() {
        let mut conn = db::open_memory_database().unwrap();
        add(&mut conn, "Rust ownership", "borrowing rules");
        add(&mut conn, "Cooking", "Learning RUST removal from pans");
        add(&mut conn, "Unrelated", "nothing here");

        let query = SearchQuery {
            text: Some("rust".into()),
            ..Default::default()
        };
        let results = search_entries(&conn, &query).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn empty_text_is_ignored() {
        let mut conn = db::open_memory_database().unwrap();
        add(&mut conn, "a", "b");
        let query = SearchQuery {
            text: Some(String::new()),
            category: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(search_entries(&conn, &query).unwrap().len(), 1);
    }

    #[test]
    fn limit_bounds_are_enforced() {
        let conn = db::open_memory_database().unwrap();
        for limit in [0, -1, 101] {
            let query = SearchQuery {
                limit,
                ..Default::default()
            };
            let err = search_entries(&conn, &query).unwrap_err();
            assert!(matches!(err, KnowledgeError::Validation(_)), "limit {limit}");
        }
        for limit in [1, 100] {
            let query = SearchQuery {
                limit,
                ..Default::default()
            };
            assert!(search_entries(&conn, &query).is_ok(), "limit {limit}");
        }
    }
}
