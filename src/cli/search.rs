use anyhow::Result;

use crate::config::KbaseConfig;
use crate::knowledge::search::{search_entries, SearchQuery};

/// Run a search from the terminal.
pub fn search(
    config: &KbaseConfig,
    query: Option<String>,
    category: Option<String>,
    tags: Vec<String>,
    limit: i64,
) -> Result<()> {
    let db_path = config.resolved_db_path();
    let conn = crate::db::open_database(&db_path)?;

    let query = SearchQuery {
        text: query,
        category,
        tags,
        limit,
    };
    let results = search_entries(&conn, &query)?;

    if results.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    println!("Found {} result(s)\n", results.len());

    for (i, entry) in results.iter().enumerate() {
        println!(
            "  {}. #{} [{}] {} (updated {})",
            i + 1,
            entry.id,
            entry.category,
            entry.title,
            entry.updated_at,
        );
        println!("     {}", super::preview(&entry.content, 120));
        if !entry.tags.is_empty() {
            println!("     tags: {}", entry.tags.join(", "));
        }
        println!();
    }

    Ok(())
}
