use anyhow::Result;

use crate::config::KbaseConfig;
use crate::knowledge::stats::{list_categories, list_tags, store_stats};

/// Display store statistics with the top categories and tags.
pub fn stats(config: &KbaseConfig) -> Result<()> {
    let db_path = config.resolved_db_path();
    let conn = crate::db::open_database(&db_path)?;

    let response = store_stats(&conn)?;

    println!("Knowledge Base Statistics");
    println!("{}", "=".repeat(40));
    println!("  Total entries:       {}", response.total_entries);
    println!("  Categories:          {}", response.distinct_categories);
    println!("  Contexts:            {}", response.total_contexts);
    println!("  Added in last 7d:    {}", response.recent_entries_7d);
    println!();

    println!("By Category:");
    for c in list_categories(&conn)? {
        println!("  {:<20} {}", c.category, c.count);
    }
    println!();

    println!("Top Tags:");
    for t in list_tags(&conn)?.iter().take(20) {
        println!("  {:<20} {}", t.tag, t.count);
    }

    Ok(())
}
