//! CLI `inspect` command: display full details for a single entry.

use anyhow::Result;

use crate::config::KbaseConfig;

/// Inspect a single entry by ID and display full details.
pub fn inspect(config: &KbaseConfig, id: i64) -> Result<()> {
    let db_path = config.resolved_db_path();
    let conn = crate::db::open_database(&db_path)?;

    let e = crate::knowledge::entries::get_entry(&conn, id)?;

    println!("Entry: {}", e.id);
    println!("{}", "=".repeat(50));
    println!("  Category:       {}", e.category);
    println!("  Title:          {}", e.title);
    println!("  Tags:           {}", e.tags.join(", "));
    println!("  Created:        {}", e.created_at);
    println!("  Updated:        {}", e.updated_at);
    if !e.metadata.is_empty() {
        println!("  Metadata:       {}", serde_json::to_string_pretty(&e.metadata)?);
    }
    println!();
    println!("Content:");
    println!("  {}", e.content);

    Ok(())
}
