//! Forward-only schema migration framework.
//!
//! Tracks the schema version in `schema_meta` and runs sequential migrations
//! to bring the database up to [`CURRENT_SCHEMA_VERSION`]. The schema in
//! [`super::schema`] is version 1; later versions append a step to
//! [`MIGRATIONS`].

use rusqlite::Connection;

/// The schema version that the current binary expects.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// One step: the version it produces and the DDL that gets there.
type Migration = (u32, fn(&Connection) -> rusqlite::Result<()>);

/// Steps in ascending version order.
const MIGRATIONS: &[Migration] = &[];

/// Get the current schema version from the database.
pub fn get_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT value FROM schema_meta WHERE key = 'schema_version'",
        [],
        |row| {
            let val: String = row.get(0)?;
            Ok(val.parse::<u32>().unwrap_or(0))
        },
    )
}

/// Update the stored schema version.
fn update_schema_version(conn: &Connection, version: u32) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE schema_meta SET value = ?1 WHERE key = 'schema_version'",
        [version.to_string()],
    )?;
    Ok(())
}

/// Run any pending forward-only migrations.
pub fn run_migrations(conn: &Connection) -> rusqlite::Result<()> {
    apply_migrations(conn, MIGRATIONS)
}

/// Apply every step newer than the stored version. Each step and its version
/// bump commit together.
fn apply_migrations(conn: &Connection, steps: &[Migration]) -> rusqlite::Result<()> {
    let version = get_schema_version(conn)?;
    let target = steps.last().map_or(version, |(v, _)| (*v).max(version));
    tracing::debug!(schema_version = version, target, "checking migrations");

    for (next, migrate) in steps.iter().filter(|(v, _)| *v > version) {
        tracing::info!(to = next, "running migration");
        let tx = conn.unchecked_transaction()?;
        migrate(&tx)?;
        update_schema_version(&tx, *next)?;
        tx.commit()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::schema::init_schema(&conn).unwrap();
        conn
    }

    fn has_table(conn: &Connection, name: &str) -> bool {
        conn.query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |row| row.get(0),
        )
        .unwrap()
    }

    fn add_archive(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch("CREATE TABLE archive (id INTEGER PRIMARY KEY);")
    }

    fn broken(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch("CREATE TABLE half_done (id INTEGER); SELECT * FROM no_such_table;")
    }

    #[test]
    fn fresh_db_is_current() {
        let conn = test_db();
        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn pending_steps_run_once_in_order() {
        let conn = test_db();
        let steps: &[Migration] = &[(2, add_archive as fn(&Connection) -> rusqlite::Result<()>)];

        apply_migrations(&conn, steps).unwrap();
        assert!(has_table(&conn, "archive"));
        assert_eq!(get_schema_version(&conn).unwrap(), 2);

        // Already at 2, so the CREATE TABLE is not repeated
        apply_migrations(&conn, steps).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), 2);
    }

    #[test]
    fn failed_step_rolls_back_with_its_version() {
        let conn = test_db();
        let steps: &[Migration] = &[(2, broken as fn(&Connection) -> rusqlite::Result<()>)];

        assert!(apply_migrations(&conn, steps).is_err());
        assert!(!has_table(&conn, "half_done"));
        assert_eq!(get_schema_version(&conn).unwrap(), 1);
    }

    #[test]
    fn migrations_are_idempotent() {
        let conn = test_db();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap(); // second call should not error
        assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
    }
}
