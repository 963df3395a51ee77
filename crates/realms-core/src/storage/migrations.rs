//! Database schema migrations for eternal-realms.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Returns 0 if no version is set (initial database).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            tracing::warn!("failed to read schema_version: {e}");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: sessions and skills.
///
/// `character_id` is the session primary key, which is what limits a
/// character to one active session. The CHECK constraints mirror the
/// engine's invariants so a buggy writer fails loudly.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS gathering_sessions (
            character_id      TEXT PRIMARY KEY,
            id                TEXT NOT NULL UNIQUE,
            skill_type        TEXT NOT NULL,
            material_id       TEXT NOT NULL,
            quantity_goal     INTEGER NOT NULL CHECK (quantity_goal >= 1),
            quantity_gathered INTEGER NOT NULL DEFAULT 0
                CHECK (quantity_gathered >= 0 AND quantity_gathered <= quantity_goal),
            started_at        TEXT NOT NULL,
            last_gathered_at  TEXT NOT NULL,
            version           INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS skills (
            character_id TEXT NOT NULL,
            skill_type   TEXT NOT NULL,
            level        INTEGER NOT NULL DEFAULT 1 CHECK (level BETWEEN 1 AND 99),
            experience   INTEGER NOT NULL DEFAULT 0 CHECK (experience >= 0),
            updated_at   TEXT NOT NULL,
            PRIMARY KEY (character_id, skill_type)
        );",
    )?;

    tx.execute("DELETE FROM schema_version", [])?;
    tx.execute("INSERT INTO schema_version (version) VALUES (1)", [])?;
    tx.commit()
}

/// Migration v2: inventory credited by collect.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS inventory (
            character_id TEXT NOT NULL,
            material_id  TEXT NOT NULL,
            quantity     INTEGER NOT NULL DEFAULT 0 CHECK (quantity >= 0),
            PRIMARY KEY (character_id, material_id)
        );

        CREATE INDEX IF NOT EXISTS idx_gathering_sessions_material
            ON gathering_sessions(material_id);",
    )?;

    set_schema_version(&tx, 2)?;
    tx.commit()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_exists(conn: &Connection, name: &str) -> bool {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |row| row.get::<_, i64>(0),
        )
        .unwrap()
            == 1
    }

    #[test]
    fn fresh_database_reaches_current_version() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), CURRENT_SCHEMA_VERSION);
        for table in ["gathering_sessions", "skills", "inventory"] {
            assert!(table_exists(&conn, table), "missing table {table}");
        }
    }

    #[test]
    fn schema_holds_only_game_tables() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap();
        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        assert_eq!(
            tables,
            ["gathering_sessions", "inventory", "schema_version", "skills"]
        );
    }

    #[test]
    fn migrate_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn incremental_migration_from_v1() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema_version_table(&conn).unwrap();
        migrate_v1(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), 1);
        assert!(!table_exists(&conn, "inventory"));

        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), 2);
        assert!(table_exists(&conn, "inventory"));
    }

    #[test]
    fn check_constraint_rejects_overfilled_session() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        let result = conn.execute(
            "INSERT INTO gathering_sessions
                (character_id, id, skill_type, material_id, quantity_goal,
                 quantity_gathered, started_at, last_gathered_at)
             VALUES ('hero', 's1', 'mining', 'copper_ore', 5, 6, 'x', 'x')",
            [],
        );
        assert!(result.is_err());
    }
}
