//! SQLite schema for block storage

use rusqlite::{Connection, OptionalExtension, Result};

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Schema version tracking
        CREATE TABLE IF NOT EXISTS schema_info (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        -- Blocks. parent_id is a plain lookup key: no foreign key, so
        -- deleting a block never cascades to its children.
        CREATE TABLE IF NOT EXISTS blocks (
            id TEXT PRIMARY KEY,
            space_id TEXT NOT NULL,
            parent_id TEXT,
            block_type TEXT NOT NULL,
            title TEXT NOT NULL,
            sort INTEGER NOT NULL,
            folder_path TEXT,
            props TEXT NOT NULL DEFAULT '{}',
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        -- Per sibling group sort allocator. parent_key is '' for the root group.
        CREATE TABLE IF NOT EXISTS sort_counters (
            space_id TEXT NOT NULL,
            parent_key TEXT NOT NULL,
            last_sort INTEGER NOT NULL,
            PRIMARY KEY (space_id, parent_key)
        );

        -- Sibling listing in display order
        CREATE INDEX IF NOT EXISTS idx_blocks_group ON blocks(space_id, parent_id, sort);

        -- Listing by type within a space
        CREATE INDEX IF NOT EXISTS idx_blocks_type ON blocks(space_id, block_type);
        "#,
    )?;

    conn.execute(
        "INSERT OR REPLACE INTO schema_info (key, value) VALUES ('version', ?)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> Result<Option<i32>> {
    let version: Option<String> = conn
        .query_row(
            "SELECT value FROM schema_info WHERE key = 'version'",
            [],
            |row| row.get(0),
        )
        .optional()?;

    Ok(version.and_then(|v| v.parse().ok()))
}

/// Check if schema needs initialization or migration
pub fn needs_init(conn: &Connection) -> bool {
    let table_exists: bool = conn
        .prepare("SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_info'")
        .and_then(|mut stmt| stmt.exists([]))
        .unwrap_or(false);

    if !table_exists {
        return true;
    }

    match get_schema_version(conn) {
        Ok(Some(v)) => v < SCHEMA_VERSION,
        _ => true,
    }
}
