//! SQLite block repository
//!
//! The concrete persistence collaborator. One connection guarded by a mutex;
//! every multi-statement operation runs in an `IMMEDIATE` transaction so the
//! sibling-group writes (sort allocation, position shifts) are atomic even
//! when several processes share the database file.
//!
//! ## Tables
//!
//! - `blocks` - Block records
//! - `sort_counters` - Last allocated position per sibling group

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, InterruptHandle, OptionalExtension, TransactionBehavior};
use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

use super::error::{StoreError, StoreResult};
use super::schema::{init_schema, needs_init};
use super::BlockRepository;
use crate::config::Config;
use crate::models::{Block, BlockType};

/// How long a writer waits on a locked database before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Column list shared by every block query
const BLOCK_COLUMNS: &str =
    "id, space_id, parent_id, block_type, title, sort, folder_path, props, created_at, updated_at";

/// Interrupts whatever statement the repository is currently running
///
/// The interrupted call fails with [`StoreError::Canceled`].
#[derive(Clone)]
pub struct CancelHandle(Arc<InterruptHandle>);

impl CancelHandle {
    /// Abort the in-flight statement, if any
    pub fn cancel(&self) {
        self.0.interrupt();
    }
}

/// SQLite-backed [`BlockRepository`]
pub struct SqliteBlockRepository {
    conn: Mutex<Connection>,
    interrupt: Arc<InterruptHandle>,
}

impl SqliteBlockRepository {
    /// Open or create the database configured in `config`
    pub fn open(config: &Config) -> StoreResult<Self> {
        Self::open_path(&config.sqlite_path())
    }

    /// Open or create a database at `path`
    pub fn open_path(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        debug!("Opened block database at {:?}", path);
        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;

        if needs_init(&conn) {
            init_schema(&conn)?;
        }

        let interrupt = Arc::new(conn.get_interrupt_handle());
        Ok(Self {
            conn: Mutex::new(conn),
            interrupt,
        })
    }

    /// Handle that cancels the statement currently executing
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(Arc::clone(&self.interrupt))
    }

    /// Count blocks in a space, grouped by type
    pub fn count_by_type(&self, space_id: Uuid) -> StoreResult<Vec<(BlockType, i64)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT block_type, COUNT(*) FROM blocks WHERE space_id = ? GROUP BY block_type ORDER BY block_type",
        )?;

        let rows = stmt
            .query_map(params![space_id.to_string()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(tag, count)| {
                let block_type = tag.parse().map_err(|e: crate::BlockError| StoreError::Corrupt {
                    id: format!("space {}", space_id),
                    details: e.to_string(),
                })?;
                Ok((block_type, count))
            })
            .collect()
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Backend("connection lock poisoned".to_string()))
    }
}

impl BlockRepository for SqliteBlockRepository {
    fn create(&self, block: &Block) -> StoreResult<Uuid> {
        let id = if block.id.is_nil() {
            Uuid::new_v4()
        } else {
            block.id
        };

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO blocks (id, space_id, parent_id, block_type, title, sort,
                                folder_path, props, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                id.to_string(),
                block.space_id.to_string(),
                block.parent_id.map(|p| p.to_string()),
                block.block_type.as_str(),
                block.title,
                block.sort,
                block.folder_path(),
                Value::Object(block.props.clone()).to_string(),
                block.created_at.timestamp_millis(),
                block.updated_at.timestamp_millis(),
            ],
        )?;

        debug!("Inserted block {} ({})", id, block.block_type);
        Ok(id)
    }

    fn get(&self, id: Uuid) -> StoreResult<Block> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                &format!("SELECT {} FROM blocks WHERE id = ?", BLOCK_COLUMNS),
                params![id.to_string()],
                BlockRow::from_row,
            )
            .optional()?;

        row.ok_or(StoreError::NotFound { id })?.hydrate()
    }

    fn update(&self, block: &Block) -> StoreResult<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            r#"
            UPDATE blocks
            SET title = ?, folder_path = ?, props = ?, updated_at = ?
            WHERE id = ?
            "#,
            params![
                block.title,
                block.folder_path(),
                Value::Object(block.props.clone()).to_string(),
                block.updated_at.timestamp_millis(),
                block.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound { id: block.id });
        }
        Ok(())
    }

    fn delete(&self, space_id: Uuid, block_id: Uuid) -> StoreResult<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "DELETE FROM blocks WHERE space_id = ? AND id = ?",
            params![space_id.to_string(), block_id.to_string()],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound { id: block_id });
        }
        Ok(())
    }

    fn next_sort(&self, space_id: Uuid, parent_id: Option<Uuid>) -> StoreResult<i64> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let sort = allocate_sort(&tx, space_id, parent_id)?;
        tx.commit()?;
        Ok(sort)
    }

    fn move_to_parent_append(
        &self,
        block_id: Uuid,
        new_parent_id: Option<Uuid>,
    ) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let (space_id, _) = load_group(&tx, block_id)?;
        let sort = allocate_sort(&tx, space_id, new_parent_id)?;
        set_position(&tx, block_id, new_parent_id, sort)?;

        tx.commit()?;
        Ok(())
    }

    fn move_to_parent_at_sort(
        &self,
        block_id: Uuid,
        new_parent_id: Option<Uuid>,
        sort: i64,
    ) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let (space_id, _) = load_group(&tx, block_id)?;
        make_room(&tx, space_id, new_parent_id, sort, block_id)?;
        set_position(&tx, block_id, new_parent_id, sort)?;

        tx.commit()?;
        Ok(())
    }

    fn reorder_within_group(&self, block_id: Uuid, sort: i64) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let (space_id, parent_id) = load_group(&tx, block_id)?;
        make_room(&tx, space_id, parent_id, sort, block_id)?;
        set_position(&tx, block_id, parent_id, sort)?;

        tx.commit()?;
        Ok(())
    }

    fn list_by_space(
        &self,
        space_id: Uuid,
        block_type: Option<BlockType>,
        parent_id: Option<Uuid>,
    ) -> StoreResult<Vec<Block>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {}
            FROM blocks
            WHERE space_id = ?1
              AND (?2 IS NULL OR block_type = ?2)
              AND parent_id IS ?3
            ORDER BY sort ASC, created_at ASC
            "#,
            BLOCK_COLUMNS
        ))?;

        let rows = stmt
            .query_map(
                params![
                    space_id.to_string(),
                    block_type.map(|t| t.as_str()),
                    parent_id.map(|p| p.to_string()),
                ],
                BlockRow::from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(BlockRow::hydrate).collect()
    }
}

// ==================== Sibling group helpers ====================

/// Key of a sibling group in `sort_counters`
fn parent_key(parent_id: Option<Uuid>) -> String {
    parent_id.map(|p| p.to_string()).unwrap_or_default()
}

/// Allocate the next position in a group
///
/// Never hands out a value at or below an existing sibling's position, even
/// if explicit moves pushed siblings past the counter.
fn allocate_sort(conn: &Connection, space_id: Uuid, parent_id: Option<Uuid>) -> StoreResult<i64> {
    let max_sort: i64 = conn.query_row(
        "SELECT COALESCE(MAX(sort), 0) FROM blocks WHERE space_id = ? AND parent_id IS ?",
        params![space_id.to_string(), parent_id.map(|p| p.to_string())],
        |row| row.get(0),
    )?;

    let last: Option<i64> = conn
        .query_row(
            "SELECT last_sort FROM sort_counters WHERE space_id = ? AND parent_key = ?",
            params![space_id.to_string(), parent_key(parent_id)],
            |row| row.get(0),
        )
        .optional()?;

    let next = last
        .unwrap_or(0)
        .max(max_sort)
        .checked_add(1)
        .ok_or(StoreError::SortExhausted { space_id })?;

    conn.execute(
        r#"
        INSERT INTO sort_counters (space_id, parent_key, last_sort) VALUES (?, ?, ?)
        ON CONFLICT(space_id, parent_key) DO UPDATE SET last_sort = excluded.last_sort
        "#,
        params![space_id.to_string(), parent_key(parent_id), next],
    )?;

    Ok(next)
}

/// Space and parent of an existing block
fn load_group(conn: &Connection, block_id: Uuid) -> StoreResult<(Uuid, Option<Uuid>)> {
    let row: Option<(String, Option<String>)> = conn
        .query_row(
            "SELECT space_id, parent_id FROM blocks WHERE id = ?",
            params![block_id.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let (space, parent) = row.ok_or(StoreError::NotFound { id: block_id })?;
    let id = block_id.to_string();
    let space_id = parse_uuid(&id, &space)?;
    let parent_id = parent.map(|p| parse_uuid(&id, &p)).transpose()?;
    Ok((space_id, parent_id))
}

/// Shift siblings at or after `sort` down one slot if the slot is taken
///
/// Fails without touching any row when a sibling already holds `i64::MAX`.
fn make_room(
    conn: &Connection,
    space_id: Uuid,
    parent_id: Option<Uuid>,
    sort: i64,
    block_id: Uuid,
) -> StoreResult<()> {
    let space = space_id.to_string();
    let parent = parent_id.map(|p| p.to_string());
    let id = block_id.to_string();

    let occupied = conn
        .prepare(
            "SELECT 1 FROM blocks WHERE space_id = ? AND parent_id IS ? AND sort = ? AND id != ?",
        )?
        .exists(params![space, parent, sort, id])?;

    if occupied {
        let last: i64 = conn.query_row(
            "SELECT MAX(sort) FROM blocks WHERE space_id = ? AND parent_id IS ? AND sort >= ? AND id != ?",
            params![space, parent, sort, id],
            |row| row.get(0),
        )?;
        if last == i64::MAX {
            return Err(StoreError::SortExhausted { space_id });
        }

        let shifted = conn.execute(
            "UPDATE blocks SET sort = sort + 1 WHERE space_id = ? AND parent_id IS ? AND sort >= ? AND id != ?",
            params![space, parent, sort, id],
        )?;
        debug!("Shifted {} sibling(s) to free position {}", shifted, sort);
    }

    Ok(())
}

fn set_position(
    conn: &Connection,
    block_id: Uuid,
    parent_id: Option<Uuid>,
    sort: i64,
) -> StoreResult<()> {
    conn.execute(
        "UPDATE blocks SET parent_id = ?, sort = ?, updated_at = ? WHERE id = ?",
        params![
            parent_id.map(|p| p.to_string()),
            sort,
            Utc::now().timestamp_millis(),
            block_id.to_string(),
        ],
    )?;
    Ok(())
}

// ==================== Row decoding ====================

struct BlockRow {
    id: String,
    space_id: String,
    parent_id: Option<String>,
    block_type: String,
    title: String,
    sort: i64,
    folder_path: Option<String>,
    props: String,
    created_at: i64,
    updated_at: i64,
}

impl BlockRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            space_id: row.get(1)?,
            parent_id: row.get(2)?,
            block_type: row.get(3)?,
            title: row.get(4)?,
            sort: row.get(5)?,
            folder_path: row.get(6)?,
            props: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    fn hydrate(self) -> StoreResult<Block> {
        let id = parse_uuid(&self.id, &self.id)?;
        let space_id = parse_uuid(&self.id, &self.space_id)?;
        let parent_id = self
            .parent_id
            .as_deref()
            .map(|p| parse_uuid(&self.id, p))
            .transpose()?;

        let block_type: BlockType = self.block_type.parse().map_err(|e: crate::BlockError| {
            StoreError::Corrupt {
                id: self.id.clone(),
                details: e.to_string(),
            }
        })?;

        let props: Map<String, Value> =
            serde_json::from_str(&self.props).map_err(|e| StoreError::Corrupt {
                id: self.id.clone(),
                details: format!("invalid props: {}", e),
            })?;

        let mut block = Block::with_id(id, space_id, block_type, self.title);
        block.parent_id = parent_id;
        block.sort = self.sort;
        block.props = props;
        block.created_at = timestamp(self.created_at);
        block.updated_at = timestamp(self.updated_at);

        if let Some(path) = self.folder_path {
            block = block.with_folder_path(path);
        }

        Ok(block)
    }
}

fn parse_uuid(row_id: &str, value: &str) -> StoreResult<Uuid> {
    Uuid::parse_str(value).map_err(|e| StoreError::Corrupt {
        id: row_id.to_string(),
        details: format!("invalid UUID '{}': {}", value, e),
    })
}

fn timestamp(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_else(Utc::now)
}
