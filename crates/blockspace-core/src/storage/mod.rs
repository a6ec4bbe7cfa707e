//! Storage layer
//!
//! The hierarchy service never touches a database directly; it drives a
//! [`BlockRepository`]. This module defines that collaborator interface and
//! ships the SQLite implementation.
//!
//! ## Contract
//!
//! - `get` and the positional moves report a missing block as
//!   [`StoreError::NotFound`].
//! - `next_sort` must be atomic per `(space_id, parent_id)` group: two
//!   concurrent calls never return the same value.
//! - `delete` is scoped by space and never cascades.
//! - `list_by_space` returns siblings in ascending `sort` order.

pub mod error;
pub mod schema;
pub mod sqlite;

use std::sync::Arc;

use uuid::Uuid;

use crate::models::{Block, BlockType};

pub use error::{StoreError, StoreResult};
pub use schema::{init_schema, needs_init, SCHEMA_VERSION};
pub use sqlite::{CancelHandle, SqliteBlockRepository};

/// Persistence collaborator for blocks and sibling ordering
pub trait BlockRepository: Send + Sync {
    /// Persist a new block and return the ID it was stored under
    ///
    /// A nil `block.id` asks the repository to assign one.
    fn create(&self, block: &Block) -> StoreResult<Uuid>;

    /// Load a block by ID
    fn get(&self, id: Uuid) -> StoreResult<Block>;

    /// Write a block's content fields (title, folder path, props)
    fn update(&self, block: &Block) -> StoreResult<()>;

    /// Delete a block within a space
    fn delete(&self, space_id: Uuid, block_id: Uuid) -> StoreResult<()>;

    /// Allocate the next sibling position for a group (`None` = root group)
    fn next_sort(&self, space_id: Uuid, parent_id: Option<Uuid>) -> StoreResult<i64>;

    /// Re-parent a block, placing it after its new siblings
    fn move_to_parent_append(&self, block_id: Uuid, new_parent_id: Option<Uuid>)
        -> StoreResult<()>;

    /// Re-parent a block at an explicit position
    fn move_to_parent_at_sort(
        &self,
        block_id: Uuid,
        new_parent_id: Option<Uuid>,
        sort: i64,
    ) -> StoreResult<()>;

    /// Reposition a block among its current siblings
    fn reorder_within_group(&self, block_id: Uuid, sort: i64) -> StoreResult<()>;

    /// List blocks of a space, optionally by type, at one level of the tree
    ///
    /// `parent_id == None` lists root-level blocks only.
    fn list_by_space(
        &self,
        space_id: Uuid,
        block_type: Option<BlockType>,
        parent_id: Option<Uuid>,
    ) -> StoreResult<Vec<Block>>;
}

impl<R: BlockRepository + ?Sized> BlockRepository for Arc<R> {
    fn create(&self, block: &Block) -> StoreResult<Uuid> {
        (**self).create(block)
    }

    fn get(&self, id: Uuid) -> StoreResult<Block> {
        (**self).get(id)
    }

    fn update(&self, block: &Block) -> StoreResult<()> {
        (**self).update(block)
    }

    fn delete(&self, space_id: Uuid, block_id: Uuid) -> StoreResult<()> {
        (**self).delete(space_id, block_id)
    }

    fn next_sort(&self, space_id: Uuid, parent_id: Option<Uuid>) -> StoreResult<i64> {
        (**self).next_sort(space_id, parent_id)
    }

    fn move_to_parent_append(
        &self,
        block_id: Uuid,
        new_parent_id: Option<Uuid>,
    ) -> StoreResult<()> {
        (**self).move_to_parent_append(block_id, new_parent_id)
    }

    fn move_to_parent_at_sort(
        &self,
        block_id: Uuid,
        new_parent_id: Option<Uuid>,
        sort: i64,
    ) -> StoreResult<()> {
        (**self).move_to_parent_at_sort(block_id, new_parent_id, sort)
    }

    fn reorder_within_group(&self, block_id: Uuid, sort: i64) -> StoreResult<()> {
        (**self).reorder_within_group(block_id, sort)
    }

    fn list_by_space(
        &self,
        space_id: Uuid,
        block_type: Option<BlockType>,
        parent_id: Option<Uuid>,
    ) -> StoreResult<Vec<Block>> {
        (**self).list_by_space(space_id, block_type, parent_id)
    }
}
