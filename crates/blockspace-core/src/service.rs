//! Block hierarchy service
//!
//! Validates blocks against the compatibility table, allocates sibling
//! positions, maintains folder paths, and drives a [`BlockRepository`].
//!
//! Every mutating operation validates first and writes second: when an
//! operation fails validation the repository has seen reads only. The
//! service holds no state of its own, so one instance can be shared across
//! threads as long as the repository can.
//!
//! ## Folder paths
//!
//! `path(folder) = path(parent) + "/" + title` when the parent is a folder,
//! otherwise just the title. Moving or renaming a folder re-derives its own
//! path only; paths already materialized on its descendants are left as they
//! were.

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::compat::check_placement;
use crate::error::{BlockError, BlockResult};
use crate::models::{derive_folder_path, Block, BlockPatch, BlockType, NewBlock};
use crate::storage::{BlockRepository, StoreError};

/// Upper bound on the ancestor walk done when moving a container
const MAX_DEPTH: usize = 1024;

/// Orchestrates create, move, update, delete, and list over a repository
pub struct BlockService<R> {
    repo: R,
}

impl<R: BlockRepository> BlockService<R> {
    /// Create a service backed by `repo`
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Get the underlying repository
    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Validate and persist a new block
    ///
    /// Returns the stored block with its ID, `sort`, and (for folders)
    /// folder path filled in.
    pub fn create(&self, request: NewBlock) -> BlockResult<Block> {
        let block_type: BlockType = request.block_type.parse().map_err(rejected)?;

        if block_type.rules().requires_parent && request.parent_id.is_none() {
            return Err(rejected(BlockError::MissingParent { block_type }));
        }

        let parent = match request.parent_id {
            Some(parent_id) => Some(self.load_parent(request.space_id, parent_id)?),
            None => None,
        };
        check_placement(block_type, parent.as_ref().map(|p| p.block_type)).map_err(rejected)?;

        let mut block = Block::new(request.space_id, block_type, request.title);
        block.parent_id = request.parent_id;
        block.props = request.props;

        block.sort = self
            .repo
            .next_sort(block.space_id, block.parent_id)
            .map_err(|e| BlockError::from_store("allocate sort", e))?;

        if block.is_folder() {
            block.set_folder_path(folder_path_under(parent.as_ref(), &block.title));
        }

        block.id = self
            .repo
            .create(&block)
            .map_err(|e| BlockError::from_store("create block", e))?;

        info!(
            "Created {} block {} (sort={}, parent={:?})",
            block.block_type, block.id, block.sort, block.parent_id
        );
        Ok(block)
    }

    /// Load a single block
    pub fn get(&self, block_id: Uuid) -> BlockResult<Block> {
        self.repo
            .get(block_id)
            .map_err(|e| BlockError::from_store("load block", e))
    }

    /// Update a block's title and/or properties
    ///
    /// Renaming a folder re-derives its path from its current parent. A folder
    /// whose parent was deleted gets a root-level path.
    pub fn update(&self, block_id: Uuid, patch: BlockPatch) -> BlockResult<Block> {
        let mut block = self.get(block_id)?;

        if patch.is_empty() {
            return Ok(block);
        }

        if let Some(title) = patch.title {
            if title != block.title {
                block.set_title(title);

                if block.is_folder() {
                    let parent = self.current_parent(&block)?;
                    block.set_folder_path(folder_path_under(parent.as_ref(), &block.title));
                }
            }
        }

        if let Some(props) = patch.props {
            block.set_props(props);
        }

        self.repo
            .update(&block)
            .map_err(|e| BlockError::from_store("update block", e))?;

        info!("Updated block {}", block.id);
        Ok(block)
    }

    /// Delete a block from a space
    ///
    /// Children are not touched.
    pub fn delete(&self, space_id: Uuid, block_id: Uuid) -> BlockResult<()> {
        self.repo
            .delete(space_id, block_id)
            .map_err(|e| BlockError::from_store("delete block", e))?;

        info!("Deleted block {} from space {}", block_id, space_id);
        Ok(())
    }

    /// Move a block under `new_parent_id` (`None` = root of its space)
    ///
    /// Without `target_sort` the block is appended after its new siblings.
    /// With one it is placed at that position; when the parent does not
    /// change this is a plain reorder within the group.
    ///
    /// A folder's path is rewritten before its position changes. The two
    /// writes are not atomic with each other.
    pub fn move_block(
        &self,
        block_id: Uuid,
        new_parent_id: Option<Uuid>,
        target_sort: Option<i64>,
    ) -> BlockResult<()> {
        let mut block = self.get(block_id)?;
        let new_parent = self.validate_move(&block, new_parent_id)?;

        if block.is_folder() {
            block.set_folder_path(folder_path_under(new_parent.as_ref(), &block.title));
            self.repo
                .update(&block)
                .map_err(|e| BlockError::from_store("update folder path", e))?;
        }

        let result = match target_sort {
            None => self.repo.move_to_parent_append(block.id, new_parent_id),
            Some(sort) if new_parent_id == block.parent_id => {
                self.repo.reorder_within_group(block.id, sort)
            }
            Some(sort) => self.repo.move_to_parent_at_sort(block.id, new_parent_id, sort),
        };
        result.map_err(|e| BlockError::from_store("move block", e))?;

        info!(
            "Moved block {} to parent {:?} (sort={:?})",
            block.id, new_parent_id, target_sort
        );
        Ok(())
    }

    /// List blocks of a space at one level of the tree
    ///
    /// `block_type == None` lists every type; `parent_id == None` lists the
    /// root level. Order is whatever the repository returns.
    pub fn list(
        &self,
        space_id: Uuid,
        block_type: Option<BlockType>,
        parent_id: Option<Uuid>,
    ) -> BlockResult<Vec<Block>> {
        self.repo
            .list_by_space(space_id, block_type, parent_id)
            .map_err(|e| BlockError::from_store("list blocks", e))
    }

    // ==================== Validation ====================

    /// Load a parent and make sure it belongs to `space_id`
    fn load_parent(&self, space_id: Uuid, parent_id: Uuid) -> BlockResult<Block> {
        debug!("Looking up parent {}", parent_id);

        let parent = self.repo.get(parent_id).map_err(|e| match e {
            StoreError::Canceled => BlockError::OperationCanceled,
            source => rejected(BlockError::ParentLookupFailed { parent_id, source }),
        })?;

        if parent.space_id != space_id {
            return Err(rejected(BlockError::ParentLookupFailed {
                parent_id,
                source: StoreError::NotFound { id: parent_id },
            }));
        }

        Ok(parent)
    }

    /// Load the parent a block currently points at, if it still exists
    fn current_parent(&self, block: &Block) -> BlockResult<Option<Block>> {
        let Some(parent_id) = block.parent_id else {
            return Ok(None);
        };

        match self.repo.get(parent_id) {
            Ok(parent) => Ok(Some(parent)),
            Err(StoreError::NotFound { .. }) => {
                debug!("Parent {} of block {} no longer exists", parent_id, block.id);
                Ok(None)
            }
            Err(e) => Err(BlockError::from_store("load parent", e)),
        }
    }

    /// Check a move and return the loaded new parent
    fn validate_move(&self, block: &Block, new_parent_id: Option<Uuid>) -> BlockResult<Option<Block>> {
        let Some(parent_id) = new_parent_id else {
            check_placement(block.block_type, None).map_err(rejected)?;
            return Ok(None);
        };

        if parent_id == block.id {
            return Err(rejected(BlockError::InvalidChildForParent {
                child: block.block_type,
                parent: "itself".to_string(),
            }));
        }

        let parent = self.load_parent(block.space_id, parent_id)?;

        if check_placement(block.block_type, Some(parent.block_type)).is_err() {
            return Err(rejected(BlockError::InvalidChildForParent {
                child: block.block_type,
                parent: parent.block_type.to_string(),
            }));
        }

        self.ensure_not_ancestor(block, &parent)?;
        Ok(Some(parent))
    }

    /// Fail if `block` is an ancestor of `new_parent`
    fn ensure_not_ancestor(&self, block: &Block, new_parent: &Block) -> BlockResult<()> {
        // Leaves have no descendants
        if !block.block_type.rules().hosts_children {
            return Ok(());
        }

        let mut cursor = new_parent.parent_id;
        let mut depth = 0;

        while let Some(ancestor_id) = cursor {
            if ancestor_id == block.id {
                return Err(rejected(BlockError::InvalidChildForParent {
                    child: block.block_type,
                    parent: format!("its own descendant {}", new_parent.id),
                }));
            }

            depth += 1;
            if depth >= MAX_DEPTH {
                warn!("Ancestor walk from {} exceeded {} levels", new_parent.id, MAX_DEPTH);
                return Err(rejected(BlockError::InvalidChildForParent {
                    child: block.block_type,
                    parent: format!("a block nested deeper than {} levels", MAX_DEPTH),
                }));
            }

            cursor = match self.repo.get(ancestor_id) {
                Ok(ancestor) => ancestor.parent_id,
                // Orphaned chain: nothing above can be the moved block
                Err(StoreError::NotFound { .. }) => None,
                Err(e) => return Err(BlockError::from_store("load ancestor", e)),
            };
        }

        Ok(())
    }
}

/// Folder path for a folder titled `title` placed under `parent`
fn folder_path_under(parent: Option<&Block>, title: &str) -> String {
    derive_folder_path(parent.and_then(Block::folder_path), title)
}

fn rejected(error: BlockError) -> BlockError {
    warn!("Rejected: {}", error);
    error
}
