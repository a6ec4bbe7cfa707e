//! Block command handlers

use anyhow::{bail, Context, Result};
use serde_json::Value;
use uuid::Uuid;

use blockspace_core::{BlockPatch, BlockType, NewBlock};

use super::{confirm, Service};
use crate::output::{short_id, Output, TreeNode};

/// Create a new block
pub fn create(
    service: &Service,
    space: Uuid,
    block_type: String,
    title: String,
    parent: Option<Uuid>,
    props: Vec<String>,
    output: &Output,
) -> Result<()> {
    let mut request = NewBlock::new(space, block_type, title);
    request.parent_id = parent;
    for prop in &props {
        let (key, value) = parse_prop(prop)?;
        request.props.insert(key, value);
    }

    let block = service.create(request).context("Failed to create block")?;

    output.success(&format!("Created {} block: {}", block.block_type, block.id));
    output.print_block(&block);

    Ok(())
}

/// List one level of the tree, optionally filtered by type
pub fn list(
    service: &Service,
    space: Uuid,
    block_type: Option<String>,
    parent: Option<Uuid>,
    output: &Output,
) -> Result<()> {
    let block_type = block_type
        .map(|t| t.parse::<BlockType>())
        .transpose()?;

    let blocks = service.list(space, block_type, parent)?;

    output.print_blocks(&blocks);
    Ok(())
}

/// Show the whole space as a tree
pub fn tree(service: &Service, space: Uuid, output: &Output) -> Result<()> {
    let nodes = build_tree(service, space, None)?;
    output.print_tree(&nodes);
    Ok(())
}

/// Show a single block
pub fn show(service: &Service, id: Uuid, output: &Output) -> Result<()> {
    let block = service.get(id)?;
    output.print_block(&block);
    Ok(())
}

/// Move a block
///
/// Without `--parent` or `--root` the block stays under its current parent,
/// which with `--sort` is a plain reorder.
pub fn move_block(
    service: &Service,
    id: Uuid,
    parent: Option<Uuid>,
    root: bool,
    sort: Option<i64>,
    output: &Output,
) -> Result<()> {
    let new_parent = if root {
        None
    } else if parent.is_some() {
        parent
    } else {
        if sort.is_none() {
            bail!("Nothing to do. Pass --parent <ID>, --root, or --sort <N>.");
        }
        service.get(id)?.parent_id
    };

    service
        .move_block(id, new_parent, sort)
        .context("Failed to move block")?;

    let block = service.get(id)?;
    output.success(&format!("Moved block: {}", block.id));
    output.print_block(&block);

    Ok(())
}

/// Rename a block
pub fn rename(service: &Service, id: Uuid, title: String, output: &Output) -> Result<()> {
    let block = service
        .update(id, BlockPatch::title(title))
        .context("Failed to rename block")?;

    output.success("Block renamed");
    output.print_block(&block);

    Ok(())
}

/// Delete a block
pub fn delete(service: &Service, space: Uuid, id: Uuid, yes: bool, output: &Output) -> Result<()> {
    let block = service.get(id)?;

    if !yes && output.should_prompt() {
        println!("Delete {} block: {} - {}", block.block_type, short_id(&block), block.title);
        if block.block_type.rules().hosts_children
            && !service.list(space, None, Some(id))?.is_empty()
        {
            println!("Its children will be left in place without a parent.");
        }
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    service
        .delete(space, id)
        .context("Failed to delete block")?;

    output.success(&format!("Deleted block: {}", id));

    Ok(())
}

/// Load the subtree under `parent` level by level
fn build_tree(service: &Service, space: Uuid, parent: Option<Uuid>) -> Result<Vec<TreeNode>> {
    service
        .list(space, None, parent)?
        .into_iter()
        .map(|block| {
            let children = if block.block_type.rules().hosts_children {
                build_tree(service, space, Some(block.id))?
            } else {
                Vec::new()
            };
            Ok(TreeNode { block, children })
        })
        .collect()
}

/// Parse a `key=value` property
///
/// Values that parse as JSON (numbers, booleans, arrays...) are stored as
/// such; anything else is kept as a string.
fn parse_prop(raw: &str) -> Result<(String, Value)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("Invalid property '{}'. Use key=value.", raw);
    };

    let key = key.trim();
    if key.is_empty() {
        bail!("Invalid property '{}': key is empty.", raw);
    }

    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}
