//! Data models for blockspace
//!
//! Defines the core data structures: `Block`, `BlockType`, and the request
//! types accepted by the hierarchy service (`NewBlock`, `BlockPatch`).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::BlockError;

/// Separator between folder path segments
pub const PATH_SEPARATOR: &str = "/";

/// The kind of a block
///
/// The set is closed; placement rules for every variant live in the
/// compatibility table (see [`crate::compat`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    /// Grouping container with a materialized display path
    Folder,
    /// A document; hosts text blocks
    Page,
    /// A paragraph of content; nests under pages and other text blocks
    Text,
    /// Standard operating procedure attached to a text block
    Sop,
    /// Generic leaf (no children)
    Image,
}

impl BlockType {
    /// All block types, in table order
    pub const ALL: [BlockType; 5] = [
        BlockType::Folder,
        BlockType::Page,
        BlockType::Text,
        BlockType::Sop,
        BlockType::Image,
    ];

    /// Stable lowercase tag used on the wire and in storage
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Folder => "folder",
            BlockType::Page => "page",
            BlockType::Text => "text",
            BlockType::Sop => "sop",
            BlockType::Image => "image",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockType {
    type Err = BlockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        if tag.is_empty() {
            return Err(BlockError::InvalidType("block type is required".to_string()));
        }

        BlockType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(tag))
            .ok_or_else(|| BlockError::InvalidType(format!("unknown block type '{}'", tag)))
    }
}

/// A node in the content hierarchy of a space
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Block {
    /// Unique identifier (assigned by the repository on create)
    pub id: Uuid,
    /// Owning space
    pub space_id: Uuid,
    /// Parent block; `None` places the block at the root of its space
    pub parent_id: Option<Uuid>,
    /// Kind of block (immutable after creation)
    #[serde(rename = "type")]
    pub block_type: BlockType,
    /// Display title
    pub title: String,
    /// Position among siblings sharing `(space_id, parent_id)`, ascending
    pub sort: i64,
    /// Materialized "/"-joined path, folders only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    folder_path: Option<String>,
    /// Free-form content and properties (e.g. opaque blob keys)
    #[serde(default)]
    pub props: Map<String, Value>,
    /// When this block was created
    pub created_at: DateTime<Utc>,
    /// When this block was last updated
    pub updated_at: DateTime<Utc>,
}

impl Block {
    /// Create an unsaved block at the root of `space_id`
    ///
    /// The ID stays nil until a repository assigns one.
    pub fn new(space_id: Uuid, block_type: BlockType, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::nil(),
            space_id,
            parent_id: None,
            block_type,
            title: title.into(),
            sort: 0,
            folder_path: None,
            props: Map::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a block with a specific ID (for loading from storage)
    pub fn with_id(id: Uuid, space_id: Uuid, block_type: BlockType, title: impl Into<String>) -> Self {
        Self {
            id,
            ..Self::new(space_id, block_type, title)
        }
    }

    /// Set the parent (builder style)
    pub fn under(mut self, parent_id: Uuid) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Attach a previously materialized folder path
    ///
    /// Storage backends use this when rehydrating persisted rows; the path is
    /// otherwise only ever derived by the hierarchy service.
    pub fn with_folder_path(mut self, path: impl Into<String>) -> Self {
        self.folder_path = Some(path.into());
        self
    }

    /// Materialized folder path (always `None` for non-folders)
    pub fn folder_path(&self) -> Option<&str> {
        if self.block_type != BlockType::Folder {
            return None;
        }
        self.folder_path.as_deref()
    }

    pub(crate) fn set_folder_path(&mut self, path: String) {
        self.folder_path = Some(path);
        self.updated_at = Utc::now();
    }

    /// Check whether the block sits at the root of its space
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Check whether the block is a folder
    pub fn is_folder(&self) -> bool {
        self.block_type == BlockType::Folder
    }

    /// Update the title
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.updated_at = Utc::now();
    }

    /// Replace all properties
    pub fn set_props(&mut self, props: Map<String, Value>) {
        self.props = props;
        self.updated_at = Utc::now();
    }
}

/// Derive the folder path for a folder titled `title`
///
/// `parent_path` is the materialized path of the parent when that parent is
/// itself a folder; `None` (or an empty path) means the folder is root-level
/// or hangs under a non-folder.
pub fn derive_folder_path(parent_path: Option<&str>, title: &str) -> String {
    match parent_path {
        Some(parent) if !parent.is_empty() => format!("{}{}{}", parent, PATH_SEPARATOR, title),
        _ => title.to_string(),
    }
}

/// Request to create a block
///
/// The type arrives as a raw tag so that a missing or unknown type is reported
/// by the service like any other validation failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewBlock {
    pub space_id: Uuid,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    #[serde(rename = "type", default)]
    pub block_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub props: Map<String, Value>,
}

impl NewBlock {
    /// Create a root-level request
    pub fn new(space_id: Uuid, block_type: impl ToString, title: impl Into<String>) -> Self {
        Self {
            space_id,
            parent_id: None,
            block_type: block_type.to_string(),
            title: title.into(),
            props: Map::new(),
        }
    }

    /// Place the new block under `parent_id`
    pub fn under(mut self, parent_id: Uuid) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Add a property
    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }
}

/// Partial update of a block's mutable fields
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BlockPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub props: Option<Map<String, Value>>,
}

impl BlockPatch {
    /// Patch that only changes the title
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            props: None,
        }
    }

    /// Check whether the patch changes nothing
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.props.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_type_round_trip_tags() {
        for t in BlockType::ALL {
            assert_eq!(t.as_str().parse::<BlockType>().unwrap(), t);
        }
        assert_eq!("SOP".parse::<BlockType>().unwrap(), BlockType::Sop);
    }

    #[test]
    fn test_block_type_empty_is_invalid() {
        let err = "".parse::<BlockType>().unwrap_err();
        assert!(matches!(err, BlockError::InvalidType(_)));
        assert!(err.to_string().contains("block type is required"));
    }

    #[test]
    fn test_block_type_unknown_is_invalid() {
        let err = "video".parse::<BlockType>().unwrap_err();
        assert!(err.to_string().contains("unknown block type 'video'"));
    }

    #[test]
    fn test_block_new() {
        let space = Uuid::new_v4();
        let block = Block::new(space, BlockType::Page, "Notes");
        assert!(block.id.is_nil());
        assert_eq!(block.space_id, space);
        assert!(block.is_root());
        assert_eq!(block.sort, 0);
        assert!(block.props.is_empty());
    }

    #[test]
    fn test_folder_path_only_for_folders() {
        let space = Uuid::new_v4();
        let folder = Block::new(space, BlockType::Folder, "Docs").with_folder_path("Docs");
        assert_eq!(folder.folder_path(), Some("Docs"));

        let page = Block::new(space, BlockType::Page, "Docs").with_folder_path("Docs");
        assert_eq!(page.folder_path(), None);
    }

    #[test]
    fn test_derive_folder_path() {
        assert_eq!(derive_folder_path(None, "Root"), "Root");
        assert_eq!(derive_folder_path(Some(""), "Root"), "Root");
        assert_eq!(derive_folder_path(Some("Root"), "Sub"), "Root/Sub");
        assert_eq!(
            derive_folder_path(Some("Folder1/Folder2/Folder3"), "DeepFolder"),
            "Folder1/Folder2/Folder3/DeepFolder"
        );
    }

    #[test]
    fn test_block_set_title_touches() {
        let mut block = Block::new(Uuid::new_v4(), BlockType::Text, "a");
        let before = block.updated_at;
        std::thread::sleep(std::time::Duration::from_millis(10));
        block.set_title("b");
        assert_eq!(block.title, "b");
        assert!(block.updated_at > before);
    }

    #[test]
    fn test_block_serialization() {
        let mut block = Block::with_id(Uuid::new_v4(), Uuid::new_v4(), BlockType::Folder, "Docs")
            .with_folder_path("Docs");
        block.props.insert("color".to_string(), Value::from("blue"));

        let json = serde_json::to_string(&block).unwrap();
        assert!(json.contains("\"type\":\"folder\""));
        assert!(json.contains("\"folder_path\":\"Docs\""));

        let back: Block = serde_json::from_str(&json).unwrap();
        assert_eq!(back, block);
    }

    #[test]
    fn test_new_block_builder() {
        let space = Uuid::new_v4();
        let parent = Uuid::new_v4();
        let req = NewBlock::new(space, BlockType::Image, "diagram")
            .under(parent)
            .with_prop("blob_key", "uploads/diagram.png");

        assert_eq!(req.block_type, "image");
        assert_eq!(req.parent_id, Some(parent));
        assert_eq!(req.props["blob_key"], "uploads/diagram.png");
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(BlockPatch::default().is_empty());
        assert!(!BlockPatch::title("x").is_empty());
    }
}
