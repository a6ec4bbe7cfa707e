//! Blockspace Core Library
//!
//! This crate provides the block hierarchy behind Blockspace: typed content
//! blocks (folders, pages, text, SOPs, images) arranged in a tree per
//! space, with ordered siblings and materialized folder paths.
//!
//! # Architecture
//!
//! - **BlockService**: Validation and orchestration, no state of its own
//! - **BlockRepository**: Persistence collaborator (SQLite by default)
//!
//! # Quick Start
//!
//! ```text
//! let repo = SqliteBlockRepository::open(&config)?;
//! let service = BlockService::new(repo);
//!
//! let folder = service.create(NewBlock::new(space, BlockType::Folder, "Docs"))?;
//! let page = service.create(NewBlock::new(space, BlockType::Page, "Intro").under(folder.id))?;
//!
//! let children = service.list(space, None, Some(folder.id))?;
//! ```
//!
//! # Modules
//!
//! - `service`: Hierarchy operations (main entry point)
//! - `compat`: Which block types may be placed under which
//! - `models`: Block data structures
//! - `storage`: Repository interface and SQLite implementation
//! - `config`: Application configuration

pub mod compat;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod storage;

pub use compat::{check_placement, is_valid_child, Compatibility, Placement};
pub use config::Config;
pub use error::{BlockError, BlockResult};
pub use models::{derive_folder_path, Block, BlockPatch, BlockType, NewBlock};
pub use service::BlockService;
pub use storage::{BlockRepository, CancelHandle, SqliteBlockRepository, StoreError, StoreResult};
