//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use blockspace_core::Block;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// A block with its children, as shown by `block tree`
#[derive(Debug, Serialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub block: Block,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Check if output is JSON
    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print a single block
    pub fn print_block(&self, block: &Block) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:          {}", block.id);
                println!("Type:        {}", block.block_type);
                println!("Title:       {}", block.title);
                println!(
                    "Parent:      {}",
                    block
                        .parent_id
                        .map(|p| p.to_string())
                        .unwrap_or_else(|| "(root)".to_string())
                );
                println!("Sort:        {}", block.sort);
                if let Some(path) = block.folder_path() {
                    println!("Path:        {}", path);
                }
                if !block.props.is_empty() {
                    println!("Props:");
                    for (key, value) in &block.props {
                        println!("  {} = {}", key, value);
                    }
                }
                println!("Space:       {}", block.space_id);
                println!("Created:     {}", block.created_at.format("%Y-%m-%d %H:%M"));
                println!("Updated:     {}", block.updated_at.format("%Y-%m-%d %H:%M"));
            }
            OutputFormat::Json => print_json(block),
            OutputFormat::Quiet => {
                println!("{}", block.id);
            }
        }
    }

    /// Print one level of blocks
    pub fn print_blocks(&self, blocks: &[Block]) {
        match self.format {
            OutputFormat::Human => {
                if blocks.is_empty() {
                    println!("No blocks found.");
                    return;
                }
                for block in blocks {
                    println!(
                        "{} | {:<6} | {:>4} | {}",
                        short_id(block),
                        block.block_type,
                        block.sort,
                        truncate(block.folder_path().unwrap_or(&block.title), 50)
                    );
                }
                println!("\n{} block(s)", blocks.len());
            }
            OutputFormat::Json => print_json(&blocks),
            OutputFormat::Quiet => {
                for block in blocks {
                    println!("{}", block.id);
                }
            }
        }
    }

    /// Print a block tree
    pub fn print_tree(&self, nodes: &[TreeNode]) {
        match self.format {
            OutputFormat::Human => {
                if nodes.is_empty() {
                    println!("Space is empty.");
                    return;
                }
                for node in nodes {
                    print_tree_node(node, 0);
                }
            }
            OutputFormat::Json => print_json(&nodes),
            OutputFormat::Quiet => {
                let mut stack: Vec<&TreeNode> = nodes.iter().rev().collect();
                while let Some(node) = stack.pop() {
                    println!("{}", node.block.id);
                    stack.extend(node.children.iter().rev());
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }
}

fn print_tree_node(node: &TreeNode, depth: usize) {
    println!(
        "{}{} [{}] ({})",
        "  ".repeat(depth),
        node.block.title,
        node.block.block_type,
        short_id(&node.block)
    );
    for child in &node.children {
        print_tree_node(child, depth + 1);
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to encode output: {}", e),
    }
}

/// First 8 characters of a block ID
pub fn short_id(block: &Block) -> String {
    block.id.to_string()[..8].to_string()
}

/// Truncate a string to max length, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}
