//! Command handlers

pub mod block;
pub mod config;
pub mod init;
pub mod status;

use std::io::{self, IsTerminal, Write};

use anyhow::{bail, Result};
use uuid::Uuid;

use blockspace_core::{BlockService, Config, SqliteBlockRepository};

/// Service type every block command runs against
pub type Service = BlockService<SqliteBlockRepository>;

/// Pick the space from `--space`, falling back to the configured default
pub fn resolve_space(space: Option<Uuid>, config: &Config) -> Result<Uuid> {
    match space.or(config.default_space) {
        Some(space) => Ok(space),
        None => bail!(
            "No space selected.\n\
             Run `blockspace init` to create one, or pass --space <UUID>."
        ),
    }
}

/// Ask a yes/no question on stdin (defaults to no)
pub fn confirm(prompt: &str) -> Result<bool> {
    if !io::stdin().is_terminal() {
        return Ok(false);
    }

    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}
