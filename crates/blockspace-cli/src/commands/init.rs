//! Init command handler

use anyhow::{Context, Result};
use uuid::Uuid;

use blockspace_core::{Config, SqliteBlockRepository};

use crate::output::Output;

/// Create a new space and store it as the default
pub fn run(mut config: Config, force: bool, output: &Output) -> Result<()> {
    if let (Some(space), false) = (config.default_space, force) {
        if output.is_json() {
            println!(
                "{}",
                serde_json::json!({"space_id": space, "is_new": false})
            );
        } else if output.is_quiet() {
            println!("{}", space);
        } else {
            println!("Already initialized.");
            println!("Default space: {}", space);
            println!();
            println!("To create another space, run: blockspace init --force");
        }
        return Ok(());
    }

    // Create the database up front so later commands find it
    SqliteBlockRepository::open(&config).context("Failed to create block database")?;

    let space = Uuid::new_v4();
    config.default_space = Some(space);
    config.save().context("Failed to save configuration")?;

    if output.is_json() {
        println!(
            "{}",
            serde_json::json!({"space_id": space, "is_new": true})
        );
    } else if output.is_quiet() {
        println!("{}", space);
    } else {
        println!("Created new space: {}", space);
        println!();
        println!("Database:    {}", config.sqlite_path().display());
        println!("Config file: {}", Config::config_file_path().display());
    }

    Ok(())
}
