//! Status command handler

use anyhow::{Context, Result};
use uuid::Uuid;

use blockspace_core::{Config, SqliteBlockRepository};

use crate::output::{Output, OutputFormat};

/// Show status information
pub fn show(config: &Config, space: Option<Uuid>, output: &Output) -> Result<()> {
    let space = space.or(config.default_space);
    let db_path = config.sqlite_path();
    let database_exists = db_path.exists();

    let counts = match (space, database_exists) {
        (Some(space), true) => {
            let repo =
                SqliteBlockRepository::open(config).context("Failed to open block database")?;
            repo.count_by_type(space)
                .context("Failed to count blocks")?
        }
        _ => Vec::new(),
    };
    let total: i64 = counts.iter().map(|(_, n)| n).sum();
    let database_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    match output.format {
        OutputFormat::Json => {
            let by_type: serde_json::Map<String, serde_json::Value> = counts
                .iter()
                .map(|(t, n)| (t.to_string(), serde_json::Value::from(*n)))
                .collect();
            println!(
                "{}",
                serde_json::json!({
                    "space_id": space,
                    "storage": {
                        "database": db_path,
                        "database_exists": database_exists,
                        "database_size": database_size
                    },
                    "counts": {
                        "total": total,
                        "by_type": by_type
                    }
                })
            );
        }
        OutputFormat::Quiet => {
            if let Some(space) = space {
                println!("{}", space);
            }
        }
        OutputFormat::Human => {
            println!("Blockspace Status");
            println!("=================");
            println!();
            match space {
                Some(space) => println!("Space: {}", space),
                None => println!("Space: (not set, run `blockspace init`)"),
            }
            println!();
            println!("Storage:");
            println!("  Location: {}", db_path.display());
            if database_exists {
                println!("  Size:     {}", human_size(database_size));
            } else {
                println!("  Size:     (not created)");
            }
            println!();
            println!("Contents:");
            for (block_type, count) in &counts {
                println!("  {:<7} {}", format!("{}:", block_type), count);
            }
            println!("  Total:  {}", total);
        }
    }

    Ok(())
}

fn human_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
