//! Blockspace CLI
//!
//! Command-line interface for Blockspace - typed block hierarchies.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use blockspace_core::{BlockService, Config, SqliteBlockRepository};

mod commands;
mod logging;
mod output;

use commands::Service;
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "blockspace")]
#[command(about = "Blockspace - Typed block hierarchies")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Space to operate on (defaults to the configured space)
    #[arg(long, global = true)]
    space: Option<Uuid>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new space and make it the default
    Init {
        /// Replace an already configured default space
        #[arg(long)]
        force: bool,
    },
    /// Manage blocks
    Block {
        #[command(subcommand)]
        command: BlockCommands,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Show status (space, database, block counts)
    Status,
}

#[derive(Subcommand)]
enum BlockCommands {
    /// Create a new block
    #[command(alias = "add")]
    Create {
        /// Block type (folder, page, text, sop, image)
        block_type: String,
        /// Block title
        title: String,
        /// Parent block ID (omit for the root level)
        #[arg(short, long)]
        parent: Option<Uuid>,
        /// Property as key=value (repeatable)
        #[arg(long = "prop")]
        props: Vec<String>,
    },
    /// List blocks at one level of the tree
    #[command(alias = "ls")]
    List {
        /// Only list blocks of this type
        #[arg(short = 't', long = "type")]
        block_type: Option<String>,
        /// List children of this block (root level if omitted)
        #[arg(short, long)]
        parent: Option<Uuid>,
    },
    /// Show the whole space as a tree
    Tree,
    /// Show block details
    Show {
        /// Block ID
        id: Uuid,
    },
    /// Move a block to a new parent and/or position
    #[command(alias = "mv")]
    Move {
        /// Block ID
        id: Uuid,
        /// New parent block ID
        #[arg(short, long, conflicts_with = "root")]
        parent: Option<Uuid>,
        /// Move to the root level
        #[arg(long)]
        root: bool,
        /// Target position among the new siblings (appends if omitted)
        #[arg(short, long)]
        sort: Option<i64>,
    },
    /// Rename a block
    Rename {
        /// Block ID
        id: Uuid,
        /// New title
        title: String,
    },
    /// Delete a block (children are kept)
    #[command(alias = "rm")]
    Delete {
        /// Block ID
        id: Uuid,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, default_space, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    let config = Config::load().context("Failed to load configuration")?;
    logging::init(&config, cli.verbose);

    match cli.command {
        Commands::Init { force } => commands::init::run(config, force, &output),
        Commands::Config { command } => handle_config_command(command, &output),
        Commands::Status => commands::status::show(&config, cli.space, &output),
        Commands::Block { command } => {
            let repo =
                SqliteBlockRepository::open(&config).context("Failed to open block database")?;
            let service = BlockService::new(repo);
            handle_block_command(command, &service, &config, cli.space, &output)
        }
    }
}

fn handle_block_command(
    command: BlockCommands,
    service: &Service,
    config: &Config,
    space: Option<Uuid>,
    output: &Output,
) -> Result<()> {
    use commands::block;

    match command {
        BlockCommands::Create {
            block_type,
            title,
            parent,
            props,
        } => {
            let space = commands::resolve_space(space, config)?;
            block::create(service, space, block_type, title, parent, props, output)
        }
        BlockCommands::List { block_type, parent } => {
            let space = commands::resolve_space(space, config)?;
            block::list(service, space, block_type, parent, output)
        }
        BlockCommands::Tree => {
            let space = commands::resolve_space(space, config)?;
            block::tree(service, space, output)
        }
        BlockCommands::Show { id } => block::show(service, id, output),
        BlockCommands::Move {
            id,
            parent,
            root,
            sort,
        } => block::move_block(service, id, parent, root, sort, output),
        BlockCommands::Rename { id, title } => block::rename(service, id, title, output),
        BlockCommands::Delete { id, yes } => {
            let space = commands::resolve_space(space, config)?;
            block::delete(service, space, id, yes, output)
        }
    }
}

fn handle_config_command(command: Option<ConfigCommands>, output: &Output) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(output),
        Some(ConfigCommands::Set { key, value }) => commands::config::set(key, value, output),
    }
}
