//! # Warden CLI Module
//!
//! This module implements the CLI interface for Warden.
//!
//! ## Available Commands
//!
//! - `init` - Initialize a new empty store
//! - `seed` - Load a snapshot file into the store
//! - `show` - Show the decoded status of a stored entity
//! - `inspect` - Decide capabilities and transitions from a snapshot file
//! - `transition` - Apply an optimistic phase change against the store

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use warden_core::WardenError;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Warden - Capability & Workflow Decision Engine
///
/// Every access decision is an explicit matrix row; every phase change runs
/// through the same validators the tests pin down. The CLI only moves
/// snapshots in and decisions out.
#[derive(Parser, Debug)]
#[command(name = "warden")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the decision store
    #[arg(short = 'D', long, global = true, default_value = "warden.db")]
    pub database: PathBuf,

    /// Output in JSON format (for programmatic access)
    #[arg(long = "json", global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new empty store
    Init {
        /// Force initialization even if the store exists
        #[arg(short, long)]
        force: bool,
    },

    /// Load a snapshot file into the store
    Seed {
        /// Path to the snapshot file (JSON)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Show the decoded status of a stored entity
    Show {
        /// Entity id
        #[arg(short, long)]
        entity: u64,
    },

    /// Decide capabilities and legal transitions from a snapshot file
    Inspect {
        /// Path to the snapshot file (JSON)
        #[arg(short, long)]
        file: PathBuf,

        /// Viewer principal (numeric id or sysmail key)
        #[arg(short = 'u', long)]
        viewer: String,

        /// Evaluate the viewer as a platform admin
        #[arg(long)]
        admin: bool,

        /// Entity id to decide for; omit to decide for the project itself
        #[arg(short, long)]
        entity: Option<u64>,
    },

    /// Apply a phase change against the store
    Transition {
        /// Entity id
        #[arg(short, long)]
        entity: u64,

        /// Viewer principal (numeric id or sysmail key)
        #[arg(short = 'u', long)]
        viewer: String,

        /// Evaluate the viewer as a platform admin
        #[arg(long)]
        admin: bool,

        /// The packed status the caller last read
        #[arg(long)]
        expected: u32,

        /// The packed status to store
        #[arg(long)]
        target: u32,

        /// Live post count (project activation input)
        #[arg(long, default_value_t = 0)]
        posts: u32,

        /// Live event count (project activation input)
        #[arg(long, default_value_t = 0)]
        events: u32,

        /// Current member count (project activation input)
        #[arg(long, default_value_t = 0)]
        members: u32,

        /// Associated project count (project activation input)
        #[arg(long, default_value_t = 0)]
        associations: u32,

        /// Live cover image count (project activation input)
        #[arg(long, default_value_t = 0)]
        cover_images: u32,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), WardenError> {
    let json_mode = cli.json_mode;

    match cli.command {
        Commands::Init { force } => cmd_init(&cli.database, force),
        Commands::Seed { file } => cmd_seed(&cli.database, json_mode, &file),
        Commands::Show { entity } => cmd_show(&cli.database, json_mode, entity),
        Commands::Inspect {
            file,
            viewer,
            admin,
            entity,
        } => cmd_inspect(json_mode, &file, &viewer, admin, entity),
        Commands::Transition {
            entity,
            viewer,
            admin,
            expected,
            target,
            posts,
            events,
            members,
            associations,
            cover_images,
        } => {
            let counts = warden_core::ContentCounts {
                posts,
                events,
                members,
                associations,
                cover_images,
            };
            cmd_transition(
                &cli.database,
                json_mode,
                entity,
                &viewer,
                admin,
                expected,
                target,
                &counts,
            )
        }
    }
}
