//! CLI surface: argument definitions and command handlers.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod hook;
pub mod recovery;
pub mod setup;

#[derive(Debug, Parser)]
#[command(
    name = "rmguard",
    version,
    about = "Deletion guard for coding agents: intercepts rm-family commands and redirects them into a recoverable trash store"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run as the host runtime's PreToolUse hook (reads the payload on stdin)
    Hook,
    /// List recoverable files
    List {
        /// Emit the listing as JSON
        #[arg(long)]
        json: bool,
    },
    /// Restore a file or directory from the trash store
    Recover {
        /// Recovery id, or a unique prefix of one
        id: String,
        /// Restore somewhere other than the original location
        #[arg(long = "to", value_name = "PATH")]
        to: Option<PathBuf>,
        /// Overwrite an existing destination
        #[arg(long)]
        force: bool,
    },
    /// Permanently delete one trash slot
    Purge {
        /// Recovery id, or a unique prefix of one
        id: String,
    },
    /// Permanently delete every slot older than a threshold
    PurgeAll {
        /// Age threshold, e.g. 7d, 24h, 30m
        #[arg(long = "older-than", value_name = "DURATION")]
        older_than: String,
    },
    /// Register the hook in the host settings file
    Install,
    /// Remove the hook from the host settings file
    Uninstall,
    /// Show hook registration state
    Status,
}
