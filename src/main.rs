//! rmguard - deletion guard for coding agents
//!
//! Thin binary entry point that delegates to modular CLI handlers.

use anyhow::Result;
use clap::Parser;

mod cli;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    initialize_tracing();

    let args = Cli::parse();

    match args.command {
        Commands::Hook => cli::hook::handle_hook(),
        Commands::List { json } => cli::recovery::handle_list(json),
        Commands::Recover { id, to, force } => cli::recovery::handle_recover(&id, to, force),
        Commands::Purge { id } => cli::recovery::handle_purge(&id),
        Commands::PurgeAll { older_than } => cli::recovery::handle_purge_all(&older_than),
        Commands::Install => cli::setup::handle_install(),
        Commands::Uninstall => cli::setup::handle_uninstall(),
        Commands::Status => cli::setup::handle_status(),
    }
}

/// Honor `RUST_LOG` when set. Diagnostics go to stderr so the hook's
/// stdout stays a clean JSON channel for the host runtime.
fn initialize_tracing() {
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }
}
