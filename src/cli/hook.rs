//! The `hook` subcommand: one interception round-trip with the host.

use std::io::Read;

use anyhow::Result;
use rmguard_core::{GuardConfig, GuardEnv, evaluate, extract_command};

/// Read the payload from stdin, evaluate the command, and emit exactly one
/// decision object on stdout. Per-path outcomes go to stderr where the
/// host shows them in verbose mode.
///
/// Anything that prevents a trustworthy evaluation - unreadable input, an
/// empty command, unparseable shell syntax - exits with status 2, which
/// the host treats as an unconditional block.
pub fn handle_hook() -> Result<()> {
    let config = GuardConfig::default();
    let env = GuardEnv::from_process_env();

    let mut stdin_data = String::new();
    if std::io::stdin().read_to_string(&mut stdin_data).is_err() {
        block_with_feedback("Failed to read input");
    }
    let stdin_data = stdin_data.trim();
    if stdin_data.is_empty() {
        block_with_feedback("No input received");
    }

    let command = extract_command(stdin_data);
    if command.is_empty() {
        block_with_feedback("Empty command");
    }

    match evaluate(&command, &config, &env) {
        Ok(evaluation) => {
            for note in &evaluation.notes {
                eprintln!("{note}");
            }
            println!("{}", serde_json::to_string(&evaluation.response)?);
            Ok(())
        }
        Err(err) => block_with_feedback(&err.to_string()),
    }
}

/// Blocking error: stderr is shown to the agent, exit status 2 blocks the
/// command unconditionally.
fn block_with_feedback(reason: &str) -> ! {
    eprintln!("BLOCKED: {reason}");
    std::process::exit(2);
}
