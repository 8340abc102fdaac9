//! Command safety analysis for deletion interception.
//!
//! Turns a raw shell command string into the set of concrete filesystem
//! paths it would delete:
//!
//! 1. [`shell_parser`] builds a bash syntax tree and extracts the literal
//!    words of every simple command, failing closed on unparseable input.
//! 2. [`deletions`] strips wrapper prefixes, matches deletion verbs, and
//!    collects target arguments into [`DeletionInvocation`]s.
//! 3. [`expansion`] expands wildcard targets against the filesystem.

pub mod deletions;
pub mod expansion;
pub mod shell_parser;

pub use deletions::{DeletionInvocation, find_deletions};
pub use expansion::expand_targets;

use crate::config::GuardConfig;
use crate::error::GuardError;

/// Parse `command` and return every concrete deletion target it names,
/// wildcards expanded, in command order.
pub fn deletion_targets(command: &str, config: &GuardConfig) -> Result<Vec<String>, GuardError> {
    let invocations = find_deletions(command, config)?;
    let raw_targets: Vec<String> = invocations
        .into_iter()
        .flat_map(|invocation| invocation.targets)
        .collect();
    Ok(expand_targets(&raw_targets))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_are_collected_across_invocations() {
        let config = GuardConfig::default();
        let targets = deletion_targets("rm one.txt; unlink two.txt", &config).unwrap();
        assert_eq!(targets, vec!["one.txt", "two.txt"]);
    }

    #[test]
    fn non_deletion_command_has_no_targets() {
        let config = GuardConfig::default();
        assert!(deletion_targets("ls -la", &config).unwrap().is_empty());
    }
}
