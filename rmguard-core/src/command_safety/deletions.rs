//! Extraction of deletion invocations from parsed shell commands.
//!
//! Wrapper commands (`sudo`, `env`, `nice`, ...) and leading `KEY=VALUE`
//! assignments are stripped until the real verb surfaces; the verb is
//! matched by base name against the configured deletion set; option words
//! are ignored unless a bare `--` has marked the end of options.

use crate::config::{GuardConfig, base_name};
use crate::error::GuardError;

use super::shell_parser::{self, CommandWords};

/// One shell command identified as destructive, with its extracted target
/// arguments in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionInvocation {
    /// The deletion verb, path stripped (`rm`, `unlink`, ...).
    pub verb: String,
    /// Target arguments as written, before glob expansion.
    pub targets: Vec<String>,
}

/// Parse `command` and return every deletion invocation found in it.
///
/// A parse failure is returned as-is: the caller must treat it as a hard
/// block, never as "no deletions found".
pub fn find_deletions(
    command: &str,
    config: &GuardConfig,
) -> Result<Vec<DeletionInvocation>, GuardError> {
    let commands = shell_parser::parse_command_words(command)?;
    Ok(commands
        .into_iter()
        .filter_map(|words| deletion_from_words(words, config))
        .collect())
}

/// Classify one command's words as a deletion invocation, or `None` when
/// the command does not delete or names no targets.
fn deletion_from_words(words: CommandWords, config: &GuardConfig) -> Option<DeletionInvocation> {
    let words = skip_prefixes(words, config);

    let verb = match words.first() {
        Some(Some(word)) => base_name(word).to_string(),
        // An opaque verb cannot be matched against the deletion set.
        _ => return None,
    };

    if !config.deletion_verbs.contains(&verb) {
        return None;
    }

    let targets = parse_targets(&words[1..]);
    if targets.is_empty() {
        return None;
    }

    Some(DeletionInvocation { verb, targets })
}

/// Drop leading wrapper commands, `KEY=VALUE` assignments, and opaque
/// placeholders until the first real word.
fn skip_prefixes(mut words: CommandWords, config: &GuardConfig) -> CommandWords {
    while let Some(first) = words.first() {
        match first {
            None => {
                words.remove(0);
            }
            Some(word) if word.contains('=') && !word.starts_with('-') => {
                words.remove(0);
            }
            Some(word) if config.is_prefix_command(word) => {
                words.remove(0);
            }
            _ => break,
        }
    }
    words
}

/// Extract target arguments: everything that is not an option word, plus
/// everything after a bare `--` regardless of leading dashes.
fn parse_targets(args: &[Option<String>]) -> Vec<String> {
    let mut targets = Vec::new();
    let mut end_of_options = false;

    for arg in args {
        let arg = match arg {
            Some(arg) => arg,
            // Opaque placeholders are never targets.
            None => continue,
        };

        if end_of_options {
            targets.push(arg.clone());
        } else if arg == "--" {
            end_of_options = true;
        } else if !arg.starts_with('-') {
            targets.push(arg.clone());
        }
    }

    targets
}
