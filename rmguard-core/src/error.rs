use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while intercepting deletions or operating the trash store.
///
/// Parsing and classification failures are never downgraded to "allow":
/// callers translate them into a blocking decision. Recovery-side errors are
/// surfaced to the operator with the specific reason and never retried.
#[derive(Debug, Error)]
pub enum GuardError {
    /// Shell syntax the parser cannot fully understand. Fails closed: the
    /// whole command is blocked, never partially trusted.
    #[error("could not parse command safely: {0}")]
    ParseFailure(String),

    /// A target path could not be resolved to an absolute canonical form.
    #[error("could not resolve path '{path}': {source}")]
    PathResolution {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Moving a protected target into the trash store failed. The original
    /// is left in place wherever the filesystem allows it.
    #[error("failed to protect '{path}' while {action}: {source}")]
    Relocation {
        path: PathBuf,
        action: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// No trash slot matches the requested id prefix.
    #[error("recovery id not found: {0}")]
    RecoveryNotFound(String),

    /// More than one trash slot matches the requested id prefix.
    #[error("recovery id '{prefix}' is ambiguous, matches: {}", .matches.join(", "))]
    AmbiguousRecoveryId { prefix: String, matches: Vec<String> },

    /// The recovery destination already exists and `force` was not given.
    #[error("destination already exists: {0}")]
    DestinationCollision(PathBuf),

    /// A slot directory with missing or unparseable metadata, or whose
    /// recorded content is gone. Skipped during listing, an error when
    /// targeted directly.
    #[error("corrupt trash slot '{slot}': {reason}")]
    CorruptSlot { slot: PathBuf, reason: String },

    /// Reading or writing the trash store itself failed.
    #[error("trash store i/o on '{path}': {source}")]
    Store {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GuardError {
    /// Helper for store-level i/o failures.
    pub(crate) fn store(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GuardError::Store {
            path: path.into(),
            source,
        }
    }
}
