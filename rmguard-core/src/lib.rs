//! # rmguard-core - Deletion guard runtime
//!
//! `rmguard-core` powers the rmguard deletion guard. It intercepts a coding
//! agent's shell commands before execution, finds every path they would
//! delete, and either blocks the command or redirects the deletion into a
//! recoverable trash store.
//!
//! ## Architecture Overview
//!
//! - `config/`: immutable rule set plus host-environment resolution.
//! - `command_safety/`: tree-sitter-bash parsing, deletion-verb matching,
//!   and wildcard expansion. Unparseable input fails closed.
//! - `protection/`: per-path classification, the trash store, and the
//!   recovery manager that reverses relocations.
//! - `hook/`: the PreToolUse contract with the host runtime - payload in,
//!   one allow/deny decision out.
//! - `settings`: hook registration in the host's settings file.
//!
//! Every hook or CLI invocation is a single-threaded, synchronous
//! process-to-completion; isolation between concurrent invocations rests
//! on random slot naming and write ordering, not locks.

pub mod command_safety;
pub mod config;
pub mod error;
pub mod hook;
pub mod protection;
pub mod settings;

pub use command_safety::{DeletionInvocation, deletion_targets, find_deletions};
pub use config::{GuardConfig, GuardEnv};
pub use error::GuardError;
pub use hook::{HookEvaluation, HookResponse, evaluate, extract_command};
pub use protection::{
    EntryType, PathVerdict, RecoveryManager, RecoveryMetadata, RecoveryReport, RecoverySlot,
    TrashStore, classify,
};
