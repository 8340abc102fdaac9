//! Guard configuration and host-environment resolution.
//!
//! [`GuardConfig`] is the immutable rule set: which verbs delete, which
//! wrapper commands to skip, and which path substrings are excluded from or
//! barred from protection. It is constructed once at startup and passed
//! explicitly into the parser and classifier; there is no mutable global
//! state.
//!
//! [`GuardEnv`] captures what the host runtime provides through the process
//! environment: the project boundary, the trash location, and the actor and
//! task identifiers recorded in recovery metadata.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Environment variable naming the project directory the guard protects.
pub const PROJECT_DIR_ENV: &str = "CLAUDE_PROJECT_DIR";
/// Environment variable naming the base directory the trash store lives in.
pub const PLAN_DIR_ENV: &str = "CLAUDE_PLAN_DIR";
/// Environment variable identifying the acting agent.
pub const AGENT_ID_ENV: &str = "CLAUDE_AGENT_ID";
/// Environment variable identifying the current task.
pub const TASK_ID_ENV: &str = "CLAUDE_TASK_ID";

/// Directory name of the trash store inside its base directory. Also the
/// path segment that makes anything under a trash store permanently
/// blocked from deletion.
pub const TRASH_DIR_NAME: &str = ".trash";

/// Default trash base below the project root when the host provides none.
const DEFAULT_TRASH_BASE: &str = ".claude/guard/_default";

/// Immutable rule set for deletion interception.
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// Commands that delete files, matched by base name.
    pub deletion_verbs: BTreeSet<String>,
    /// Wrapper commands skipped before the verb (privilege elevation,
    /// environment and rate/time limiting wrappers).
    pub prefix_commands: BTreeSet<String>,
    /// Path substrings where deletions proceed untouched (build artifacts,
    /// caches, dependency trees).
    pub excluded_patterns: Vec<String>,
    /// Path substrings where deletions are always blocked. The trash
    /// store's own directory name is always part of this set.
    pub blocked_patterns: Vec<String>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        let deletion_verbs = ["rm", "unlink", "trash", "trash-put", "del", "remove"]
            .into_iter()
            .map(str::to_string)
            .collect();

        let prefix_commands = [
            "sudo", "env", "nice", "nohup", "time", "timeout", "strace", "ltrace",
        ]
        .into_iter()
        .map(str::to_string)
        .collect();

        let excluded_patterns = [
            "/node_modules/",
            "/.git/",
            "/__pycache__/",
            "/.pytest_cache/",
            "/.mypy_cache/",
            "/.ruff_cache/",
            "/target/",
            "/dist/",
            "/build/",
            "/.next/",
            "/.nuxt/",
            "/coverage/",
            "/.tox/",
            "/.venv/",
            "/venv/",
            "/.env/",
        ]
        .into_iter()
        .map(str::to_string)
        .collect();

        let blocked_patterns = vec![format!("/{TRASH_DIR_NAME}/")];

        Self {
            deletion_verbs,
            prefix_commands,
            excluded_patterns,
            blocked_patterns,
        }
    }
}

impl GuardConfig {
    /// True if `word`'s base name is a deletion-capable verb.
    pub fn is_deletion_verb(&self, word: &str) -> bool {
        self.deletion_verbs.contains(base_name(word))
    }

    /// True if `word`'s base name is a recognized wrapper command.
    pub fn is_prefix_command(&self, word: &str) -> bool {
        self.prefix_commands.contains(base_name(word))
    }
}

/// Base name of a command word, with any leading path stripped.
pub fn base_name(word: &str) -> &str {
    Path::new(word)
        .file_name()
        .and_then(|osstr| osstr.to_str())
        .unwrap_or(word)
}

/// Host-provided directories and identifiers, resolved once per process.
#[derive(Debug, Clone)]
pub struct GuardEnv {
    /// The filesystem subtree inside which protection applies. Anything
    /// outside it is always blocked from deletion.
    pub project_root: PathBuf,
    /// Where trash slots are created and looked up.
    pub trash_root: PathBuf,
    /// Actor recorded as `deleted_by` in recovery metadata.
    pub deleted_by: String,
    /// Task recorded in recovery metadata.
    pub task_id: String,
}

impl GuardEnv {
    /// Resolve from the process environment. Missing variables fall back to
    /// the current working directory and the default trash location.
    pub fn from_process_env() -> Self {
        let project_root = std::env::var_os(PROJECT_DIR_ENV)
            .map(PathBuf::from)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        let project_root = project_root.canonicalize().unwrap_or(project_root);

        let trash_root = match std::env::var_os(PLAN_DIR_ENV) {
            Some(plan_dir) => PathBuf::from(plan_dir).join(TRASH_DIR_NAME),
            None => project_root.join(DEFAULT_TRASH_BASE).join(TRASH_DIR_NAME),
        };

        Self {
            project_root,
            trash_root,
            deleted_by: std::env::var(AGENT_ID_ENV).unwrap_or_else(|_| "unknown".to_string()),
            task_id: std::env::var(TASK_ID_ENV).unwrap_or_else(|_| "unknown".to_string()),
        }
    }

    /// Build an environment over explicit roots. Used by tests and by CLI
    /// flags that override the process environment.
    pub fn with_roots(project_root: PathBuf, trash_root: PathBuf) -> Self {
        Self {
            project_root,
            trash_root,
            deleted_by: "unknown".to_string(),
            task_id: "unknown".to_string(),
        }
    }
}
