//! Per-path disposition for deletion targets.
//!
//! Classification is a pure function of the resolved path and the static
//! rule set, evaluated in strict precedence order. Pattern matching is
//! plain substring containment on the resolved absolute path: cheap,
//! predictable, and intentionally broad enough to catch nested
//! occurrences of excluded or blocked directories.

use std::path::{Path, PathBuf};

use crate::config::{GuardConfig, GuardEnv};
use crate::error::GuardError;

/// Disposition of one deletion target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathVerdict {
    /// Move to the trash store instead of deleting.
    Protect,
    /// Never allow deletion (protected directory, trash store itself).
    Block,
    /// Deletion proceeds untouched (build artifacts, caches).
    Excluded,
    /// Outside the project boundary; always blocked.
    OutsideProject,
    /// Could not resolve the path; blocked for safety.
    ResolveError,
}

impl PathVerdict {
    /// True when this verdict forces the whole command to be blocked.
    pub fn is_blocking(self) -> bool {
        matches!(
            self,
            PathVerdict::Block | PathVerdict::OutsideProject | PathVerdict::ResolveError
        )
    }
}

/// Resolve a path to its absolute canonical form.
///
/// Falls back to canonicalizing the parent for entries the filesystem
/// cannot fully resolve (dangling symlinks), so the link itself still
/// classifies instead of erroring.
pub fn resolve_path(path: &Path) -> Result<PathBuf, GuardError> {
    match path.canonicalize() {
        Ok(resolved) => Ok(resolved),
        Err(err) => {
            let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
            let name = path.file_name();
            if let (Some(parent), Some(name)) = (parent, name) {
                if let Ok(resolved_parent) = parent.canonicalize() {
                    return Ok(resolved_parent.join(name));
                }
            }
            if let Some(name) = name {
                if path.parent().is_some_and(|p| p.as_os_str().is_empty()) {
                    if let Ok(cwd) = std::env::current_dir() {
                        return Ok(cwd.join(name));
                    }
                }
            }
            Err(GuardError::PathResolution {
                path: path.to_path_buf(),
                source: err,
            })
        }
    }
}

/// Classify how to handle one deletion target. First match wins:
/// resolution failure, project boundary, blocked patterns (the trash root
/// is always blocked), excluded patterns, then protection by default.
pub fn classify(path: &Path, env: &GuardEnv, config: &GuardConfig) -> PathVerdict {
    let resolved = match resolve_path(path) {
        Ok(resolved) => resolved,
        Err(_) => return PathVerdict::ResolveError,
    };

    if !resolved.starts_with(&env.project_root) {
        return PathVerdict::OutsideProject;
    }

    // The trash root never relocates into itself.
    if resolved.starts_with(&env.trash_root) {
        return PathVerdict::Block;
    }

    let resolved_str = resolved.to_string_lossy();
    if matches_any(&resolved_str, &config.blocked_patterns) {
        return PathVerdict::Block;
    }

    if matches_any(&resolved_str, &config.excluded_patterns) {
        return PathVerdict::Excluded;
    }

    PathVerdict::Protect
}

fn matches_any(path: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| path.contains(pattern.as_str()))
}
