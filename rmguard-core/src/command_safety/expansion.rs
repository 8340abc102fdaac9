//! Wildcard expansion of deletion targets.
//!
//! The shell the agent runs would expand globs before `rm` ever sees them,
//! so the guard expands them the same way to learn the concrete paths. A
//! pattern with no matches is kept literally: downstream classification
//! then reports a clear "does not exist" outcome instead of silently
//! dropping the target.

use glob::glob;
use tracing::debug;

/// Characters that mark a word as a glob pattern.
const GLOB_METACHARACTERS: [char; 3] = ['*', '?', '['];

/// Expand every wildcard target against the current filesystem. Recursive
/// `**` patterns are supported. Non-wildcard targets pass through
/// unchanged, as does any pattern that matches nothing or fails to parse.
pub fn expand_targets(targets: &[String]) -> Vec<String> {
    targets.iter().flat_map(|target| expand_one(target)).collect()
}

fn expand_one(target: &str) -> Vec<String> {
    if !target.contains(GLOB_METACHARACTERS) {
        return vec![target.to_string()];
    }

    let paths = match glob(target) {
        Ok(paths) => paths,
        Err(err) => {
            debug!("keeping unparseable glob pattern '{}' literal: {}", target, err);
            return vec![target.to_string()];
        }
    };

    let matches: Vec<String> = paths
        .filter_map(|entry| entry.ok())
        .map(|path| path.to_string_lossy().into_owned())
        .collect();

    if matches.is_empty() {
        vec![target.to_string()]
    } else {
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn plain_paths_pass_through() {
        let expanded = expand_targets(&["src/app.py".to_string()]);
        assert_eq!(expanded, vec!["src/app.py"]);
    }

    #[test]
    fn wildcard_expands_to_matches() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.log"), "a").unwrap();
        fs::write(dir.path().join("b.log"), "b").unwrap();
        fs::write(dir.path().join("keep.txt"), "k").unwrap();

        let pattern = dir.path().join("*.log").to_string_lossy().into_owned();
        let mut expanded = expand_targets(&[pattern]);
        expanded.sort();

        assert_eq!(expanded.len(), 2);
        assert!(expanded[0].ends_with("a.log"));
        assert!(expanded[1].ends_with("b.log"));
    }

    #[test]
    fn recursive_wildcard_descends() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nested/deep")).unwrap();
        fs::write(dir.path().join("nested/deep/x.tmp"), "x").unwrap();

        let pattern = dir.path().join("**/*.tmp").to_string_lossy().into_owned();
        let expanded = expand_targets(&[pattern]);

        assert_eq!(expanded.len(), 1);
        assert!(expanded[0].ends_with("x.tmp"));
    }

    #[test]
    fn unmatched_pattern_stays_literal() {
        let expanded = expand_targets(&["no-such-dir-xyz/*.log".to_string()]);
        assert_eq!(expanded, vec!["no-such-dir-xyz/*.log"]);
    }
}
