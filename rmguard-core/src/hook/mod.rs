//! The host-runtime hook contract.
//!
//! One hook invocation reads a payload naming the proposed shell command,
//! runs the interception pipeline, and reports exactly one decision back:
//!
//! - **deny** with blocking reasons when any target must never be deleted
//!   (outside the project, under the trash root, unresolvable, or a store
//!   failure);
//! - **deny** with recovery ids when targets were moved to the trash
//!   (the original command must not run, its targets are gone);
//! - **allow** when every target is excluded or does not exist.
//!
//! Relocation happens only after every target is classified: a single
//! blocking verdict suppresses all relocations for the invocation.

use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::command_safety::deletion_targets;
use crate::config::{GuardConfig, GuardEnv};
use crate::error::GuardError;
use crate::protection::classifier::{PathVerdict, classify};
use crate::protection::trash::TrashStore;

/// Event name tag the host expects in hook responses.
pub const HOOK_EVENT_NAME: &str = "PreToolUse";

/// Structured decision object emitted on the hook's output channel.
#[derive(Debug, Serialize)]
pub struct HookResponse {
    #[serde(rename = "hookSpecificOutput")]
    pub hook_specific_output: HookSpecificOutput,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookSpecificOutput {
    pub hook_event_name: &'static str,
    pub permission_decision: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission_decision_reason: Option<String>,
}

impl HookResponse {
    pub fn allow() -> Self {
        Self {
            hook_specific_output: HookSpecificOutput {
                hook_event_name: HOOK_EVENT_NAME,
                permission_decision: "allow",
                permission_decision_reason: None,
            },
        }
    }

    pub fn deny(reason: String) -> Self {
        Self {
            hook_specific_output: HookSpecificOutput {
                hook_event_name: HOOK_EVENT_NAME,
                permission_decision: "deny",
                permission_decision_reason: Some(reason),
            },
        }
    }
}

/// Result of evaluating one hook invocation: the host-visible response
/// plus per-target notes for the error channel (visible in verbose mode).
#[derive(Debug)]
pub struct HookEvaluation {
    pub response: HookResponse,
    pub notes: Vec<String>,
}

/// Pull the command string out of the hook payload. A structured payload
/// nests it under `tool_input.command`; anything unstructured is treated
/// as the command verbatim.
pub fn extract_command(stdin_data: &str) -> String {
    match serde_json::from_str::<Value>(stdin_data) {
        Ok(payload) => payload
            .get("tool_input")
            .and_then(|tool_input| tool_input.get("command"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Err(_) => stdin_data.to_string(),
    }
}

/// One classified deletion target with its human-readable outcome.
#[derive(Debug)]
struct TargetOutcome {
    target: String,
    verdict: PathVerdict,
    message: String,
}

/// Run the full interception pipeline for one command.
///
/// Returns [`GuardError::ParseFailure`] for shell syntax the guard cannot
/// verify; the caller must turn that into an unconditional block.
pub fn evaluate(
    command: &str,
    config: &GuardConfig,
    env: &GuardEnv,
) -> Result<HookEvaluation, GuardError> {
    let targets = deletion_targets(command, config)?;
    if targets.is_empty() {
        debug!("no deletion targets in command");
        return Ok(HookEvaluation {
            response: HookResponse::allow(),
            notes: Vec::new(),
        });
    }

    // Phase one: classify everything before touching anything.
    let mut outcomes: Vec<TargetOutcome> = targets
        .iter()
        .map(|target| classify_target(target, env, config))
        .collect();

    let any_blocking = outcomes.iter().any(|o| o.verdict.is_blocking());

    // Phase two: relocate protected targets, only when nothing blocks.
    let mut recovered: Vec<(String, String)> = Vec::new();
    let mut store_failures: Vec<String> = Vec::new();
    if !any_blocking {
        let store = TrashStore::new(env);
        for outcome in outcomes
            .iter_mut()
            .filter(|o| o.verdict == PathVerdict::Protect)
        {
            match store.relocate(Path::new(&outcome.target)) {
                Ok(recovery_id) => {
                    outcome.message = format!(
                        "Protected: {} -> {} (id {})",
                        outcome.target,
                        store.trash_root().display(),
                        recovery_id
                    );
                    recovered.push((outcome.target.clone(), recovery_id));
                }
                Err(err) => {
                    outcome.message = format!("BLOCKED: failed to protect {}: {}", outcome.target, err);
                    store_failures.push(outcome.message.clone());
                }
            }
        }
    }

    let notes: Vec<String> = outcomes.iter().map(|o| o.message.clone()).collect();

    let blocking_reasons: Vec<String> = outcomes
        .iter()
        .filter(|o| o.verdict.is_blocking())
        .map(|o| o.message.clone())
        .chain(store_failures.iter().cloned())
        .collect();

    let response = if !blocking_reasons.is_empty() {
        HookResponse::deny(format!("Deletion blocked: {}", blocking_reasons.join("; ")))
    } else if !recovered.is_empty() {
        let listing = recovered
            .iter()
            .map(|(target, id)| format!("{target} (id {id})"))
            .collect::<Vec<_>>()
            .join(", ");
        HookResponse::deny(format!(
            "Files moved to recoverable trash ({}): {}. Use 'rmguard list' to see them and 'rmguard recover <id>' to restore.",
            env.trash_root.display(),
            listing
        ))
    } else {
        HookResponse::allow()
    };

    Ok(HookEvaluation { response, notes })
}

fn classify_target(target: &str, env: &GuardEnv, config: &GuardConfig) -> TargetOutcome {
    let path = Path::new(target);

    // Nonexistent targets pass through so the underlying command can
    // produce its own natural error.
    if path.symlink_metadata().is_err() {
        return TargetOutcome {
            target: target.to_string(),
            verdict: PathVerdict::Excluded,
            message: format!("Does not exist: {target}"),
        };
    }

    let verdict = classify(path, env, config);
    let message = match verdict {
        PathVerdict::OutsideProject => format!(
            "BLOCKED: cannot delete files outside project ({}): {}",
            env.project_root.display(),
            target
        ),
        PathVerdict::Block => {
            format!("BLOCKED: cannot delete from protected directory: {target}")
        }
        PathVerdict::ResolveError => {
            format!("BLOCKED: could not safely resolve path: {target}")
        }
        PathVerdict::Excluded => format!("Excluded (allowing deletion): {target}"),
        PathVerdict::Protect => format!("Protected: {target}"),
    };

    TargetOutcome {
        target: target.to_string(),
        verdict,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn guard_env(project: &Path) -> GuardEnv {
        GuardEnv::with_roots(
            project.canonicalize().unwrap(),
            project
                .canonicalize()
                .unwrap()
                .join(".claude/guard/_default/.trash"),
        )
    }

    fn decision(evaluation: &HookEvaluation) -> (&'static str, Option<&str>) {
        let output = &evaluation.response.hook_specific_output;
        (
            output.permission_decision,
            output.permission_decision_reason.as_deref(),
        )
    }

    #[test]
    fn envelope_payload_yields_nested_command() {
        let payload = r#"{"tool_input": {"command": "rm file.txt"}}"#;
        assert_eq!(extract_command(payload), "rm file.txt");
    }

    #[test]
    fn unstructured_payload_is_the_command_itself() {
        assert_eq!(extract_command("rm file.txt"), "rm file.txt");
    }

    #[test]
    fn envelope_without_command_yields_empty() {
        assert_eq!(extract_command(r#"{"tool_input": {}}"#), "");
    }

    #[test]
    fn non_deletion_command_is_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let env = guard_env(dir.path());
        let evaluation = evaluate("ls -la", &GuardConfig::default(), &env).unwrap();
        assert_eq!(decision(&evaluation).0, "allow");
    }

    #[test]
    fn nonexistent_target_is_allowed_through() {
        let dir = tempfile::tempdir().unwrap();
        let env = guard_env(dir.path());
        let evaluation = evaluate(
            &format!("rm {}", dir.path().join("nonexistent.txt").display()),
            &GuardConfig::default(),
            &env,
        )
        .unwrap();
        assert_eq!(decision(&evaluation).0, "allow");
        assert!(evaluation.notes[0].starts_with("Does not exist"));
    }

    #[test]
    fn protected_target_is_denied_with_redirect() {
        let dir = tempfile::tempdir().unwrap();
        let env = guard_env(dir.path());
        let file = dir.path().join("app.py");
        fs::write(&file, "print()").unwrap();

        let evaluation = evaluate(
            &format!("rm {}", file.display()),
            &GuardConfig::default(),
            &env,
        )
        .unwrap();

        let (verdict, reason) = decision(&evaluation);
        assert_eq!(verdict, "deny");
        assert!(reason.unwrap().contains("recoverable trash"));
        assert!(!file.exists());
        assert!(env.trash_root.exists());
    }

    #[test]
    fn outside_project_target_blocks_the_command() {
        let project = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let env = guard_env(project.path());
        let file = outside.path().join("passwd");
        fs::write(&file, "root").unwrap();

        let evaluation = evaluate(
            &format!("rm {}", file.display()),
            &GuardConfig::default(),
            &env,
        )
        .unwrap();

        let (verdict, reason) = decision(&evaluation);
        assert_eq!(verdict, "deny");
        assert!(reason.unwrap().contains("outside project"));
        assert!(file.exists());
    }

    #[test]
    fn blocking_path_suppresses_relocation_of_protected_path() {
        let project = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let env = guard_env(project.path());
        let inside = project.path().join("keep.txt");
        fs::write(&inside, "keep").unwrap();
        let forbidden = outside.path().join("other.txt");
        fs::write(&forbidden, "x").unwrap();

        let evaluation = evaluate(
            &format!("rm {} {}", inside.display(), forbidden.display()),
            &GuardConfig::default(),
            &env,
        )
        .unwrap();

        assert_eq!(decision(&evaluation).0, "deny");
        // The protected file must not have been moved.
        assert!(inside.exists());
        assert!(!env.trash_root.exists());
    }

    #[test]
    fn excluded_and_protected_targets_mix_to_redirect() {
        let dir = tempfile::tempdir().unwrap();
        let env = guard_env(dir.path());
        let build = dir.path().join("build");
        fs::create_dir_all(&build).unwrap();
        fs::write(build.join("out.o"), "o").unwrap();
        let src = dir.path().join("app.py");
        fs::write(&src, "print()").unwrap();

        let evaluation = evaluate(
            &format!("rm -rf {} {}", build.join("out.o").display(), src.display()),
            &GuardConfig::default(),
            &env,
        )
        .unwrap();

        let (verdict, reason) = decision(&evaluation);
        assert_eq!(verdict, "deny");
        assert!(reason.unwrap().contains("app.py"));
        // Excluded build artifact stays for rm itself to handle.
        assert!(build.join("out.o").exists());
        assert!(!src.exists());
    }

    #[test]
    fn trash_contents_never_relocate() {
        let dir = tempfile::tempdir().unwrap();
        let env = guard_env(dir.path());
        fs::create_dir_all(&env.trash_root).unwrap();
        let slotted = env.trash_root.join("aa11-x");
        fs::create_dir_all(&slotted).unwrap();

        let evaluation = evaluate(
            &format!("rm -rf {}", slotted.display()),
            &GuardConfig::default(),
            &env,
        )
        .unwrap();

        let (verdict, reason) = decision(&evaluation);
        assert_eq!(verdict, "deny");
        assert!(reason.unwrap().contains("protected directory"));
        assert!(slotted.exists());
    }

    #[test]
    fn parse_failure_propagates_for_hard_block() {
        let dir = tempfile::tempdir().unwrap();
        let env = guard_env(dir.path());
        let result = evaluate("rm \"oops", &GuardConfig::default(), &env);
        assert!(matches!(result, Err(GuardError::ParseFailure(_))));
    }

    #[test]
    fn glob_targets_expand_before_classification() {
        let dir = tempfile::tempdir().unwrap();
        let env = guard_env(dir.path());
        fs::write(dir.path().join("one.log"), "1").unwrap();
        fs::write(dir.path().join("two.log"), "2").unwrap();

        let evaluation = evaluate(
            &format!("rm {}", dir.path().join("*.log").display()),
            &GuardConfig::default(),
            &env,
        )
        .unwrap();

        assert_eq!(decision(&evaluation).0, "deny");
        assert!(!dir.path().join("one.log").exists());
        assert!(!dir.path().join("two.log").exists());
    }
}
