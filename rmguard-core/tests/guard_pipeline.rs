//! End-to-end exercises of the interception pipeline against a real
//! filesystem: command string in, trash slots and recoveries out.

use std::fs;
use std::path::Path;

use rmguard_core::{
    GuardConfig, GuardEnv, RecoveryManager, evaluate, extract_command,
};

fn guard_env(project: &Path) -> GuardEnv {
    let root = project.canonicalize().unwrap();
    let trash = root.join(".claude/guard/_default/.trash");
    GuardEnv::with_roots(root, trash)
}

fn permission_decision(evaluation: &rmguard_core::HookEvaluation) -> &'static str {
    evaluation.response.hook_specific_output.permission_decision
}

#[test]
fn intercepted_deletion_round_trips_through_recovery() {
    let dir = tempfile::tempdir().unwrap();
    let env = guard_env(dir.path());
    let config = GuardConfig::default();

    let tree = dir.path().join("feature");
    fs::create_dir_all(tree.join("src")).unwrap();
    fs::write(tree.join("src/lib.rs"), "pub fn f() {}").unwrap();
    fs::write(tree.join("notes.md"), "# notes").unwrap();

    // The agent proposes a recursive delete; the hook denies and redirects.
    let payload = format!(
        r#"{{"tool_input": {{"command": "rm -rf {}"}}}}"#,
        tree.display()
    );
    let command = extract_command(&payload);
    let evaluation = evaluate(&command, &config, &env).unwrap();

    assert_eq!(permission_decision(&evaluation), "deny");
    assert!(!tree.exists());

    // The operator restores it byte-for-byte from the listing.
    let manager = RecoveryManager::new(env.trash_root.clone());
    let slots = manager.list().unwrap();
    assert_eq!(slots.len(), 1);

    let id = slots[0].metadata.recovery_id.clone();
    manager.recover(&id, None, false).unwrap();

    assert_eq!(
        fs::read_to_string(tree.join("src/lib.rs")).unwrap(),
        "pub fn f() {}"
    );
    assert_eq!(fs::read_to_string(tree.join("notes.md")).unwrap(), "# notes");
    assert!(manager.list().unwrap().is_empty());
}

#[test]
fn mixed_verdicts_follow_strict_precedence() {
    let project = tempfile::tempdir().unwrap();
    let outside = tempfile::tempdir().unwrap();
    let env = guard_env(project.path());
    let config = GuardConfig::default();

    let protected = project.path().join("app.py");
    fs::write(&protected, "print()").unwrap();
    let foreign = outside.path().join("hosts");
    fs::write(&foreign, "127.0.0.1").unwrap();

    let evaluation = evaluate(
        &format!("rm {} {}", protected.display(), foreign.display()),
        &config,
        &env,
    )
    .unwrap();

    // One blocking path blocks the whole command and suppresses every
    // relocation, even of paths that would have been protected.
    assert_eq!(permission_decision(&evaluation), "deny");
    let reason = evaluation
        .response
        .hook_specific_output
        .permission_decision_reason
        .as_deref()
        .unwrap();
    assert!(reason.contains("outside project"));
    assert!(protected.exists());
    assert!(foreign.exists());
    assert!(!env.trash_root.exists());
}

#[test]
fn excluded_only_command_is_allowed_through() {
    let dir = tempfile::tempdir().unwrap();
    let env = guard_env(dir.path());
    let config = GuardConfig::default();

    let cache = dir.path().join("node_modules/left-pad");
    fs::create_dir_all(&cache).unwrap();
    fs::write(cache.join("index.js"), "x").unwrap();

    let evaluation = evaluate(
        &format!("rm -rf {}", cache.display()),
        &config,
        &env,
    )
    .unwrap();

    assert_eq!(permission_decision(&evaluation), "allow");
    // The guard leaves the deletion to the command itself.
    assert!(cache.exists());
}

#[test]
fn sudo_and_double_dash_still_protect() {
    let dir = tempfile::tempdir().unwrap();
    let env = guard_env(dir.path());
    let config = GuardConfig::default();

    let weird = dir.path().join("-weirdfile");
    fs::write(&weird, "w").unwrap();

    let evaluation = evaluate(
        &format!("sudo rm -- {}", weird.display()),
        &config,
        &env,
    )
    .unwrap();

    assert_eq!(permission_decision(&evaluation), "deny");
    assert!(!weird.exists());
    assert_eq!(
        RecoveryManager::new(env.trash_root.clone())
            .list()
            .unwrap()
            .len(),
        1
    );
}
