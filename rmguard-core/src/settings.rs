//! Hook registration in the host runtime's settings file.
//!
//! `install`, `uninstall`, and `status` edit or read the project's
//! `.claude/settings.json`, adding or removing one entry in the
//! `hooks.PreToolUse` array. Both operations are idempotent and leave
//! unrelated settings untouched.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use tracing::warn;

use crate::error::GuardError;
use crate::hook::HOOK_EVENT_NAME;

/// Settings file location relative to the project root.
pub const SETTINGS_FILE: &str = ".claude/settings.json";

/// Shell command the host runs for each intercepted tool use.
const HOOK_COMMAND: &str = "rmguard hook";

/// Marker identifying our entry among other PreToolUse hooks.
const HOOK_MARKER: &str = "rmguard";

/// Hook registration state as read from the settings file.
#[derive(Debug)]
pub struct HookStatus {
    pub installed: bool,
    pub settings_exists: bool,
    pub settings_path: PathBuf,
    /// Our hook entry verbatim, when installed.
    pub hook_config: Option<Value>,
}

pub fn settings_path(project_root: &Path) -> PathBuf {
    project_root.join(SETTINGS_FILE)
}

/// The hook entry written on install: a matcher narrowing the hook to
/// Bash deletion commands, plus the command the host should run.
pub fn hook_entry() -> Value {
    json!({
        "matcher": {
            "tool_name": "Bash",
            "command_patterns": ["rm ", "rm$", "unlink ", "trash "]
        },
        "hooks": [{
            "type": "command",
            "command": HOOK_COMMAND
        }]
    })
}

/// Register the hook. Returns `false` when it was already installed.
pub fn install(project_root: &Path) -> Result<bool, GuardError> {
    let path = settings_path(project_root);
    let mut settings = load_settings(&path);

    if is_installed(&settings) {
        return Ok(false);
    }

    let invalid_layout = || {
        GuardError::store(
            &path,
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "settings file does not hold the expected JSON layout",
            ),
        )
    };

    let map = settings.as_object_mut().ok_or_else(invalid_layout)?;
    let hooks = map
        .entry("hooks")
        .or_insert_with(|| json!({}))
        .as_object_mut()
        .ok_or_else(invalid_layout)?;
    let entries = hooks
        .entry(HOOK_EVENT_NAME)
        .or_insert_with(|| json!([]))
        .as_array_mut()
        .ok_or_else(invalid_layout)?;
    entries.push(hook_entry());

    save_settings(&path, &settings)?;
    Ok(true)
}

/// Remove the hook. Returns `false` when it was not installed.
pub fn uninstall(project_root: &Path) -> Result<bool, GuardError> {
    let path = settings_path(project_root);
    let mut settings = load_settings(&path);

    if !is_installed(&settings) {
        return Ok(false);
    }

    if let Some(map) = settings.as_object_mut() {
        let mut drop_hooks = false;
        if let Some(hooks) = map.get_mut("hooks").and_then(Value::as_object_mut) {
            let mut drop_event = false;
            if let Some(entries) = hooks.get_mut(HOOK_EVENT_NAME).and_then(Value::as_array_mut) {
                entries.retain(|entry| !is_our_hook(entry));
                drop_event = entries.is_empty();
            }
            if drop_event {
                hooks.remove(HOOK_EVENT_NAME);
            }
            drop_hooks = hooks.is_empty();
        }
        if drop_hooks {
            map.remove("hooks");
        }
    }

    save_settings(&path, &settings)?;
    Ok(true)
}

/// Read the current registration state without modifying anything.
pub fn status(project_root: &Path) -> HookStatus {
    let path = settings_path(project_root);
    let settings = load_settings(&path);

    let hook_config = pre_tool_hooks(&settings)
        .iter()
        .find(|entry| is_our_hook(entry))
        .cloned();

    HookStatus {
        installed: hook_config.is_some(),
        settings_exists: path.exists(),
        settings_path: path,
        hook_config,
    }
}

fn load_settings(path: &Path) -> Value {
    if !path.exists() {
        return json!({});
    }
    match fs::read_to_string(path)
        .map_err(|err| err.to_string())
        .and_then(|raw| serde_json::from_str(&raw).map_err(|err| err.to_string()))
    {
        Ok(settings) => settings,
        Err(err) => {
            warn!("{} is not valid JSON ({}), treating as empty", path.display(), err);
            json!({})
        }
    }
}

fn save_settings(path: &Path, settings: &Value) -> Result<(), GuardError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| GuardError::store(parent, err))?;
    }
    let serialized = serde_json::to_string_pretty(settings)
        .map_err(|err| GuardError::store(path, std::io::Error::new(std::io::ErrorKind::InvalidData, err)))?;
    fs::write(path, serialized + "\n").map_err(|err| GuardError::store(path, err))
}

fn pre_tool_hooks(settings: &Value) -> Vec<Value> {
    settings
        .get("hooks")
        .and_then(|hooks| hooks.get(HOOK_EVENT_NAME))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn is_installed(settings: &Value) -> bool {
    pre_tool_hooks(settings).iter().any(is_our_hook)
}

fn is_our_hook(entry: &Value) -> bool {
    entry
        .get("hooks")
        .and_then(Value::as_array)
        .map(|hooks| {
            hooks.iter().any(|hook| {
                hook.get("type").and_then(Value::as_str) == Some("command")
                    && hook
                        .get("command")
                        .and_then(Value::as_str)
                        .is_some_and(|command| command.contains(HOOK_MARKER))
            })
        })
        .unwrap_or(false)
}
