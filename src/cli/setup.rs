//! Hook management subcommands: `install`, `uninstall`, `status`.

use anyhow::Result;
use rmguard_core::{GuardEnv, settings};

pub fn handle_install() -> Result<()> {
    let env = GuardEnv::from_process_env();

    if !settings::install(&env.project_root)? {
        println!("rmguard hook is already installed.");
        return Ok(());
    }

    println!("rmguard hook installed.");
    println!();
    println!("Files deleted via rm/unlink/trash will now be moved to:");
    println!("  {}", env.trash_root.display());
    println!();
    println!("To recover files:");
    println!("  rmguard list");
    println!("  rmguard recover <id>");
    println!();
    println!("IMPORTANT: restart the agent session for this to take effect.");

    Ok(())
}

pub fn handle_uninstall() -> Result<()> {
    let env = GuardEnv::from_process_env();

    if !settings::uninstall(&env.project_root)? {
        println!("rmguard hook is not installed.");
        return Ok(());
    }

    println!("rmguard hook removed. File deletions are now permanent.");
    println!();
    println!("IMPORTANT: restart the agent session for this to take effect.");

    Ok(())
}

pub fn handle_status() -> Result<()> {
    let env = GuardEnv::from_process_env();
    let status = settings::status(&env.project_root);

    println!("rmguard hook status");
    println!("{}", "-".repeat(40));
    println!("Installed: {}", if status.installed { "Yes" } else { "No" });
    println!(
        "Settings file: {} ({})",
        status.settings_path.display(),
        if status.settings_exists { "exists" } else { "missing" }
    );
    println!("Trash directory: {}", env.trash_root.display());

    if let Some(config) = &status.hook_config {
        println!();
        println!("Hook configuration:");
        println!("{}", serde_json::to_string_pretty(config)?);
    }

    Ok(())
}
