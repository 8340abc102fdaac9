//! Recovery subcommands: `list`, `recover`, `purge`, `purge-all`.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use rmguard_core::{GuardEnv, RecoveryManager, RecoverySlot};
use serde_json::json;

fn manager() -> RecoveryManager {
    RecoveryManager::new(GuardEnv::from_process_env().trash_root)
}

pub fn handle_list(as_json: bool) -> Result<()> {
    let manager = manager();
    let slots = manager.list()?;

    if as_json {
        let records: Vec<serde_json::Value> = slots
            .iter()
            .map(|slot| {
                let mut record = serde_json::to_value(&slot.metadata).unwrap_or_else(|_| json!({}));
                if let Some(map) = record.as_object_mut() {
                    map.insert("slot_dir".into(), json!(slot.slot_dir));
                }
                record
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if slots.is_empty() {
        println!("No recoverable files found.");
        println!();
        println!("Trash directory: {}", manager.trash_root().display());
        return Ok(());
    }

    println!("Recoverable Files");
    println!("{}", "=".repeat(100));
    println!(
        "{:<10} {:<32} {:<20} {:<8} {}",
        "ID", "Name", "Deleted At", "Type", "Path"
    );
    println!("{}", "-".repeat(100));

    for slot in &slots {
        print_row(slot);
    }

    println!("{}", "-".repeat(100));
    println!("Total: {} file(s)", slots.len());
    println!();
    println!("To recover: rmguard recover <id>");

    Ok(())
}

fn print_row(slot: &RecoverySlot) {
    let meta = &slot.metadata;
    println!(
        "{:<10} {:<32} {:<20} {:<8} {}",
        meta.recovery_id,
        truncate(&meta.original_basename, 30),
        meta.deleted_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        meta.entry_type.to_string(),
        truncate_left(&meta.original_absolute_path.to_string_lossy(), 40)
    );
}

pub fn handle_recover(id: &str, to: Option<PathBuf>, force: bool) -> Result<()> {
    let manager = manager();
    let report = match manager.recover(id, to.as_deref(), force) {
        Ok(report) => report,
        Err(err @ rmguard_core::GuardError::DestinationCollision(_)) => {
            eprintln!("Error: {err}");
            eprintln!();
            eprintln!("Use --force to overwrite, or --to <path> for a different location.");
            bail!("recovery refused");
        }
        Err(err) => {
            return Err(err).context("recovery failed (use 'rmguard list' to see available files)");
        }
    };

    println!("Recovered: {}", report.metadata.original_absolute_path.display());
    println!("       To: {}", report.restored_to.display());
    println!("  Deleted: {}", report.metadata.deleted_at.to_rfc3339());
    if report.metadata.deleted_by != "unknown" {
        println!("       By: {}", report.metadata.deleted_by);
    }
    println!();
    println!("Recovery data cleaned up.");

    Ok(())
}

pub fn handle_purge(id: &str) -> Result<()> {
    let manager = manager();
    let slot = manager.purge(id)?;
    println!(
        "Purged: {} ({})",
        slot.metadata.original_absolute_path.display(),
        slot.metadata.recovery_id
    );
    Ok(())
}

pub fn handle_purge_all(older_than: &str) -> Result<()> {
    let max_age = humantime::parse_duration(older_than)
        .with_context(|| format!("invalid duration '{older_than}', expected forms like 7d, 24h, 30m"))?;
    let manager = manager();
    let purged = manager.purge_older_than(max_age)?;
    println!("Purged {purged} file(s).");
    Ok(())
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() > max {
        format!("{}...", &text[..max.saturating_sub(3)])
    } else {
        text.to_string()
    }
}

fn truncate_left(text: &str, max: usize) -> String {
    if text.len() > max {
        format!("...{}", &text[text.len() - (max - 3)..])
    } else {
        text.to_string()
    }
}
