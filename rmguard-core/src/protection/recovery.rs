//! Enumeration, restoration, and purging of trash slots.
//!
//! The recovery manager depends only on the on-disk slot layout written by
//! the trash store. Slot directories that violate the layout invariant
//! (missing or unparseable metadata, missing content) are treated as
//! corrupt: skipped during listing with a warning, reported as an error
//! only when targeted directly. No operation here retries; the operator
//! decides.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};

use crate::error::GuardError;

use super::trash::{CONTENT_FILE_NAME, EntryType, METADATA_FILE_NAME, RecoveryMetadata, copy_entry, copy_tree};

/// A valid trash slot: parsed metadata plus the directory that holds it.
#[derive(Debug, Clone)]
pub struct RecoverySlot {
    pub metadata: RecoveryMetadata,
    pub slot_dir: PathBuf,
}

impl RecoverySlot {
    pub fn content_path(&self) -> PathBuf {
        self.slot_dir.join(CONTENT_FILE_NAME)
    }
}

/// Outcome of a successful recovery.
#[derive(Debug, Clone)]
pub struct RecoveryReport {
    pub metadata: RecoveryMetadata,
    pub restored_to: PathBuf,
}

/// Reverses relocations performed by the trash store.
#[derive(Debug, Clone)]
pub struct RecoveryManager {
    trash_root: PathBuf,
}

impl RecoveryManager {
    pub fn new(trash_root: impl Into<PathBuf>) -> Self {
        Self {
            trash_root: trash_root.into(),
        }
    }

    pub fn trash_root(&self) -> &Path {
        &self.trash_root
    }

    /// All valid slots under the trash root, newest deletion first.
    /// Corrupt slot directories are skipped, not an error for the listing.
    pub fn list(&self) -> Result<Vec<RecoverySlot>, GuardError> {
        if !self.trash_root.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.trash_root)
            .map_err(|err| GuardError::store(&self.trash_root, err))?;

        let mut slots = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| GuardError::store(&self.trash_root, err))?;
            if !entry.path().is_dir() {
                continue;
            }
            match read_slot(&entry.path()) {
                Ok(slot) => slots.push(slot),
                Err(err) => warn!("skipping unrecoverable trash entry: {}", err),
            }
        }

        slots.sort_by(|a, b| b.metadata.deleted_at.cmp(&a.metadata.deleted_at));
        Ok(slots)
    }

    /// The unique slot whose recovery id starts with `prefix`.
    ///
    /// An ambiguous prefix is an error, never a silent first match: two
    /// different files could otherwise be confused.
    pub fn find(&self, prefix: &str) -> Result<RecoverySlot, GuardError> {
        let mut matches: Vec<RecoverySlot> = self
            .list()?
            .into_iter()
            .filter(|slot| slot.metadata.recovery_id.starts_with(prefix))
            .collect();

        match matches.len() {
            0 => Err(GuardError::RecoveryNotFound(prefix.to_string())),
            1 => Ok(matches.remove(0)),
            _ => Err(GuardError::AmbiguousRecoveryId {
                prefix: prefix.to_string(),
                matches: matches
                    .into_iter()
                    .map(|slot| slot.metadata.recovery_id)
                    .collect(),
            }),
        }
    }

    /// Restore a slot's content to `destination` (default: the original
    /// absolute path) and delete the slot.
    ///
    /// An existing destination without `force` is a collision error with
    /// no state change; with `force` the destination is removed first.
    pub fn recover(
        &self,
        prefix: &str,
        destination: Option<&Path>,
        force: bool,
    ) -> Result<RecoveryReport, GuardError> {
        let slot = self.find(prefix)?;
        let content = slot.content_path();
        let destination = destination
            .map(Path::to_path_buf)
            .unwrap_or_else(|| slot.metadata.original_absolute_path.clone());

        if destination.symlink_metadata().is_ok() {
            if !force {
                return Err(GuardError::DestinationCollision(destination));
            }
            remove_existing(&destination)
                .map_err(|err| GuardError::store(&destination, err))?;
        }

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|err| GuardError::store(parent, err))?;
        }

        let restore = if EntryType::of(&content) == EntryType::Directory {
            copy_tree(&content, &destination)
        } else {
            copy_entry(&content, &destination)
        };
        restore.map_err(|err| GuardError::Relocation {
            path: destination.clone(),
            action: "restoring content from the trash store",
            source: err,
        })?;

        fs::remove_dir_all(&slot.slot_dir)
            .map_err(|err| GuardError::store(&slot.slot_dir, err))?;

        debug!(
            "recovered {} to {}",
            slot.metadata.recovery_id,
            destination.display()
        );
        Ok(RecoveryReport {
            metadata: slot.metadata,
            restored_to: destination,
        })
    }

    /// Delete a slot outright, no restoration.
    pub fn purge(&self, prefix: &str) -> Result<RecoverySlot, GuardError> {
        let slot = self.find(prefix)?;
        fs::remove_dir_all(&slot.slot_dir)
            .map_err(|err| GuardError::store(&slot.slot_dir, err))?;
        debug!("purged {}", slot.metadata.recovery_id);
        Ok(slot)
    }

    /// Delete every slot whose deletion time is older than `max_age`.
    /// Returns how many slots were removed.
    pub fn purge_older_than(&self, max_age: Duration) -> Result<usize, GuardError> {
        let age = chrono::Duration::from_std(max_age)
            .unwrap_or_else(|_| chrono::Duration::days(36_500));
        let cutoff = Utc::now() - age;

        let mut purged = 0;
        for slot in self.list()? {
            if slot.metadata.deleted_at < cutoff {
                fs::remove_dir_all(&slot.slot_dir)
                    .map_err(|err| GuardError::store(&slot.slot_dir, err))?;
                debug!(
                    "purged {} (deleted {})",
                    slot.metadata.recovery_id, slot.metadata.deleted_at
                );
                purged += 1;
            }
        }
        Ok(purged)
    }
}

/// Parse one slot directory, enforcing the layout invariant.
fn read_slot(slot_dir: &Path) -> Result<RecoverySlot, GuardError> {
    let metadata_path = slot_dir.join(METADATA_FILE_NAME);
    let raw = fs::read_to_string(&metadata_path).map_err(|_| GuardError::CorruptSlot {
        slot: slot_dir.to_path_buf(),
        reason: "missing metadata".to_string(),
    })?;

    let metadata: RecoveryMetadata =
        serde_json::from_str(&raw).map_err(|err| GuardError::CorruptSlot {
            slot: slot_dir.to_path_buf(),
            reason: format!("unparseable metadata: {err}"),
        })?;

    if metadata.recovery_content_path.as_os_str().is_empty()
        || slot_dir.join(CONTENT_FILE_NAME).symlink_metadata().is_err()
    {
        return Err(GuardError::CorruptSlot {
            slot: slot_dir.to_path_buf(),
            reason: "recorded content is missing".to_string(),
        });
    }

    Ok(RecoverySlot {
        metadata,
        slot_dir: slot_dir.to_path_buf(),
    })
}

fn remove_existing(path: &Path) -> std::io::Result<()> {
    let meta = path.symlink_metadata()?;
    if meta.is_dir() && !meta.file_type().is_symlink() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}
