//! The recoverable trash store.
//!
//! A protected target is relocated into a slot directory named
//! `<recovery-id>-<original-basename>` holding exactly two children:
//! `content` (the relocated file or tree, symbolic links preserved as
//! links) and `metadata.json`. Content is fully in place before the
//! original is removed, and metadata is written last, so a crash mid-way
//! never yields a slot whose metadata claims content that is not there.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;
use walkdir::WalkDir;

use crate::config::GuardEnv;
use crate::error::GuardError;

use super::classifier::resolve_path;

/// Name of the relocated payload inside a slot directory.
pub const CONTENT_FILE_NAME: &str = "content";
/// Name of the metadata record inside a slot directory.
pub const METADATA_FILE_NAME: &str = "metadata.json";

/// Hex characters of a recovery id: 48 bits drawn from a UUIDv4.
/// Uniqueness is probabilistic per trash root and never pre-checked.
const RECOVERY_ID_LEN: usize = 12;

/// What kind of filesystem entry a slot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Directory,
    Symlink,
    Unknown,
}

impl EntryType {
    /// Inspect `path` without following a final symlink.
    pub fn of(path: &Path) -> Self {
        match path.symlink_metadata() {
            Ok(meta) if meta.file_type().is_symlink() => EntryType::Symlink,
            Ok(meta) if meta.is_dir() => EntryType::Directory,
            Ok(meta) if meta.is_file() => EntryType::File,
            _ => EntryType::Unknown,
        }
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            EntryType::File => "file",
            EntryType::Directory => "directory",
            EntryType::Symlink => "symlink",
            EntryType::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Recovery record written once at relocation time, read-only thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryMetadata {
    pub original_absolute_path: PathBuf,
    pub original_basename: String,
    pub deleted_at: DateTime<Utc>,
    pub deleted_by: String,
    pub task_id: String,
    pub entry_type: EntryType,
    pub recovery_id: String,
    pub recovery_content_path: PathBuf,
}

/// Relocates protected targets into uniquely identified recovery slots.
#[derive(Debug, Clone)]
pub struct TrashStore {
    trash_root: PathBuf,
    deleted_by: String,
    task_id: String,
}

impl TrashStore {
    pub fn new(env: &GuardEnv) -> Self {
        Self {
            trash_root: env.trash_root.clone(),
            deleted_by: env.deleted_by.clone(),
            task_id: env.task_id.clone(),
        }
    }

    /// Where this store keeps its slots.
    pub fn trash_root(&self) -> &Path {
        &self.trash_root
    }

    /// Move `path` into a fresh recovery slot and return its recovery id.
    ///
    /// On failure the original is left in place wherever possible and the
    /// partially created slot is cleaned up; the caller treats the error
    /// as blocking for the whole command.
    pub fn relocate(&self, path: &Path) -> Result<String, GuardError> {
        let original_absolute_path = resolve_path(path)?;
        let entry_type = EntryType::of(path);
        let basename = original_absolute_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unnamed".to_string());

        fs::create_dir_all(&self.trash_root)
            .map_err(|err| GuardError::store(&self.trash_root, err))?;

        let recovery_id = fresh_recovery_id();
        let slot_dir = self.trash_root.join(format!("{recovery_id}-{basename}"));
        fs::create_dir_all(&slot_dir).map_err(|err| GuardError::store(&slot_dir, err))?;
        let content_path = slot_dir.join(CONTENT_FILE_NAME);

        let moved = match entry_type {
            EntryType::Directory => copy_tree(path, &content_path)
                .and_then(|_| fs::remove_dir_all(path))
                .map(|_| false),
            _ => move_entry(path, &content_path).map(|_| true),
        };
        let renamed = match moved {
            Ok(renamed) => renamed,
            Err(err) => {
                let _ = fs::remove_dir_all(&slot_dir);
                return Err(GuardError::Relocation {
                    path: path.to_path_buf(),
                    action: "moving content into the trash store",
                    source: err,
                });
            }
        };

        let metadata = RecoveryMetadata {
            original_absolute_path,
            original_basename: basename.clone(),
            deleted_at: Utc::now(),
            deleted_by: self.deleted_by.clone(),
            task_id: self.task_id.clone(),
            entry_type,
            recovery_id: recovery_id.clone(),
            recovery_content_path: content_path.clone(),
        };
        if let Err(err) = write_metadata(&slot_dir, &metadata) {
            // A renamed entry can still be put back where it was.
            if renamed {
                let _ = move_entry(&content_path, path);
            }
            let _ = fs::remove_dir_all(&slot_dir);
            return Err(GuardError::Relocation {
                path: path.to_path_buf(),
                action: "writing recovery metadata",
                source: err,
            });
        }

        debug!(
            "protected {} as {} ({})",
            path.display(),
            slot_dir.display(),
            entry_type
        );
        Ok(recovery_id)
    }
}

fn fresh_recovery_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    id[..RECOVERY_ID_LEN].to_string()
}

fn write_metadata(slot_dir: &Path, metadata: &RecoveryMetadata) -> io::Result<()> {
    let serialized = serde_json::to_string_pretty(metadata)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
    fs::write(slot_dir.join(METADATA_FILE_NAME), serialized + "\n")
}

/// Move a file or symlink. Rename is atomic on one filesystem; across
/// filesystems fall back to copy-then-delete.
pub(crate) fn move_entry(source: &Path, target: &Path) -> io::Result<()> {
    match fs::rename(source, target) {
        Ok(()) => Ok(()),
        Err(_) => {
            copy_entry(source, target)?;
            fs::remove_file(source)
        }
    }
}

/// Copy a single non-directory entry, preserving a symlink as a link.
pub(crate) fn copy_entry(source: &Path, target: &Path) -> io::Result<()> {
    let meta = source.symlink_metadata()?;
    if meta.file_type().is_symlink() {
        let link = fs::read_link(source)?;
        replicate_symlink(&link, target)
    } else {
        fs::copy(source, target).map(|_| ())
    }
}

/// Recursively copy a directory tree, preserving symbolic links as links
/// rather than dereferencing them.
pub(crate) fn copy_tree(source: &Path, target: &Path) -> io::Result<()> {
    for entry in WalkDir::new(source).follow_links(false) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        let destination = if relative.as_os_str().is_empty() {
            target.to_path_buf()
        } else {
            target.join(relative)
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&destination)?;
        } else if file_type.is_symlink() {
            let link = fs::read_link(entry.path())?;
            replicate_symlink(&link, &destination)?;
        } else {
            fs::copy(entry.path(), &destination).map(|_| ())?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn replicate_symlink(link: &Path, target: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(link, target)
}

#[cfg(not(unix))]
fn replicate_symlink(_link: &Path, _target: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symbolic link relocation is only supported on unix",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &Path) -> TrashStore {
        TrashStore::new(&GuardEnv::with_roots(
            dir.to_path_buf(),
            dir.join(".trash"),
        ))
    }

    fn single_slot(trash_root: &Path) -> PathBuf {
        let mut entries: Vec<_> = fs::read_dir(trash_root)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(entries.len(), 1);
        entries.remove(0)
    }

    #[test]
    fn relocating_a_file_creates_content_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let file = dir.path().join("notes.txt");
        fs::write(&file, "important").unwrap();

        let id = store.relocate(&file).unwrap();

        assert_eq!(id.len(), 12);
        assert!(!file.exists());
        let slot = single_slot(store.trash_root());
        assert!(slot.file_name().unwrap().to_string_lossy().ends_with("-notes.txt"));
        assert_eq!(
            fs::read_to_string(slot.join(CONTENT_FILE_NAME)).unwrap(),
            "important"
        );

        let metadata: RecoveryMetadata =
            serde_json::from_str(&fs::read_to_string(slot.join(METADATA_FILE_NAME)).unwrap())
                .unwrap();
        assert_eq!(metadata.recovery_id, id);
        assert_eq!(metadata.entry_type, EntryType::File);
        assert_eq!(metadata.original_basename, "notes.txt");
        assert!(metadata.recovery_content_path.ends_with("content"));
    }

    #[test]
    fn relocating_a_directory_preserves_the_tree() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let tree = dir.path().join("srcdir");
        fs::create_dir_all(tree.join("nested")).unwrap();
        fs::write(tree.join("a.txt"), "a").unwrap();
        fs::write(tree.join("nested/b.txt"), "b").unwrap();

        store.relocate(&tree).unwrap();

        assert!(!tree.exists());
        let slot = single_slot(store.trash_root());
        let content = slot.join(CONTENT_FILE_NAME);
        assert_eq!(fs::read_to_string(content.join("a.txt")).unwrap(), "a");
        assert_eq!(
            fs::read_to_string(content.join("nested/b.txt")).unwrap(),
            "b"
        );
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_preserved_as_links() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let tree = dir.path().join("linked");
        fs::create_dir_all(&tree).unwrap();
        fs::write(tree.join("real.txt"), "real").unwrap();
        std::os::unix::fs::symlink("real.txt", tree.join("alias")).unwrap();

        store.relocate(&tree).unwrap();

        let slot = single_slot(store.trash_root());
        let alias = slot.join(CONTENT_FILE_NAME).join("alias");
        assert!(alias.symlink_metadata().unwrap().file_type().is_symlink());
        assert_eq!(fs::read_link(alias).unwrap(), PathBuf::from("real.txt"));
    }

    #[test]
    fn recovery_ids_are_distinct() {
        let first = fresh_recovery_id();
        let second = fresh_recovery_id();
        assert_ne!(first, second);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn failed_relocation_leaves_original_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let missing = dir.path().join("never-existed.txt");

        assert!(store.relocate(&missing).is_err());
        assert!(!missing.exists());
    }
}
