//! Path classification, the trash store, and recovery.
//!
//! - [`classifier`] assigns each concrete deletion target a disposition.
//! - [`trash`] relocates protected targets into recovery slots.
//! - [`recovery`] lists, restores, and purges those slots later.

pub mod classifier;
pub mod recovery;
pub mod trash;

pub use classifier::{PathVerdict, classify, resolve_path};
pub use recovery::{RecoveryManager, RecoveryReport, RecoverySlot};
pub use trash::{EntryType, RecoveryMetadata, TrashStore};
