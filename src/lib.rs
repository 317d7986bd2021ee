//! # slicervault - verified backups of slicer configuration trees
//!
//! slicervault captures the on-disk configuration state of a desktop slicer
//! into a content-addressed, checksum-verified snapshot, and can later
//! verify that snapshot or reconstruct the original tree from it exactly.
//!
//! ## Overview
//!
//! A snapshot is a directory or a single ZIP archive containing the captured
//! files plus a `backup_manifest.json` at its root. The manifest records
//! every file's relative path, size and SHA-256 digest together with
//! aggregate statistics; it is the authority everything else checks against:
//!
//! - **Backup** stages a copy of the source tree, computes per-file
//!   entries, writes the manifest, and emits the snapshot.
//! - **Verify** re-derives everything the manifest claims, in two strict
//!   phases: a full existence sweep, then a full digest sweep.
//! - **Restore** verifies first, maps manifest entries onto a target
//!   installation, and copies them across, tolerating individual missing
//!   files but never unverified snapshots.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use slicervault::{create_backup, restore_backup, verify_backup};
//! use slicervault::{BackupOptions, RestoreOptions};
//! use slicervault::discovery::{self, SystemResolver};
//! use std::path::Path;
//!
//! # fn main() -> slicervault::Result<()> {
//! // Snapshot the detected OrcaSlicer installation
//! let source = discovery::describe(discovery::ORCASLICER)?;
//! let snapshot = create_backup(&source, Path::new("./backups"), &BackupOptions::default())?;
//!
//! // Check it later
//! assert!(verify_backup(&snapshot));
//!
//! // And put it back
//! let result = restore_backup(&snapshot, &SystemResolver, &RestoreOptions::with_safety_backup())?;
//! println!("restored {}/{} files", result.restored_files, result.total_files);
//! # Ok(())
//! # }
//! ```
//!
//! ## Failure-handling contract
//!
//! Preconditions (invalid source, unverified snapshot, missing target) fail
//! fast with [`VaultError::Validation`]. A file that cannot be read aborts a
//! backup outright; the same failure during restore becomes a warning in the
//! [`restore::RestoreResult`] and the operation continues. The verifier
//! never faults past its boundary: corruption of any kind is reported as an
//! invalid snapshot, so "invalid backup" is ordinary data to callers.
//!
//! ## Module Organization
//!
//! - [`checksum`]: streaming SHA-256 content digests
//! - [`archive`]: ZIP container pack/unpack and structural validation
//! - [`manifest`]: the snapshot manifest model and its invariants
//! - [`backup`]: snapshot creation
//! - [`verify`]: snapshot integrity verification
//! - [`restore`]: restore planning and reconciliation
//! - [`source`]: source descriptors and snapshot naming
//! - [`discovery`]: platform lookup of installed slicers
//! - [`cancel`]: cooperative cancellation
//! - [`error`]: error types and handling

pub mod archive;
pub mod backup;
pub mod cancel;
pub mod checksum;
pub mod discovery;
pub mod error;
pub mod manifest;
pub mod restore;
pub mod source;
pub mod utils;
pub mod verify;

// Re-export the main entry points for convenience
pub use backup::{create_backup, BackupOptions};
pub use cancel::CancellationToken;
pub use error::{Result, VaultError};
pub use manifest::{FileEntry, Manifest, MANIFEST_FILE_NAME};
pub use restore::{plan_restore, restore_backup, RestoreOptions, RestoreResult};
pub use source::{snapshot_file_name, SourceDescriptor, SourceResolver};
pub use verify::{
    load_manifest, snapshot_info, verify_backup, verify_backup_with_report, SnapshotInfo,
    VerificationReport,
};
