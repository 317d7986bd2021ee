//! Restore reconciliation
//!
//! Restore replays a verified snapshot onto a target installation. The
//! file mapping is a pure function of the manifest and the target root;
//! applying it is deliberately tolerant: an individual file that is absent
//! from the snapshot or fails to copy becomes a warning and the operation
//! continues. Only systemic preconditions abort a restore: a snapshot
//! that fails verification, a target root that does not exist, or a failed
//! pre-restore safety backup.

use crate::backup::{create_backup, BackupOptions};
use crate::cancel::CancellationToken;
use crate::error::{Result, VaultError};
use crate::manifest::Manifest;
use crate::source::{SourceDescriptor, SourceResolver};
use crate::utils;
use crate::verify;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, instrument, warn};

/// Number of mapping entries carried in a dry-run preview
const DRY_RUN_PREVIEW_LIMIT: usize = 10;

/// One planned copy from snapshot to target
#[derive(Debug, Clone, Serialize)]
pub struct MappedFile {
    /// Path relative to the snapshot root
    pub source: String,
    /// Absolute destination under the target root
    pub destination: PathBuf,
}

/// Options for a restore operation
#[derive(Debug, Clone, Default)]
pub struct RestoreOptions {
    /// Explicit target; when absent the manifest's source label is resolved
    pub target: Option<SourceDescriptor>,
    /// Plan only: report the mapping without touching the target
    pub dry_run: bool,
    /// Snapshot the current target state before overwriting it
    pub backup_existing: bool,
    /// Where to place the safety snapshot; defaults to a sibling of the
    /// target root
    pub safety_backup_dir: Option<PathBuf>,
    /// Cooperative cancellation, observed between files
    pub cancel: CancellationToken,
}

impl RestoreOptions {
    /// Options with the pre-restore safety backup enabled
    pub fn with_safety_backup() -> Self {
        Self {
            backup_existing: true,
            ..Default::default()
        }
    }
}

/// Outcome of a restore operation
///
/// Partial success is a result value, not an error: callers inspect
/// [`RestoreResult::is_complete`] and `warnings`.
#[derive(Debug, Clone, Serialize)]
pub struct RestoreResult {
    /// Number of files the mapping planned
    pub total_files: usize,
    /// Number of files actually copied
    pub restored_files: usize,
    /// Per-file problems that did not abort the restore
    pub warnings: Vec<String>,
    /// Whether this was a planning-only run
    pub dry_run: bool,
    /// Bounded preview of the mapping, populated on dry runs
    pub preview: Vec<MappedFile>,
    /// Safety snapshot taken before the restore, if one was made
    pub safety_backup: Option<PathBuf>,
}

impl RestoreResult {
    /// Whether every planned file was restored (dry runs count as complete)
    pub fn is_complete(&self) -> bool {
        self.dry_run || self.restored_files == self.total_files
    }
}

/// Compute the snapshot-to-target file mapping
///
/// Pure function of the manifest and the target root; performs no
/// filesystem access. Entry order follows the manifest.
pub fn plan_restore(manifest: &Manifest, target_root: &Path) -> Vec<MappedFile> {
    manifest
        .files
        .iter()
        .map(|entry| MappedFile {
            source: entry.path.clone(),
            destination: target_root.join(&entry.path),
        })
        .collect()
}

/// Restore a snapshot onto a target installation
///
/// The snapshot is fully verified first; restore never proceeds against
/// unverified content. The target is either `options.target` or the
/// installation the resolver finds for the manifest's source label.
///
/// # Errors
///
/// - [`VaultError::Validation`] when the snapshot fails verification or the
///   target root does not exist
/// - [`VaultError::Restore`] when the requested safety backup cannot be
///   produced; the restore aborts rather than risk an unrecoverable
///   overwrite
/// - [`VaultError::Cancelled`] when the options' token is cancelled
#[instrument(skip(resolver, options))]
pub fn restore_backup(
    snapshot_path: &Path,
    resolver: &dyn SourceResolver,
    options: &RestoreOptions,
) -> Result<RestoreResult> {
    // Systemic precondition: only verified snapshots are restored
    let report = verify::verify_backup_with_report(snapshot_path, &options.cancel);
    if !report.is_valid() {
        return Err(VaultError::validation(format!(
            "snapshot {:?} failed verification: {}",
            snapshot_path,
            report.summary()
        )));
    }

    let manifest = verify::load_manifest(snapshot_path)?;
    let target = match &options.target {
        Some(target) => target.clone(),
        None => resolver.resolve(&manifest.source_label)?,
    };

    if !target.root.is_dir() {
        return Err(VaultError::validation(format!(
            "{} not found at {:?}",
            target.display_name, target.root
        )));
    }

    let mapping = plan_restore(&manifest, &target.root);

    if options.dry_run {
        info!(
            "Dry run: would restore {} files to {:?}",
            mapping.len(),
            target.root
        );
        let preview: Vec<MappedFile> =
            mapping.iter().take(DRY_RUN_PREVIEW_LIMIT).cloned().collect();
        for planned in &preview {
            debug!("  {} -> {:?}", planned.source, planned.destination);
        }
        return Ok(RestoreResult {
            total_files: mapping.len(),
            restored_files: 0,
            warnings: Vec::new(),
            dry_run: true,
            preview,
            safety_backup: None,
        });
    }

    // Safety snapshot of the current target state; failure here is fatal
    let safety_backup = if options.backup_existing && target.is_valid() {
        let side_dir = options.safety_backup_dir.clone().unwrap_or_else(|| {
            target
                .root
                .parent()
                .unwrap_or(&target.root)
                .join("slicervault_pre_restore")
        });
        info!("Backing up existing configuration to {:?}", side_dir);
        let safety_options = BackupOptions {
            compress: true,
            verify_after: false,
            cancel: options.cancel.clone(),
        };
        let path = create_backup(&target, &side_dir, &safety_options).map_err(|e| {
            VaultError::restore(format!(
                "failed to back up existing configuration: {}",
                e
            ))
        })?;
        Some(path)
    } else {
        None
    };

    // Packed snapshots are read through a scoped extraction
    let staging: Option<TempDir>;
    let source_root = if verify::is_packed(snapshot_path) {
        let tmp = TempDir::new()?;
        crate::archive::unpack(snapshot_path, tmp.path())?;
        let root = tmp.path().to_path_buf();
        staging = Some(tmp);
        root
    } else {
        staging = None;
        snapshot_path.to_path_buf()
    };
    let _staging = staging;

    let (restored_files, warnings) =
        apply_file_mapping(&source_root, &mapping, &options.cancel)?;

    let result = RestoreResult {
        total_files: mapping.len(),
        restored_files,
        warnings,
        dry_run: false,
        preview: Vec::new(),
        safety_backup,
    };

    info!(
        "Restored {}/{} files to {:?}",
        result.restored_files, result.total_files, target.root
    );
    Ok(result)
}

/// Copy each mapped file from the snapshot view into place
///
/// Individual failures are collected as warnings; the sweep continues past
/// them. Returns the restored count alongside the warnings.
fn apply_file_mapping(
    source_root: &Path,
    mapping: &[MappedFile],
    cancel: &CancellationToken,
) -> Result<(usize, Vec<String>)> {
    let mut restored = 0usize;
    let mut warnings = Vec::new();

    for planned in mapping {
        cancel.check()?;

        let source = source_root.join(&planned.source);
        if !source.is_file() {
            warn!("File not found in snapshot: {}", planned.source);
            warnings.push(format!("file not found in snapshot: {}", planned.source));
            continue;
        }

        match utils::copy_file_preserving(&source, &planned.destination) {
            Ok(()) => restored += 1,
            Err(e) => {
                warn!("Failed to restore {}: {}", planned.source, e);
                warnings.push(format!("failed to restore {}: {}", planned.source, e));
            }
        }
    }

    Ok((restored, warnings))
}
