//! Snapshot creation
//!
//! The builder walks a source installation, stages a copy of everything
//! worth capturing in a private temporary directory, computes per-file
//! manifest entries, and emits the finished snapshot as either a packed
//! archive or a plain directory under the destination.
//!
//! Staging is a scoped resource: the temporary directory is removed on
//! every exit path, success or failure. A source file that cannot be read
//! aborts the whole build; partial snapshots are never produced.

use crate::archive;
use crate::cancel::CancellationToken;
use crate::checksum;
use crate::error::{Result, VaultError};
use crate::manifest::{FileEntry, Manifest, MANIFEST_FILE_NAME};
use crate::source::{snapshot_file_name, SourceDescriptor};
use crate::utils;
use crate::verify;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, instrument};
use walkdir::WalkDir;

/// Fixed staging subdirectory for the user profile subtree
pub const USER_DIR_NAME: &str = "user";

/// Fixed staging subdirectory for custom scripts
pub const SCRIPTS_DIR_NAME: &str = "custom_scripts";

/// Options for snapshot creation
#[derive(Debug, Clone)]
pub struct BackupOptions {
    /// Pack the snapshot into a single archive file
    pub compress: bool,
    /// Run full verification on the produced snapshot before returning
    pub verify_after: bool,
    /// Cooperative cancellation, observed between files
    pub cancel: CancellationToken,
}

impl Default for BackupOptions {
    fn default() -> Self {
        Self {
            compress: true,
            verify_after: true,
            cancel: CancellationToken::new(),
        }
    }
}

/// One file scheduled for capture
struct PlannedFile {
    /// Absolute path in the source installation
    source: PathBuf,
    /// Path of the staged copy, relative to the staging root
    staged: PathBuf,
    /// Manifest entry path, relative to the source root
    entry_path: String,
}

/// Create a snapshot of a source installation
///
/// Captures the primary config file, the user profile subtree and, when
/// present, the custom scripts subtree. Entry paths in the manifest are
/// relative to the source root, which is exactly what restore later replays
/// against an installation root.
///
/// Returns the path of the produced snapshot (archive file or directory).
///
/// # Errors
///
/// - [`VaultError::Validation`] if the source is not a complete installation
/// - [`VaultError::Io`] if any source file cannot be read or copied; the
///   build aborts rather than produce a partial snapshot
/// - [`VaultError::VerificationFailed`] if `verify_after` is set and the
///   produced snapshot does not verify; the snapshot is left on disk for
///   inspection
/// - [`VaultError::Cancelled`] if the options' token is cancelled
#[instrument(skip(source, options), fields(source = %source.label))]
pub fn create_backup(
    source: &SourceDescriptor,
    output_dir: &Path,
    options: &BackupOptions,
) -> Result<PathBuf> {
    if !source.is_valid() {
        return Err(VaultError::validation(format!(
            "{} is not a complete installation at {:?}",
            source.display_name, source.root
        )));
    }

    utils::ensure_dir(output_dir)?;

    // Private staging area, deleted unconditionally when dropped
    let staging = TempDir::new()?;
    let staging_root = staging.path().join("snapshot");
    fs::create_dir(&staging_root)?;

    let plan = plan_capture(source)?;
    debug!("Capture plan holds {} files", plan.len());

    for file in &plan {
        options.cancel.check()?;
        utils::copy_file_preserving(&file.source, &staging_root.join(&file.staged))?;
    }

    // Hash in parallel; collect preserves the discovery order of the plan
    let entries: Vec<FileEntry> = plan
        .par_iter()
        .map(|file| -> Result<FileEntry> {
            options.cancel.check()?;
            let size = fs::metadata(&file.source)?.len();
            let digest = checksum::hash_file(&file.source)?;
            Ok(FileEntry {
                path: file.entry_path.clone(),
                size,
                digest,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let manifest = Manifest::new(
        source.label.clone(),
        source.version.clone(),
        std::env::consts::OS,
        entries,
        options.compress,
    );
    fs::write(staging_root.join(MANIFEST_FILE_NAME), manifest.to_bytes()?)?;

    let name = snapshot_file_name(&source.label, manifest.created_at, options.compress);
    let output_path = output_dir.join(name);

    if options.compress {
        archive::pack(&staging_root, &output_path)?;
    } else {
        utils::copy_tree_preserving(&staging_root, &output_path)?;
    }

    info!(
        "Created snapshot {:?} ({} files, {})",
        output_path,
        manifest.total_files,
        utils::format_bytes(manifest.total_size)
    );

    if options.verify_after {
        let report = verify::verify_backup_with_report(&output_path, &options.cancel);
        if !report.is_valid() {
            // Keep the snapshot on disk as evidence
            return Err(VaultError::VerificationFailed {
                path: output_path,
                reason: report.summary(),
            });
        }
    }

    Ok(output_path)
}

/// Enumerate the files to capture, in discovery order
///
/// Order is: primary config, then the user subtree, then the scripts
/// subtree, each walked in file-name order. This order is what the manifest
/// records.
fn plan_capture(source: &SourceDescriptor) -> Result<Vec<PlannedFile>> {
    let mut plan = Vec::new();

    if let Some(conf) = &source.primary_config {
        let file_name = conf
            .file_name()
            .ok_or_else(|| VaultError::internal(format!("no file name in {:?}", conf)))?;
        plan.push(PlannedFile {
            source: conf.clone(),
            staged: PathBuf::from(file_name),
            entry_path: utils::relative_unix_path(conf, &source.root)?,
        });
    }

    if let Some(user_dir) = &source.user_dir {
        plan_subtree(user_dir, Path::new(USER_DIR_NAME), &source.root, &mut plan)?;
    }

    if let Some(scripts_dir) = &source.scripts_dir {
        if scripts_dir.is_dir() {
            plan_subtree(
                scripts_dir,
                Path::new(SCRIPTS_DIR_NAME),
                &source.root,
                &mut plan,
            )?;
        }
    }

    Ok(plan)
}

fn plan_subtree(
    subtree: &Path,
    staged_prefix: &Path,
    source_root: &Path,
    plan: &mut Vec<PlannedFile>,
) -> Result<()> {
    for entry in WalkDir::new(subtree).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let within_subtree = entry.path().strip_prefix(subtree).map_err(|_| {
            VaultError::internal(format!(
                "path {:?} is not under {:?}",
                entry.path(),
                subtree
            ))
        })?;
        plan.push(PlannedFile {
            source: entry.path().to_path_buf(),
            staged: staged_prefix.join(within_subtree),
            entry_path: utils::relative_unix_path(entry.path(), source_root)?,
        });
    }
    Ok(())
}
