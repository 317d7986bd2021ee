//! Snapshot integrity verification
//!
//! Verification re-derives everything the manifest claims: the container
//! must be structurally sound, the manifest must load and satisfy its
//! invariants, every listed file must exist under the snapshot root, and
//! every digest must match a fresh recomputation.
//!
//! The check runs in two strict phases. The existence sweep completes over
//! the whole file list and collects **all** missing paths; only when nothing
//! is missing does the digest sweep run, which again collects **all**
//! mismatches before the verdict. One verification pass therefore yields a
//! complete picture instead of stopping at the first defect.
//!
//! The public contract is a report, never a fault: corruption, parse errors
//! and I/O problems inside the snapshot all surface as an invalid report so
//! callers can treat "invalid backup" as ordinary data.

use crate::archive;
use crate::cancel::CancellationToken;
use crate::checksum;
use crate::error::{Result, VaultError};
use crate::manifest::{Manifest, MANIFEST_FILE_NAME};
use crate::utils;
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::TempDir;
use tracing::{debug, info, instrument, warn};

/// Outcome of verifying one snapshot
#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    /// Snapshot that was checked
    pub snapshot_path: PathBuf,
    /// Container structural check (always true for directory snapshots)
    pub archive_ok: bool,
    /// Manifest loaded and satisfied its invariants
    pub manifest_ok: bool,
    /// Every manifest path that does not exist under the snapshot root
    pub missing_files: Vec<String>,
    /// Every manifest path whose recomputed digest disagrees; empty when
    /// the existence sweep already failed, since digests are not checked
    /// in that case
    pub digest_mismatches: Vec<String>,
    /// Number of manifest entries examined
    pub files_checked: usize,
    /// Faults that prevented a phase from completing (I/O, staging, cancel)
    pub errors: Vec<String>,
    /// Wall-clock time of the verification pass in milliseconds
    pub duration_ms: u64,
}

impl VerificationReport {
    fn new(snapshot_path: &Path) -> Self {
        Self {
            snapshot_path: snapshot_path.to_path_buf(),
            archive_ok: false,
            manifest_ok: false,
            missing_files: Vec::new(),
            digest_mismatches: Vec::new(),
            files_checked: 0,
            errors: Vec::new(),
            duration_ms: 0,
        }
    }

    /// Whether the snapshot passed every check
    pub fn is_valid(&self) -> bool {
        self.archive_ok
            && self.manifest_ok
            && self.missing_files.is_empty()
            && self.digest_mismatches.is_empty()
            && self.errors.is_empty()
    }

    /// One-line human-readable summary
    pub fn summary(&self) -> String {
        if self.is_valid() {
            return format!("{} files verified", self.files_checked);
        }
        if !self.archive_ok {
            return "archive structural check failed".to_string();
        }
        if !self.manifest_ok {
            return "manifest missing or invalid".to_string();
        }
        if !self.missing_files.is_empty() {
            return format!("{} file(s) missing", self.missing_files.len());
        }
        if !self.digest_mismatches.is_empty() {
            return format!("{} digest mismatch(es)", self.digest_mismatches.len());
        }
        self.errors.join("; ")
    }
}

/// Read-only summary of a snapshot for display purposes
#[derive(Debug, Clone)]
pub struct SnapshotInfo {
    /// Path to the snapshot file or directory
    pub path: PathBuf,
    /// The snapshot's manifest
    pub manifest: Manifest,
    /// Whether the snapshot passed full verification
    pub is_valid: bool,
    /// On-disk size of the snapshot in megabytes
    pub size_mb: f64,
}

/// Whether a snapshot path is a packed archive (as opposed to a directory)
pub fn is_packed(snapshot_path: &Path) -> bool {
    snapshot_path.is_file()
        && snapshot_path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
}

/// Load the manifest out of a packed or unpacked snapshot
///
/// # Errors
///
/// Returns [`VaultError::ManifestParse`] when the manifest is absent or
/// violates its invariants, or an archive/I/O error when the snapshot
/// cannot be read.
pub fn load_manifest(snapshot_path: &Path) -> Result<Manifest> {
    let bytes = if is_packed(snapshot_path) {
        archive::read_entry(snapshot_path, MANIFEST_FILE_NAME)?
    } else {
        let manifest_path = snapshot_path.join(MANIFEST_FILE_NAME);
        if !manifest_path.is_file() {
            return Err(VaultError::manifest(format!(
                "no {} in {:?}",
                MANIFEST_FILE_NAME, snapshot_path
            )));
        }
        fs::read(manifest_path)?
    };
    Manifest::from_bytes(&bytes)
}

/// Verify a snapshot, reporting only the verdict
pub fn verify_backup(snapshot_path: &Path) -> bool {
    verify_backup_with_report(snapshot_path, &CancellationToken::new()).is_valid()
}

/// Verify a snapshot and return the full diagnostic report
///
/// Never returns an error: every failure mode is folded into the report.
/// Cancellation marks the report invalid through its `errors` field.
#[instrument(skip(cancel))]
pub fn verify_backup_with_report(
    snapshot_path: &Path,
    cancel: &CancellationToken,
) -> VerificationReport {
    let start = Instant::now();
    let mut report = VerificationReport::new(snapshot_path);

    if !snapshot_path.exists() {
        report.errors.push(format!("snapshot not found: {:?}", snapshot_path));
        report.duration_ms = start.elapsed().as_millis() as u64;
        return report;
    }

    // Phase 1: container structure
    let packed = is_packed(snapshot_path);
    report.archive_ok = !packed || archive::is_structurally_valid(snapshot_path);
    if !report.archive_ok {
        warn!("Structural check failed for {:?}", snapshot_path);
        report.duration_ms = start.elapsed().as_millis() as u64;
        return report;
    }

    // Phase 2: manifest
    let manifest = match load_manifest(snapshot_path) {
        Ok(manifest) => {
            report.manifest_ok = true;
            manifest
        }
        Err(e) => {
            warn!("Manifest load failed for {:?}: {}", snapshot_path, e);
            report.errors.push(format!("manifest: {}", e));
            report.duration_ms = start.elapsed().as_millis() as u64;
            return report;
        }
    };

    // Packed snapshots are checked against a scoped extraction
    let staging: Option<TempDir>;
    let check_root: PathBuf = if packed {
        let tmp = match TempDir::new() {
            Ok(tmp) => tmp,
            Err(e) => {
                report.errors.push(format!("staging: {}", e));
                report.duration_ms = start.elapsed().as_millis() as u64;
                return report;
            }
        };
        if let Err(e) = archive::unpack(snapshot_path, tmp.path()) {
            report.errors.push(format!("unpack: {}", e));
            report.duration_ms = start.elapsed().as_millis() as u64;
            return report;
        }
        let root = tmp.path().to_path_buf();
        staging = Some(tmp);
        root
    } else {
        staging = None;
        snapshot_path.to_path_buf()
    };
    let _staging = staging; // keep the extraction alive for both sweeps

    report.files_checked = manifest.files.len();

    // Phase 3: existence sweep, collecting every missing path
    for entry in &manifest.files {
        if cancel.is_cancelled() {
            report.errors.push("verification cancelled".to_string());
            report.duration_ms = start.elapsed().as_millis() as u64;
            return report;
        }
        if !check_root.join(&entry.path).is_file() {
            report.missing_files.push(entry.path.clone());
        }
    }
    if !report.missing_files.is_empty() {
        // Digest checking does not run when files are missing
        debug!(
            "{} missing file(s) in {:?}",
            report.missing_files.len(),
            snapshot_path
        );
        report.duration_ms = start.elapsed().as_millis() as u64;
        return report;
    }

    // Phase 4: digest sweep; fan out, then fold every finding in
    let findings: Vec<(Option<String>, Option<String>)> = manifest
        .files
        .par_iter()
        .map(|entry| {
            if cancel.is_cancelled() {
                return (None, None);
            }
            match checksum::hash_file(&check_root.join(&entry.path)) {
                Ok(actual) if actual == entry.digest => (None, None),
                Ok(_) => (Some(entry.path.clone()), None),
                Err(e) => (None, Some(format!("{}: {}", entry.path, e))),
            }
        })
        .collect();

    for (mismatch, error) in findings {
        if let Some(path) = mismatch {
            report.digest_mismatches.push(path);
        }
        if let Some(error) = error {
            report.errors.push(error);
        }
    }
    if cancel.is_cancelled() {
        report.errors.push("verification cancelled".to_string());
    }

    report.duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Verified {:?} in {}ms: {}",
        snapshot_path,
        report.duration_ms,
        report.summary()
    );
    report
}

/// Compose manifest load, verification and size computation into a
/// read-only summary
///
/// # Errors
///
/// Fails when the snapshot or its manifest cannot be read; a snapshot that
/// reads but does not verify is reported with `is_valid == false`, not an
/// error.
pub fn snapshot_info(snapshot_path: &Path) -> Result<SnapshotInfo> {
    if !snapshot_path.exists() {
        return Err(VaultError::validation(format!(
            "snapshot not found: {:?}",
            snapshot_path
        )));
    }

    let manifest = load_manifest(snapshot_path)?;
    let is_valid = verify_backup(snapshot_path);

    let size_bytes = if snapshot_path.is_file() {
        fs::metadata(snapshot_path)?.len()
    } else {
        utils::dir_size(snapshot_path)?
    };

    Ok(SnapshotInfo {
        path: snapshot_path.to_path_buf(),
        manifest,
        is_valid,
        size_mb: size_bytes as f64 / (1024.0 * 1024.0),
    })
}
