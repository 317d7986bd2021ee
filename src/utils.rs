//! Utility functions shared across the backup pipeline
//!
//! File copies here preserve permissions and modification time. Preserved
//! metadata is a convenience for users inspecting restored trees; it is not
//! part of the integrity contract, which covers content digests only.

use crate::error::{Result, VaultError};
use filetime::FileTime;
use std::fs;
use std::path::Path;
use tracing::trace;
use walkdir::WalkDir;

/// Ensure a directory exists, creating it and its parents if necessary
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.is_dir() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Copy a single file, creating parent directories and preserving
/// permissions and modification time
///
/// `fs::copy` carries permissions across; the modification time is restamped
/// from the source afterwards.
pub fn copy_file_preserving(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(src, dst)?;

    let metadata = fs::metadata(src)?;
    let mtime = FileTime::from_last_modification_time(&metadata);
    filetime::set_file_mtime(dst, mtime)?;

    trace!("Copied {:?} -> {:?}", src, dst);
    Ok(())
}

/// Recursively copy every regular file under `src_dir` into `dst_dir`,
/// preserving the relative structure and per-file metadata
///
/// Walks in file-name order so the copy order is deterministic.
pub fn copy_tree_preserving(src_dir: &Path, dst_dir: &Path) -> Result<()> {
    for entry in WalkDir::new(src_dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(src_dir)
            .map_err(|_| {
                VaultError::internal(format!(
                    "path {:?} is not under {:?}",
                    entry.path(),
                    src_dir
                ))
            })?;
        copy_file_preserving(entry.path(), &dst_dir.join(relative))?;
    }
    Ok(())
}

/// Express `path` relative to `base` as a forward-slash separated string
///
/// Manifest entry paths and archive entry names use this form on every
/// platform. Fails if the path is not under `base` or contains non-UTF-8
/// components.
pub fn relative_unix_path(path: &Path, base: &Path) -> Result<String> {
    let relative = path.strip_prefix(base).map_err(|_| {
        VaultError::internal(format!("path {:?} is not relative to {:?}", path, base))
    })?;

    let mut parts = Vec::new();
    for component in relative.components() {
        let part = component
            .as_os_str()
            .to_str()
            .ok_or_else(|| VaultError::PathConversion(path.to_path_buf()))?;
        parts.push(part);
    }
    Ok(parts.join("/"))
}

/// Total size in bytes of all regular files under a directory
pub fn dir_size(path: &Path) -> Result<u64> {
    let mut total = 0u64;
    for entry in WalkDir::new(path) {
        let entry = entry?;
        if entry.file_type().is_file() {
            total += entry.metadata()?.len();
        }
    }
    Ok(total)
}

/// Format bytes in human-readable form
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", size as u64, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}
