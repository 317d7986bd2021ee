//! Snapshot archive container
//!
//! Packed snapshots are standard ZIP containers with DEFLATE compression
//! per entry. Entry names are POSIX-style paths relative to the packed
//! directory, so a container produced on one platform unpacks identically
//! on another. Directory entries are not written; the relative tree is
//! recreated from file entry names on extraction.
//!
//! Extraction refuses any entry whose resolved path would escape the output
//! directory. Structural validation drains every entry through the decoder,
//! which checks each entry's CRC without materializing content on disk.

use crate::error::{Result, VaultError};
use crate::utils;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Pack every regular file under `source_dir` into a single archive
///
/// Files are walked in name order so the container layout is deterministic
/// for a given tree. Returns the path of the written archive.
pub fn pack(source_dir: &Path, output_file: &Path) -> Result<PathBuf> {
    let file = File::create(output_file)?;
    let mut writer = ZipWriter::new(BufWriter::new(file));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut entries = 0usize;
    for entry in WalkDir::new(source_dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let arcname = utils::relative_unix_path(entry.path(), source_dir)?;
        trace!("Packing entry {}", arcname);
        writer.start_file(arcname, options)?;
        let mut src = File::open(entry.path())?;
        io::copy(&mut src, &mut writer)?;
        entries += 1;
    }

    writer.finish()?;
    debug!("Packed {} entries into {:?}", entries, output_file);
    Ok(output_file.to_path_buf())
}

/// Unpack an archive into `output_dir`, recreating the relative tree
///
/// Intermediate directories are created as needed.
///
/// # Errors
///
/// Returns [`VaultError::Archive`] for any entry whose name resolves
/// outside `output_dir` (absolute paths or `..` traversal); nothing is
/// written for such an entry.
pub fn unpack(archive_file: &Path, output_dir: &Path) -> Result<PathBuf> {
    let file = File::open(archive_file)?;
    let mut archive = ZipArchive::new(file)?;
    fs::create_dir_all(output_dir)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        // Containment check before any write; entry names are untrusted.
        let relative = entry
            .enclosed_name()
            .map(Path::to_path_buf)
            .ok_or_else(|| {
                VaultError::archive(format!(
                    "entry {:?} escapes the extraction directory",
                    entry.name()
                ))
            })?;
        let out_path = output_dir.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&out_path)?;
        io::copy(&mut entry, &mut out)?;
    }

    debug!("Unpacked {:?} into {:?}", archive_file, output_dir);
    Ok(output_dir.to_path_buf())
}

/// Read a single entry's bytes without extracting the container
///
/// Used to load the manifest out of a packed snapshot.
pub fn read_entry(archive_file: &Path, name: &str) -> Result<Vec<u8>> {
    let file = File::open(archive_file)?;
    let mut archive = ZipArchive::new(file)?;
    let mut entry = archive.by_name(name).map_err(|e| match e {
        ZipError::FileNotFound => {
            VaultError::archive(format!("entry {} not found in {:?}", name, archive_file))
        }
        other => VaultError::Zip(other),
    })?;
    let mut bytes = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// Check container structural integrity without extracting content
///
/// Every entry is drained through the decoder, which verifies the per-entry
/// CRC at end of stream. Returns `false` for a missing file, an unreadable
/// file, or a corrupted container; this function never fails with an error.
pub fn is_structurally_valid(archive_file: &Path) -> bool {
    match scan_entries(archive_file) {
        Ok(()) => true,
        Err(e) => {
            debug!("Structural check failed for {:?}: {}", archive_file, e);
            false
        }
    }
}

fn scan_entries(archive_file: &Path) -> Result<()> {
    let file = File::open(archive_file)?;
    let mut archive = ZipArchive::new(file)?;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        io::copy(&mut entry, &mut io::sink())?;
    }
    Ok(())
}
