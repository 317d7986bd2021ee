//! Backup manifest model
//!
//! A manifest is the authoritative description of a snapshot: the ordered
//! file list with sizes and content digests, aggregate statistics, and
//! metadata about where the snapshot came from. It is created exactly once
//! by the snapshot builder, serialized to [`MANIFEST_FILE_NAME`] at the
//! snapshot root, and read-only for the verifier and the restore
//! reconciler from then on.
//!
//! ## Aggregate invariants
//!
//! For every valid manifest:
//!
//! - `total_files == files.len()`
//! - `total_size == sum(files[i].size)`
//! - entry paths are unique
//!
//! These are enforced when a manifest is deserialized; a manifest violating
//! any of them is rejected with [`VaultError::ManifestParse`] rather than
//! silently accepted.

use crate::error::{Result, VaultError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed file name of the manifest at the root of every snapshot
pub const MANIFEST_FILE_NAME: &str = "backup_manifest.json";

/// Current manifest format version
pub const MANIFEST_FORMAT_VERSION: &str = "1.0";

/// One file's identity inside a snapshot
///
/// `path` is relative to the snapshot root, forward-slash normalized and
/// unique within a manifest. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Relative path within the snapshot
    pub path: String,
    /// File size in bytes
    pub size: u64,
    /// SHA-256 digest of the file content, lowercase hex
    pub digest: String,
}

/// Manifest describing snapshot contents and metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Manifest format version, for forward compatibility
    pub format_version: String,
    /// Snapshot creation timestamp (ISO-8601 in the serialized form)
    pub created_at: DateTime<Utc>,
    /// Label identifying what was backed up, e.g. "orcaslicer"
    pub source_label: String,
    /// Detected source application version, if any
    pub source_version: Option<String>,
    /// OS family the snapshot was taken on
    pub platform: String,
    /// Backed up files, in discovery order
    pub files: Vec<FileEntry>,
    /// Total number of files; must equal `files.len()`
    pub total_files: usize,
    /// Total size of all files in bytes; must equal the sum of entry sizes
    pub total_size: u64,
    /// Whether the sibling snapshot is a packed archive
    pub compressed: bool,
}

impl Manifest {
    /// Assemble a manifest from a discovery-ordered entry list
    ///
    /// Aggregate fields are derived from `files`, so a freshly built
    /// manifest cannot violate its own invariants.
    pub fn new(
        source_label: impl Into<String>,
        source_version: Option<String>,
        platform: impl Into<String>,
        files: Vec<FileEntry>,
        compressed: bool,
    ) -> Self {
        let total_files = files.len();
        let total_size = files.iter().map(|f| f.size).sum();

        Self {
            format_version: MANIFEST_FORMAT_VERSION.to_string(),
            created_at: Utc::now(),
            source_label: source_label.into(),
            source_version,
            platform: platform.into(),
            files,
            total_files,
            total_size,
            compressed,
        }
    }

    /// Serialize to pretty-printed JSON bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Deserialize from JSON bytes, enforcing the aggregate invariants
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::ManifestParse`] on schema violations, on
    /// `total_files`/`total_size` disagreeing with the entry list, and on
    /// duplicate entry paths.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let manifest: Manifest = serde_json::from_slice(bytes)
            .map_err(|e| VaultError::manifest(e.to_string()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Total size expressed in megabytes, as a derived view
    pub fn size_in_megabytes(&self) -> f64 {
        self.total_size as f64 / (1024.0 * 1024.0)
    }

    fn validate(&self) -> Result<()> {
        if self.total_files != self.files.len() {
            return Err(VaultError::manifest(format!(
                "total_files is {} but the manifest lists {} files",
                self.total_files,
                self.files.len()
            )));
        }

        let actual_size: u64 = self.files.iter().map(|f| f.size).sum();
        if self.total_size != actual_size {
            return Err(VaultError::manifest(format!(
                "total_size is {} but entry sizes sum to {}",
                self.total_size, actual_size
            )));
        }

        let mut seen = std::collections::HashSet::with_capacity(self.files.len());
        for entry in &self.files {
            if !seen.insert(entry.path.as_str()) {
                return Err(VaultError::manifest(format!(
                    "duplicate entry path: {}",
                    entry.path
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entries() -> Vec<FileEntry> {
        vec![
            FileEntry {
                path: "Config.conf".to_string(),
                size: 12,
                digest: "a".repeat(64),
            },
            FileEntry {
                path: "user/profile.json".to_string(),
                size: 40,
                digest: "b".repeat(64),
            },
        ]
    }

    #[test]
    fn test_new_derives_aggregates() {
        let manifest = Manifest::new(
            "orcaslicer",
            Some("2.3.1".to_string()),
            "linux",
            sample_entries(),
            true,
        );

        assert_eq!(manifest.format_version, MANIFEST_FORMAT_VERSION);
        assert_eq!(manifest.total_files, 2);
        assert_eq!(manifest.total_size, 52);
        assert!(manifest.compressed);
    }

    #[test]
    fn test_round_trip_preserves_order() {
        let manifest = Manifest::new("orcaslicer", None, "linux", sample_entries(), false);
        let bytes = manifest.to_bytes().unwrap();
        let parsed = Manifest::from_bytes(&bytes).unwrap();

        assert_eq!(parsed.files, manifest.files);
        assert_eq!(parsed.created_at, manifest.created_at);
        assert_eq!(parsed.source_label, "orcaslicer");
    }

    #[test]
    fn test_created_at_serializes_iso8601() {
        let manifest = Manifest::new("orcaslicer", None, "linux", vec![], true);
        let json = String::from_utf8(manifest.to_bytes().unwrap()).unwrap();
        // RFC 3339 timestamp, e.g. "2026-08-07T12:00:00Z"
        assert!(json.contains("\"created_at\": \""));
        assert!(json.contains('T'));
    }

    #[test]
    fn test_rejects_total_files_mismatch() {
        let mut manifest = Manifest::new("orcaslicer", None, "linux", sample_entries(), true);
        manifest.total_files = 3;
        let bytes = serde_json::to_vec(&manifest).unwrap();

        let err = Manifest::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, VaultError::ManifestParse(_)));
    }

    #[test]
    fn test_rejects_total_size_mismatch() {
        let mut manifest = Manifest::new("orcaslicer", None, "linux", sample_entries(), true);
        manifest.total_size = 999;
        let bytes = serde_json::to_vec(&manifest).unwrap();

        let err = Manifest::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, VaultError::ManifestParse(_)));
    }

    #[test]
    fn test_rejects_duplicate_paths() {
        let mut entries = sample_entries();
        entries[1].path = entries[0].path.clone();
        let manifest = Manifest::new("orcaslicer", None, "linux", entries, true);
        let bytes = serde_json::to_vec(&manifest).unwrap();

        let err = Manifest::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, VaultError::ManifestParse(_)));
    }

    #[test]
    fn test_rejects_missing_required_field() {
        let err = Manifest::from_bytes(b"{\"format_version\": \"1.0\"}").unwrap_err();
        assert!(matches!(err, VaultError::ManifestParse(_)));
    }

    #[test]
    fn test_size_in_megabytes() {
        let manifest = Manifest::new(
            "orcaslicer",
            None,
            "linux",
            vec![FileEntry {
                path: "big.bin".to_string(),
                size: 3 * 1024 * 1024,
                digest: "c".repeat(64),
            }],
            true,
        );
        assert!((manifest.size_in_megabytes() - 3.0).abs() < f64::EPSILON);
    }
}
