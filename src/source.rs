//! Source descriptors and snapshot naming
//!
//! A [`SourceDescriptor`] is the capability the core operates on: it names a
//! labeled directory tree and the pieces of it worth capturing. The core
//! never inspects the environment to find installations; descriptors are
//! supplied by the caller or resolved through a [`SourceResolver`]
//! implementation such as [`crate::discovery::SystemResolver`].

use crate::error::Result;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Identifies what to snapshot: a root directory plus the known
/// sub-locations of a slicer configuration tree
///
/// `primary_config`, `user_dir` and `scripts_dir` are optional because an
/// installation may lack any of them; [`SourceDescriptor::is_valid`] defines
/// the minimum a backup requires.
#[derive(Debug, Clone)]
pub struct SourceDescriptor {
    /// Stable label keyed by resolvers, e.g. "orcaslicer"
    pub label: String,
    /// Human-readable name for display, e.g. "OrcaSlicer"
    pub display_name: String,
    /// Root of the configuration tree; entry paths are relative to this
    pub root: PathBuf,
    /// Application version detected from the installation, if any
    pub version: Option<String>,
    /// Main configuration file, expected directly under `root`
    pub primary_config: Option<PathBuf>,
    /// User profile subtree
    pub user_dir: Option<PathBuf>,
    /// Custom scripts subtree; only captured when it exists
    pub scripts_dir: Option<PathBuf>,
}

impl SourceDescriptor {
    /// Whether this source is complete enough to back up
    ///
    /// The root, the primary config file and the user subtree must all
    /// exist. The scripts subtree is optional.
    pub fn is_valid(&self) -> bool {
        if !self.root.is_dir() {
            return false;
        }
        match &self.primary_config {
            Some(conf) if conf.is_file() => {}
            _ => return false,
        }
        match &self.user_dir {
            Some(dir) if dir.is_dir() => {}
            _ => return false,
        }
        true
    }
}

/// Resolves a source label to a concrete installation on this machine
///
/// Restore uses this when the caller does not supply an explicit target:
/// the manifest's `source_label` is resolved back to a descriptor. Test
/// code and embedders can provide their own implementation to avoid any
/// platform lookup.
pub trait SourceResolver {
    /// Resolve `label` to a descriptor
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::VaultError::UnknownSource`] when the label
    /// does not correspond to a known installation.
    fn resolve(&self, label: &str) -> Result<SourceDescriptor>;
}

/// Build the file name for a snapshot produced at `timestamp`
///
/// The convention is `{LabelTitleCased}_backup_{YYYY-MM-DD_HH-MM-SS}` with a
/// `.zip` extension when packed. The timestamp component is human-sortable;
/// collisions between snapshots taken within the same second are accepted.
///
/// # Examples
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use slicervault::source::snapshot_file_name;
///
/// let ts = Utc.with_ymd_and_hms(2026, 8, 7, 9, 30, 0).unwrap();
/// assert_eq!(
///     snapshot_file_name("orca-flashforge", ts, true),
///     "Orca_Flashforge_backup_2026-08-07_09-30-00.zip"
/// );
/// ```
pub fn snapshot_file_name(label: &str, timestamp: DateTime<Utc>, compressed: bool) -> String {
    let stamp = timestamp.format("%Y-%m-%d_%H-%M-%S");
    let extension = if compressed { ".zip" } else { "" };
    format!("{}_backup_{}{}", title_case_label(label), stamp, extension)
}

/// Title-case a label for use in snapshot file names
///
/// Dashes become underscores and each underscore-separated word is
/// capitalized: "orca-flashforge" -> "Orca_Flashforge".
fn title_case_label(label: &str) -> String {
    label
        .replace('-', "_")
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("_")
}
