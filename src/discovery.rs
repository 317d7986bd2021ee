//! Discovery of installed slicer configurations
//!
//! This is the only module that inspects the environment. It maps the known
//! source labels to their platform-specific configuration directories,
//! probes which pieces of an installation are present, and extracts the
//! application version from the primary config file when possible. The core
//! pipeline stays decoupled from all of this: it consumes
//! [`SourceDescriptor`] values, and restore reaches discovery only through
//! the [`SourceResolver`] trait.

use crate::error::{Result, VaultError};
use crate::source::{SourceDescriptor, SourceResolver};
use std::env;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Label for an OrcaSlicer installation
pub const ORCASLICER: &str = "orcaslicer";

/// Label for an Orca-Flashforge installation
pub const ORCA_FLASHFORGE: &str = "orca-flashforge";

/// All labels this module knows how to locate
pub fn known_labels() -> &'static [&'static str] {
    &[ORCASLICER, ORCA_FLASHFORGE]
}

/// Resolver backed by the platform lookup in this module
///
/// Pass this to [`crate::restore::restore_backup`] to let restore find the
/// installation matching a manifest's `source_label`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl SourceResolver for SystemResolver {
    fn resolve(&self, label: &str) -> Result<SourceDescriptor> {
        describe(label)
    }
}

/// Build a descriptor for a known label by probing the local filesystem
///
/// The descriptor is returned even when the installation is absent or
/// incomplete; callers decide what that means via
/// [`SourceDescriptor::is_valid`].
///
/// # Errors
///
/// Returns [`VaultError::UnknownSource`] for labels this module does not
/// know, and an error when no configuration base directory can be
/// determined on this platform.
pub fn describe(label: &str) -> Result<SourceDescriptor> {
    let (display_name, conf_name) = match label {
        ORCASLICER => ("OrcaSlicer", "OrcaSlicer.conf"),
        ORCA_FLASHFORGE => ("Orca-Flashforge", "Orca-Flashforge.conf"),
        other => return Err(VaultError::UnknownSource(other.to_string())),
    };

    let root = config_root(display_name)?;
    let primary_config = existing(root.join(conf_name));
    let user_dir = existing(root.join("user"));
    let scripts_dir = existing(root.join("custom_scripts"));
    let version = primary_config.as_deref().and_then(extract_version);

    debug!(
        "Probed {}: root={:?} version={:?}",
        display_name, root, version
    );

    Ok(SourceDescriptor {
        label: label.to_string(),
        display_name: display_name.to_string(),
        root,
        version,
        primary_config,
        user_dir,
        scripts_dir,
    })
}

/// Probe every known label and return the descriptors of complete
/// installations only
pub fn detect_installed() -> Vec<SourceDescriptor> {
    known_labels()
        .iter()
        .filter_map(|label| describe(label).ok())
        .filter(SourceDescriptor::is_valid)
        .collect()
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    if path.exists() {
        Some(path)
    } else {
        None
    }
}

/// Platform-specific configuration directory for a slicer
#[cfg(target_os = "windows")]
fn config_root(display_name: &str) -> Result<PathBuf> {
    let base = env::var_os("APPDATA")
        .map(PathBuf::from)
        .ok_or_else(|| VaultError::internal("APPDATA is not set"))?;
    Ok(base.join(display_name))
}

#[cfg(target_os = "macos")]
fn config_root(display_name: &str) -> Result<PathBuf> {
    let home = env::var_os("HOME")
        .map(PathBuf::from)
        .ok_or_else(|| VaultError::internal("HOME is not set"))?;
    Ok(home
        .join("Library")
        .join("Application Support")
        .join(display_name))
}

#[cfg(all(unix, not(target_os = "macos")))]
fn config_root(display_name: &str) -> Result<PathBuf> {
    let home = env::var_os("HOME")
        .map(PathBuf::from)
        .ok_or_else(|| VaultError::internal("HOME is not set"))?;

    // Flatpak OrcaSlicer keeps its config under ~/.var
    if display_name == "OrcaSlicer" {
        let flatpak = home
            .join(".var/app/io.github.softfever.OrcaSlicer/config/OrcaSlicer");
        if flatpak.is_dir() {
            return Ok(flatpak);
        }
    }
    Ok(home.join(".config").join(display_name))
}

/// Extract the application version from a primary config file
///
/// The config is JSON with either a `header` string such as
/// `"OrcaSlicer 2.3.1-beta"` or an `app.version` field. Any trailing
/// checksum comment appended after the JSON body is ignored. Returns `None`
/// when no version can be found; discovery never fails on this.
pub fn extract_version(conf_file: &std::path::Path) -> Option<String> {
    let content = fs::read_to_string(conf_file).ok()?;
    let body = content.split("# MD5").next().unwrap_or(&content);
    let value: serde_json::Value = serde_json::from_str(body.trim()).ok()?;

    if let Some(header) = value.get("header").and_then(|h| h.as_str()) {
        if let Some(version) = version_token(header) {
            return Some(version);
        }
    }
    value
        .get("app")
        .and_then(|app| app.get("version"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

/// Find a dotted version token like `2.3.1` or `2.3.1-beta` in free text
fn version_token(text: &str) -> Option<String> {
    for token in text.split_whitespace() {
        let trimmed = token.trim_matches(|c: char| !c.is_ascii_alphanumeric());
        let mut dots = 0;
        let numeric_prefix = trimmed
            .split('-')
            .next()
            .unwrap_or(trimmed);
        for c in numeric_prefix.chars() {
            match c {
                '0'..='9' => {}
                '.' => dots += 1,
                _ => {
                    dots = 0;
                    break;
                }
            }
        }
        if dots >= 2 && numeric_prefix.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            return Some(trimmed.to_string());
        }
    }
    None
}
