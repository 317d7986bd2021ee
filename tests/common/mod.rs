//! Shared fixtures for integration tests

use slicervault::error::Result;
use slicervault::source::{SourceDescriptor, SourceResolver};
use std::fs;
use std::path::Path;

/// Lay down a slicer-like installation under `root` and describe it
///
/// The tree is:
/// ```text
/// root/
///   OrcaSlicer.conf        (12 bytes)
///   user/
///     profile.json         (40 bytes)
///     machine/printer.json
///     filament/empty.json  (0 bytes)
///   custom_scripts/
///     post_process.py
/// ```
pub fn install_source(root: &Path) -> SourceDescriptor {
    fs::create_dir_all(root.join("user/machine")).unwrap();
    fs::create_dir_all(root.join("user/filament")).unwrap();
    fs::create_dir_all(root.join("custom_scripts")).unwrap();

    // Sizes are load-bearing for the aggregate assertions
    fs::write(root.join("OrcaSlicer.conf"), b"0123456789AB").unwrap();
    fs::write(
        root.join("user/profile.json"),
        b"{\"layer_height\":0.2,\"walls\":3}\n12345678",
    )
    .unwrap();
    fs::write(root.join("user/machine/printer.json"), b"{\"bed\":256}").unwrap();
    fs::write(root.join("user/filament/empty.json"), b"").unwrap();
    fs::write(root.join("custom_scripts/post_process.py"), b"#!/usr/bin/env python\n")
        .unwrap();

    describe_install(root)
}

/// Describe an installation laid out by [`install_source`]
pub fn describe_install(root: &Path) -> SourceDescriptor {
    SourceDescriptor {
        label: "orcaslicer".to_string(),
        display_name: "OrcaSlicer".to_string(),
        root: root.to_path_buf(),
        version: Some("2.3.1".to_string()),
        primary_config: Some(root.join("OrcaSlicer.conf")),
        user_dir: Some(root.join("user")),
        scripts_dir: Some(root.join("custom_scripts")),
    }
}

/// Resolver that always answers with a fixed descriptor
pub struct FixedResolver(pub SourceDescriptor);

impl SourceResolver for FixedResolver {
    fn resolve(&self, _label: &str) -> Result<SourceDescriptor> {
        Ok(self.0.clone())
    }
}

/// Relative paths of every file in the fixture installation, in the
/// builder's discovery order
pub fn fixture_paths() -> Vec<&'static str> {
    vec![
        "OrcaSlicer.conf",
        "user/filament/empty.json",
        "user/machine/printer.json",
        "user/profile.json",
        "custom_scripts/post_process.py",
    ]
}
