//! Build -> verify -> restore round-trip behavior

mod common;

use common::{describe_install, fixture_paths, install_source, FixedResolver};
use slicervault::backup::{create_backup, BackupOptions};
use slicervault::cancel::CancellationToken;
use slicervault::checksum;
use slicervault::restore::{restore_backup, RestoreOptions};
use slicervault::verify::{load_manifest, snapshot_info, verify_backup, verify_backup_with_report};
use std::fs;
use tempfile::TempDir;

fn plain_options() -> BackupOptions {
    BackupOptions {
        compress: false,
        verify_after: false,
        cancel: CancellationToken::new(),
    }
}

#[test]
fn packed_snapshot_verifies_after_build() {
    let source_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    let source = install_source(source_dir.path());

    let snapshot =
        create_backup(&source, output_dir.path(), &BackupOptions::default()).unwrap();

    assert!(snapshot.is_file());
    let name = snapshot.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("Orcaslicer_backup_"), "bad name: {name}");
    assert!(name.ends_with(".zip"));

    // verify(build(T)) holds
    assert!(verify_backup(&snapshot));
}

#[test]
fn manifest_records_discovery_order_and_aggregates() {
    let source_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    let source = install_source(source_dir.path());

    let snapshot = create_backup(&source, output_dir.path(), &plain_options()).unwrap();
    let manifest = load_manifest(&snapshot).unwrap();

    let paths: Vec<&str> = manifest.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, fixture_paths());

    assert_eq!(manifest.total_files, manifest.files.len());
    let size_sum: u64 = manifest.files.iter().map(|f| f.size).sum();
    assert_eq!(manifest.total_size, size_sum);
    assert_eq!(manifest.source_label, "orcaslicer");
    assert_eq!(manifest.source_version.as_deref(), Some("2.3.1"));
    assert!(!manifest.compressed);

    // Empty files are first-class entries with the empty-input digest
    let empty = manifest
        .files
        .iter()
        .find(|f| f.path == "user/filament/empty.json")
        .unwrap();
    assert_eq!(empty.size, 0);
    assert_eq!(empty.digest, checksum::hash_bytes(b""));
}

#[test]
fn concrete_two_file_scenario() {
    let source_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    let root = source_dir.path();

    // Exactly the documented scenario: a 12-byte config and a 40-byte profile
    fs::create_dir_all(root.join("user")).unwrap();
    fs::write(root.join("Config.conf"), b"nozzle=0.4mm").unwrap();
    fs::write(root.join("user/profile.json"), vec![b'x'; 40]).unwrap();

    let mut source = describe_install(root);
    source.primary_config = Some(root.join("Config.conf"));
    source.scripts_dir = None;
    source.version = None;

    let snapshot =
        create_backup(&source, output_dir.path(), &BackupOptions::default()).unwrap();
    let manifest = load_manifest(&snapshot).unwrap();

    assert_eq!(manifest.total_files, 2);
    assert_eq!(manifest.total_size, 52);
    assert_eq!(
        manifest.files[0].digest,
        checksum::hash_bytes(b"nozzle=0.4mm")
    );
    assert_eq!(
        manifest.files[1].digest,
        checksum::hash_bytes(&[b'x'; 40])
    );

    // Packing then unpacking reproduces both files with identical digests
    assert!(verify_backup(&snapshot));
}

#[test]
fn restore_reproduces_tree_byte_identical() {
    let source_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    let target_dir = TempDir::new().unwrap();
    let source = install_source(source_dir.path());

    let snapshot =
        create_backup(&source, output_dir.path(), &BackupOptions::default()).unwrap();

    // Restore into an empty clone of the installation root
    let target = describe_install(target_dir.path());
    let options = RestoreOptions {
        target: Some(target),
        backup_existing: false,
        ..Default::default()
    };
    let resolver = FixedResolver(describe_install(target_dir.path()));
    let result = restore_backup(&snapshot, &resolver, &options).unwrap();

    assert!(result.is_complete());
    assert_eq!(result.restored_files, fixture_paths().len());
    assert!(result.warnings.is_empty());

    for rel in fixture_paths() {
        let original = checksum::hash_file(&source_dir.path().join(rel)).unwrap();
        let restored = checksum::hash_file(&target_dir.path().join(rel)).unwrap();
        assert_eq!(original, restored, "digest mismatch for {rel}");
    }
}

#[test]
fn verification_is_idempotent() {
    let source_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    let source = install_source(source_dir.path());

    let snapshot = create_backup(&source, output_dir.path(), &plain_options()).unwrap();

    let cancel = CancellationToken::new();
    let first = verify_backup_with_report(&snapshot, &cancel);
    let second = verify_backup_with_report(&snapshot, &cancel);

    assert!(first.is_valid());
    assert!(second.is_valid());
    assert_eq!(first.files_checked, second.files_checked);
}

#[test]
fn tampering_is_detected_and_named() {
    let source_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    let source = install_source(source_dir.path());

    let snapshot = create_backup(&source, output_dir.path(), &plain_options()).unwrap();

    // Flip one byte of one backed-up file
    let victim = snapshot.join("user/profile.json");
    let mut bytes = fs::read(&victim).unwrap();
    bytes[0] ^= 0xFF;
    fs::write(&victim, &bytes).unwrap();

    let report = verify_backup_with_report(&snapshot, &CancellationToken::new());
    assert!(!report.is_valid());
    assert_eq!(report.digest_mismatches, vec!["user/profile.json".to_string()]);
    assert!(report.missing_files.is_empty());
}

#[test]
fn deletion_is_detected_before_digest_phase() {
    let source_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    let source = install_source(source_dir.path());

    let snapshot = create_backup(&source, output_dir.path(), &plain_options()).unwrap();

    // Remove one file and corrupt another; only the missing file may be
    // reported, because digest checking must not run in that case
    fs::remove_file(snapshot.join("user/machine/printer.json")).unwrap();
    fs::write(snapshot.join("OrcaSlicer.conf"), b"corrupted....").unwrap();

    let report = verify_backup_with_report(&snapshot, &CancellationToken::new());
    assert!(!report.is_valid());
    assert_eq!(
        report.missing_files,
        vec!["user/machine/printer.json".to_string()]
    );
    assert!(report.digest_mismatches.is_empty());
}

#[test]
fn snapshot_info_composes_manifest_and_verdict() {
    let source_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    let source = install_source(source_dir.path());

    let snapshot =
        create_backup(&source, output_dir.path(), &BackupOptions::default()).unwrap();

    let info = snapshot_info(&snapshot).unwrap();
    assert!(info.is_valid);
    assert_eq!(info.manifest.total_files, fixture_paths().len());
    assert!(info.size_mb > 0.0);
}

#[test]
fn packed_and_plain_snapshots_have_equal_manifests() {
    let source_dir = TempDir::new().unwrap();
    let output_packed = TempDir::new().unwrap();
    let output_plain = TempDir::new().unwrap();
    let source = install_source(source_dir.path());

    let packed = create_backup(
        &source,
        output_packed.path(),
        &BackupOptions {
            compress: true,
            verify_after: false,
            cancel: CancellationToken::new(),
        },
    )
    .unwrap();
    let plain = create_backup(&source, output_plain.path(), &plain_options()).unwrap();

    let from_packed = load_manifest(&packed).unwrap();
    let from_plain = load_manifest(&plain).unwrap();

    assert_eq!(from_packed.files, from_plain.files);
    assert!(from_packed.compressed);
    assert!(!from_plain.compressed);
}
