//! # slicervault CLI
//!
//! Command-line interface for backing up, verifying and restoring slicer
//! configuration trees.
//!
//! ## Usage
//! ```bash
//! # Show detected slicer installations
//! slicervault list
//!
//! # Back up the detected OrcaSlicer configuration
//! slicervault backup --output ~/SlicerBackups
//!
//! # Verify a snapshot
//! slicervault verify ~/SlicerBackups/Orcaslicer_backup_2026-08-07_09-30-00.zip
//!
//! # See what a restore would touch
//! slicervault restore <SNAPSHOT> --dry-run
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use humantime::format_duration;
use indicatif::{ProgressBar, ProgressStyle};
use slicervault::discovery::{self, SystemResolver};
use slicervault::{
    create_backup, restore_backup, snapshot_info, verify_backup_with_report,
    BackupOptions, CancellationToken, RestoreOptions,
};
use std::path::PathBuf;
use std::time::Instant;

/// How many problem paths verification output shows per category
const REPORT_PREVIEW_LIMIT: usize = 5;

/// slicervault - checksum-verified backups of slicer configurations
#[derive(Parser)]
#[command(name = "slicervault")]
#[command(version)]
#[command(about = "Back up, verify and restore slicer configuration trees")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show detected slicer installations
    #[command(alias = "ls")]
    List,

    /// Create a backup of a slicer configuration
    Backup {
        /// Source label (defaults to the first detected installation)
        #[arg(short, long)]
        source: Option<String>,

        /// Directory to place the snapshot in
        #[arg(short, long, default_value = "./slicer_backups")]
        output: PathBuf,

        /// Produce a plain directory instead of a packed archive
        #[arg(long)]
        no_compress: bool,

        /// Skip post-build verification
        #[arg(long)]
        no_verify: bool,
    },

    /// Verify the integrity of a snapshot
    Verify {
        /// Snapshot file or directory
        snapshot: PathBuf,
    },

    /// Show information about a snapshot
    Info {
        /// Snapshot file or directory
        snapshot: PathBuf,
    },

    /// Restore a snapshot onto an installation
    Restore {
        /// Snapshot file or directory
        snapshot: PathBuf,

        /// Target label (defaults to the snapshot's source)
        #[arg(short, long)]
        target: Option<String>,

        /// Show what would be restored without touching anything
        #[arg(long)]
        dry_run: bool,

        /// Skip the pre-restore backup of the existing configuration
        #[arg(long)]
        no_backup: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    }

    if std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    if let Err(e) = run(cli) {
        eprintln!("{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::List => cmd_list(),
        Commands::Backup {
            source,
            output,
            no_compress,
            no_verify,
        } => cmd_backup(source, output, !no_compress, !no_verify),
        Commands::Verify { snapshot } => cmd_verify(snapshot),
        Commands::Info { snapshot } => cmd_info(snapshot),
        Commands::Restore {
            snapshot,
            target,
            dry_run,
            no_backup,
        } => cmd_restore(snapshot, target, dry_run, !no_backup),
    }
}

/// Show every detected slicer installation
fn cmd_list() -> Result<()> {
    println!("{}", "Detected slicer installations:".blue().bold());

    let installed = discovery::detect_installed();
    if installed.is_empty() {
        println!("{}", "  none found".yellow());
        return Ok(());
    }

    for source in installed {
        let version = source.version.as_deref().unwrap_or("unknown version");
        println!(
            "  {} {} ({}) - {}",
            "✓".green().bold(),
            source.display_name.cyan(),
            version,
            source.root.display()
        );
    }
    Ok(())
}

/// Create a snapshot of a slicer configuration
fn cmd_backup(
    source_label: Option<String>,
    output: PathBuf,
    compress: bool,
    verify_after: bool,
) -> Result<()> {
    let source = match source_label {
        Some(label) => discovery::describe(&label)?,
        None => discovery::detect_installed()
            .into_iter()
            .next()
            .context("no slicer installation detected; use --source")?,
    };

    println!(
        "{} {}",
        "Backing up".blue().bold(),
        source.display_name.cyan()
    );

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    spinner.set_message("Copying and hashing files...");

    let start = Instant::now();
    let options = BackupOptions {
        compress,
        verify_after,
        cancel: CancellationToken::new(),
    };
    let snapshot = create_backup(&source, &output, &options);
    spinner.finish_and_clear();
    let snapshot = snapshot?;

    println!("{} Created snapshot", "✓".green().bold());
    println!("  Path: {}", snapshot.display().to_string().cyan());
    println!(
        "  Time: {}",
        format_duration(start.elapsed()).to_string().cyan()
    );
    if verify_after {
        println!("  {}", "Verified after build".green());
    }
    Ok(())
}

/// Verify a snapshot and print the full diagnostic picture
fn cmd_verify(snapshot: PathBuf) -> Result<()> {
    println!(
        "{} {}",
        "Verifying".blue().bold(),
        snapshot.display().to_string().cyan()
    );

    let report = verify_backup_with_report(&snapshot, &CancellationToken::new());

    if !report.missing_files.is_empty() {
        println!(
            "  {} {} missing file(s):",
            "✗".red().bold(),
            report.missing_files.len()
        );
        preview(&report.missing_files);
    }
    if !report.digest_mismatches.is_empty() {
        println!(
            "  {} {} checksum mismatch(es):",
            "✗".red().bold(),
            report.digest_mismatches.len()
        );
        preview(&report.digest_mismatches);
    }
    for error in &report.errors {
        println!("  {} {}", "!".red(), error);
    }

    if report.is_valid() {
        println!(
            "{} {} files verified, snapshot is valid",
            "✓".green().bold(),
            report.files_checked
        );
        Ok(())
    } else {
        bail!("snapshot is invalid: {}", report.summary());
    }
}

/// Show manifest metadata and verification status of a snapshot
fn cmd_info(snapshot: PathBuf) -> Result<()> {
    let info = snapshot_info(&snapshot)?;
    let manifest = &info.manifest;

    println!("{}", "Snapshot:".blue().bold());
    println!("  Path: {}", info.path.display().to_string().cyan());
    println!("  Source: {}", manifest.source_label.cyan());
    if let Some(version) = &manifest.source_version {
        println!("  Source version: {}", version.cyan());
    }
    println!("  Platform: {}", manifest.platform.cyan());
    println!(
        "  Created: {}",
        manifest
            .created_at
            .format("%Y-%m-%d %H:%M:%S UTC")
            .to_string()
            .cyan()
    );
    println!("  Files: {}", manifest.total_files.to_string().cyan());
    println!("  Size: {:.2} MB", info.size_mb);
    println!(
        "  Compressed: {}",
        if manifest.compressed { "yes" } else { "no" }
    );

    let status = if info.is_valid {
        "VALID".green().bold()
    } else {
        "INVALID".red().bold()
    };
    println!("  Status: {}", status);
    Ok(())
}

/// Restore a snapshot onto an installation
fn cmd_restore(
    snapshot: PathBuf,
    target_label: Option<String>,
    dry_run: bool,
    backup_existing: bool,
) -> Result<()> {
    let target = target_label.map(|label| discovery::describe(&label)).transpose()?;

    println!(
        "{} {}",
        "Restoring".blue().bold(),
        snapshot.display().to_string().cyan()
    );

    let options = RestoreOptions {
        target,
        dry_run,
        backup_existing,
        safety_backup_dir: None,
        cancel: CancellationToken::new(),
    };
    let result = restore_backup(&snapshot, &SystemResolver, &options)?;

    if result.dry_run {
        println!(
            "{} Would restore {} files",
            "✓".green().bold(),
            result.total_files.to_string().cyan()
        );
        for planned in &result.preview {
            println!("  {} -> {}", planned.source, planned.destination.display());
        }
        if result.total_files > result.preview.len() {
            println!(
                "  ... and {} more files",
                result.total_files - result.preview.len()
            );
        }
        return Ok(());
    }

    if let Some(safety) = &result.safety_backup {
        println!(
            "  Existing configuration backed up to {}",
            safety.display().to_string().cyan()
        );
    }

    println!(
        "{} Restored {}/{} files",
        if result.is_complete() {
            "✓".green().bold()
        } else {
            "!".yellow().bold()
        },
        result.restored_files.to_string().cyan(),
        result.total_files.to_string().cyan()
    );

    if !result.warnings.is_empty() {
        println!("\n{}", "Warnings:".yellow().bold());
        for warning in &result.warnings {
            println!("  - {}", warning.yellow());
        }
    }

    if !result.is_complete() {
        bail!(
            "restore incomplete: {}/{} files restored",
            result.restored_files,
            result.total_files
        );
    }
    Ok(())
}

/// Print the first few entries of a problem list
fn preview(paths: &[String]) {
    for path in paths.iter().take(REPORT_PREVIEW_LIMIT) {
        println!("    - {}", path);
    }
    if paths.len() > REPORT_PREVIEW_LIMIT {
        println!("    ... and {} more", paths.len() - REPORT_PREVIEW_LIMIT);
    }
}
