//! Error types for the slicervault library
//!
//! All fallible operations return [`Result<T>`]. The error taxonomy follows
//! the failure-handling contract of the backup pipeline: validation errors
//! are precondition failures and are never retried, I/O errors are fatal
//! while building a snapshot but demoted to per-file warnings during
//! restore, and manifest/container corruption is always reported as an
//! invalid snapshot rather than propagated past the verifier boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Type alias for Results in the slicervault library
pub type Result<T> = std::result::Result<T, VaultError>;

/// Main error type for all slicervault operations
#[derive(Debug, Error)]
pub enum VaultError {
    /// I/O errors during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors during JSON serialization/deserialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors from the zip container layer
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Walk directory error from walkdir crate
    #[error("Walk directory error")]
    WalkDir(#[from] walkdir::Error),

    /// A precondition was not met (invalid source, unverified snapshot,
    /// missing restore target)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Manifest could not be parsed or violates its aggregate invariants
    #[error("Manifest parse error: {0}")]
    ManifestParse(String),

    /// Archive container fault, including extraction paths that would
    /// escape the output directory
    #[error("Archive error: {0}")]
    Archive(String),

    /// Post-build verification of a snapshot failed; the snapshot is kept
    /// on disk for inspection
    #[error("Verification failed for {path:?}: {reason}")]
    VerificationFailed {
        /// Path to the snapshot that failed verification
        path: PathBuf,
        /// Summary of what failed
        reason: String,
    },

    /// Systemic restore failure (failed safety backup, unusable target)
    #[error("Restore failed: {0}")]
    Restore(String),

    /// No known installation matches the requested source label
    #[error("Unknown source: {0}")]
    UnknownSource(String),

    /// Path contains non-UTF-8 components and cannot be recorded in a manifest
    #[error("Path conversion error: {0:?}")]
    PathConversion(PathBuf),

    /// Operation was cancelled through a [`crate::cancel::CancellationToken`]
    #[error("Operation cancelled")]
    Cancelled,

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

impl VaultError {
    /// Create a validation error with a custom message
    pub fn validation(msg: impl Into<String>) -> Self {
        VaultError::Validation(msg.into())
    }

    /// Create a manifest parse error with a custom message
    pub fn manifest(msg: impl Into<String>) -> Self {
        VaultError::ManifestParse(msg.into())
    }

    /// Create an archive error with a custom message
    pub fn archive(msg: impl Into<String>) -> Self {
        VaultError::Archive(msg.into())
    }

    /// Create a restore error with a custom message
    pub fn restore(msg: impl Into<String>) -> Self {
        VaultError::Restore(msg.into())
    }

    /// Create an internal error with a custom message
    pub fn internal(msg: impl Into<String>) -> Self {
        VaultError::Internal(msg.into())
    }

    /// Check if this error indicates snapshot corruption
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            VaultError::ManifestParse(_)
                | VaultError::Archive(_)
                | VaultError::VerificationFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VaultError::validation("source not installed");
        assert_eq!(err.to_string(), "Validation error: source not installed");
    }

    #[test]
    fn test_error_corruption() {
        assert!(VaultError::manifest("bad field").is_corruption());
        assert!(VaultError::archive("truncated").is_corruption());
        assert!(!VaultError::validation("missing target").is_corruption());
        assert!(!VaultError::Cancelled.is_corruption());
    }
}
