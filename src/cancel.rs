//! Cooperative cancellation for long-running operations
//!
//! Backup, verification and restore all iterate over file sets; each of them
//! observes a [`CancellationToken`] at file-iteration boundaries. Cancellation
//! is cooperative: an in-flight file operation completes, then the operation
//! returns [`VaultError::Cancelled`] without touching further files. Staging
//! areas are scoped and are cleaned up on the cancellation path like on any
//! other exit path.

use crate::error::{Result, VaultError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag used to request cancellation of a running operation
///
/// Tokens are cheap to clone; all clones observe the same flag. A default
/// token is never cancelled.
///
/// # Examples
///
/// ```rust
/// use slicervault::cancel::CancellationToken;
///
/// let token = CancellationToken::new();
/// let worker_token = token.clone();
/// assert!(!worker_token.is_cancelled());
///
/// token.cancel();
/// assert!(worker_token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, un-cancelled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; observed by every clone of this token
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Return `Err(VaultError::Cancelled)` if cancellation was requested
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(VaultError::Cancelled)
        } else {
            Ok(())
        }
    }
}
