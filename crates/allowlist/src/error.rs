//! Error types for the allow-list store.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by [`crate::Store`] operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading or writing the backing file failed.
    #[error("allow-list store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// Another mutator held the lock past the bounded wait.
    #[error("timed out waiting for exclusive access to {}", path.display())]
    LockTimeout {
        /// The lock file that could not be acquired.
        path: PathBuf,
    },
    /// A class name normalized to the empty key.
    #[error("class name is empty after normalization")]
    EmptyClass,
    /// No platform config directory could be determined.
    #[error("no config directory available; set ${0}")]
    NoConfigDir(&'static str),
}

/// Convenience result alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;
