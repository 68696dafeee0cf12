//! Error types for backend operations.

use std::io;
use thiserror::Error;

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors reported by a blob backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The partition has not been initialized.
    #[error("partition not initialized")]
    NotInitialized,

    /// The partition has no free pages left and must be erased.
    #[error("partition has no free pages")]
    NoFreePages,

    /// The partition was written by a different format version.
    #[error("partition format version {found} found, this build supports {supported}")]
    NewVersionFound {
        /// Version stored in the partition.
        found: u16,
        /// Version understood by this backend.
        supported: u16,
    },

    /// The namespace or key does not exist.
    #[error("not found: {name}")]
    NotFound {
        /// The missing namespace or key.
        name: String,
    },

    /// The namespace or key name is not acceptable.
    #[error("invalid name {name:?}: {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The handle is not open.
    #[error("invalid handle {0}")]
    InvalidHandle(u32),

    /// A write was attempted through a read-only handle.
    #[error("handle is read-only")]
    ReadOnly,

    /// The read buffer cannot hold the stored blob.
    #[error("buffer too small: blob needs {required} bytes, buffer has {provided}")]
    InvalidLength {
        /// Size of the stored blob.
        required: usize,
        /// Size of the caller's buffer.
        provided: usize,
    },

    /// The partition cannot hold the write.
    #[error("not enough space: need {required} bytes, {available} available")]
    NotEnoughSpace {
        /// Bytes the partition would need after the write.
        required: usize,
        /// Partition capacity in bytes.
        available: usize,
    },

    /// The partition contents could not be decoded.
    #[error("partition corrupted: {0}")]
    Corrupted(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl BackendError {
    /// Returns true for errors that are cleared by erasing the partition
    /// and initializing it again.
    #[must_use]
    pub fn requires_erase(&self) -> bool {
        matches!(self, Self::NoFreePages | Self::NewVersionFound { .. })
    }
}
