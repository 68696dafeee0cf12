//! Blob backend trait definition.

use crate::error::{BackendError, BackendResult};

/// Longest namespace or key name a backend accepts, in bytes.
pub const MAX_NAME_LEN: usize = 15;

/// Access mode requested when opening a namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Reads only. The namespace must already exist.
    ReadOnly,
    /// Reads and writes. The namespace is created if absent.
    ReadWrite,
}

/// An open namespace handle issued by a backend.
///
/// Handles are plain tokens; the backend owns the state behind them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentHandle(pub(crate) u32);

/// A non-volatile key-value blob store.
///
/// Backends persist named blobs grouped into namespaces. They do not
/// interpret blob contents. Sizing policy, padding and scratch buffers
/// belong to the caller.
///
/// # Invariants
///
/// - Every operation except `initialize`, `erase_all` and `close` fails with
///   [`BackendError::NotInitialized`] until `initialize` succeeds
/// - `erase_all` destroys every namespace, de-initializes the partition and
///   invalidates all open handles
/// - `write_blob` replaces the whole blob or leaves it untouched
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing
/// - [`super::FileBackend`] - For persistent storage on a host
pub trait BlobBackend: Send + Sync {
    /// Brings the partition online.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NoFreePages`] or
    /// [`BackendError::NewVersionFound`] when the partition must be erased
    /// before it can be used, or another error if it cannot be read.
    fn initialize(&self) -> BackendResult<()>;

    /// Destroys all stored data.
    ///
    /// # Errors
    ///
    /// Returns an error if the partition cannot be erased.
    fn erase_all(&self) -> BackendResult<()>;

    /// Opens a namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The name is invalid
    /// - The namespace is missing and `mode` is [`OpenMode::ReadOnly`]
    /// - The partition is not initialized
    fn open(&self, namespace: &str, mode: OpenMode) -> BackendResult<SegmentHandle>;

    /// Closes a handle. Closing an unknown handle does nothing.
    fn close(&self, handle: SegmentHandle);

    /// Returns the size in bytes of the blob stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if the key has no blob.
    fn blob_size(&self, handle: SegmentHandle, key: &str) -> BackendResult<usize>;

    /// Reads the blob stored under `key` into the start of `buf`.
    ///
    /// Returns the number of bytes read.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::InvalidLength`] if `buf` is smaller than the
    /// stored blob, or [`BackendError::NotFound`] if the key has no blob.
    fn read_blob(&self, handle: SegmentHandle, key: &str, buf: &mut [u8]) -> BackendResult<usize>;

    /// Stores `data` as the blob under `key`, replacing any previous blob.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The handle is read-only
    /// - The partition cannot hold the blob
    /// - The blob cannot be persisted
    fn write_blob(&self, handle: SegmentHandle, key: &str, data: &[u8]) -> BackendResult<()>;
}

/// Checks a namespace or key name against backend limits.
///
/// # Errors
///
/// Returns [`BackendError::InvalidName`] for empty names, names longer than
/// [`MAX_NAME_LEN`] bytes, or names containing NUL.
pub fn validate_name(name: &str) -> BackendResult<()> {
    let reason = if name.is_empty() {
        "name is empty"
    } else if name.len() > MAX_NAME_LEN {
        "name is longer than 15 bytes"
    } else if name.contains('\0') {
        "name contains NUL"
    } else {
        return Ok(());
    };

    Err(BackendError::InvalidName {
        name: name.to_string(),
        reason,
    })
}
