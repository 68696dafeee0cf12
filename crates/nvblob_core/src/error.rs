//! Error types for the blob store manager.

use nvblob_storage::BackendError;
use thiserror::Error;

/// Result type for manager operations.
pub type ManagerResult<T> = Result<T, ManagerError>;

/// Coarse failure category, for callers that branch on the cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// `get`/`put` before a successful `setup`.
    NotInitialized,
    /// The backend could not be initialized or erased.
    InitFailed,
    /// The segment could not be opened.
    BackendOpenFailed,
    /// The stored blob size could not be queried.
    BackendQueryFailed,
    /// The stored blob could not be read.
    BackendReadFailed,
    /// The blob could not be written.
    BackendWriteFailed,
    /// A scratch buffer could not be allocated.
    AllocationFailed,
    /// Requested, stored, or capacity sizes do not fit together.
    SizeMismatch,
}

/// Errors returned by [`crate::BlobStoreManager`].
///
/// A failed `get` or `put` performed no write; the stored blob is unchanged.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// The manager has not been set up.
    #[error("blob store not initialized")]
    NotInitialized,

    /// Backend initialization failed.
    #[error("backend initialization failed: {0}")]
    Init(#[source] BackendError),

    /// Erasing the partition failed.
    #[error("partition erase failed: {0}")]
    Erase(#[source] BackendError),

    /// The segment could not be opened.
    #[error("unable to open segment {segment}: {source}")]
    Open {
        /// Segment name.
        segment: String,
        /// Backend failure.
        #[source]
        source: BackendError,
    },

    /// The stored blob size could not be queried.
    #[error("unable to read data length of segment {segment}: {source}")]
    Query {
        /// Segment name.
        segment: String,
        /// Backend failure.
        #[source]
        source: BackendError,
    },

    /// The stored blob could not be read.
    #[error("unable to read segment {segment}: {source}")]
    Read {
        /// Segment name.
        segment: String,
        /// Backend failure.
        #[source]
        source: BackendError,
    },

    /// The blob could not be written.
    #[error("unable to write segment {segment}: {source}")]
    Write {
        /// Segment name.
        segment: String,
        /// Backend failure.
        #[source]
        source: BackendError,
    },

    /// A scratch buffer could not be allocated.
    #[error("unable to allocate {size} bytes for segment content")]
    AllocationFailed {
        /// Requested allocation size.
        size: usize,
    },

    /// The stored blob holds fewer bytes than requested.
    #[error("segment {segment} holds {stored} bytes, too small for requested {requested}")]
    StoredTooSmall {
        /// Segment name.
        segment: String,
        /// Stored blob size.
        stored: usize,
        /// Requested size.
        requested: usize,
    },

    /// The data does not fit in the declared segment capacity.
    #[error("segment {segment} capacity {capacity} too small for data size {data}")]
    DataExceedsCapacity {
        /// Segment name.
        segment: String,
        /// Declared segment capacity.
        capacity: usize,
        /// Data size.
        data: usize,
    },

    /// The declared segment capacity exceeds the configured limit.
    #[error("segment {segment} capacity {capacity} exceeds limit {limit}")]
    CapacityLimit {
        /// Segment name.
        segment: String,
        /// Declared segment capacity.
        capacity: usize,
        /// Configured limit.
        limit: usize,
    },
}

impl ManagerError {
    /// Returns the failure category.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotInitialized => ErrorKind::NotInitialized,
            Self::Init(_) | Self::Erase(_) => ErrorKind::InitFailed,
            Self::Open { .. } => ErrorKind::BackendOpenFailed,
            Self::Query { .. } => ErrorKind::BackendQueryFailed,
            Self::Read { .. } => ErrorKind::BackendReadFailed,
            Self::Write { .. } => ErrorKind::BackendWriteFailed,
            Self::AllocationFailed { .. } => ErrorKind::AllocationFailed,
            Self::StoredTooSmall { .. }
            | Self::DataExceedsCapacity { .. }
            | Self::CapacityLimit { .. } => ErrorKind::SizeMismatch,
        }
    }

    /// Returns the backend error behind this failure, if any.
    #[must_use]
    pub fn backend_error(&self) -> Option<&BackendError> {
        match self {
            Self::Init(e) | Self::Erase(e) => Some(e),
            Self::Open { source, .. }
            | Self::Query { source, .. }
            | Self::Read { source, .. }
            | Self::Write { source, .. } => Some(source),
            _ => None,
        }
    }
}
