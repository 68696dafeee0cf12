//! Fault injection for exercising failure paths in tests.

use crate::error::BackendError;
use std::io;

/// A backend operation that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// [`crate::BlobBackend::initialize`]
    Initialize,
    /// [`crate::BlobBackend::erase_all`]
    EraseAll,
    /// [`crate::BlobBackend::open`]
    Open,
    /// [`crate::BlobBackend::blob_size`]
    BlobSize,
    /// [`crate::BlobBackend::read_blob`]
    ReadBlob,
    /// [`crate::BlobBackend::write_blob`]
    WriteBlob,
}

/// The error an injected failure produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Fail with [`BackendError::NoFreePages`].
    NoFreePages,
    /// Fail with [`BackendError::NewVersionFound`].
    NewVersionFound,
    /// Fail with [`BackendError::Corrupted`].
    Corrupted,
    /// Fail with an I/O error.
    Io,
}

impl Fault {
    /// Builds the error this fault stands for.
    #[must_use]
    pub fn into_error(self) -> BackendError {
        match self {
            Self::NoFreePages => BackendError::NoFreePages,
            Self::NewVersionFound => BackendError::NewVersionFound {
                found: u16::MAX,
                supported: crate::file::FORMAT_VERSION,
            },
            Self::Corrupted => BackendError::Corrupted("injected fault".to_string()),
            Self::Io => BackendError::Io(io::Error::other("injected fault")),
        }
    }
}

/// Queue of one-shot failures, consumed in order per operation.
#[derive(Debug, Default)]
pub(crate) struct FaultPlan {
    pending: Vec<(Operation, Fault)>,
}

impl FaultPlan {
    pub(crate) fn push(&mut self, op: Operation, fault: Fault) {
        self.pending.push((op, fault));
    }

    /// Removes and returns the first fault queued for `op`.
    pub(crate) fn take(&mut self, op: Operation) -> Option<BackendError> {
        let idx = self.pending.iter().position(|(o, _)| *o == op)?;
        Some(self.pending.remove(idx).1.into_error())
    }

    pub(crate) fn clear(&mut self) {
        self.pending.clear();
    }
}
