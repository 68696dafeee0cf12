//! In-memory blob backend for testing.

use crate::backend::{BlobBackend, OpenMode, SegmentHandle};
use crate::error::BackendResult;
use crate::fault::{Fault, FaultPlan, Operation};
use crate::partition::{BlobEntry, PartitionImage, PartitionState};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Capacity of an [`InMemoryBackend`] created with [`InMemoryBackend::new`].
pub const DEFAULT_MEMORY_CAPACITY: usize = 1024 * 1024;

/// An in-memory blob backend.
///
/// This backend keeps the partition in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Host builds that don't need persistence
///
/// Failures can be scheduled with [`InMemoryBackend::fail_next`], and every
/// trait call is counted so tests can assert that a caller never reached
/// the backend.
///
/// # Example
///
/// ```rust
/// use nvblob_storage::{BlobBackend, InMemoryBackend, OpenMode};
///
/// let backend = InMemoryBackend::new();
/// backend.initialize().unwrap();
/// let handle = backend.open("wifi", OpenMode::ReadWrite).unwrap();
/// backend.write_blob(handle, "wifi", b"ssid1").unwrap();
/// assert_eq!(backend.blob_size(handle, "wifi").unwrap(), 5);
/// backend.close(handle);
/// ```
#[derive(Debug)]
pub struct InMemoryBackend {
    state: RwLock<PartitionState>,
    faults: Mutex<FaultPlan>,
    operations: AtomicUsize,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MEMORY_CAPACITY)
    }
}

impl InMemoryBackend {
    /// Creates an empty backend with [`DEFAULT_MEMORY_CAPACITY`] bytes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty backend holding at most `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: RwLock::new(PartitionState::new(capacity)),
            faults: Mutex::new(FaultPlan::default()),
            operations: AtomicUsize::new(0),
        }
    }

    /// Makes the next call of `op` fail with `fault`.
    ///
    /// Several faults may be queued; each fires once.
    pub fn fail_next(&self, op: Operation, fault: Fault) {
        self.faults.lock().push(op, fault);
    }

    /// Drops any faults that have not fired yet.
    pub fn clear_faults(&self) {
        self.faults.lock().clear();
    }

    /// Returns how many trait calls this backend has served.
    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.operations.load(Ordering::Relaxed)
    }

    /// Returns how many handles are currently open.
    #[must_use]
    pub fn open_handle_count(&self) -> usize {
        self.state.read().open_handle_count()
    }

    /// Returns whether the partition is online.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.state.read().is_initialized()
    }

    /// Lists every stored blob.
    #[must_use]
    pub fn entries(&self) -> Vec<BlobEntry> {
        self.state.read().entries()
    }

    fn enter(&self, op: Operation) -> BackendResult<()> {
        self.operations.fetch_add(1, Ordering::Relaxed);
        match self.faults.lock().take(op) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl BlobBackend for InMemoryBackend {
    fn initialize(&self) -> BackendResult<()> {
        self.enter(Operation::Initialize)?;
        let mut state = self.state.write();
        if !state.is_initialized() {
            state.load(PartitionImage::default());
        }
        Ok(())
    }

    fn erase_all(&self) -> BackendResult<()> {
        self.enter(Operation::EraseAll)?;
        self.state.write().erase();
        Ok(())
    }

    fn open(&self, namespace: &str, mode: OpenMode) -> BackendResult<SegmentHandle> {
        self.enter(Operation::Open)?;
        self.state.write().open(namespace, mode)
    }

    fn close(&self, handle: SegmentHandle) {
        self.operations.fetch_add(1, Ordering::Relaxed);
        self.state.write().close(handle);
    }

    fn blob_size(&self, handle: SegmentHandle, key: &str) -> BackendResult<usize> {
        self.enter(Operation::BlobSize)?;
        self.state.read().blob_size(handle, key)
    }

    fn read_blob(&self, handle: SegmentHandle, key: &str, buf: &mut [u8]) -> BackendResult<usize> {
        self.enter(Operation::ReadBlob)?;
        self.state.read().read_blob(handle, key, buf)
    }

    fn write_blob(&self, handle: SegmentHandle, key: &str, data: &[u8]) -> BackendResult<()> {
        self.enter(Operation::WriteBlob)?;
        self.state.write().write_blob(handle, key, data)?;
        Ok(())
    }
}
