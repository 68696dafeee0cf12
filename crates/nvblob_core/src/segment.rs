//! Scoped access to a single segment.

use nvblob_storage::{BackendResult, BlobBackend, OpenMode, SegmentHandle};

/// An open segment whose handle is closed when the guard drops.
///
/// A segment name doubles as the namespace and as the blob key inside it.
pub(crate) struct SegmentGuard<'a, B: BlobBackend + ?Sized> {
    backend: &'a B,
    handle: SegmentHandle,
    name: &'a str,
}

impl<'a, B: BlobBackend + ?Sized> SegmentGuard<'a, B> {
    pub(crate) fn open(backend: &'a B, name: &'a str, mode: OpenMode) -> BackendResult<Self> {
        let handle = backend.open(name, mode)?;
        Ok(Self {
            backend,
            handle,
            name,
        })
    }

    pub(crate) fn blob_size(&self) -> BackendResult<usize> {
        self.backend.blob_size(self.handle, self.name)
    }

    pub(crate) fn read(&self, buf: &mut [u8]) -> BackendResult<usize> {
        self.backend.read_blob(self.handle, self.name, buf)
    }

    pub(crate) fn write(&self, data: &[u8]) -> BackendResult<()> {
        self.backend.write_blob(self.handle, self.name, data)
    }
}

impl<B: BlobBackend + ?Sized> Drop for SegmentGuard<'_, B> {
    fn drop(&mut self) {
        self.backend.close(self.handle);
    }
}
