//! File-based blob backend for persistent storage.
//!
//! The whole partition lives in one file:
//!
//! ```text
//! +-------+---------+----------------------------------+
//! | NVBP  | version | CBOR: namespace -> key -> bytes  |
//! | 4 B   | u16 LE  |                                  |
//! +-------+---------+----------------------------------+
//! ```

use crate::backend::{BlobBackend, OpenMode, SegmentHandle};
use crate::error::{BackendError, BackendResult};
use crate::partition::{BlobEntry, PartitionImage, PartitionState};
use parking_lot::RwLock;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Magic bytes at the start of a partition file.
pub const MAGIC: [u8; 4] = *b"NVBP";

/// Partition format version written by this backend.
pub const FORMAT_VERSION: u16 = 1;

/// Default partition capacity in bytes (24 KiB, the usual NVS partition).
pub const DEFAULT_PARTITION_CAPACITY: usize = 24 * 1024;

const HEADER_LEN: usize = MAGIC.len() + 2;

/// A file-based blob backend.
///
/// The partition is loaded by [`BlobBackend::initialize`], which formats an
/// empty partition file if none exists, and rewritten whenever a namespace
/// is created or a blob is written. Data survives process restarts.
///
/// The capacity limits the bytes charged for names and blob contents, not
/// the size of the file, which adds a small header and CBOR framing.
///
/// # Durability
///
/// Each write goes to a temporary file which is synced and then renamed
/// over the partition file. If persisting fails the in-memory blob is
/// rolled back, so the backend never reports a write it did not store.
///
/// # Example
///
/// ```no_run
/// use nvblob_storage::{BlobBackend, FileBackend, OpenMode, DEFAULT_PARTITION_CAPACITY};
/// use std::path::Path;
///
/// let backend = FileBackend::open(Path::new("nvs.bin"), DEFAULT_PARTITION_CAPACITY).unwrap();
/// backend.initialize().unwrap();
/// let handle = backend.open("wifi", OpenMode::ReadWrite).unwrap();
/// backend.write_blob(handle, "wifi", b"ssid1").unwrap();
/// backend.close(handle);
/// ```
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    state: RwLock<PartitionState>,
}

impl FileBackend {
    /// Creates a backend for the partition file at `path`.
    ///
    /// Parent directories are created if needed. The file itself is not
    /// read until [`BlobBackend::initialize`].
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directories cannot be created.
    pub fn open(path: &Path, capacity: usize) -> BackendResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            state: RwLock::new(PartitionState::new(capacity)),
        })
    }

    /// Returns the path to the partition file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the partition capacity in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.state.read().capacity()
    }

    /// Returns how many bytes of the capacity are in use.
    #[must_use]
    pub fn used_bytes(&self) -> usize {
        self.state.read().image().used_bytes()
    }

    /// Lists every stored blob. Empty until the partition is initialized.
    #[must_use]
    pub fn entries(&self) -> Vec<BlobEntry> {
        self.state.read().entries()
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn load(&self, capacity: usize) -> BackendResult<PartitionImage> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no partition file, formatting");
                let image = PartitionImage::default();
                self.persist(&image)?;
                return Ok(image);
            }
            Err(e) => return Err(e.into()),
        };

        let image = decode(&bytes)?;
        let used = image.used_bytes();
        if used > capacity {
            debug!(used, capacity, "partition contents exceed capacity");
            return Err(BackendError::NoFreePages);
        }
        Ok(image)
    }

    fn persist(&self, image: &PartitionImage) -> BackendResult<()> {
        let data = encode(image)?;
        let temp_path = self.temp_path();

        let mut file = File::create(&temp_path)?;
        file.write_all(&data)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, &self.path)?;
        debug!(path = %self.path.display(), bytes = data.len(), "partition persisted");
        Ok(())
    }
}

fn encode(image: &PartitionImage) -> BackendResult<Vec<u8>> {
    let mut data = Vec::with_capacity(HEADER_LEN + image.used_bytes());
    data.extend_from_slice(&MAGIC);
    data.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    ciborium::into_writer(image, &mut data)
        .map_err(|e| BackendError::Io(io::Error::other(e.to_string())))?;
    Ok(data)
}

fn decode(bytes: &[u8]) -> BackendResult<PartitionImage> {
    if bytes.len() < HEADER_LEN || bytes[..MAGIC.len()] != MAGIC {
        return Err(BackendError::Corrupted("bad partition header".to_string()));
    }

    let found = u16::from_le_bytes([bytes[4], bytes[5]]);
    if found != FORMAT_VERSION {
        return Err(BackendError::NewVersionFound {
            found,
            supported: FORMAT_VERSION,
        });
    }

    ciborium::from_reader(&bytes[HEADER_LEN..]).map_err(|e| BackendError::Corrupted(e.to_string()))
}

impl BlobBackend for FileBackend {
    fn initialize(&self) -> BackendResult<()> {
        let mut state = self.state.write();
        if state.is_initialized() {
            return Ok(());
        }
        let image = self.load(state.capacity())?;
        state.load(image);
        Ok(())
    }

    fn erase_all(&self) -> BackendResult<()> {
        let mut state = self.state.write();
        for path in [self.path.clone(), self.temp_path()] {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        state.erase();
        debug!(path = %self.path.display(), "partition erased");
        Ok(())
    }

    fn open(&self, namespace: &str, mode: OpenMode) -> BackendResult<SegmentHandle> {
        let mut state = self.state.write();
        let created = mode == OpenMode::ReadWrite && !state.has_namespace(namespace);
        let handle = state.open(namespace, mode)?;

        if created {
            if let Err(e) = self.persist(state.image()) {
                state.close(handle);
                state.remove_namespace(namespace);
                return Err(e);
            }
        }
        Ok(handle)
    }

    fn close(&self, handle: SegmentHandle) {
        self.state.write().close(handle);
    }

    fn blob_size(&self, handle: SegmentHandle, key: &str) -> BackendResult<usize> {
        self.state.read().blob_size(handle, key)
    }

    fn read_blob(&self, handle: SegmentHandle, key: &str, buf: &mut [u8]) -> BackendResult<usize> {
        self.state.read().read_blob(handle, key, buf)
    }

    fn write_blob(&self, handle: SegmentHandle, key: &str, data: &[u8]) -> BackendResult<()> {
        let mut state = self.state.write();
        let (namespace, previous) = state.write_blob(handle, key, data)?;
        if let Err(e) = self.persist(state.image()) {
            state.restore(&namespace, key, previous);
            return Err(e);
        }
        Ok(())
    }
}
