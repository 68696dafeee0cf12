//! The blob store manager.

use crate::config::ManagerConfig;
use crate::error::{ManagerError, ManagerResult};
use crate::scratch::ScratchBuffer;
use crate::segment::SegmentGuard;
use nvblob_storage::{BlobBackend, OpenMode};
use tracing::{debug, error, info};

/// Bounded blob reads and writes over a non-volatile backend.
///
/// Each segment is stored as one blob of a fixed, caller-declared capacity.
/// Writes zero-pad the data up to that capacity so later reads always find
/// a predictable size.
///
/// The manager owns its backend and an `initialized` flag that only a
/// successful [`setup`](Self::setup) sets. `get` and `put` refuse to touch
/// the backend until then. It is meant for single-threaded use; share it
/// behind your own lock if several tasks need it.
///
/// # Example
///
/// ```rust
/// use nvblob_core::BlobStoreManager;
/// use nvblob_storage::InMemoryBackend;
///
/// let mut store = BlobStoreManager::new(InMemoryBackend::new());
/// store.setup(false).unwrap();
///
/// store.put("wifi", 64, b"ssid1").unwrap();
///
/// let mut ssid = [0u8; 5];
/// store.get("wifi", &mut ssid).unwrap();
/// assert_eq!(&ssid, b"ssid1");
/// ```
#[derive(Debug)]
pub struct BlobStoreManager<B: BlobBackend> {
    backend: B,
    config: ManagerConfig,
    initialized: bool,
}

impl<B: BlobBackend> BlobStoreManager<B> {
    /// Creates a manager with the default configuration.
    ///
    /// The manager is not usable until [`setup`](Self::setup) succeeds.
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, ManagerConfig::default())
    }

    /// Creates a manager with the given configuration.
    #[must_use]
    pub fn with_config(backend: B, config: ManagerConfig) -> Self {
        Self {
            backend,
            config,
            initialized: false,
        }
    }

    /// Brings the backend partition online.
    ///
    /// With `force_erase`, the partition is erased and then initialized, and
    /// any failure is final. Otherwise initialization is tried directly; if
    /// the backend reports no free pages or a new format version, the
    /// partition is erased and initialized once more.
    ///
    /// Both erase paths destroy every stored segment.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::Init`] or [`ManagerError::Erase`] when the
    /// partition cannot be brought online. The manager is then left
    /// uninitialized.
    pub fn setup(&mut self, force_erase: bool) -> ManagerResult<()> {
        self.initialized = false;

        let result = if force_erase {
            info!("Erasing NVS partition on request");
            self.erase_and_initialize()
        } else {
            self.initialize_or_recover()
        };

        match result {
            Ok(()) => {
                self.initialized = true;
                debug!("NVS ready");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "NVS error");
                Err(e)
            }
        }
    }

    /// Reads the start of a segment into `dest`.
    ///
    /// Exactly `dest.len()` bytes are copied. The stored blob must hold at
    /// least that many; if it holds more, the rest is not returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the manager is not set up, the segment does not
    /// exist or cannot be read, or the stored blob is shorter than `dest`.
    pub fn get(&self, segment: &str, dest: &mut [u8]) -> ManagerResult<()> {
        info!(segment, size = dest.len(), "Reading segment");

        self.read_segment(segment, dest).inspect_err(|e| {
            error!(segment, error = %e, "Segment read failed");
        })
    }

    /// Writes `data` to a segment of `capacity` bytes.
    ///
    /// The stored blob is always `capacity` bytes: `data` followed by zero
    /// padding. Any previous content of the segment is replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if the manager is not set up, `data` is longer than
    /// `capacity`, `capacity` exceeds the configured limit, or the backend
    /// rejects the write. Size checks happen before the backend is touched.
    pub fn put(&self, segment: &str, capacity: usize, data: &[u8]) -> ManagerResult<()> {
        info!(segment, capacity, size = data.len(), "Writing segment");

        self.write_segment(segment, capacity, data).inspect_err(|e| {
            error!(segment, error = %e, "Segment write failed");
        })
    }

    /// Returns whether the last [`setup`](Self::setup) succeeded.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Returns the backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Consumes the manager and returns the backend.
    #[must_use]
    pub fn into_backend(self) -> B {
        self.backend
    }

    fn initialize_or_recover(&self) -> ManagerResult<()> {
        match self.backend.initialize() {
            Ok(()) => Ok(()),
            Err(e) if e.requires_erase() && self.config.recover_on_init_error => {
                info!(reason = %e, "Erasing NVS partition");
                self.erase_and_initialize()
            }
            Err(e) => Err(ManagerError::Init(e)),
        }
    }

    fn erase_and_initialize(&self) -> ManagerResult<()> {
        self.backend.erase_all().map_err(ManagerError::Erase)?;
        self.backend.initialize().map_err(ManagerError::Init)
    }

    fn ensure_initialized(&self) -> ManagerResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(ManagerError::NotInitialized)
        }
    }

    fn read_segment(&self, segment: &str, dest: &mut [u8]) -> ManagerResult<()> {
        self.ensure_initialized()?;
        let requested = dest.len();

        let guard = SegmentGuard::open(&self.backend, segment, OpenMode::ReadOnly).map_err(
            |source| ManagerError::Open {
                segment: segment.to_string(),
                source,
            },
        )?;

        let stored = guard.blob_size().map_err(|source| ManagerError::Query {
            segment: segment.to_string(),
            source,
        })?;
        if stored < requested {
            return Err(ManagerError::StoredTooSmall {
                segment: segment.to_string(),
                stored,
                requested,
            });
        }

        let mut scratch = ScratchBuffer::zeroed(stored)?;
        guard.read(&mut scratch).map_err(|source| ManagerError::Read {
            segment: segment.to_string(),
            source,
        })?;

        dest.copy_from_slice(&scratch[..requested]);
        if requested < stored {
            debug!(segment, stored, requested, "Read truncated to requested size");
        }
        Ok(())
    }

    fn write_segment(&self, segment: &str, capacity: usize, data: &[u8]) -> ManagerResult<()> {
        self.ensure_initialized()?;

        if data.len() > capacity {
            return Err(ManagerError::DataExceedsCapacity {
                segment: segment.to_string(),
                capacity,
                data: data.len(),
            });
        }
        if let Some(limit) = self.config.max_segment_capacity {
            if capacity > limit {
                return Err(ManagerError::CapacityLimit {
                    segment: segment.to_string(),
                    capacity,
                    limit,
                });
            }
        }

        let guard = SegmentGuard::open(&self.backend, segment, OpenMode::ReadWrite).map_err(
            |source| ManagerError::Open {
                segment: segment.to_string(),
                source,
            },
        )?;

        let mut scratch = ScratchBuffer::zeroed(capacity)?;
        scratch[..data.len()].copy_from_slice(data);

        guard.write(&scratch).map_err(|source| ManagerError::Write {
            segment: segment.to_string(),
            source,
        })
    }
}
