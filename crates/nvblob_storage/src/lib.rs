//! # nvblob Storage
//!
//! Backend trait and implementations for nvblob.
//!
//! This crate models the platform's non-volatile key-value service: a
//! partition of namespaces, each holding named blobs. Backends are
//! **opaque blob stores** - they do not interpret the bytes they keep.
//!
//! ## Design Principles
//!
//! - Backends store whole blobs (open, size, read, write, close)
//! - No knowledge of how callers size or pad their blobs
//! - Must be `Send + Sync`; all methods take `&self`
//! - Initialization errors that need an erase are reported as such
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing, with fault injection
//! - [`FileBackend`] - For persistent storage in a single partition file
//!
//! ## Example
//!
//! ```rust
//! use nvblob_storage::{BlobBackend, InMemoryBackend, OpenMode};
//!
//! let backend = InMemoryBackend::new();
//! backend.initialize().unwrap();
//!
//! let handle = backend.open("wifi", OpenMode::ReadWrite).unwrap();
//! backend.write_blob(handle, "wifi", b"hello world").unwrap();
//!
//! let mut buf = [0u8; 11];
//! backend.read_blob(handle, "wifi", &mut buf).unwrap();
//! assert_eq!(&buf, b"hello world");
//! backend.close(handle);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod fault;
mod file;
mod memory;
mod partition;

pub use backend::{validate_name, BlobBackend, OpenMode, SegmentHandle, MAX_NAME_LEN};
pub use error::{BackendError, BackendResult};
pub use fault::{Fault, Operation};
pub use file::{FileBackend, DEFAULT_PARTITION_CAPACITY, FORMAT_VERSION, MAGIC};
pub use memory::{InMemoryBackend, DEFAULT_MEMORY_CAPACITY};
pub use partition::BlobEntry;
