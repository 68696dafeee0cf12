//! # nvblob Core
//!
//! Bounded blob storage for firmware settings on top of a non-volatile
//! key-value backend.
//!
//! [`BlobStoreManager`] adds three things to a raw [`BlobBackend`]:
//!
//! - `setup`: initialize the partition, erasing and retrying once when the
//!   backend reports it is full or was written by another format version
//! - `put`: store data as a fixed-capacity, zero-padded blob
//! - `get`: read the leading bytes of a stored blob
//!
//! ## Example
//!
//! ```rust
//! use nvblob_core::{BlobStoreManager, ErrorKind};
//! use nvblob_storage::InMemoryBackend;
//!
//! let mut store = BlobStoreManager::new(InMemoryBackend::new());
//!
//! let mut buf = [0u8; 5];
//! let err = store.get("wifi", &mut buf).unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::NotInitialized);
//!
//! store.setup(false).unwrap();
//! store.put("wifi", 64, b"ssid1").unwrap();
//! store.get("wifi", &mut buf).unwrap();
//! assert_eq!(&buf, b"ssid1");
//! ```
//!
//! [`BlobBackend`]: nvblob_storage::BlobBackend

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod manager;
mod scratch;
mod segment;

pub use config::ManagerConfig;
pub use error::{ErrorKind, ManagerError, ManagerResult};
pub use manager::BlobStoreManager;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
