//! CLI command implementations.

pub mod get;
pub mod inspect;
pub mod put;
pub mod setup;

use nvblob_core::{BlobStoreManager, ManagerConfig};
use nvblob_storage::FileBackend;
use std::path::Path;

type Store = BlobStoreManager<FileBackend>;

/// Opens the partition at `path` and sets it up, erasing it if it cannot
/// be used as-is.
pub fn open_store(
    path: &Path,
    capacity: usize,
    force_erase: bool,
) -> Result<Store, Box<dyn std::error::Error>> {
    setup_with(path, capacity, ManagerConfig::new(), force_erase)
}

/// Opens the partition at `path` without ever erasing it.
///
/// A partition that would need an erase is reported as an error.
pub fn open_existing(path: &Path, capacity: usize) -> Result<Store, Box<dyn std::error::Error>> {
    setup_with(
        path,
        capacity,
        ManagerConfig::new().recover_on_init_error(false),
        false,
    )
}

fn setup_with(
    path: &Path,
    capacity: usize,
    config: ManagerConfig,
    force_erase: bool,
) -> Result<Store, Box<dyn std::error::Error>> {
    let backend = FileBackend::open(path, capacity)?;
    let mut store = BlobStoreManager::with_config(backend, config);
    store.setup(force_erase)?;
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn open_existing_never_recovers() {
        let dir = tempdir().unwrap();
        let store = open_existing(&dir.path().join("nvs.bin"), 4096).unwrap();
        assert!(!store.config().recover_on_init_error);

        let store = open_store(&dir.path().join("nvs.bin"), 4096, false).unwrap();
        assert!(store.config().recover_on_init_error);
    }
}
