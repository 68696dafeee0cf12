//! Setup command implementation.

use super::open_store;
use std::path::Path;
use tracing::info;

/// Runs the setup command.
pub fn run(path: &Path, capacity: usize, force_erase: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(path, capacity, force_erase)?;
    let backend = store.backend();
    info!(
        path = %path.display(),
        used = backend.used_bytes(),
        capacity = backend.capacity(),
        segments = backend.entries().len(),
        "Partition ready"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn setup_fresh_partition() {
        let dir = tempdir().unwrap();
        assert!(run(&dir.path().join("nvs.bin"), 4096, false).is_ok());
    }

    #[test]
    fn setup_rejects_garbage_without_erase() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nvs.bin");
        std::fs::write(&path, b"garbage").unwrap();

        assert!(run(&path, 4096, false).is_err());
        assert!(run(&path, 4096, true).is_ok());
    }
}
