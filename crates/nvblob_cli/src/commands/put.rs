//! Put command implementation.

use super::open_existing;
use std::path::Path;

/// Runs the put command.
pub fn run(
    path: &Path,
    capacity: usize,
    segment: &str,
    size: usize,
    data: &[u8],
) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_existing(path, capacity)?;
    store.put(segment, size, data)?;
    println!("Wrote {} of {} bytes to segment {}", data.len(), size, segment);
    Ok(())
}
