//! Inspect command implementation.

use super::open_existing;
use nvblob_storage::BlobEntry;
use serde::Serialize;
use std::path::Path;

/// Partition inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Partition path.
    pub path: String,
    /// Partition capacity in bytes.
    pub capacity: usize,
    /// Bytes in use.
    pub used: usize,
    /// Stored segments.
    pub segments: Vec<BlobEntry>,
}

/// Runs the inspect command.
pub fn run(path: &Path, capacity: usize, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("No partition found at {:?}", path).into());
    }

    let result = collect(path, capacity)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => print_text_output(&result),
    }

    Ok(())
}

fn collect(path: &Path, capacity: usize) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let store = open_existing(path, capacity)?;
    let backend = store.backend();
    Ok(InspectResult {
        path: path.display().to_string(),
        capacity: backend.capacity(),
        used: backend.used_bytes(),
        segments: backend.entries(),
    })
}

fn print_text_output(result: &InspectResult) {
    println!("Partition: {}", result.path);
    println!("Used:      {} / {} bytes", result.used, result.capacity);
    println!("Segments:  {}", result.segments.len());
    for entry in &result.segments {
        println!("  {}/{}: {} bytes", entry.namespace, entry.key, entry.size);
    }
}
