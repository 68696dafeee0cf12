//! Get command implementation.

use super::open_existing;
use std::path::Path;

/// Runs the get command.
pub fn run(
    path: &Path,
    capacity: usize,
    segment: &str,
    size: usize,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_existing(path, capacity)?;
    let mut data = vec![0u8; size];
    store.get(segment, &mut data)?;

    match format {
        "hex" => println!("{}", to_hex(&data)),
        _ => println!("{}", String::from_utf8_lossy(trim_padding(&data))),
    }
    Ok(())
}

/// Drops the zero padding `put` appends.
fn trim_padding(data: &[u8]) -> &[u8] {
    let end = data.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    &data[..end]
}

fn to_hex(data: &[u8]) -> String {
    data.chunks(16)
        .map(|row| {
            row.iter()
                .map(|b| format!("{:02x}", b))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::put;
    use tempfile::tempdir;

    #[test]
    fn trims_trailing_zeroes_only() {
        assert_eq!(trim_padding(b"ssid1\0\0\0"), b"ssid1");
        assert_eq!(trim_padding(b"\0a\0b\0"), b"\0a\0b");
        assert_eq!(trim_padding(b"\0\0"), b"");
    }

    #[test]
    fn hex_rows_of_sixteen() {
        assert_eq!(to_hex(&[0x00, 0xab, 0x10]), "00 ab 10");
        let row = to_hex(&[0u8; 17]);
        assert_eq!(row.lines().count(), 2);
    }

    #[test]
    fn get_reads_stored_segment() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nvs.bin");
        put::run(&path, 4096, "wifi", 16, b"ssid1").unwrap();

        assert!(run(&path, 4096, "wifi", 16, "text").is_ok());
        assert!(run(&path, 4096, "wifi", 17, "hex").is_err());
        assert!(run(&path, 4096, "mqtt", 1, "text").is_err());
    }
}
