//! Hexdump command implementation.
//!
//! ```text
//! 0x000: 4F 62 6A 65 63 74 00 00  00 00 00 00 00 00 00 00  |Object..........|
//! ```

use anyhow::Result;
use gdump::{DumperConfig, MemoryReader, ReadMemory};

use super::open_process;

pub fn run(
    config: &DumperConfig,
    pid: Option<u32>,
    address: u64,
    size: usize,
    ascii: bool,
) -> Result<()> {
    let process = open_process(config, pid)?;
    let reader = MemoryReader::new(&process);
    let bytes = reader.read_bytes(address, size)?;

    println!("Hexdump at 0x{:X} ({} bytes):", address, size);
    println!();
    for (i, chunk) in bytes.chunks(16).enumerate() {
        println!("{}", format_line(i * 16, chunk, ascii));
    }
    Ok(())
}

/// Format one 16-byte row
fn format_line(offset: usize, chunk: &[u8], ascii: bool) -> String {
    let mut line = format!("0x{:03X}: ", offset);

    for j in 0..16 {
        if j == 8 {
            line.push(' ');
        }
        match chunk.get(j) {
            Some(byte) => line.push_str(&format!("{:02X} ", byte)),
            None => line.push_str("   "),
        }
    }

    if ascii {
        line.push_str(" |");
        for j in 0..16 {
            line.push(match chunk.get(j) {
                Some(&b) if (0x20..0x7F).contains(&b) => b as char,
                Some(_) => '.',
                None => ' ',
            });
        }
        line.push('|');
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_line() {
        let line = format_line(0, b"Object\0\0\0\0\0\0\0\0\0\0", true);
        assert_eq!(
            line,
            "0x000: 4F 62 6A 65 63 74 00 00  00 00 00 00 00 00 00 00  |Object..........|"
        );
    }

    #[test]
    fn test_short_line_is_padded() {
        let line = format_line(0x20, &[0x41, 0x42], true);
        assert!(line.starts_with("0x020: 41 42 "));
        assert!(line.ends_with(&format!("|AB{}|", " ".repeat(14))));
        assert_eq!(line.len(), format_line(0, &[0; 16], true).len());
    }

    #[test]
    fn test_without_ascii() {
        let line = format_line(0, &[0xFF; 4], false);
        assert!(!line.contains('|'));
        assert!(line.starts_with("0x000: FF FF FF FF"));
    }
}
