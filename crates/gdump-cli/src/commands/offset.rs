//! Offset command implementation.

use anyhow::Result;

/// Parse a hex address string (with or without 0x prefix)
pub fn parse_hex_address(s: &str) -> Result<u64> {
    let s = s.trim_start_matches("0x").trim_start_matches("0X");
    u64::from_str_radix(s, 16).map_err(|e| anyhow::anyhow!("Invalid hex address: {}", e))
}

/// Signed distance from `from` to `to` as (negative, magnitude)
fn distance(from: u64, to: u64) -> (bool, u64) {
    if to >= from {
        (false, to - from)
    } else {
        (true, from - to)
    }
}

pub fn run(from: &str, to: &str) -> Result<()> {
    let from_addr = parse_hex_address(from)?;
    let to_addr = parse_hex_address(to)?;
    let (negative, diff) = distance(from_addr, to_addr);
    let sign = if negative { "-" } else { "" };

    println!("From: 0x{:X}", from_addr);
    println!("To:   0x{:X}", to_addr);
    println!();
    println!("Offset: {}{} ({}0x{:X})", sign, diff, sign, diff);
    Ok(())
}
