//! Synthetic address space for tests.
//!
//! Memory is a set of independent regions. A read succeeds only when the
//! whole requested range lies inside a single region, which mirrors how a
//! read that touches an unmapped page fails on a live process.

use crate::error::{Error, Result};
use crate::memory::ReadMemory;

#[derive(Debug, Clone)]
struct Region {
    base: u64,
    data: Vec<u8>,
}

impl Region {
    fn end(&self) -> u64 {
        self.base + self.data.len() as u64
    }

    fn contains_range(&self, address: u64, size: usize) -> bool {
        address >= self.base
            && address
                .checked_add(size as u64)
                .is_some_and(|end| end <= self.end())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockMemoryReader {
    regions: Vec<Region>,
}

impl ReadMemory for MockMemoryReader {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        let region = self
            .regions
            .iter()
            .find(|r| r.contains_range(address, size))
            .ok_or_else(|| Error::read_failed(address, "unmapped"))?;
        let start = (address - region.base) as usize;
        Ok(region.data[start..start + size].to_vec())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockMemoryBuilder {
    regions: Vec<Region>,
}

impl MockMemoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `size` zeroed bytes at `base`
    pub fn map(mut self, base: u64, size: usize) -> Self {
        self.regions.push(Region {
            base,
            data: vec![0; size],
        });
        self
    }

    /// Write `bytes` at `address`, mapping a fresh region if needed
    pub fn write_bytes(mut self, address: u64, bytes: &[u8]) -> Self {
        match self
            .regions
            .iter_mut()
            .find(|r| r.contains_range(address, bytes.len()))
        {
            Some(region) => {
                let start = (address - region.base) as usize;
                region.data[start..start + bytes.len()].copy_from_slice(bytes);
            }
            None => self.regions.push(Region {
                base: address,
                data: bytes.to_vec(),
            }),
        }
        self
    }

    pub fn write_u64(self, address: u64, value: u64) -> Self {
        self.write_bytes(address, &value.to_le_bytes())
    }

    pub fn write_u32(self, address: u64, value: u32) -> Self {
        self.write_bytes(address, &value.to_le_bytes())
    }

    pub fn write_i32(self, address: u64, value: i32) -> Self {
        self.write_bytes(address, &value.to_le_bytes())
    }

    /// Write a NUL-terminated narrow string
    pub fn write_cstr(self, address: u64, text: &str) -> Self {
        let mut bytes = text.as_bytes().to_vec();
        bytes.push(0);
        self.write_bytes(address, &bytes)
    }

    /// Write a zero-terminated UTF-32 string
    pub fn write_utf32(self, address: u64, text: &str) -> Self {
        let mut bytes: Vec<u8> = text
            .chars()
            .flat_map(|c| (c as u32).to_le_bytes())
            .collect();
        bytes.extend_from_slice(&[0; 4]);
        self.write_bytes(address, &bytes)
    }

    pub fn build(self) -> MockMemoryReader {
        MockMemoryReader {
            regions: self.regions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_inside_region() {
        let reader = MockMemoryBuilder::new()
            .map(0x1000, 0x100)
            .write_u64(0x1010, 0xDEAD_BEEF)
            .build();
        assert_eq!(reader.read_u64(0x1010).unwrap(), 0xDEAD_BEEF);
        assert_eq!(reader.read_u32(0x1014).unwrap(), 0);
    }

    #[test]
    fn test_read_crossing_region_end_fails() {
        let reader = MockMemoryBuilder::new().map(0x1000, 0x10).build();
        assert!(reader.read_bytes(0x1008, 8).is_ok());
        assert!(reader.read_bytes(0x1009, 8).is_err());
        assert!(reader.read_bytes(0x0FFF, 2).is_err());
    }

    #[test]
    fn test_write_outside_mapping_creates_region() {
        let reader = MockMemoryBuilder::new().write_cstr(0x5000, "Node").build();
        assert_eq!(reader.read_bytes(0x5000, 5).unwrap(), b"Node\0");
    }
}
