//! Section table enumeration for the loaded module image.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::memory::{ByteBuffer, ReadMemory};

const DOS_HEADER_SIZE: usize = 64;
const DOS_E_LFANEW: usize = 60;
/// Signature, file header and enough of the optional header to be safe
const PE_HEADER_READ: usize = 264;
const PE_NUMBER_OF_SECTIONS: usize = 6;
const PE_SIZE_OF_OPTIONAL_HEADER: usize = 20;
/// Signature (4) + file header (20)
const PE_OPTIONAL_HEADER_START: u64 = 24;
const SECTION_ENTRY_SIZE: usize = 40;
const SECTION_VIRTUAL_SIZE: usize = 8;
const SECTION_VIRTUAL_ADDRESS: usize = 12;

/// A named memory region of the module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySection {
    pub name: String,
    pub start: u64,
    pub size: u64,
}

impl MemorySection {
    pub fn new(name: impl Into<String>, start: u64, size: u64) -> Self {
        Self {
            name: name.into(),
            start,
            size,
        }
    }

    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.size)
    }

    /// Whether the name suggests initialized or zero-filled writable data
    pub fn is_data(&self) -> bool {
        let name = self.name.to_ascii_lowercase();
        name.contains("data") || name.contains("bss")
    }
}

/// Read the section table of the PE image loaded at `base`.
///
/// Returns an empty list when the headers are unreadable or malformed.
/// Individual unreadable section entries are skipped.
pub fn read_pe_sections<R: ReadMemory>(reader: &R, base: u64) -> Vec<MemorySection> {
    let Ok(dos) = reader.read_bytes(base, DOS_HEADER_SIZE) else {
        debug!("DOS header unreadable at 0x{:X}", base);
        return Vec::new();
    };
    if !dos.starts_with(b"MZ") {
        return Vec::new();
    }
    let Some(e_lfanew) = ByteBuffer::new(&dos).u32_at(DOS_E_LFANEW) else {
        return Vec::new();
    };

    let pe_addr = base + e_lfanew as u64;
    let Ok(pe) = reader.read_bytes(pe_addr, PE_HEADER_READ) else {
        debug!("PE header unreadable at 0x{:X}", pe_addr);
        return Vec::new();
    };
    if !pe.starts_with(b"PE\0\0") {
        return Vec::new();
    }
    let pe = ByteBuffer::new(&pe);
    let (Some(count), Some(optional_size)) = (
        pe.u16_at(PE_NUMBER_OF_SECTIONS),
        pe.u16_at(PE_SIZE_OF_OPTIONAL_HEADER),
    ) else {
        return Vec::new();
    };

    let table = pe_addr + PE_OPTIONAL_HEADER_START + optional_size as u64;
    let mut sections = Vec::with_capacity(count as usize);

    for i in 0..count as u64 {
        let entry_addr = table + i * SECTION_ENTRY_SIZE as u64;
        let Ok(entry) = reader.read_bytes(entry_addr, SECTION_ENTRY_SIZE) else {
            continue;
        };
        let name_len = memchr::memchr(0, &entry[..8]).unwrap_or(8);
        let name: String = entry[..name_len]
            .iter()
            .filter(|b| b.is_ascii())
            .map(|&b| b as char)
            .collect();

        let entry = ByteBuffer::new(&entry);
        let (Some(virtual_size), Some(virtual_address)) = (
            entry.u32_at(SECTION_VIRTUAL_SIZE),
            entry.u32_at(SECTION_VIRTUAL_ADDRESS),
        ) else {
            continue;
        };

        sections.push(MemorySection::new(
            name,
            base + virtual_address as u64,
            virtual_size as u64,
        ));
    }

    sections
}
