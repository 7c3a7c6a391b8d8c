//! Read-free pointer plausibility checks.

use serde::{Deserialize, Serialize};

/// Addresses below this are never dereferenced (null page and friends)
pub const MIN_POINTER: u64 = 0x10000;

/// Exclusive upper bound of the user-mode address range
pub const MAX_USER_POINTER: u64 = 0x7FFF_FFFF_FFFF;

/// Classify `ptr` as a maybe-valid pointer without reading it.
///
/// Anything inside the scanned module is accepted, as is anything in the
/// user-mode heap range, since interned strings and allocations usually
/// live outside the module image. A `true` result does not mean the page
/// is mapped.
pub fn is_plausible_pointer(ptr: u64, module_base: u64, module_size: u64) -> bool {
    if ptr < MIN_POINTER {
        return false;
    }
    if ptr >= module_base && ptr - module_base < module_size {
        return true;
    }
    ptr > MIN_POINTER && ptr < MAX_USER_POINTER
}

/// The loaded module being scanned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleInfo {
    pub name: String,
    pub base_address: u64,
    pub size: u64,
}

impl ModuleInfo {
    pub fn new(name: impl Into<String>, base_address: u64, size: u64) -> Self {
        Self {
            name: name.into(),
            base_address,
            size,
        }
    }

    pub fn contains(&self, address: u64) -> bool {
        address >= self.base_address && address - self.base_address < self.size
    }

    /// Offset of `address` from the module base
    pub fn offset_of(&self, address: u64) -> u64 {
        address.wrapping_sub(self.base_address)
    }

    pub fn is_plausible(&self, ptr: u64) -> bool {
        is_plausible_pointer(ptr, self.base_address, self.size)
    }
}
