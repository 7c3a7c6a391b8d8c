//! Memory layout constants for the engine's ClassDB structures
//!
//! This module centralizes every fixed offset used to decode the class
//! registry. Constants are organized by structure type.
//!
//! All values match a single known engine build. A build with a different
//! layout is not detected here: decoding simply yields garbage or nothing.

/// Hash-table header (`HashMap` with an ordered element list)
pub mod hash_map {
    /// Bytes read for one header
    pub const SIZE: usize = 48;

    pub const ELEMENTS: usize = 0;
    pub const HASHES: usize = 8;
    pub const HEAD: usize = 16;
    pub const TAIL: usize = 24;
    pub const CAPACITY_INDEX: usize = 32;
    pub const SIZE_FIELD: usize = 36;
}

/// Generic bucket-chain node
pub mod node {
    /// Bytes read for one node
    pub const SIZE: usize = 32;

    pub const NEXT: usize = 0;
    pub const PREV: usize = 8;
    pub const KEY: usize = 16;
    pub const VALUE: usize = 24;
}

/// `ClassInfo`, embedded in the registry node right after the key
pub mod class_info {
    /// Offset of the embedded record from the start of its bucket node
    pub const FROM_NODE: u64 = 24;

    /// Window read by the registry decoder
    pub const READ_SIZE: usize = 0x200;

    /// Window read by the scanner when probing a candidate element
    pub const PROBE_SIZE: usize = 0x190;

    pub const METHOD_MAP: usize = 0x28;
    pub const PROPERTY_MAP: usize = 0x120;
    pub const INHERITS: usize = 0x178;
    pub const NAME: usize = 0x180;
}

/// `StringName` data
pub mod string_name {
    /// Bytes read for one name structure
    pub const SIZE: usize = 32;

    pub const CNAME: usize = 8;
    pub const NAME: usize = 16;

    /// Longest narrow string read, terminator included
    pub const MAX_CSTRING_LEN: usize = 128;

    /// Window read for the UTF-32 representation
    pub const UTF32_WINDOW: usize = 256;
}

/// `MethodBind`
pub mod method_bind {
    /// Bytes read for one method bind
    pub const SIZE: usize = 80;

    pub const METHOD_ID: usize = 8;
    pub const NAME: usize = 16;
    pub const DEFAULT_ARG_COUNT: usize = 48;
    pub const ARG_COUNT: usize = 52;
    pub const FLAGS: usize = 56;
    pub const ARG_TYPES: usize = 64;

    pub const FLAG_STATIC: u32 = 0x0001;
    pub const FLAG_CONST: u32 = 0x0100;
    pub const FLAG_RETURN: u32 = 0x1_0000;

    /// Argument counts at or above this are treated as corrupt
    pub const MAX_ARG_COUNT: i32 = 30;
}

/// Property-table node (`HashMap<StringName, PropertySetGet>` element)
pub mod property_node {
    /// Bytes read for one node
    pub const SIZE: usize = 80;

    pub const NEXT: usize = 0;
    pub const KEY: usize = 16;
    pub const VARIANT_TYPE: usize = 24;
}

/// Step limits for bucket walks
pub mod walk {
    /// Extra steps allowed past the registry's declared size
    pub const REGISTRY_SLACK: u64 = 100;

    /// Extra steps allowed past a nested table's declared size
    pub const NESTED_SLACK: u64 = 10;

    /// Declared sizes above this are almost certainly corrupt
    pub const SUSPICIOUS_SIZE: u32 = 100_000;
}
