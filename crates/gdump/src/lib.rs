//! # gdump
//!
//! Reconstructs the class registry (`ClassDB`) of a running Godot engine
//! process without symbols.
//!
//! This crate provides:
//! - Remote process memory reading and module/section discovery
//! - Interned name (`StringName`) decoding
//! - A heuristic scanner that locates the registry's hash table
//! - Decoding of classes, methods and properties into [`ClassRecord`]s
//! - Approximate instance layouts and JSON export
//!
//! Structure offsets match one engine build; other builds decode to
//! garbage rather than an error.

pub mod config;
pub mod dumper;
pub mod error;
pub mod export;
pub mod layout;
pub mod memory;
pub mod name;
pub mod registry;
pub mod scan;
pub mod variant;

#[cfg(test)]
mod testing;

pub use config::{DumperConfig, DumperConfigBuilder};
pub use dumper::{DumpStats, Dumper};
pub use error::{Error, Result};
pub use export::{load_json, save_json, to_json};
pub use layout::{BASE_CLASS_SIZE, compute_layouts};
pub use memory::{
    ByteBuffer, EngineProcess, MemoryReader, MemorySection, ModuleInfo, ProcessHandle,
    ReadMemory, find_engine_processes, is_plausible_pointer, read_pe_sections,
};
pub use name::StringNameReader;
pub use registry::{ClassMap, ClassRecord, MethodRecord, PropertyRecord, RegistryDecoder};
pub use scan::{Candidate, CandidateDetails, RegistryScanner, is_class_name, select_candidate};
pub use variant::{VariantType, cpp_type_name, type_size};
