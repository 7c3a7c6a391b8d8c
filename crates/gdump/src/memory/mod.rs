pub mod layout;
mod buffer;
mod pointer;
mod process;
mod reader;
mod sections;

#[cfg(test)]
pub mod mock;

pub use buffer::ByteBuffer;
pub use pointer::{ModuleInfo, is_plausible_pointer};
pub use process::*;
pub use reader::{MemoryReader, ReadMemory};
pub use sections::{MemorySection, read_pe_sections};

#[cfg(test)]
pub use mock::{MockMemoryBuilder, MockMemoryReader};
