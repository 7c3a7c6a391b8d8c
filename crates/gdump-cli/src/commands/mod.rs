//! CLI command implementations.

pub mod dump;
pub mod hexdump;
pub mod offset;
pub mod processes;
pub mod scan;

use anyhow::Result;
use gdump::{DumperConfig, ProcessHandle};
use tracing::info;

/// Open `pid`, or the configured engine process when no PID is given
pub fn open_process(config: &DumperConfig, pid: Option<u32>) -> Result<ProcessHandle> {
    let process = match pid {
        Some(pid) => ProcessHandle::open(pid)?,
        None => ProcessHandle::find_and_open(&config.window_class, config.process_index)?,
    };
    info!(
        "Attached to PID {} ({}, base 0x{:X}, size 0x{:X})",
        process.pid, process.module.name, process.module.base_address, process.module.size
    );
    Ok(process)
}
