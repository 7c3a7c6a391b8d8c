//! Remote process access.
//!
//! [`ProcessHandle`] owns the one OS handle used for every read of a scan
//! session. It is acquired in [`ProcessHandle::open`] and closed when the
//! value is dropped, on every exit path.

use serde::Serialize;
#[cfg(target_os = "windows")]
use tracing::debug;

use crate::error::{Error, Result};
use crate::memory::ModuleInfo;

/// Window class registered by the engine's main window
pub const ENGINE_WINDOW_CLASS: &str = "Engine";

/// A running process that owns an engine window
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineProcess {
    pub pid: u32,
    pub title: String,
}

pub struct ProcessHandle {
    #[cfg(target_os = "windows")]
    handle: win::HandleGuard,
    pub pid: u32,
    pub module: ModuleInfo,
}

impl std::fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("pid", &self.pid)
            .field("module", &self.module)
            .finish()
    }
}

impl ProcessHandle {
    /// Open the engine process at `index` among all windows of `window_class`.
    ///
    /// An out-of-range index falls back to the first process found.
    pub fn find_and_open(window_class: &str, index: usize) -> Result<Self> {
        let processes = find_engine_processes(window_class)?;
        let process = processes
            .get(index)
            .or_else(|| processes.first())
            .ok_or_else(|| {
                Error::ProcessNotFound(format!("no window with class '{}'", window_class))
            })?;
        Self::open(process.pid)
    }
}

#[cfg(target_os = "windows")]
impl ProcessHandle {
    /// Open `pid` for reading and resolve its main module
    pub fn open(pid: u32) -> Result<Self> {
        use windows::Win32::System::Threading::{
            OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_READ,
        };

        // SAFETY: OpenProcess has no memory-safety preconditions; the returned
        // handle is owned by the guard and closed exactly once.
        let raw = unsafe { OpenProcess(PROCESS_VM_READ | PROCESS_QUERY_INFORMATION, false, pid) }
            .map_err(|e| Error::ProcessOpenFailed(format!("PID {}: {}", pid, e)))?;
        let handle = win::HandleGuard(raw);

        let module = win::main_module(pid)?;
        debug!(
            "Opened PID {} ({} base=0x{:X} size=0x{:X})",
            pid, module.name, module.base_address, module.size
        );

        Ok(Self {
            handle,
            pid,
            module,
        })
    }

    /// Read into `buffer`, returning the number of bytes copied
    pub(crate) fn read_into(&self, address: u64, buffer: &mut [u8]) -> Result<usize> {
        use windows::Win32::System::Diagnostics::Debug::ReadProcessMemory;

        let mut read = 0usize;
        // SAFETY: `buffer` is a valid writable slice of `buffer.len()` bytes and
        // the handle stays open for the lifetime of `self`.
        unsafe {
            ReadProcessMemory(
                self.handle.0,
                address as *const std::ffi::c_void,
                buffer.as_mut_ptr() as *mut std::ffi::c_void,
                buffer.len(),
                Some(&mut read as *mut usize),
            )
        }
        .map_err(|e| Error::read_failed(address, e.to_string()))?;
        Ok(read)
    }
}

#[cfg(not(target_os = "windows"))]
impl ProcessHandle {
    pub fn open(_pid: u32) -> Result<Self> {
        Err(Error::UnsupportedPlatform)
    }

    pub(crate) fn read_into(&self, _address: u64, _buffer: &mut [u8]) -> Result<usize> {
        Err(Error::UnsupportedPlatform)
    }
}

/// Find every process owning a top-level window of `window_class`
#[cfg(target_os = "windows")]
pub fn find_engine_processes(window_class: &str) -> Result<Vec<EngineProcess>> {
    win::enum_windows_by_class(window_class)
}

#[cfg(not(target_os = "windows"))]
pub fn find_engine_processes(_window_class: &str) -> Result<Vec<EngineProcess>> {
    Err(Error::UnsupportedPlatform)
}

#[cfg(target_os = "windows")]
mod win {
    use windows::Win32::Foundation::{BOOL, CloseHandle, HANDLE, HWND, LPARAM};
    use windows::Win32::System::Diagnostics::ToolHelp::{
        CreateToolhelp32Snapshot, MODULEENTRY32W, Module32FirstW, TH32CS_SNAPMODULE,
        TH32CS_SNAPMODULE32,
    };
    use windows::Win32::UI::WindowsAndMessaging::{
        EnumWindows, GetClassNameW, GetWindowTextW, GetWindowThreadProcessId,
    };

    use super::EngineProcess;
    use crate::error::{Error, Result};
    use crate::memory::ModuleInfo;

    /// Closes the wrapped handle on drop
    pub(super) struct HandleGuard(pub(super) HANDLE);

    impl Drop for HandleGuard {
        fn drop(&mut self) {
            if !self.0.is_invalid() {
                // SAFETY: the guard is the sole owner of the handle.
                let _ = unsafe { CloseHandle(self.0) };
            }
        }
    }

    pub(super) fn main_module(pid: u32) -> Result<ModuleInfo> {
        // SAFETY: snapshot creation has no preconditions; the handle is guarded.
        let snapshot =
            unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPMODULE | TH32CS_SNAPMODULE32, pid) }
                .map_err(|e| Error::ProcessOpenFailed(format!("module snapshot: {}", e)))?;
        let snapshot = HandleGuard(snapshot);

        let mut entry = MODULEENTRY32W {
            dwSize: std::mem::size_of::<MODULEENTRY32W>() as u32,
            ..Default::default()
        };
        // SAFETY: `entry` is initialized with its size as the API requires.
        unsafe { Module32FirstW(snapshot.0, &mut entry) }
            .map_err(|_| Error::ModuleNotFound(pid))?;

        let name_len = entry
            .szModule
            .iter()
            .position(|&c| c == 0)
            .unwrap_or(entry.szModule.len());
        let name = String::from_utf16_lossy(&entry.szModule[..name_len]);

        Ok(ModuleInfo::new(
            name,
            entry.modBaseAddr as u64,
            entry.modBaseSize as u64,
        ))
    }

    struct EnumState<'a> {
        window_class: &'a str,
        found: Vec<EngineProcess>,
    }

    pub(super) fn enum_windows_by_class(window_class: &str) -> Result<Vec<EngineProcess>> {
        let mut state = EnumState {
            window_class,
            found: Vec::new(),
        };

        // SAFETY: `state` outlives the synchronous EnumWindows call and the
        // callback only accesses it through the LPARAM for that duration.
        unsafe {
            let _ = EnumWindows(
                Some(enum_callback),
                LPARAM(&mut state as *mut EnumState as isize),
            );
        }

        Ok(state.found)
    }

    unsafe extern "system" fn enum_callback(hwnd: HWND, lparam: LPARAM) -> BOOL {
        let state = unsafe { &mut *(lparam.0 as *mut EnumState) };

        let mut class_buf = [0u16; 256];
        let class_len = unsafe { GetClassNameW(hwnd, &mut class_buf) };
        let class_name = String::from_utf16_lossy(&class_buf[..class_len.max(0) as usize]);

        if class_name == state.window_class {
            let mut title_buf = [0u16; 256];
            let title_len = unsafe { GetWindowTextW(hwnd, &mut title_buf) };
            let title = String::from_utf16_lossy(&title_buf[..title_len.max(0) as usize]);

            let mut pid: u32 = 0;
            unsafe { GetWindowThreadProcessId(hwnd, Some(&mut pid as *mut u32)) };

            state.found.push(EngineProcess { pid, title });
        }
        BOOL(1)
    }
}
