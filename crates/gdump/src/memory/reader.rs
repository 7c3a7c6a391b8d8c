use crate::error::{Error, Result};
use crate::memory::ProcessHandle;

/// Bounds-checked reads from a foreign address space.
///
/// A read either returns exactly `size` bytes or fails; short reads are
/// failures. Implementations never retry.
pub trait ReadMemory {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>>;

    fn read_u32(&self, address: u64) -> Result<u32> {
        let bytes = self.read_bytes(address, 4)?;
        let array: [u8; 4] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| Error::read_failed(address, "short read"))?;
        Ok(u32::from_le_bytes(array))
    }

    fn read_i32(&self, address: u64) -> Result<i32> {
        self.read_u32(address).map(|v| v as i32)
    }

    fn read_u64(&self, address: u64) -> Result<u64> {
        let bytes = self.read_bytes(address, 8)?;
        let array: [u8; 8] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| Error::read_failed(address, "short read"))?;
        Ok(u64::from_le_bytes(array))
    }
}

impl<T: ReadMemory + ?Sized> ReadMemory for &T {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        (**self).read_bytes(address, size)
    }
}

/// Reader over a live process opened with [`ProcessHandle`]
pub struct MemoryReader<'a> {
    process: &'a ProcessHandle,
}

impl<'a> MemoryReader<'a> {
    pub fn new(process: &'a ProcessHandle) -> Self {
        Self { process }
    }
}

impl ReadMemory for MemoryReader<'_> {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; size];
        let read = self.process.read_into(address, &mut buffer)?;
        if read < size {
            return Err(Error::read_failed(
                address,
                format!("short read ({} of {} bytes)", read, size),
            ));
        }
        Ok(buffer)
    }
}
