//! Offset-based field extraction over an already-fetched buffer.
//!
//! Remote memory is read once into a local `Vec<u8>`; every field is then
//! pulled from that copy. An offset that falls outside the buffer yields
//! `None` instead of panicking.

#[derive(Debug, Clone, Copy)]
pub struct ByteBuffer<'a> {
    bytes: &'a [u8],
}

impl<'a> ByteBuffer<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn array_at<const N: usize>(&self, offset: usize) -> Option<[u8; N]> {
        let end = offset.checked_add(N)?;
        self.bytes.get(offset..end)?.try_into().ok()
    }

    pub fn u32_at(&self, offset: usize) -> Option<u32> {
        self.array_at(offset).map(u32::from_le_bytes)
    }

    pub fn i32_at(&self, offset: usize) -> Option<i32> {
        self.array_at(offset).map(i32::from_le_bytes)
    }

    pub fn u64_at(&self, offset: usize) -> Option<u64> {
        self.array_at(offset).map(u64::from_le_bytes)
    }

    pub fn u16_at(&self, offset: usize) -> Option<u16> {
        self.array_at(offset).map(u16::from_le_bytes)
    }

    /// Sub-view starting at `offset`, if `offset` is inside the buffer
    pub fn slice_from(&self, offset: usize) -> Option<ByteBuffer<'a>> {
        self.bytes.get(offset..).map(ByteBuffer::new)
    }
}
