//! `StringName` decoding.
//!
//! An interned name carries either a pointer to a static narrow C string
//! or a pointer to a UTF-32 array. The narrow form is tried first.

use crate::memory::layout::string_name;
use crate::memory::{ByteBuffer, ModuleInfo, ReadMemory};

/// Decodes interned names out of a remote process
pub struct StringNameReader<'a, R: ReadMemory> {
    reader: &'a R,
    module: &'a ModuleInfo,
}

impl<'a, R: ReadMemory> StringNameReader<'a, R> {
    pub fn new(reader: &'a R, module: &'a ModuleInfo) -> Self {
        Self { reader, module }
    }

    /// Decode the name structure at `ptr`.
    ///
    /// Returns `None` when neither representation yields non-empty text.
    pub fn read(&self, ptr: u64) -> Option<String> {
        if !self.module.is_plausible(ptr) {
            return None;
        }
        let data = self.reader.read_bytes(ptr, string_name::SIZE).ok()?;
        let data = ByteBuffer::new(&data);
        let cname_ptr = data.u64_at(string_name::CNAME)?;
        let name_ptr = data.u64_at(string_name::NAME)?;

        if self.module.is_plausible(cname_ptr)
            && let Some(name) = self.read_cstring(cname_ptr)
        {
            return Some(name);
        }

        if self.module.is_plausible(name_ptr) {
            return self.read_utf32(name_ptr);
        }
        None
    }

    fn read_cstring(&self, address: u64) -> Option<String> {
        let data = self
            .reader
            .read_bytes(address, string_name::MAX_CSTRING_LEN)
            .ok()?;
        decode_cstring(&data)
    }

    fn read_utf32(&self, address: u64) -> Option<String> {
        let data = self
            .reader
            .read_bytes(address, string_name::UTF32_WINDOW)
            .ok()?;
        let text = decode_utf32(&data);
        (!text.is_empty()).then_some(text)
    }
}

/// Format characters (category Cf)
const FORMAT_CHARS: &[(char, char)] = &[
    ('\u{00AD}', '\u{00AD}'),
    ('\u{0600}', '\u{0605}'),
    ('\u{061C}', '\u{061C}'),
    ('\u{06DD}', '\u{06DD}'),
    ('\u{070F}', '\u{070F}'),
    ('\u{0890}', '\u{0891}'),
    ('\u{08E2}', '\u{08E2}'),
    ('\u{180E}', '\u{180E}'),
    ('\u{200B}', '\u{200F}'),
    ('\u{202A}', '\u{202E}'),
    ('\u{2060}', '\u{2064}'),
    ('\u{2066}', '\u{206F}'),
    ('\u{FEFF}', '\u{FEFF}'),
    ('\u{FFF9}', '\u{FFFB}'),
    ('\u{110BD}', '\u{110BD}'),
    ('\u{110CD}', '\u{110CD}'),
    ('\u{13430}', '\u{1343F}'),
    ('\u{1BCA0}', '\u{1BCA3}'),
    ('\u{1D173}', '\u{1D17A}'),
    ('\u{E0001}', '\u{E0001}'),
    ('\u{E0020}', '\u{E007F}'),
];

/// Private use areas and ranges with no assigned characters
const UNPRINTABLE_BLOCKS: &[(char, char)] = &[
    ('\u{E000}', '\u{F8FF}'),
    ('\u{FDD0}', '\u{FDEF}'),
    ('\u{40000}', '\u{DFFFF}'),
    ('\u{E0080}', '\u{10FFFF}'),
];

/// Whether `c` renders as visible text.
///
/// ASCII space is the only accepted separator. Control, format, private
/// use and noncharacter code points are rejected.
pub fn is_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    if c.is_control() || c.is_whitespace() {
        return false;
    }
    let in_ranges = |ranges: &[(char, char)]| {
        ranges.iter().any(|&(lo, hi)| (lo..=hi).contains(&c))
    };
    // U+xFFFE and U+xFFFF are noncharacters in every plane
    (c as u32 & 0xFFFE) != 0xFFFE
        && !in_ranges(FORMAT_CHARS)
        && !in_ranges(UNPRINTABLE_BLOCKS)
}

/// Decode a NUL-terminated narrow string.
///
/// Invalid UTF-8 sequences are dropped. A buffer without a terminator, an
/// empty string or one with non-printable characters yields `None`.
pub fn decode_cstring(bytes: &[u8]) -> Option<String> {
    let end = memchr::memchr(0, bytes)?;
    let text: String = bytes[..end].utf8_chunks().map(|c| c.valid()).collect();
    if text.is_empty() || !text.chars().all(is_printable) {
        return None;
    }
    Some(text)
}

/// Decode little-endian UTF-32 code points up to the first zero or the
/// first value that is not a Unicode scalar.
pub fn decode_utf32(bytes: &[u8]) -> String {
    bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .take_while(|&v| v != 0)
        .map_while(char::from_u32)
        .collect()
}
