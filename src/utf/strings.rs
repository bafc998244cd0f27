//! String encoding and the strings pool (read side and build side).

use std::collections::HashMap;

use crate::error::{Error, Result};

/// The string encoding used to decode/encode the strings pool.
///
/// Defaults to UTF-8. [`StringEncoding::Latin1`] is the generic escape
/// hatch for any other 8-bit-clean encoding: it maps each byte to the
/// codepoint of the same value, which round-trips losslessly for byte
/// sequences that are not valid UTF-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StringEncoding {
    #[default]
    Utf8,
    Latin1,
}

impl StringEncoding {
    /// Decode a byte run read from the strings pool.
    pub fn decode(self, bytes: &[u8], offset: usize) -> Result<String> {
        match self {
            Self::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_string)
                .map_err(|_| Error::EncodingError { offset }),
            Self::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
        }
    }

    /// Encode a string for appending to the strings pool.
    pub fn encode(self, s: &str) -> Result<Vec<u8>> {
        match self {
            Self::Utf8 => Ok(s.as_bytes().to_vec()),
            Self::Latin1 => s
                .chars()
                .map(|c| u8::try_from(c as u32).map_err(|_| Error::EncodingError { offset: 0 }))
                .collect(),
        }
    }
}

/// Read a NUL-terminated string out of the strings region at `offset`
/// (pool-relative), per the @UTF convention.
pub fn read_string(region: &[u8], offset: usize, encoding: StringEncoding) -> Result<String> {
    if offset >= region.len() {
        return Err(Error::OffsetOutOfBounds {
            offset,
            len: 1,
            region_size: region.len(),
        });
    }
    let end = region[offset..]
        .iter()
        .position(|&b| b == 0)
        .ok_or(Error::OffsetOutOfBounds {
            offset,
            len: 1,
            region_size: region.len(),
        })?;
    encoding.decode(&region[offset..offset + end], offset)
}

/// The strings pool being assembled during a build, with interning for
/// de-duplication (table name, column names, string values/rows all share
/// one `string -> offset` map).
#[derive(Debug, Clone, Default)]
pub struct StringPool {
    data: Vec<u8>,
    offsets: HashMap<String, u32>,
    encoding: StringEncoding,
}

impl StringPool {
    /// Create an empty pool using the given encoding.
    #[must_use]
    pub fn new(encoding: StringEncoding) -> Self {
        Self {
            data: Vec::new(),
            offsets: HashMap::new(),
            encoding,
        }
    }

    /// Intern `s`, returning its pool-relative offset. Returns the existing
    /// offset if this exact string was already interned.
    pub fn intern(&mut self, s: &str) -> Result<u32> {
        if let Some(&offset) = self.offsets.get(s) {
            return Ok(offset);
        }
        let offset = self.data.len() as u32;
        self.data.extend_from_slice(&self.encoding.encode(s)?);
        self.data.push(0);
        self.offsets.insert(s.to_string(), offset);
        Ok(offset)
    }

    /// Current length of the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether nothing has been interned yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Consume the pool, returning its raw bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_deduplicates() {
        let mut pool = StringPool::new(StringEncoding::Utf8);
        let a = pool.intern("hello").unwrap();
        let b = pool.intern("hello").unwrap();
        assert_eq!(a, b);
        assert_eq!(pool.len(), 6); // "hello\0"
    }

    #[test]
    fn intern_distinct_strings_get_distinct_offsets() {
        let mut pool = StringPool::new(StringEncoding::Utf8);
        let a = pool.intern("a").unwrap();
        let b = pool.intern("b").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn read_string_round_trips() {
        let region = b"T\0k\0a\0b\0";
        assert_eq!(read_string(region, 0, StringEncoding::Utf8).unwrap(), "T");
        assert_eq!(read_string(region, 2, StringEncoding::Utf8).unwrap(), "k");
        assert_eq!(read_string(region, 4, StringEncoding::Utf8).unwrap(), "a");
        assert_eq!(read_string(region, 6, StringEncoding::Utf8).unwrap(), "b");
    }

    #[test]
    fn read_string_missing_terminator_is_out_of_bounds() {
        let region = b"no-nul";
        assert!(read_string(region, 0, StringEncoding::Utf8).is_err());
    }
}
