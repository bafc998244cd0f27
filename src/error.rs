//! Error types for criutf.

use thiserror::Error;

/// Result type alias for criutf operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during @UTF/AFS2 parsing or building.
#[derive(Debug, Error)]
pub enum Error {
    /// Magic bytes did not match `@UTF` or `AFS2`.
    #[error("bad magic: expected {expected:?}, got {actual:?}")]
    BadMagic {
        /// Expected magic bytes.
        expected: &'static [u8],
        /// Magic bytes actually read.
        actual: [u8; 4],
    },

    /// Table header carries the obfuscated `1F 9E F3 F5` magic.
    #[error("table is encrypted (obfuscated header), decryption is out of scope")]
    EncryptedTable,

    /// A header field or derived region size failed its sanity check.
    #[error("malformed header: {0}")]
    HeaderMalformed(String),

    /// Column data-flag nibble was not one of 0x1, 0x3, 0x5.
    #[error("unsupported storage flag: 0x{0:X}")]
    UnsupportedStorage(u8),

    /// Column type nibble (or JSON `valueType`) did not match a known tag.
    #[error("unsupported value type: {0}")]
    UnsupportedValueType(String),

    /// AFS2 offset or identifier width was not 2 or 4 bytes.
    #[error("unsupported width: {0} (expected 2 or 4)")]
    UnsupportedWidth(u8),

    /// A string/blob pool access, or an AFS2 entry extraction, read past the
    /// bounds of its owning region.
    #[error("offset out of bounds: offset {offset}, len {len}, region size {region_size}")]
    OffsetOutOfBounds {
        /// Offset that was requested.
        offset: usize,
        /// Number of bytes requested from that offset.
        len: usize,
        /// Size of the region being addressed.
        region_size: usize,
    },

    /// Per-row sub-buffers did not all end up the same length during build.
    #[error("row width mismatch: row {row} has width {actual}, expected {expected}")]
    RowWidthMismatch {
        /// Index of the offending row.
        row: usize,
        /// Width the row actually serialised to.
        actual: usize,
        /// Width every other row serialised to.
        expected: usize,
    },

    /// AFS2 archive would not fit in the configured `offset_width`.
    #[error("archive too large: size {size} does not fit in {offset_width}-byte offsets")]
    ArchiveTooLarge {
        /// Total archive size that was computed.
        size: u64,
        /// Configured offset table entry width, in bytes.
        offset_width: u8,
    },

    /// Nested @UTF blob sniffing exceeded the configured recursion depth.
    #[error("recursion depth exceeded: limit is {limit}")]
    RecursionDepthExceeded {
        /// The configured depth limit.
        limit: u32,
    },

    /// Two columns share a name that is not the `"Non"` sentinel.
    #[error("duplicate column name: {0}")]
    DuplicateColumnName(String),

    /// A column lookup by name found nothing.
    #[error("column not found: {0}")]
    ColumnNotFound(String),

    /// A row index passed to a lookup was outside `0..rows_count`.
    #[error("row index {index} out of range (rows_count {rows_count})")]
    RowIndexOutOfRange {
        /// Requested row index.
        index: u32,
        /// Number of rows in the table.
        rows_count: u32,
    },

    /// A string failed to decode/encode under the configured encoding.
    #[error("encoding error at offset {offset}")]
    EncodingError {
        /// Offset of the string that failed to decode.
        offset: usize,
    },
}
