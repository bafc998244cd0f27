//! The `@UTF` tabular codec: a big-endian, self-describing table format used
//! throughout CRI Middleware containers.

pub mod blobs;
pub mod strings;
pub mod table;
pub mod value;

pub use blobs::BlobPool;
pub use strings::{StringEncoding, StringPool};
pub use table::{BuildOptions, ColumnData, ParseOptions, UtfColumn, UtfTable};
pub use value::{ColumnStorage, ColumnValue, ValueType};
