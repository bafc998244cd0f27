//! # criutf
//!
//! Codecs for two nested binary container formats CRI Middleware uses to
//! ship audio assets: the `@UTF` tabular metadata format and the AFS2
//! sub-file archive it commonly ships alongside.
//!
//! This crate only ever touches the raw bytes of a table or archive — no
//! HCA/EHCA audio decoding, no filesystem walking, no CLI surface. Those are
//! left to a calling asset pipeline.
//!
//! ## Features
//!
//! - Parse and build `@UTF` tables, including arbitrarily nested `@UTF`
//!   blobs (an ACB-style metadata tree), with string/blob pool
//!   de-duplication on build.
//! - Parse and build AFS2 archives, including the alignment-rounding rule
//!   that recovers true sub-file offsets from the stored offset table.
//! - A canonical JSON representation of a parsed `@UTF` table
//!   ([`UtfTable::to_json`]/[`UtfTable::from_json`]).
//!
//! ## Example
//!
//! ```ignore
//! use criutf::{ParseOptions, UtfTable};
//!
//! let table = UtfTable::parse(&table_bytes, ParseOptions::default())?;
//! println!("table {} has {} rows", table.table_name, table.rows_count);
//!
//! let json = table.to_json();
//! ```

pub mod afs;
pub mod error;
pub mod json;
pub mod reader;
pub mod utf;
pub mod writer;

// Re-export main types
pub use error::{Error, Result};
pub use reader::ByteCursor;
pub use writer::{round_up, ByteWriter};

// Re-export the AFS2 archive codec
pub use afs::{AfsArchive, AfsEntry, OffsetMode};

// Re-export the @UTF table codec
pub use utf::{
    BlobPool, BuildOptions, ColumnData, ColumnStorage, ColumnValue, ParseOptions, StringEncoding,
    StringPool, UtfColumn, UtfTable, ValueType,
};
