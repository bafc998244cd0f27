//! The AFS2 archive codec.

pub mod archive;

pub use archive::{AfsArchive, AfsEntry, OffsetMode};
