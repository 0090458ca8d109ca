//! Dictzip: gzip containers with a chunk table for random access.
//!
//! A dictzip file is an ordinary gzip member whose deflate stream is fully flushed
//! every `chunk_length` uncompressed bytes. The compressed size of each chunk is
//! recorded in an `RA` sub-field of the gzip extra field, so any uncompressed offset
//! can be served by inflating a single chunk. Regular gzip tools still decompress
//! the whole file.

pub mod content;
pub mod header;
pub mod reader;
pub mod writer;

pub use content::DictzipContent;
pub use header::{ChunkLocation, DictzipHeader};
pub use reader::DictzipReader;
pub use writer::{DictzipSummary, DictzipWriter, DictzipWriterParams};

/// Returns `true` when `bytes` start with the gzip magic.
pub fn is_gzip(bytes: &[u8]) -> bool {
    bytes.starts_with(&header::GZIP_MAGIC)
}
