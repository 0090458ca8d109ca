//! Content fetch: turning an index record's `(offset, length)` into the entry bytes.

use std::{path::Path, sync::Arc};

use bytes::Bytes;
use dictidx_common::{Result, error::Error};

use crate::{FileReader, ReadAt};

/// A source of dictionary entry content addressed by uncompressed byte offset.
///
/// Index records are validated against the content only at fetch time: the index
/// may have been built against a content file that has since been replaced, so an
/// `offset + length` past the end is reported as `OutOfRange` here rather than
/// when the index is read.
pub trait ContentSource: Send + Sync + 'static {
    /// Returns the uncompressed size of the content.
    fn content_size(&self) -> Result<u64>;

    /// Reads `length` bytes of content starting at `offset`.
    fn read_content(&self, offset: u32, length: u32) -> Result<Bytes>;
}

/// Content stored as a flat, uncompressed blob.
pub struct FlatContent {
    reader: Arc<dyn ReadAt>,
}

impl FlatContent {
    pub fn new(reader: Arc<dyn ReadAt>) -> FlatContent {
        FlatContent { reader }
    }

    pub fn open(path: impl AsRef<Path>) -> Result<FlatContent> {
        let path = path.as_ref();
        let reader = FileReader::open(path)
            .map_err(|e| Error::io(format!("open content {}", path.display()), e))?;
        Ok(FlatContent::new(Arc::new(reader)))
    }
}

impl ContentSource for FlatContent {
    fn content_size(&self) -> Result<u64> {
        self.reader
            .size()
            .map_err(|e| Error::io("content size", e))
    }

    fn read_content(&self, offset: u32, length: u32) -> Result<Bytes> {
        let size = self.content_size()?;
        let end = offset as u64 + length as u64;
        if end > size {
            return Err(Error::out_of_range("content", end, size));
        }
        let bytes = self
            .reader
            .read_at(offset as u64..end)
            .map_err(|e| Error::io("read content", e))?;
        if bytes.len() as u64 != length as u64 {
            return Err(Error::out_of_range(
                "content",
                end,
                offset as u64 + bytes.len() as u64,
            ));
        }
        Ok(bytes)
    }
}

impl<T> ContentSource for Arc<T>
where
    T: ContentSource + ?Sized,
{
    fn content_size(&self) -> Result<u64> {
        self.as_ref().content_size()
    }

    fn read_content(&self, offset: u32, length: u32) -> Result<Bytes> {
        self.as_ref().read_content(offset, length)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use dictidx_common::error::ErrorKind;

    use super::{ContentSource, FlatContent};

    #[test]
    fn test_flat_content_read() {
        let content = FlatContent::new(Arc::new(b"catcardog".to_vec()));
        assert_eq!(content.content_size().unwrap(), 9);
        assert_eq!(content.read_content(3, 3).unwrap().as_ref(), b"car");
        assert!(content.read_content(9, 0).unwrap().is_empty());
    }

    #[test]
    fn test_flat_content_out_of_range() {
        let content = FlatContent::new(Arc::new(b"catcardog".to_vec()));
        let err = content.read_content(6, 10).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::OutOfRange { end: 16, limit: 9, .. }
        ));
    }

    #[test]
    fn test_flat_content_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.dict");
        std::fs::write(&path, b"alphabeta").unwrap();
        let content = FlatContent::open(&path).unwrap();
        assert_eq!(content.read_content(5, 4).unwrap().as_ref(), b"beta");
        assert!(FlatContent::open(dir.path().join("missing.dict")).is_err());
    }
}
