//! A helper that turns any `ReadAt` implementation into a standard `std::io::Read`.

use crate::ReadAt;

/// A helper that turns any `ReadAt` implementation into a standard `std::io::Read` and
/// `std::io::Seek`.
///
/// Record scanners wrap it in a `BufReader` so the sequential record decoder can
/// consume an index file starting at any byte offset.
pub struct ReadAdapter<R> {
    inner: R,
    pos: u64,
    /// Cached size of the inner `ReadAt`
    size: Option<u64>,
}

impl<R> ReadAdapter<R> {
    /// Creates a new `ReadAdapter` wrapping the given `ReadAt` implementation.
    pub fn new(inner: R) -> Self {
        Self::new_at_position(inner, 0)
    }

    /// Creates a new `ReadAdapter` starting from the specified position.
    pub fn new_at_position(inner: R, pos: u64) -> Self {
        Self {
            inner,
            pos,
            size: None,
        }
    }

    /// Returns the current read position.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Consumes the adapter and returns the underlying `ReadAt` implementation.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: ReadAt> ReadAdapter<R> {
    fn size(&mut self) -> std::io::Result<u64> {
        if let Some(size) = self.size {
            Ok(size)
        } else {
            let size = self.inner.size()?;
            self.size = Some(size);
            Ok(size)
        }
    }
}

impl<R: ReadAt> std::io::Read for ReadAdapter<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let size = self.size()?;
        if self.pos >= size {
            return Ok(0);
        }

        let to_read = std::cmp::min(buf.len() as u64, size - self.pos);
        let bytes = self.inner.read_at(self.pos..self.pos + to_read)?;
        let bytes_read = bytes.len();
        buf[..bytes_read].copy_from_slice(&bytes);
        self.pos += bytes_read as u64;
        Ok(bytes_read)
    }
}

impl<R: ReadAt> std::io::Seek for ReadAdapter<R> {
    fn seek(&mut self, pos: std::io::SeekFrom) -> std::io::Result<u64> {
        use std::io::SeekFrom;

        let size = self.size()?;

        let new_pos = match pos {
            SeekFrom::Start(offset) => offset,
            SeekFrom::End(offset) => {
                if offset >= 0 {
                    size.saturating_add(offset as u64)
                } else {
                    size.saturating_sub(offset.unsigned_abs())
                }
            }
            SeekFrom::Current(offset) => {
                if offset >= 0 {
                    self.pos.saturating_add(offset as u64)
                } else {
                    self.pos.saturating_sub(offset.unsigned_abs())
                }
            }
        };

        // Seeking past the end is allowed, as per std::io::Seek behavior
        self.pos = new_pos;
        Ok(self.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::io::{Read, Seek, SeekFrom};

    #[test]
    fn test_read_adapter_basic() {
        let mut adapter = ReadAdapter::new(Bytes::from_static(b"Hello, World!"));

        let mut buf = [0u8; 5];
        assert_eq!(adapter.read(&mut buf).unwrap(), 5);
        assert_eq!(&buf, b"Hello");
        assert_eq!(adapter.position(), 5);

        let mut buf = [0u8; 10];
        assert_eq!(adapter.read(&mut buf).unwrap(), 8);
        assert_eq!(&buf[..8], b", World!");

        // EOF
        assert_eq!(adapter.read(&mut buf).unwrap(), 0);
        assert_eq!(adapter.position(), 13);
    }

    #[test]
    fn test_read_adapter_start_at_position() {
        let mut adapter = ReadAdapter::new_at_position(b"Hello, World!".to_vec(), 7);
        let mut result = Vec::new();
        adapter.read_to_end(&mut result).unwrap();
        assert_eq!(result, b"World!");

        let mut adapter = ReadAdapter::new_at_position(b"Hello".to_vec(), 10);
        let mut buf = [0u8; 5];
        assert_eq!(adapter.read(&mut buf).unwrap(), 0);
        assert_eq!(adapter.position(), 10);
    }

    #[test]
    fn test_read_adapter_seek() {
        let mut adapter = ReadAdapter::new(Bytes::from_static(b"Hello, World!"));

        assert_eq!(adapter.seek(SeekFrom::End(-6)).unwrap(), 7);
        let mut buf = [0u8; 6];
        adapter.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"World!");

        adapter.seek(SeekFrom::Start(3)).unwrap();
        assert_eq!(adapter.seek(SeekFrom::Current(-5)).unwrap(), 0);
        assert_eq!(adapter.seek(SeekFrom::Current(2)).unwrap(), 2);

        adapter.seek(SeekFrom::Start(20)).unwrap();
        assert_eq!(adapter.read(&mut buf).unwrap(), 0);
        assert_eq!(adapter.into_inner().len(), 13);
    }
}
