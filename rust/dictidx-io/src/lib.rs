//! I/O abstractions:
//! - `ReadAt`: positional reader with the ability to fetch a specified byte range from a file/blob.
//! - `SealingWrite`: sequential writer with a `seal()` operation, committing the write activity.
//! - `ContentSource`: resolves an index record's `(offset, length)` to the entry content.
//!
//! Provides simple implementations of each: memory-based and file-based.

use std::{ops::Range, sync::Arc};

use bytes::Bytes;

pub mod content;
pub mod file;
pub mod memory;
pub mod utils;

pub use content::{ContentSource, FlatContent};
pub use file::{FileReader, FileWriter};
pub use utils::read_adapter::ReadAdapter;

/// A trait representing a conceptual file or buffer that supports reading from arbitrary
/// positions.
///
/// Index and content files are immutable once built, so implementations hold no cursor
/// state and may be shared freely between readers.
pub trait ReadAt: Send + Sync + 'static {
    /// Returns the size of the underlying object.
    fn size(&self) -> std::io::Result<u64>;

    /// Reads a specified range of bytes from the object.
    ///
    /// **NOTE**: `read_at` should not return with a short read, unless end-of-file
    /// is encountered. The function may return fewer bytes than requested if the range
    /// extends beyond the end of the object.
    fn read_at(&self, range: Range<u64>) -> std::io::Result<Bytes>;

    /// Retrieves the storage profile associated with this reader.
    fn storage_profile(&self) -> StorageProfile;
}

/// A trait for sequential writing with explicit sealing semantics.
///
/// Index and content files are written append-only and committed once with
/// [`seal`](SealingWrite::seal); there is no in-place rewriting.
pub trait SealingWrite: Send {
    /// Writes the entire buffer to the underlying storage, appending it to any
    /// previously written data.
    ///
    /// Either all bytes are written successfully, or an error is returned.
    /// Writing after [`seal`](SealingWrite::seal) is an error.
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()>;

    /// Seals the writer, ensuring all buffered data is flushed and committed
    /// to the underlying storage medium.
    ///
    /// Once sealed, the writer does not accept any further write operations.
    fn seal(&mut self) -> std::io::Result<()>;

    /// Retrieves the storage profile associated with this writer.
    fn storage_profile(&self) -> StorageProfile;
}

/// Characterizes the performance aspects of the underlying storage implementation.
#[derive(Debug, Clone)]
pub struct StorageProfile {
    /// Suggested minimum size for an effective I/O request.
    /// Sequential scanners use this as their read buffer size.
    pub min_io_size: usize,

    /// Suggested maximum size for a single I/O request.
    pub max_io_size: usize,
}

impl StorageProfile {
    /// Clamps a given I/O size to the recommended range defined by this profile.
    ///
    /// The minimum size is guaranteed to be at least 1, and the maximum size is
    /// guaranteed to be at least the minimum size.
    pub fn clamp_io_size(&self, size: usize) -> usize {
        let min = self.min_io_size.max(1).min(self.max_io_size);
        let max = self.max_io_size.max(1).max(min);
        size.clamp(min, max)
    }
}

impl Default for StorageProfile {
    fn default() -> StorageProfile {
        Self {
            min_io_size: 4 * 1024,
            max_io_size: 4 * 1024 * 1024,
        }
    }
}

impl<T> ReadAt for Arc<T>
where
    T: ReadAt + ?Sized,
{
    fn size(&self) -> std::io::Result<u64> {
        self.as_ref().size()
    }

    fn read_at(&self, range: Range<u64>) -> std::io::Result<Bytes> {
        self.as_ref().read_at(range)
    }

    fn storage_profile(&self) -> StorageProfile {
        self.as_ref().storage_profile()
    }
}

impl<T> SealingWrite for Box<T>
where
    T: SealingWrite + ?Sized,
{
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.as_mut().write_all(buf)
    }

    fn seal(&mut self) -> std::io::Result<()> {
        self.as_mut().seal()
    }

    fn storage_profile(&self) -> StorageProfile {
        self.as_ref().storage_profile()
    }
}

#[cfg(test)]
mod tests {
    use super::StorageProfile;

    #[test]
    fn test_clamp_io_size() {
        let profile = StorageProfile {
            min_io_size: 16,
            max_io_size: 64,
        };
        assert_eq!(profile.clamp_io_size(1), 16);
        assert_eq!(profile.clamp_io_size(32), 32);
        assert_eq!(profile.clamp_io_size(1000), 64);

        let degenerate = StorageProfile {
            min_io_size: 0,
            max_io_size: 0,
        };
        assert_eq!(degenerate.clamp_io_size(10), 1);
    }
}
