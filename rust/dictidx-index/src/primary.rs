//! The primary index: a flat sequence of records mapping every key to its content range.
//!
//! The file has no header and no record count; its size is implicit and it is read
//! incrementally. Readers never load the whole file, they stream records from any
//! record boundary through a small read buffer.

use std::{io::BufReader, ops::Range, path::Path, sync::Arc};

use dictidx_common::{Result, error::Error};
use dictidx_io::{FileReader, FileWriter, ReadAdapter, ReadAt, SealingWrite};

use crate::record::{IndexRecord, RecordCodecOptions, decode_record, encode_record};

/// A record together with the byte position where it starts in the index file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub position: u64,
    pub record: IndexRecord,
}

impl IndexEntry {
    /// Position of the first byte after this record.
    pub fn end(&self) -> u64 {
        self.position + self.record.encoded_len() as u64
    }
}

/// Read-only view of a primary index file.
///
/// The view is cheap to clone and holds no cursor; each scan owns its own buffer,
/// so independent lookups may run against the same index concurrently.
#[derive(Clone)]
pub struct PrimaryIndex {
    reader: Arc<dyn ReadAt>,
    size: u64,
    options: RecordCodecOptions,
}

impl PrimaryIndex {
    pub fn open(path: impl AsRef<Path>) -> Result<PrimaryIndex> {
        Self::open_with_options(path, RecordCodecOptions::default())
    }

    pub fn open_with_options(
        path: impl AsRef<Path>,
        options: RecordCodecOptions,
    ) -> Result<PrimaryIndex> {
        let path = path.as_ref();
        let reader = FileReader::open(path)
            .map_err(|e| Error::io(format!("open index {}", path.display()), e))?;
        Self::from_reader(Arc::new(reader), options)
    }

    pub fn from_reader(
        reader: Arc<dyn ReadAt>,
        options: RecordCodecOptions,
    ) -> Result<PrimaryIndex> {
        let size = reader.size().map_err(|e| Error::io("index size", e))?;
        Ok(PrimaryIndex {
            reader,
            size,
            options,
        })
    }

    /// Size of the index file in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn options(&self) -> &RecordCodecOptions {
        &self.options
    }

    /// Scans the whole index in file order.
    pub fn scan(&self) -> RecordIter {
        self.scan_range(0..self.size)
    }

    /// Scans from `position` (which must be a record boundary) to the end of the file.
    pub fn scan_from(&self, position: u64) -> RecordIter {
        self.scan_range(position..self.size)
    }

    /// Scans the records that start within `range`.
    pub fn scan_range(&self, range: Range<u64>) -> RecordIter {
        let buf_size = self
            .reader
            .storage_profile()
            .clamp_io_size((range.end - range.start.min(range.end)) as usize);
        let adapter = ReadAdapter::new_at_position(Arc::clone(&self.reader), range.start);
        RecordIter {
            reader: BufReader::with_capacity(buf_size, adapter),
            position: range.start,
            end: range.end.min(self.size),
            options: self.options.clone(),
            done: false,
        }
    }

    /// Decodes the single record starting at `position`.
    pub fn read_at(&self, position: u64) -> Result<Option<IndexEntry>> {
        self.scan_from(position).next().transpose()
    }

    /// Finds the first record whose key equals `key`, scanning the whole file.
    pub fn find_linear(&self, key: &[u8]) -> Result<Option<IndexRecord>> {
        for entry in self.scan() {
            let entry = entry?;
            if entry.record.key == key {
                return Ok(Some(entry.record));
            }
        }
        Ok(None)
    }
}

/// Lazy, finite iterator over index records. Restart by creating a new scan.
///
/// A decoding error is yielded once and ends the iteration: after a misread the
/// alignment of every following record is unknown.
pub struct RecordIter {
    reader: BufReader<ReadAdapter<Arc<dyn ReadAt>>>,
    position: u64,
    end: u64,
    options: RecordCodecOptions,
    done: bool,
}

impl RecordIter {
    /// Byte position of the next record to be decoded.
    pub fn position(&self) -> u64 {
        self.position
    }
}

impl Iterator for RecordIter {
    type Item = Result<IndexEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.position >= self.end {
            return None;
        }
        match decode_record(&mut self.reader, &self.options) {
            Ok(Some(record)) => {
                let entry = IndexEntry {
                    position: self.position,
                    record,
                };
                self.position = entry.end();
                Some(Ok(entry))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Totals reported when a primary index writer is finished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrimaryIndexSummary {
    pub records: u64,
    pub size: u64,
}

/// Append-only writer of a primary index.
///
/// No deduplication or ordering is applied: records land in the file in the order
/// they are appended.
pub struct PrimaryIndexWriter {
    writer: Box<dyn SealingWrite>,
    options: RecordCodecOptions,
    buf: Vec<u8>,
    position: u64,
    records: u64,
}

impl PrimaryIndexWriter {
    pub fn create(path: impl AsRef<Path>) -> Result<PrimaryIndexWriter> {
        Self::create_with_options(path, RecordCodecOptions::default())
    }

    pub fn create_with_options(
        path: impl AsRef<Path>,
        options: RecordCodecOptions,
    ) -> Result<PrimaryIndexWriter> {
        let path = path.as_ref();
        let writer = FileWriter::create(path)
            .map_err(|e| Error::io(format!("create index {}", path.display()), e))?;
        Ok(Self::new(Box::new(writer), options))
    }

    pub fn new(writer: Box<dyn SealingWrite>, options: RecordCodecOptions) -> PrimaryIndexWriter {
        PrimaryIndexWriter {
            writer,
            options,
            buf: Vec::with_capacity(64),
            position: 0,
            records: 0,
        }
    }

    pub fn options(&self) -> &RecordCodecOptions {
        &self.options
    }

    /// Number of bytes written so far; the position of the next record.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Appends one record and returns the byte position it was written at.
    pub fn append(&mut self, key: &[u8], offset: u32, length: u32) -> Result<u64> {
        self.buf.clear();
        encode_record(key, offset, length, &self.options, &mut self.buf)?;
        self.writer
            .write_all(&self.buf)
            .map_err(|e| Error::io("write index record", e))?;
        let position = self.position;
        self.position += self.buf.len() as u64;
        self.records += 1;
        Ok(position)
    }

    pub fn append_record(&mut self, record: &IndexRecord) -> Result<u64> {
        self.append(&record.key, record.offset, record.length)
    }

    /// Flushes and seals the underlying file.
    pub fn finish(mut self) -> Result<PrimaryIndexSummary> {
        self.writer
            .seal()
            .map_err(|e| Error::io("seal index", e))?;
        log::debug!(
            "primary index sealed: {} records, {} bytes",
            self.records,
            self.position
        );
        Ok(PrimaryIndexSummary {
            records: self.records,
            size: self.position,
        })
    }
}
