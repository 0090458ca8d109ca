use std::{io::BufReader, ops::Range, path::Path, sync::Arc};

use byteorder::{ByteOrder, LittleEndian};
use bytes::{Bytes, BytesMut};
use dictidx_common::{Result, error::Error, try_or_ret_some_err};
use dictidx_io::{FileReader, ReadAdapter, ReadAt};
use flate2::{Decompress, FlushDecompress};

use crate::header::{ChunkLocation, DictzipHeader};

/// Gzip trailer: CRC32 and ISIZE, both little-endian.
pub const TRAILER_LEN: u64 = 8;

/// Random access reader over a dictzip container.
///
/// Only the chunks covering a requested range are read and inflated. Each chunk is
/// a self-contained raw deflate segment (the writer flushes fully at every chunk
/// boundary), so no state is carried from one chunk to the next.
#[derive(Clone)]
pub struct DictzipReader {
    reader: Arc<dyn ReadAt>,
    header: DictzipHeader,
}

impl DictzipReader {
    pub fn open(path: impl AsRef<Path>) -> Result<DictzipReader> {
        let path = path.as_ref();
        let reader = FileReader::open(path)
            .map_err(|e| Error::io(format!("open dictzip {}", path.display()), e))?;
        let reader = Self::from_reader(Arc::new(reader))?;
        log::debug!(
            "{}: {} chunks of {} bytes, data at {}",
            path.display(),
            reader.header.chunk_count(),
            reader.header.chunk_length,
            reader.header.header_len()
        );
        Ok(reader)
    }

    pub fn from_reader(reader: Arc<dyn ReadAt>) -> Result<DictzipReader> {
        let header = DictzipHeader::read_from(BufReader::with_capacity(
            4096,
            ReadAdapter::new(Arc::clone(&reader)),
        ))?;
        Ok(DictzipReader { reader, header })
    }

    pub fn header(&self) -> &DictzipHeader {
        &self.header
    }

    pub fn locate(&self, offset: u64) -> Result<ChunkLocation> {
        self.header.locate(offset)
    }

    /// Uncompressed size, as recorded in the gzip trailer (modulo 2^32).
    pub fn uncompressed_size(&self) -> Result<u64> {
        let size = self
            .reader
            .size()
            .map_err(|e| Error::io("dictzip size", e))?;
        let data_end = self.header.data_end();
        if size < data_end + TRAILER_LEN {
            return Err(Error::out_of_range(
                "dictzip trailer",
                data_end + TRAILER_LEN,
                size,
            ));
        }
        let trailer = self
            .reader
            .read_at(size - TRAILER_LEN..size)
            .map_err(|e| Error::io("read dictzip trailer", e))?;
        Ok(LittleEndian::read_u32(&trailer[4..]) as u64)
    }

    /// Inflates one chunk.
    pub fn read_chunk(&self, chunk: usize) -> Result<Bytes> {
        let Some(start) = self.header.chunk_offset(chunk) else {
            return Err(Error::out_of_range(
                "dictzip chunk",
                chunk as u64 + 1,
                self.header.chunk_count() as u64,
            ));
        };
        let end = start + self.header.chunk_sizes[chunk] as u64;
        let compressed = self
            .reader
            .read_at(start..end)
            .map_err(|e| Error::io(format!("read dictzip chunk {chunk}"), e))?;
        if (compressed.len() as u64) < end - start {
            return Err(Error::out_of_range(
                "dictzip chunk",
                end,
                start + compressed.len() as u64,
            ));
        }

        let mut inflate = Decompress::new(false);
        let mut out = Vec::with_capacity(self.header.chunk_length as usize);
        inflate
            .decompress_vec(&compressed, &mut out, FlushDecompress::Sync)
            .map_err(|e| Error::compression(format!("inflate dictzip chunk {chunk}"), e))?;
        Ok(Bytes::from(out))
    }

    /// Iterates the inflated chunks in `chunks`.
    pub fn chunks(&self, chunks: Range<usize>) -> ChunkIter<'_> {
        ChunkIter {
            reader: self,
            next: chunks.start,
            end: chunks.end.min(self.header.chunk_count()),
        }
    }

    /// Reads `length` uncompressed bytes starting at `offset`.
    pub fn read(&self, offset: u64, length: usize) -> Result<Bytes> {
        if length == 0 {
            return Ok(Bytes::new());
        }
        let end = offset + length as u64;
        let first = self.locate(offset)?;
        let last = self.locate(end - 1)?;

        if first.chunk == last.chunk {
            let chunk = self.read_chunk(first.chunk)?;
            return slice_checked(chunk, first.skip, length, end);
        }

        let mut buf = BytesMut::with_capacity(first.skip + length);
        for chunk in self.chunks(first.chunk..last.chunk + 1) {
            buf.extend_from_slice(&chunk?);
        }
        slice_checked(buf.freeze(), first.skip, length, end)
    }
}

fn slice_checked(data: Bytes, skip: usize, length: usize, end: u64) -> Result<Bytes> {
    if data.len() < skip + length {
        return Err(Error::out_of_range(
            "dictzip content",
            end,
            end - (skip + length - data.len()) as u64,
        ));
    }
    Ok(data.slice(skip..skip + length))
}

/// Lazily inflates consecutive chunks.
pub struct ChunkIter<'a> {
    reader: &'a DictzipReader,
    next: usize,
    end: usize,
}

impl Iterator for ChunkIter<'_> {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let chunk = self.next;
        self.next += 1;
        let data = try_or_ret_some_err!(self.reader.read_chunk(chunk));
        if chunk + 1 < self.end && data.len() != self.reader.header.chunk_length as usize {
            self.next = self.end;
            return Some(Err(Error::corrupt_header(format!(
                "chunk {chunk} inflates to {} bytes, expected {}",
                data.len(),
                self.reader.header.chunk_length
            ))));
        }
        Some(Ok(data))
    }
}
