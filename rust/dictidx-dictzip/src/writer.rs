use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};
use dictidx_common::{Result, error::Error, verify_arg};
use dictidx_io::{FileWriter, SealingWrite};
use flate2::{Compress, Compression, FlushCompress, Status};

use crate::header::{
    DictzipHeader, MAX_CHUNK_COUNT, XFL_FAST_COMPRESSION, XFL_MAX_COMPRESSION,
};

/// Chunk length used by the reference `dictzip` tool; small enough that a chunk of
/// incompressible data still fits the 16-bit compressed-size field.
pub const DEFAULT_CHUNK_LENGTH: u16 = 58315;

#[derive(Debug, Clone)]
pub struct DictzipWriterParams {
    /// Uncompressed bytes per chunk.
    pub chunk_length: u16,
    /// Deflate level, 0 to 9.
    pub level: u32,
    pub file_name: Option<String>,
    pub comment: Option<String>,
    /// Modification time recorded in the header, seconds since the epoch.
    pub mtime: u32,
}

impl Default for DictzipWriterParams {
    fn default() -> Self {
        DictzipWriterParams {
            chunk_length: DEFAULT_CHUNK_LENGTH,
            level: 9,
            file_name: None,
            comment: None,
            mtime: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DictzipSummary {
    pub chunks: usize,
    pub uncompressed_size: u64,
    pub compressed_size: u64,
}

/// Compresses a byte stream into a dictzip container.
///
/// The chunk table precedes the data, so compressed chunks are kept in memory until
/// [`DictzipWriter::finish`] writes the whole container.
pub struct DictzipWriter {
    params: DictzipWriterParams,
    writer: Box<dyn SealingWrite>,
    deflate: Compress,
    crc: crc32fast::Hasher,
    pending: Vec<u8>,
    compressed: Vec<u8>,
    chunk_sizes: Vec<u16>,
    uncompressed_size: u64,
}

impl DictzipWriter {
    pub fn create(path: impl AsRef<Path>, params: DictzipWriterParams) -> Result<DictzipWriter> {
        let path = path.as_ref();
        let writer = FileWriter::create(path)
            .map_err(|e| Error::io(format!("create dictzip {}", path.display()), e))?;
        Self::new(Box::new(writer), params)
    }

    pub fn new(writer: Box<dyn SealingWrite>, params: DictzipWriterParams) -> Result<DictzipWriter> {
        verify_arg!(chunk_length, params.chunk_length > 0);
        verify_arg!(level, params.level <= 9);
        let deflate = Compress::new(Compression::new(params.level), false);
        Ok(DictzipWriter {
            pending: Vec::with_capacity(params.chunk_length as usize),
            params,
            writer,
            deflate,
            crc: crc32fast::Hasher::new(),
            compressed: Vec::new(),
            chunk_sizes: Vec::new(),
            uncompressed_size: 0,
        })
    }

    pub fn write_all(&mut self, mut data: &[u8]) -> Result<()> {
        let chunk_length = self.params.chunk_length as usize;
        while !data.is_empty() {
            let take = (chunk_length - self.pending.len()).min(data.len());
            self.pending.extend_from_slice(&data[..take]);
            data = &data[take..];
            if self.pending.len() == chunk_length {
                self.flush_chunk(FlushCompress::Full)?;
            }
        }
        Ok(())
    }

    /// Compresses the remaining input and writes the container.
    pub fn finish(mut self) -> Result<DictzipSummary> {
        // The last chunk ends the deflate stream; an empty input still gets one chunk.
        if !self.pending.is_empty() || self.chunk_sizes.is_empty() {
            self.flush_chunk(FlushCompress::Finish)?;
        } else {
            self.finish_stream()?;
        }

        let extra_flags = match self.params.level {
            9 => XFL_MAX_COMPRESSION,
            1 => XFL_FAST_COMPRESSION,
            _ => 0,
        };
        let header = DictzipHeader::new(
            self.params.chunk_length,
            std::mem::take(&mut self.chunk_sizes),
            self.params.file_name.take().map(String::into_bytes),
            self.params.comment.take().map(String::into_bytes),
            self.params.mtime,
            extra_flags,
        )?;

        let mut head = Vec::with_capacity(header.header_len() as usize);
        header
            .write_to(&mut head)
            .map_err(|e| Error::io("encode dictzip header", e))?;
        let mut trailer = [0u8; 8];
        LittleEndian::write_u32(&mut trailer[..4], self.crc.clone().finalize());
        LittleEndian::write_u32(&mut trailer[4..], self.uncompressed_size as u32);

        for part in [&head[..], &self.compressed[..], &trailer[..]] {
            self.writer
                .write_all(part)
                .map_err(|e| Error::io("write dictzip", e))?;
        }
        self.writer
            .seal()
            .map_err(|e| Error::io("seal dictzip", e))?;

        let summary = DictzipSummary {
            chunks: header.chunk_count(),
            uncompressed_size: self.uncompressed_size,
            compressed_size: (head.len() + self.compressed.len() + trailer.len()) as u64,
        };
        log::debug!(
            "dictzip: {} chunks, {} -> {} bytes",
            summary.chunks,
            summary.uncompressed_size,
            summary.compressed_size
        );
        Ok(summary)
    }

    fn flush_chunk(&mut self, flush: FlushCompress) -> Result<()> {
        if self.chunk_sizes.len() == MAX_CHUNK_COUNT {
            return Err(Error::out_of_range(
                "dictzip chunk table",
                MAX_CHUNK_COUNT as u64 + 1,
                MAX_CHUNK_COUNT as u64,
            ));
        }
        let input = std::mem::take(&mut self.pending);
        self.crc.update(&input);
        self.uncompressed_size += input.len() as u64;

        let start = self.compressed.len();
        self.deflate_into(&input, flush)?;
        let size = self.compressed.len() - start;
        if size > u16::MAX as usize {
            return Err(Error::invalid_arg(
                "chunk_length",
                format!(
                    "chunk {} compresses to {size} bytes, more than the table can record",
                    self.chunk_sizes.len()
                ),
            ));
        }
        self.chunk_sizes.push(size as u16);

        self.pending = input;
        self.pending.clear();
        Ok(())
    }

    /// Ends the deflate stream after the last full chunk; the final empty block is
    /// counted in that chunk.
    fn finish_stream(&mut self) -> Result<()> {
        let start = self.compressed.len();
        self.deflate_into(&[], FlushCompress::Finish)?;
        let grown = self.compressed.len() - start;
        if let Some(last) = self.chunk_sizes.last_mut() {
            *last = u16::try_from(*last as usize + grown).map_err(|_| {
                Error::invalid_arg("chunk_length", "last chunk exceeds the table limit")
            })?;
        }
        Ok(())
    }

    fn deflate_into(&mut self, input: &[u8], flush: FlushCompress) -> Result<()> {
        let base_in = self.deflate.total_in();
        loop {
            if self.compressed.capacity() - self.compressed.len() < 1024 {
                self.compressed.reserve(input.len() / 2 + 4096);
            }
            let consumed = (self.deflate.total_in() - base_in) as usize;
            let status = self
                .deflate
                .compress_vec(&input[consumed..], &mut self.compressed, flush)
                .map_err(|e| Error::compression("deflate dictzip chunk", e))?;
            let consumed = (self.deflate.total_in() - base_in) as usize;
            let has_room = self.compressed.len() < self.compressed.capacity();
            let done = match flush {
                FlushCompress::Finish => status == Status::StreamEnd,
                _ => consumed == input.len() && has_room,
            };
            if done {
                return Ok(());
            }
        }
    }
}
