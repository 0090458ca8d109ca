//! The dictzip header: a gzip member header whose extra field carries the chunk table.
//!
//! ```text
//! 1F 8B  CM  FLG  MTIME(LE32)  XFL  OS
//! [FEXTRA]   XLEN(LE16) 'R' 'A' LEN(LE16) VER(LE16) CHLEN(LE16) CHCNT(LE16) CHCNT x SIZE(LE16)
//! [FNAME]    original file name, NUL-terminated
//! [FCOMMENT] comment, NUL-terminated
//! [FHCRC]    CRC16 of the header
//! ```

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use dictidx_common::{Result, error::Error};

pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
pub const METHOD_DEFLATE: u8 = 8;

pub const FLAG_TEXT: u8 = 0x01;
pub const FLAG_HCRC: u8 = 0x02;
pub const FLAG_EXTRA: u8 = 0x04;
pub const FLAG_NAME: u8 = 0x08;
pub const FLAG_COMMENT: u8 = 0x10;

pub const XFL_MAX_COMPRESSION: u8 = 2;
pub const XFL_FAST_COMPRESSION: u8 = 4;
pub const OS_UNIX: u8 = 3;

/// Sub-field identifier of the random access table.
pub const RA_SUBFIELD_ID: [u8; 2] = *b"RA";
pub const RA_VERSION: u16 = 1;

/// Magic, method, flags, mtime, xfl and os.
const FIXED_HEADER_LEN: u64 = 10;
/// VER, CHLEN and CHCNT.
const RA_FIXED_LEN: usize = 6;

/// Largest chunk table that still fits the 16-bit XLEN field.
pub const MAX_CHUNK_COUNT: usize = (u16::MAX as usize - 4 - RA_FIXED_LEN) / 2;

/// Where a given uncompressed offset lives in the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkLocation {
    pub chunk: usize,
    /// Offset of the requested byte within the decompressed chunk.
    pub skip: usize,
    /// File offset of the chunk's compressed bytes.
    pub file_offset: u64,
    pub compressed_len: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictzipHeader {
    pub method: u8,
    pub flags: u8,
    pub mtime: u32,
    pub extra_flags: u8,
    pub os: u8,
    pub version: u16,
    pub chunk_length: u16,
    pub chunk_sizes: Vec<u16>,
    pub file_name: Option<Vec<u8>>,
    pub comment: Option<Vec<u8>>,
    /// Total header length; compressed data starts here.
    header_len: u64,
    /// File offset of every chunk, plus the end of the last one.
    chunk_offsets: Vec<u64>,
}

impl DictzipHeader {
    /// Builds the header of a new container from its chunk table.
    pub fn new(
        chunk_length: u16,
        chunk_sizes: Vec<u16>,
        file_name: Option<Vec<u8>>,
        comment: Option<Vec<u8>>,
        mtime: u32,
        extra_flags: u8,
    ) -> Result<DictzipHeader> {
        if chunk_length == 0 {
            return Err(Error::invalid_arg("chunk_length", "must be positive"));
        }
        if chunk_sizes.is_empty() || chunk_sizes.len() > MAX_CHUNK_COUNT {
            return Err(Error::invalid_arg(
                "chunk_sizes",
                format!(
                    "{} chunks, expected 1 to {MAX_CHUNK_COUNT}",
                    chunk_sizes.len()
                ),
            ));
        }
        for (name, value) in [("file_name", &file_name), ("comment", &comment)] {
            if value.as_deref().is_some_and(|v| v.contains(&0)) {
                return Err(Error::invalid_arg(name, "contains a NUL byte"));
            }
        }
        let mut flags = FLAG_EXTRA;
        if file_name.is_some() {
            flags |= FLAG_NAME;
        }
        if comment.is_some() {
            flags |= FLAG_COMMENT;
        }
        let mut header = DictzipHeader {
            method: METHOD_DEFLATE,
            flags,
            mtime,
            extra_flags,
            os: OS_UNIX,
            version: RA_VERSION,
            chunk_length,
            chunk_sizes,
            file_name,
            comment,
            header_len: 0,
            chunk_offsets: Vec::new(),
        };
        header.header_len = FIXED_HEADER_LEN
            + 2
            + header.xlen() as u64
            + header.file_name.as_ref().map_or(0, |n| n.len() as u64 + 1)
            + header.comment.as_ref().map_or(0, |c| c.len() as u64 + 1);
        header.compute_chunk_offsets();
        Ok(header)
    }

    /// Parses the header from the start of a container.
    ///
    /// The reader is consumed field by field; on success it is positioned at the
    /// first compressed chunk.
    pub fn read_from<R: Read>(reader: R) -> Result<DictzipHeader> {
        let mut reader = CountingReader {
            inner: reader,
            position: 0,
        };

        let mut magic = [0u8; 2];
        reader.read_exact(&mut magic).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => Error::not_a_container("file is too short"),
            _ => Error::io("read gzip magic", e),
        })?;
        if magic != GZIP_MAGIC {
            return Err(Error::not_a_container(format!(
                "leading bytes {:02x} {:02x}",
                magic[0], magic[1]
            )));
        }

        let method = reader.read_u8().map_err(header_io)?;
        let flags = reader.read_u8().map_err(header_io)?;
        let mtime = reader.read_u32::<LittleEndian>().map_err(header_io)?;
        let extra_flags = reader.read_u8().map_err(header_io)?;
        let os = reader.read_u8().map_err(header_io)?;
        let mut header_len = FIXED_HEADER_LEN;

        if flags & FLAG_EXTRA == 0 {
            return Err(Error::not_seekable("plain gzip file without an extra field"));
        }
        let xlen = reader.read_u16::<LittleEndian>().map_err(header_io)?;
        header_len += 2 + xlen as u64;

        let mut subfield_id = [0u8; 2];
        reader.read_exact(&mut subfield_id).map_err(header_io)?;
        if subfield_id != RA_SUBFIELD_ID {
            return Err(Error::not_seekable(format!(
                "extra sub-field '{}' is not 'RA'",
                String::from_utf8_lossy(&subfield_id)
            )));
        }
        let _subfield_len = reader.read_u16::<LittleEndian>().map_err(header_io)?;
        let version = reader.read_u16::<LittleEndian>().map_err(header_io)?;
        if version != RA_VERSION {
            return Err(Error::unsupported_version(version));
        }
        let chunk_length = reader.read_u16::<LittleEndian>().map_err(header_io)?;
        let chunk_count = reader.read_u16::<LittleEndian>().map_err(header_io)?;
        if chunk_count == 0 {
            return Err(Error::corrupt_header("no chunks"));
        }
        if chunk_length == 0 {
            return Err(Error::corrupt_header("zero chunk length"));
        }
        let mut chunk_sizes = Vec::with_capacity(chunk_count as usize);
        for _ in 0..chunk_count {
            chunk_sizes.push(reader.read_u16::<LittleEndian>().map_err(header_io)?);
        }

        let file_name = if flags & FLAG_NAME != 0 {
            let name = read_zero_terminated(&mut reader)?;
            header_len += name.len() as u64 + 1;
            Some(name)
        } else {
            None
        };
        let comment = if flags & FLAG_COMMENT != 0 {
            let comment = read_zero_terminated(&mut reader)?;
            header_len += comment.len() as u64 + 1;
            Some(comment)
        } else {
            None
        };
        if flags & FLAG_HCRC != 0 {
            reader.read_u16::<LittleEndian>().map_err(header_io)?;
            header_len += 2;
        }

        if reader.position != header_len {
            return Err(Error::corrupt_header(format!(
                "header ends at byte {}, expected {}",
                reader.position, header_len
            )));
        }

        let mut header = DictzipHeader {
            method,
            flags,
            mtime,
            extra_flags,
            os,
            version,
            chunk_length,
            chunk_sizes,
            file_name,
            comment,
            header_len,
            chunk_offsets: Vec::new(),
        };
        header.compute_chunk_offsets();
        Ok(header)
    }

    /// Serializes the header. FHCRC is never written.
    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(&GZIP_MAGIC)?;
        writer.write_u8(self.method)?;
        writer.write_u8(self.flags & !FLAG_HCRC)?;
        writer.write_u32::<LittleEndian>(self.mtime)?;
        writer.write_u8(self.extra_flags)?;
        writer.write_u8(self.os)?;
        writer.write_u16::<LittleEndian>(self.xlen())?;
        writer.write_all(&RA_SUBFIELD_ID)?;
        writer.write_u16::<LittleEndian>(self.xlen() - 4)?;
        writer.write_u16::<LittleEndian>(self.version)?;
        writer.write_u16::<LittleEndian>(self.chunk_length)?;
        writer.write_u16::<LittleEndian>(self.chunk_sizes.len() as u16)?;
        for &size in &self.chunk_sizes {
            writer.write_u16::<LittleEndian>(size)?;
        }
        if let Some(name) = &self.file_name {
            writer.write_all(name)?;
            writer.write_u8(0)?;
        }
        if let Some(comment) = &self.comment {
            writer.write_all(comment)?;
            writer.write_u8(0)?;
        }
        Ok(())
    }

    pub fn header_len(&self) -> u64 {
        self.header_len
    }

    pub fn chunk_count(&self) -> usize {
        self.chunk_sizes.len()
    }

    /// Uncompressed bytes addressable through the chunk table.
    pub fn capacity(&self) -> u64 {
        self.chunk_length as u64 * self.chunk_count() as u64
    }

    /// File offset where the compressed data ends (the gzip trailer follows).
    pub fn data_end(&self) -> u64 {
        self.chunk_offsets.last().copied().unwrap_or(self.header_len)
    }

    pub fn chunk_offset(&self, chunk: usize) -> Option<u64> {
        self.chunk_offsets[..self.chunk_count()].get(chunk).copied()
    }

    /// Maps an uncompressed offset to its chunk.
    pub fn locate(&self, offset: u64) -> Result<ChunkLocation> {
        let chunk_length = self.chunk_length as u64;
        let chunk = offset / chunk_length;
        if chunk >= self.chunk_count() as u64 {
            return Err(Error::out_of_range(
                "dictzip offset",
                offset + 1,
                self.capacity(),
            ));
        }
        let chunk = chunk as usize;
        Ok(ChunkLocation {
            chunk,
            skip: (offset % chunk_length) as usize,
            file_offset: self.chunk_offsets[chunk],
            compressed_len: self.chunk_sizes[chunk] as usize,
        })
    }

    fn xlen(&self) -> u16 {
        (4 + RA_FIXED_LEN + 2 * self.chunk_sizes.len()) as u16
    }

    fn compute_chunk_offsets(&mut self) {
        let mut offset = self.header_len;
        self.chunk_offsets = Vec::with_capacity(self.chunk_sizes.len() + 1);
        self.chunk_offsets.push(offset);
        for &size in &self.chunk_sizes {
            offset += size as u64;
            self.chunk_offsets.push(offset);
        }
    }
}

struct CountingReader<R> {
    inner: R,
    position: u64,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.position += n as u64;
        Ok(n)
    }
}

fn read_zero_terminated<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let mut value = Vec::new();
    loop {
        match reader.read_u8().map_err(header_io)? {
            0 => return Ok(value),
            b => value.push(b),
        }
    }
}

fn header_io(e: io::Error) -> Error {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        Error::corrupt_header("file ends inside the header")
    } else {
        Error::io("read dictzip header", e)
    }
}
