//! Binary layout of a single index record.
//!
//! ```text
//! +----------------+------+----------------+----------------+
//! | key bytes      | 0x00 | offset: u32 BE | length: u32 BE |
//! +----------------+------+----------------+----------------+
//! ```
//!
//! The key carries no length prefix; the NUL terminator is the only delimiter, so a
//! key may never contain a NUL byte. The same layout is used by the section index,
//! with a folded prefix in place of the key and a primary-index byte range in place
//! of the content range.

use std::{
    borrow::Cow,
    io::{BufRead, Read},
};

use byteorder::{BigEndian, ByteOrder};
use dictidx_common::{Result, error::Error};

/// Size of the fixed part that follows the key terminator.
pub const RECORD_TRAILER_LEN: usize = 8;

/// Terminator plus trailer: bytes each record occupies beyond its key.
pub const RECORD_OVERHEAD: usize = RECORD_TRAILER_LEN + 1;

/// Default upper bound on key length, in bytes.
pub const DEFAULT_MAX_KEY_LEN: usize = 256;

/// One entry of an index file: a key and the byte range of its content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexRecord {
    pub key: Vec<u8>,
    pub offset: u32,
    pub length: u32,
}

impl IndexRecord {
    pub fn new(key: impl Into<Vec<u8>>, offset: u32, length: u32) -> IndexRecord {
        IndexRecord {
            key: key.into(),
            offset,
            length,
        }
    }

    /// Number of bytes this record occupies on disk.
    pub fn encoded_len(&self) -> usize {
        self.key.len() + RECORD_OVERHEAD
    }

    /// End of the referenced content range, exclusive.
    pub fn content_end(&self) -> u64 {
        self.offset as u64 + self.length as u64
    }

    pub fn key_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.key)
    }
}

/// Options shared by the record encoder and decoder.
#[derive(Debug, Clone)]
pub struct RecordCodecOptions {
    /// Longest accepted key, in bytes. A decoder that reads this many bytes
    /// without meeting a terminator treats the file as corrupt.
    pub max_key_len: usize,
}

impl Default for RecordCodecOptions {
    fn default() -> Self {
        RecordCodecOptions {
            max_key_len: DEFAULT_MAX_KEY_LEN,
        }
    }
}

/// Checks that `key` can be stored in an index file.
pub fn validate_key(key: &[u8], options: &RecordCodecOptions) -> Result<()> {
    if key.contains(&0) {
        return Err(Error::invalid_arg("key", "key contains a NUL byte"));
    }
    if key.len() > options.max_key_len {
        return Err(Error::invalid_arg(
            "key",
            format!(
                "key is {} bytes long, the limit is {}",
                key.len(),
                options.max_key_len
            ),
        ));
    }
    Ok(())
}

/// Appends the encoded record to `out`.
pub fn encode_record(
    key: &[u8],
    offset: u32,
    length: u32,
    options: &RecordCodecOptions,
    out: &mut Vec<u8>,
) -> Result<()> {
    validate_key(key, options)?;
    let mut trailer = [0u8; RECORD_TRAILER_LEN];
    BigEndian::write_u32(&mut trailer[..4], offset);
    BigEndian::write_u32(&mut trailer[4..], length);
    out.reserve(key.len() + RECORD_OVERHEAD);
    out.extend_from_slice(key);
    out.push(0);
    out.extend_from_slice(&trailer);
    Ok(())
}

/// Decodes the next record from `reader`.
///
/// Returns `Ok(None)` when the stream ends exactly at a record boundary. Any other
/// truncation, or a key longer than `options.max_key_len`, is reported as malformed:
/// once a record is misread, the byte alignment of everything after it is lost.
pub fn decode_record<R: BufRead>(
    reader: &mut R,
    options: &RecordCodecOptions,
) -> Result<Option<IndexRecord>> {
    let limit = options.max_key_len as u64 + 1;
    let mut key = Vec::new();
    let n = reader
        .by_ref()
        .take(limit)
        .read_until(0, &mut key)
        .map_err(|e| Error::io("read index key", e))?;
    if n == 0 {
        return Ok(None);
    }
    if key.last() != Some(&0) {
        return Err(if n as u64 == limit {
            Error::malformed(
                "index record",
                format!(
                    "no key terminator within {} bytes",
                    options.max_key_len + 1
                ),
            )
        } else {
            Error::malformed("index record", "stream ends inside a key")
        });
    }
    key.pop();

    let mut trailer = [0u8; RECORD_TRAILER_LEN];
    reader.read_exact(&mut trailer).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::malformed(
                "index record",
                format!(
                    "truncated trailer after key '{}'",
                    String::from_utf8_lossy(&key)
                ),
            )
        } else {
            Error::io("read index record trailer", e)
        }
    })?;

    Ok(Some(IndexRecord {
        key,
        offset: BigEndian::read_u32(&trailer[..4]),
        length: BigEndian::read_u32(&trailer[4..]),
    }))
}
