use std::{path::Path, sync::OnceLock};

use bytes::Bytes;
use dictidx_common::Result;
use dictidx_io::ContentSource;

use crate::reader::DictzipReader;

/// Dictionary content stored in a dictzip container.
pub struct DictzipContent {
    reader: DictzipReader,
    size: OnceLock<u64>,
}

impl DictzipContent {
    pub fn new(reader: DictzipReader) -> DictzipContent {
        DictzipContent {
            reader,
            size: OnceLock::new(),
        }
    }

    pub fn open(path: impl AsRef<Path>) -> Result<DictzipContent> {
        Ok(Self::new(DictzipReader::open(path)?))
    }

    pub fn reader(&self) -> &DictzipReader {
        &self.reader
    }
}

impl ContentSource for DictzipContent {
    fn content_size(&self) -> Result<u64> {
        if let Some(&size) = self.size.get() {
            return Ok(size);
        }
        let size = self.reader.uncompressed_size()?;
        Ok(*self.size.get_or_init(|| size))
    }

    fn read_content(&self, offset: u32, length: u32) -> Result<Bytes> {
        self.reader.read(offset as u64, length as usize)
    }
}
