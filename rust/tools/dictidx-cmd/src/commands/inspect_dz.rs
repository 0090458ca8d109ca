//! Inspect-dz command implementation

use std::path::PathBuf;

use anyhow::{Context, Result};
use dictidx::dictzip::DictzipReader;
use serde::Serialize;

use crate::utils::validate_file_exists;

#[derive(Serialize)]
struct DictzipInfo {
    method: u8,
    flags: u8,
    mtime: u32,
    os: u8,
    version: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    header_len: u64,
    chunk_length: u16,
    chunk_count: usize,
    compressed_data: u64,
    uncompressed_size: u64,
    chunks: Vec<ChunkInfo>,
}

#[derive(Serialize)]
struct ChunkInfo {
    index: usize,
    file_offset: u64,
    compressed: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    inflated: Option<usize>,
}

pub fn run(path: PathBuf, verify: bool) -> Result<()> {
    validate_file_exists(&path)?;
    let reader = DictzipReader::open(&path)
        .with_context(|| format!("Failed to open dictzip {}", path.display()))?;
    let header = reader.header();

    let mut chunks = Vec::with_capacity(header.chunk_count());
    for (index, &compressed) in header.chunk_sizes.iter().enumerate() {
        chunks.push(ChunkInfo {
            index,
            file_offset: header.chunk_offset(index).unwrap_or_default(),
            compressed,
            inflated: None,
        });
    }
    if verify {
        for (info, chunk) in chunks.iter_mut().zip(reader.chunks(0..header.chunk_count())) {
            let chunk = chunk.with_context(|| format!("Chunk {} is corrupt", info.index))?;
            info.inflated = Some(chunk.len());
        }
    }

    let summary = DictzipInfo {
        method: header.method,
        flags: header.flags,
        mtime: header.mtime,
        os: header.os,
        version: header.version,
        file_name: header
            .file_name
            .as_ref()
            .map(|n| String::from_utf8_lossy(n).into_owned()),
        comment: header
            .comment
            .as_ref()
            .map(|c| String::from_utf8_lossy(c).into_owned()),
        header_len: header.header_len(),
        chunk_length: header.chunk_length,
        chunk_count: header.chunk_count(),
        compressed_data: header.data_end() - header.header_len(),
        uncompressed_size: reader.uncompressed_size()?,
        chunks,
    };
    println!("Inspecting dictzip: {}", path.display());
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
