//! Compress command implementation

use std::{io::Read, path::PathBuf, time::UNIX_EPOCH};

use anyhow::{Context, Result};
use dictidx::dictzip::{DictzipWriter, DictzipWriterParams};

use crate::utils::{append_suffix, format_size, validate_file_exists};

pub fn run(input: PathBuf, output: Option<PathBuf>, chunk_length: u16, level: u32) -> Result<()> {
    validate_file_exists(&input)?;
    let output = output.unwrap_or_else(|| append_suffix(&input, ".dz"));
    let mtime = std::fs::metadata(&input)?
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_secs() as u32);

    let params = DictzipWriterParams {
        chunk_length,
        level,
        file_name: input.file_name().map(|n| n.to_string_lossy().into_owned()),
        comment: None,
        mtime,
    };
    let mut writer = DictzipWriter::create(&output, params)?;
    let mut file = std::fs::File::open(&input)
        .with_context(|| format!("Failed to open {}", input.display()))?;
    let mut buf = vec![0u8; 1 << 20];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n])?;
    }
    let summary = writer.finish()?;
    println!(
        "{} -> {}: {} chunks, {} -> {}",
        input.display(),
        output.display(),
        summary.chunks,
        format_size(summary.uncompressed_size),
        format_size(summary.compressed_size)
    );
    Ok(())
}
