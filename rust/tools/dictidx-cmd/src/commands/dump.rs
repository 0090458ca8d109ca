//! Dump command implementation

use std::{io::Write, path::PathBuf, sync::Arc};

use anyhow::Result;
use dictidx::{
    index::{PrimaryIndex, SectionIndex},
    io::FileReader,
};
use serde::Serialize;

use crate::utils::{display_key, format_size, validate_file_exists};

#[derive(Serialize)]
struct SectionStatsInfo {
    sections: usize,
    total_span: u64,
    largest_span: u64,
    largest_prefix: String,
    average_span: u64,
}

pub fn run(index: PathBuf, limit: Option<usize>, stats: bool) -> Result<()> {
    validate_file_exists(&index)?;

    if stats {
        let sections = SectionIndex::from_reader(Arc::new(FileReader::open(&index)?))?;
        let stats = sections.stats();
        let info = SectionStatsInfo {
            sections: stats.sections,
            total_span: stats.total_span,
            largest_span: stats.largest_span,
            largest_prefix: display_key(&stats.largest_prefix),
            average_span: stats.total_span / stats.sections.max(1) as u64,
        };
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    let primary = PrimaryIndex::open(&index)?;
    println!(
        "{}: {}",
        index.display(),
        format_size(primary.size())
    );
    let mut stdout = std::io::stdout().lock();
    let mut count = 0usize;
    for entry in primary.scan().take(limit.unwrap_or(usize::MAX)) {
        let entry = entry?;
        writeln!(
            stdout,
            "{:>10}  {}\t{}\t{}",
            entry.position,
            display_key(&entry.record.key),
            entry.record.offset,
            entry.record.length
        )?;
        count += 1;
    }
    log::info!("{count} records listed");
    Ok(())
}
