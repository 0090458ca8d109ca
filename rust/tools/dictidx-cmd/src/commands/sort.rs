//! Sort command implementation

use std::path::PathBuf;

use anyhow::{Result, bail};
use dictidx::index::sort_primary_index_file;

use crate::{commands::SectionArgs, utils::validate_file_exists};

pub fn run(input: PathBuf, output: PathBuf, sections: SectionArgs) -> Result<()> {
    validate_file_exists(&input)?;
    if input == output {
        bail!("Refusing to sort {} in place", input.display());
    }
    let summary = sort_primary_index_file(&input, &output, &sections.params()?)?;
    println!(
        "Sorted {} records ({} bytes) into {}",
        summary.records,
        summary.size,
        output.display()
    );
    Ok(())
}
