//! Build-sections command implementation

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dictidx::{
    dictionary::SECTION_INDEX_EXTENSION,
    index::{PrimaryIndex, SectionIndexBuilder},
};

use crate::{
    commands::SectionArgs,
    utils::{append_suffix, format_size, validate_file_exists},
};

/// `<name>.idx` becomes `<name>.idxidx`.
pub fn default_output(index: &Path) -> PathBuf {
    match index.extension() {
        Some(ext) if ext == "idx" => index.with_extension(SECTION_INDEX_EXTENSION),
        _ => append_suffix(index, &format!(".{SECTION_INDEX_EXTENSION}")),
    }
}

pub fn run(index: PathBuf, output: Option<PathBuf>, sections: SectionArgs) -> Result<()> {
    validate_file_exists(&index)?;
    let builder = SectionIndexBuilder::new(sections.params()?)?;
    let primary = PrimaryIndex::open(&index)?;
    let output = output.unwrap_or_else(|| default_output(&index));

    let summary = builder.build_file(&primary, &output).with_context(|| {
        format!(
            "Failed to build sections of {} (run `sort` first if the index is not grouped)",
            index.display()
        )
    })?;

    println!("Section index: {}", output.display());
    println!("  sections:      {}", summary.sections);
    println!("  primary index: {}", format_size(summary.primary_size));
    println!("  largest span:  {}", format_size(summary.largest_span));
    println!("  file size:     {}", format_size(summary.size));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output() {
        assert_eq!(
            default_output(Path::new("d/oxford.idx")),
            PathBuf::from("d/oxford.idxidx")
        );
        assert_eq!(
            default_output(Path::new("d/words.index")),
            PathBuf::from("d/words.index.idxidx")
        );
    }
}
