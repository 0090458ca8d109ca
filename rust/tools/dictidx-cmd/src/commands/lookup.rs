//! Lookup command implementation

use std::{io::Write, path::PathBuf};

use anyhow::{Context, Result};
use dictidx::{
    Dictionary, DictionaryOptions, DictionaryPaths,
    index::{KeyMatch, LookupOptions},
    io::ContentSource,
};

use crate::utils::{display_key, validate_file_exists};

pub fn run(base: PathBuf, word: String, ignore_case: bool, all: bool) -> Result<()> {
    let paths = DictionaryPaths::from_base(&base);
    validate_file_exists(&paths.index)?;
    validate_file_exists(&paths.content)?;

    let options = DictionaryOptions {
        lookup: LookupOptions {
            key_match: if ignore_case {
                KeyMatch::CaseInsensitive
            } else {
                KeyMatch::Exact
            },
        },
        ..Default::default()
    };
    let dictionary = Dictionary::open_with_options(&paths, options)
        .with_context(|| format!("Failed to open dictionary {}", base.display()))?;

    let records = match (all, dictionary.sections()) {
        (true, Some(sections)) => sections.find_all(dictionary.primary(), word.as_bytes())?,
        _ => dictionary.find(word.as_bytes())?.into_iter().collect(),
    };
    if records.is_empty() {
        println!("'{word}' not found");
        return Ok(());
    }

    let mut stdout = std::io::stdout().lock();
    for record in records {
        let content = dictionary
            .content()
            .read_content(record.offset, record.length)?;
        writeln!(
            stdout,
            "== {} (offset {}, length {})",
            display_key(&record.key),
            record.offset,
            record.length
        )?;
        stdout.write_all(&content)?;
        writeln!(stdout)?;
    }
    Ok(())
}
