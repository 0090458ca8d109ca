//! Build command implementation

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use dictidx::{
    dictionary::{CONTENT_EXTENSION, DICTZIP_EXTENSION, INDEX_EXTENSION, INFO_EXTENSION},
    dictzip::{DictzipWriter, DictzipWriterParams},
    index::{DictionaryInfo, DictionaryWriter, PrimaryIndex, SectionIndexBuilder, fold_key},
};

use crate::{
    commands::{SectionArgs, build_sections},
    utils::{append_suffix, format_size, validate_file_exists},
};

pub fn run(
    input: PathBuf,
    base: PathBuf,
    bookname: String,
    sections: SectionArgs,
    with_sections: bool,
    compress: bool,
) -> Result<()> {
    validate_file_exists(&input)?;
    let params = sections.params()?;
    let text = std::fs::read(&input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let mut entries = Vec::new();
    for (line_no, line) in text.split(|&b| b == b'\n').enumerate() {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.is_empty() {
            continue;
        }
        let Some(tab) = line.iter().position(|&b| b == b'\t') else {
            bail!("{}:{}: expected word<TAB>content", input.display(), line_no + 1);
        };
        entries.push((&line[..tab], &line[tab + 1..]));
    }
    // Sorting by section prefix first keeps every section contiguous.
    entries.sort_by_cached_key(|(key, _)| (params.section_prefix(key), fold_key(key)));

    let idx_path = append_suffix(&base, &format!(".{INDEX_EXTENSION}"));
    let dict_path = append_suffix(&base, &format!(".{CONTENT_EXTENSION}"));
    let mut writer = DictionaryWriter::create(&idx_path, &dict_path)?;
    for (key, content) in &entries {
        writer
            .add_entry(key, content)
            .with_context(|| format!("Failed to add '{}'", String::from_utf8_lossy(key)))?;
    }
    let summary = writer.finish()?;

    let mut info = DictionaryInfo::new(bookname, &summary);
    info.sametypesequence = Some("h".to_string());
    info.write(append_suffix(&base, &format!(".{INFO_EXTENSION}")))?;

    println!(
        "Built {} words: index {}, content {}",
        summary.word_count,
        format_size(summary.idx_file_size),
        format_size(summary.dict_file_size)
    );

    if with_sections {
        let primary = PrimaryIndex::open(&idx_path)?;
        let output = build_sections::default_output(&idx_path);
        let section_summary = SectionIndexBuilder::new(params)?.build_file(&primary, &output)?;
        println!(
            "Section index: {} sections, largest {}",
            section_summary.sections,
            format_size(section_summary.largest_span)
        );
    }

    if compress {
        let dz_path = append_suffix(&base, &format!(".{DICTZIP_EXTENSION}"));
        let data = std::fs::read(&dict_path)
            .with_context(|| format!("Failed to read {}", dict_path.display()))?;
        let file_name = dict_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        let mut dz = DictzipWriter::create(
            &dz_path,
            DictzipWriterParams {
                file_name,
                ..Default::default()
            },
        )?;
        dz.write_all(&data)?;
        let dz_summary = dz.finish()?;
        std::fs::remove_file(&dict_path)
            .with_context(|| format!("Failed to remove {}", dict_path.display()))?;
        println!(
            "Compressed content: {} chunks, {}",
            dz_summary.chunks,
            format_size(dz_summary.compressed_size)
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use dictidx::{Dictionary, DictionaryPaths};

    use super::*;

    #[test]
    fn test_build_compressed_with_sections() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("words.tsv");
        std::fs::write(
            &input,
            "dog\ta canine\r\ncat\ta feline\n\nconcert\ta performance\ncar\ta vehicle\n",
        )
        .unwrap();
        let base = dir.path().join("words");
        let sections = SectionArgs {
            prefix_chars: 2,
            preset: Some("oxford".to_string()),
            ambiguous: vec![],
        };
        run(input, base.clone(), "Words".to_string(), sections, true, true).unwrap();

        let paths = DictionaryPaths::from_base(&base);
        assert!(paths.sections.is_some());
        assert!(!dir.path().join("words.dict").exists());
        let dictionary = Dictionary::open(&paths).unwrap();
        assert_eq!(
            dictionary.lookup(b"car").unwrap().unwrap().as_ref(),
            b"a vehicle"
        );
        assert_eq!(
            dictionary.lookup(b"concert").unwrap().unwrap().as_ref(),
            b"a performance"
        );
        assert!(dictionary.lookup(b"cow").unwrap().is_none());
    }

    #[test]
    fn test_rejects_line_without_tab() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bad.tsv");
        std::fs::write(&input, "dog\ta canine\ncat\n").unwrap();
        let sections = SectionArgs {
            prefix_chars: 3,
            preset: None,
            ambiguous: vec![],
        };
        let err = run(
            input,
            dir.path().join("bad"),
            "Bad".to_string(),
            sections,
            false,
            false,
        )
        .unwrap_err();
        assert!(err.to_string().contains(":2:"));
    }
}
