//! The `.ifo` info file describing a dictionary.
//!
//! ```text
//! StarDict's dict ifo file
//! version=2.4.2
//! bookname=Example
//! wordcount=3
//! idxfilesize=36
//! sametypesequence=h
//! ```

use std::{fmt::Write as _, path::Path};

use dictidx_common::{Result, error::Error};
use dictidx_io::{FileWriter, SealingWrite};

use crate::writer::DictionarySummary;

pub const INFO_MAGIC: &str = "StarDict's dict ifo file";

pub const DEFAULT_INFO_VERSION: &str = "2.4.2";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryInfo {
    pub version: String,
    pub bookname: String,
    pub wordcount: u64,
    pub idxfilesize: u64,
    pub sametypesequence: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub author: Option<String>,
    pub website: Option<String>,
}

impl DictionaryInfo {
    pub fn new(bookname: impl Into<String>, summary: &DictionarySummary) -> DictionaryInfo {
        DictionaryInfo {
            version: DEFAULT_INFO_VERSION.to_string(),
            bookname: bookname.into(),
            wordcount: summary.word_count,
            idxfilesize: summary.idx_file_size,
            sametypesequence: None,
            description: None,
            date: None,
            author: None,
            website: None,
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(INFO_MAGIC);
        out.push('\n');
        let _ = writeln!(out, "version={}", self.version);
        let _ = writeln!(out, "bookname={}", single_line(&self.bookname));
        let _ = writeln!(out, "wordcount={}", self.wordcount);
        let _ = writeln!(out, "idxfilesize={}", self.idxfilesize);
        let optional = [
            ("sametypesequence", &self.sametypesequence),
            ("description", &self.description),
            ("date", &self.date),
            ("author", &self.author),
            ("website", &self.website),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                let _ = writeln!(out, "{name}={}", single_line(value));
            }
        }
        out
    }

    /// Parses an info file. Unknown keys are ignored; `wordcount` is required.
    pub fn parse(text: &str) -> Result<DictionaryInfo> {
        let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
        if lines.next() != Some(INFO_MAGIC) {
            return Err(Error::malformed("info file", "missing magic line"));
        }

        let mut version = None;
        let mut bookname = None;
        let mut wordcount = None;
        let mut idxfilesize = None;
        let mut info = DictionaryInfo {
            version: String::new(),
            bookname: String::new(),
            wordcount: 0,
            idxfilesize: 0,
            sametypesequence: None,
            description: None,
            date: None,
            author: None,
            website: None,
        };
        for line in lines {
            let Some((name, value)) = line.split_once('=') else {
                return Err(Error::malformed(
                    "info file",
                    format!("expected key=value, got '{line}'"),
                ));
            };
            let value = value.to_string();
            match name.trim() {
                "version" => version = Some(value),
                "bookname" => bookname = Some(value),
                "wordcount" => wordcount = Some(parse_count("wordcount", &value)?),
                "idxfilesize" => idxfilesize = Some(parse_count("idxfilesize", &value)?),
                "sametypesequence" => info.sametypesequence = Some(value),
                "description" => info.description = Some(value),
                "date" => info.date = Some(value),
                "author" => info.author = Some(value),
                "website" => info.website = Some(value),
                other => log::debug!("ignoring info key '{other}'"),
            }
        }

        info.wordcount =
            wordcount.ok_or_else(|| Error::malformed("info file", "missing wordcount"))?;
        info.version = version.unwrap_or_else(|| DEFAULT_INFO_VERSION.to_string());
        info.bookname = bookname.unwrap_or_default();
        info.idxfilesize = idxfilesize.unwrap_or(0);
        Ok(info)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<DictionaryInfo> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::io(format!("read info file {}", path.display()), e))?;
        Self::parse(&text)
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = FileWriter::create(path)
            .map_err(|e| Error::io(format!("create info file {}", path.display()), e))?;
        writer
            .write_all(self.render().as_bytes())
            .map_err(|e| Error::io("write info file", e))?;
        writer
            .seal()
            .map_err(|e| Error::io("seal info file", e))
    }
}

fn parse_count(name: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::malformed("info file", format!("{name} '{value}' is not a number")))
}

/// Values are line-delimited; embedded line breaks would start a new key.
fn single_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_and_parse() {
        let mut info = DictionaryInfo::new(
            "Chinese Dictionary",
            &DictionarySummary {
                word_count: 3,
                idx_file_size: 36,
                dict_file_size: 250,
            },
        );
        info.sametypesequence = Some("h".to_string());
        info.description = Some("two\nlines".to_string());

        let text = info.render();
        assert!(text.starts_with("StarDict's dict ifo file\nversion=2.4.2\n"));
        assert!(text.contains("wordcount=3\n"));
        assert!(text.contains("description=two lines\n"));

        let parsed = DictionaryInfo::parse(&text).unwrap();
        assert_eq!(parsed.wordcount, 3);
        assert_eq!(parsed.idxfilesize, 36);
        assert_eq!(parsed.bookname, "Chinese Dictionary");
        assert_eq!(parsed.sametypesequence.as_deref(), Some("h"));
        assert_eq!(parsed.author, None);
    }

    #[test]
    fn test_parse_tolerates_unknown_keys_and_blank_lines() {
        let text = "StarDict's dict ifo file\n\nversion=3.0.0\nwordcount=12\nlang=zh\n  \n";
        let info = DictionaryInfo::parse(text).unwrap();
        assert_eq!(info.version, "3.0.0");
        assert_eq!(info.wordcount, 12);
        assert_eq!(info.idxfilesize, 0);
    }

    #[test]
    fn test_parse_rejects() {
        assert!(DictionaryInfo::parse("version=2.4.2\nwordcount=1\n").is_err());
        assert!(
            DictionaryInfo::parse("StarDict's dict ifo file\nwordcount=many\n")
                .unwrap_err()
                .is_malformed()
        );
        assert!(DictionaryInfo::parse("StarDict's dict ifo file\nversion=2.4.2\n").is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.ifo");
        let info = DictionaryInfo::new("Words", &DictionarySummary::default());
        info.write(&path).unwrap();
        assert_eq!(DictionaryInfo::load(&path).unwrap(), info);
    }
}
