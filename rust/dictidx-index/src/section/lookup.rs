use std::{collections::HashMap, ops::Range, path::Path, sync::Arc};

use dictidx_common::{Result, error::Error, verify_data};
use dictidx_io::{FileReader, ReadAt};

use crate::{
    fold::{FoldedKey, keys_equal_folded},
    primary::PrimaryIndex,
    record::IndexRecord,
    section::{SectionEntry, SectionIndexParams},
};

/// How a stored key is compared with the query once its section has been found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyMatch {
    /// Byte-for-byte equality.
    #[default]
    Exact,
    /// Equality after folding both keys.
    CaseInsensitive,
}

impl KeyMatch {
    pub fn matches(&self, stored: &[u8], query: &[u8]) -> bool {
        match self {
            KeyMatch::Exact => stored == query,
            KeyMatch::CaseInsensitive => keys_equal_folded(stored, query),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LookupOptions {
    pub key_match: KeyMatch,
}

/// The section a query resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionMatch {
    pub prefix: Vec<u8>,
    pub range: Range<u64>,
}

/// Summary of the section layout, useful to judge the prefix width and the
/// ambiguous-prefix set of a dictionary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionStats {
    pub sections: usize,
    pub total_span: u64,
    pub largest_span: u64,
    pub largest_prefix: Vec<u8>,
}

/// In-memory section directory: folded prefix to primary-index byte range.
///
/// This is the only structure a lookup materializes fully; its size is bounded by
/// the number of distinct prefixes, not by the number of records.
#[derive(Debug, Clone, Default)]
pub struct SectionIndex {
    sections: HashMap<Vec<u8>, Range<u64>>,
    options: LookupOptions,
}

impl SectionIndex {
    pub fn load(path: impl AsRef<Path>) -> Result<SectionIndex> {
        let path = path.as_ref();
        let reader = FileReader::open(path)
            .map_err(|e| Error::io(format!("open section index {}", path.display()), e))?;
        let index = Self::from_reader(Arc::new(reader))?;
        log::debug!(
            "loaded {} sections from {}",
            index.len(),
            path.display()
        );
        Ok(index)
    }

    pub fn from_reader(reader: Arc<dyn ReadAt>) -> Result<SectionIndex> {
        let file = PrimaryIndex::from_reader(reader, Default::default())?;
        let mut sections = HashMap::new();
        for entry in file.scan() {
            let record = entry?.record;
            // Folded prefixes are never empty; the empty key has its own sentinel.
            verify_data!(section_prefix, !record.key.is_empty());
            let begin = record.offset as u64;
            sections.insert(record.key, begin..begin + record.length as u64);
        }
        Ok(SectionIndex {
            sections,
            options: LookupOptions::default(),
        })
    }

    pub fn from_entries(entries: impl IntoIterator<Item = SectionEntry>) -> SectionIndex {
        SectionIndex {
            sections: entries
                .into_iter()
                .map(|s| (s.prefix, s.begin..s.end))
                .collect(),
            options: LookupOptions::default(),
        }
    }

    pub fn with_options(mut self, options: LookupOptions) -> SectionIndex {
        self.options = options;
        self
    }

    pub fn options(&self) -> &LookupOptions {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// The byte range of the section with exactly this folded prefix.
    pub fn get(&self, prefix: &[u8]) -> Option<Range<u64>> {
        self.sections.get(prefix).cloned()
    }

    /// All sections, sorted by prefix.
    pub fn entries(&self) -> Vec<SectionEntry> {
        let mut entries = self
            .sections
            .iter()
            .map(|(prefix, range)| SectionEntry {
                prefix: prefix.clone(),
                begin: range.start,
                end: range.end,
            })
            .collect::<Vec<_>>();
        entries.sort_by(|a, b| a.prefix.cmp(&b.prefix));
        entries
    }

    /// Resolves `key` to the section of its longest known prefix.
    ///
    /// The folded query is cut to [`SectionIndexParams::LOOKUP_PREFIX_CHARS`]
    /// characters and shortened one character at a time until a section matches.
    pub fn locate(&self, key: &[u8]) -> Option<SectionMatch> {
        let folded = FoldedKey::leading(key, SectionIndexParams::LOOKUP_PREFIX_CHARS);
        let longest = folded
            .char_count()
            .clamp(1, SectionIndexParams::LOOKUP_PREFIX_CHARS);
        (1..=longest).rev().find_map(|chars| {
            let prefix = folded.prefix(chars);
            self.sections.get(prefix).map(|range| SectionMatch {
                prefix: prefix.to_vec(),
                range: range.clone(),
            })
        })
    }

    /// Finds the first record matching `key` in file order.
    ///
    /// Only the section returned by [`SectionIndex::locate`] is scanned: when the key
    /// is not there the result is `None`, without trying shorter prefixes. A section
    /// pointing past the end of `primary` also yields `None`.
    pub fn find(&self, primary: &PrimaryIndex, key: &[u8]) -> Result<Option<IndexRecord>> {
        let Some(range) = self.section_range(primary, key) else {
            return Ok(None);
        };
        for entry in primary.scan_range(range) {
            let entry = entry?;
            if self.options.key_match.matches(&entry.record.key, key) {
                return Ok(Some(entry.record));
            }
        }
        Ok(None)
    }

    /// Finds every record matching `key` within its section, in file order.
    pub fn find_all(&self, primary: &PrimaryIndex, key: &[u8]) -> Result<Vec<IndexRecord>> {
        let Some(range) = self.section_range(primary, key) else {
            return Ok(Vec::new());
        };
        let mut found = Vec::new();
        for entry in primary.scan_range(range) {
            let entry = entry?;
            if self.options.key_match.matches(&entry.record.key, key) {
                found.push(entry.record);
            }
        }
        Ok(found)
    }

    pub fn stats(&self) -> SectionStats {
        let mut stats = SectionStats {
            sections: self.sections.len(),
            ..Default::default()
        };
        for (prefix, range) in &self.sections {
            let span = range.end - range.start;
            stats.total_span += span;
            if span > stats.largest_span
                || (span == stats.largest_span && *prefix < stats.largest_prefix)
            {
                stats.largest_span = span;
                stats.largest_prefix = prefix.clone();
            }
        }
        stats
    }

    fn section_range(&self, primary: &PrimaryIndex, key: &[u8]) -> Option<Range<u64>> {
        let section = self.locate(key)?;
        if section.range.end > primary.size() {
            log::warn!(
                "section '{}' ends at byte {}, beyond the {} byte primary index",
                String::from_utf8_lossy(&section.prefix),
                section.range.end,
                primary.size()
            );
            return None;
        }
        Some(section.range)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        record::encode_record,
        section::builder::SectionIndexBuilder,
    };

    fn primary(records: &[(&str, u32, u32)]) -> PrimaryIndex {
        let mut bytes = Vec::new();
        for &(key, offset, length) in records {
            encode_record(key.as_bytes(), offset, length, &Default::default(), &mut bytes)
                .unwrap();
        }
        PrimaryIndex::from_reader(Arc::new(bytes), Default::default()).unwrap()
    }

    fn sections(index: &PrimaryIndex, prefix_chars: usize) -> SectionIndex {
        let builder = SectionIndexBuilder::new(SectionIndexParams {
            prefix_chars,
            ..Default::default()
        })
        .unwrap();
        SectionIndex::from_entries(builder.build(index).unwrap())
    }

    #[test]
    fn test_find_scans_only_its_section() {
        let index = primary(&[("cat", 0, 120), ("car", 120, 80), ("dog", 200, 50)]);
        let sections = sections(&index, 2);

        let located = sections.locate(b"car").unwrap();
        assert_eq!(located.prefix, b"ca");
        assert_eq!(located.range, 0..24);

        assert_eq!(
            sections.find(&index, b"car").unwrap(),
            Some(IndexRecord::new("car", 120, 80))
        );
        assert_eq!(
            sections.find(&index, b"dog").unwrap(),
            Some(IndexRecord::new("dog", 200, 50))
        );
        assert_eq!(sections.find(&index, b"cab").unwrap(), None);
        assert_eq!(sections.find(&index, b"emu").unwrap(), None);
    }

    #[test]
    fn test_prefix_fallback() {
        let index = primary(&[("a", 0, 1), ("ab", 1, 1), ("abcdef", 2, 1)]);
        let sections = sections(&index, 3);
        assert_eq!(sections.locate(b"abcdef").unwrap().prefix, b"abc");
        assert_eq!(sections.locate(b"abzzz").unwrap().prefix, b"ab");
        assert_eq!(sections.locate(b"aq").unwrap().prefix, b"a");
        assert!(sections.locate(b"q").is_none());

        // Found section "ab" holds only "ab": no fallback to "a".
        assert_eq!(sections.find(&index, b"abzzz").unwrap(), None);
    }

    #[test]
    fn test_empty_key_lookup() {
        let index = primary(&[("", 0, 5), ("x", 5, 1)]);
        let sections = sections(&index, 3);
        assert_eq!(
            sections.find(&index, b"").unwrap(),
            Some(IndexRecord::new("", 0, 5))
        );
    }

    #[test]
    fn test_case_insensitive_match() {
        let index = primary(&[("Paris", 0, 10), ("park", 10, 4)]);
        let sections = sections(&index, 3);
        assert_eq!(sections.find(&index, b"paris").unwrap(), None);

        let sections = sections.with_options(LookupOptions {
            key_match: KeyMatch::CaseInsensitive,
        });
        assert_eq!(
            sections.find(&index, b"PARIS").unwrap(),
            Some(IndexRecord::new("Paris", 0, 10))
        );
    }

    #[test]
    fn test_duplicates_first_wins() {
        let index = primary(&[("bank", 0, 3), ("bank", 3, 4), ("bat", 7, 2)]);
        let sections = sections(&index, 2);
        assert_eq!(
            sections.find(&index, b"bank").unwrap(),
            Some(IndexRecord::new("bank", 0, 3))
        );
        assert_eq!(sections.find_all(&index, b"bank").unwrap().len(), 2);
    }

    #[test]
    fn test_section_past_end_is_not_found() {
        let index = primary(&[("cat", 0, 120)]);
        let sections = SectionIndex::from_entries([SectionEntry {
            prefix: b"cat".to_vec(),
            begin: 0,
            end: 500,
        }]);
        assert_eq!(sections.find(&index, b"cat").unwrap(), None);
    }

    #[test]
    fn test_stats() {
        let index = primary(&[("cat", 0, 120), ("car", 120, 80), ("dog", 200, 50)]);
        let stats = sections(&index, 2).stats();
        assert_eq!(stats.sections, 2);
        assert_eq!(stats.total_span, 36);
        assert_eq!(stats.largest_span, 24);
        assert_eq!(stats.largest_prefix, b"ca");
    }

    #[test]
    fn test_load_last_section_closed_inclusively() {
        // Writers that close the last section at the offset of the final byte
        // (`end = file size - 1`) record `span - 1` for it; its final record still
        // starts inside the range and is found.
        let index = primary(&[("cat", 0, 120), ("car", 120, 80), ("dog", 200, 50)]);
        let mut bytes = Vec::new();
        encode_record(b"ca", 0, 24, &Default::default(), &mut bytes).unwrap();
        encode_record(b"do", 24, 11, &Default::default(), &mut bytes).unwrap();
        let sections = SectionIndex::from_reader(Arc::new(bytes)).unwrap();
        assert_eq!(sections.get(b"ca"), Some(0..24));
        assert_eq!(sections.get(b"do"), Some(24..35));
        assert_eq!(
            sections.find(&index, b"car").unwrap(),
            Some(IndexRecord::new("car", 120, 80))
        );
        assert_eq!(
            sections.find(&index, b"dog").unwrap(),
            Some(IndexRecord::new("dog", 200, 50))
        );
    }
}
