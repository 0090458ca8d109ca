use std::{collections::HashSet, path::Path};

use dictidx_common::{Result, error::Error, verify_arg};
use dictidx_io::{FileWriter, SealingWrite};

use crate::{
    primary::PrimaryIndex,
    record::{RecordCodecOptions, encode_record},
    section::{SectionEntry, SectionIndexParams},
};

/// Totals reported after a section index has been written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SectionIndexSummary {
    pub sections: usize,
    pub primary_size: u64,
    pub largest_span: u64,
    pub size: u64,
}

/// Derives the section index from a finished primary index.
///
/// The primary index must be grouped by section prefix in file order, i.e. all records
/// sharing a prefix are contiguous. Sorting by folded key guarantees this; see
/// [`crate::sort::sort_primary_index`]. A prefix that reappears after its run has been
/// closed is reported as [`dictidx_common::error::ErrorKind::UngroupedIndex`].
pub struct SectionIndexBuilder {
    params: SectionIndexParams,
}

impl SectionIndexBuilder {
    pub fn new(params: SectionIndexParams) -> Result<SectionIndexBuilder> {
        verify_arg!(
            prefix_chars,
            (1..=SectionIndexParams::MAX_PREFIX_CHARS).contains(&params.prefix_chars)
        );
        Ok(SectionIndexBuilder { params })
    }

    pub fn params(&self) -> &SectionIndexParams {
        &self.params
    }

    /// Scans the primary index once and returns its sections, sorted by prefix.
    ///
    /// The sections tile the primary index: each one starts where the previous run
    /// ended, and the last one ends at the end of the file.
    pub fn build(&self, primary: &PrimaryIndex) -> Result<Vec<SectionEntry>> {
        let mut sections: Vec<SectionEntry> = Vec::new();
        let mut seen: HashSet<Vec<u8>> = HashSet::new();
        let mut end_of_data = 0u64;

        for entry in primary.scan() {
            let entry = entry?;
            let prefix = self.params.section_prefix(&entry.record.key);
            end_of_data = entry.end();

            if let Some(current) = sections.last_mut() {
                if current.prefix == prefix {
                    continue;
                }
                current.end = entry.position;
            }
            if !seen.insert(prefix.clone()) {
                return Err(Error::ungrouped_index(&prefix, entry.position));
            }
            sections.push(SectionEntry {
                prefix,
                begin: entry.position,
                end: entry.position,
            });
        }

        if let Some(last) = sections.last_mut() {
            last.end = end_of_data;
        }

        sections.sort_by(|a, b| a.prefix.cmp(&b.prefix));
        log::debug!(
            "section index: {} sections over {} index bytes",
            sections.len(),
            primary.size()
        );
        Ok(sections)
    }

    /// Serializes sections using the index record layout.
    pub fn write(
        sections: &[SectionEntry],
        mut writer: Box<dyn SealingWrite>,
    ) -> Result<SectionIndexSummary> {
        let options = RecordCodecOptions::default();
        let mut buf = Vec::new();
        let mut summary = SectionIndexSummary {
            sections: sections.len(),
            ..Default::default()
        };
        for section in sections {
            if section.end > u32::MAX as u64 {
                return Err(Error::out_of_range(
                    "section index range",
                    section.end,
                    u32::MAX as u64,
                ));
            }
            buf.clear();
            encode_record(
                &section.prefix,
                section.begin as u32,
                section.span() as u32,
                &options,
                &mut buf,
            )?;
            writer
                .write_all(&buf)
                .map_err(|e| Error::io("write section record", e))?;
            summary.size += buf.len() as u64;
            summary.largest_span = summary.largest_span.max(section.span());
            summary.primary_size = summary.primary_size.max(section.end);
        }
        writer
            .seal()
            .map_err(|e| Error::io("seal section index", e))?;
        Ok(summary)
    }

    /// Builds the sections of `primary` and writes them to `path`.
    pub fn build_file(
        &self,
        primary: &PrimaryIndex,
        path: impl AsRef<Path>,
    ) -> Result<SectionIndexSummary> {
        let path = path.as_ref();
        let sections = self.build(primary)?;
        let writer = FileWriter::create(path)
            .map_err(|e| Error::io(format!("create section index {}", path.display()), e))?;
        let summary = Self::write(&sections, Box::new(writer))?;
        log::info!(
            "wrote {} sections to {} (largest section {} bytes)",
            summary.sections,
            path.display(),
            summary.largest_span
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use dictidx_common::error::ErrorKind;

    use super::*;
    use crate::{primary::PrimaryIndex, section::AmbiguousPrefixes};

    fn primary(keys: &[&str]) -> PrimaryIndex {
        let mut bytes = Vec::new();
        for (i, key) in keys.iter().enumerate() {
            encode_record(
                key.as_bytes(),
                i as u32 * 10,
                10,
                &Default::default(),
                &mut bytes,
            )
            .unwrap();
        }
        PrimaryIndex::from_reader(Arc::new(bytes), Default::default()).unwrap()
    }

    fn width(chars: usize) -> SectionIndexBuilder {
        SectionIndexBuilder::new(SectionIndexParams {
            prefix_chars: chars,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_two_sections() {
        let sections = width(2).build(&primary(&["cat", "car", "dog"])).unwrap();
        assert_eq!(
            sections,
            vec![
                SectionEntry {
                    prefix: b"ca".to_vec(),
                    begin: 0,
                    end: 24
                },
                SectionEntry {
                    prefix: b"do".to_vec(),
                    begin: 24,
                    end: 36
                },
            ]
        );
    }

    #[test]
    fn test_sections_sorted_and_tiling() {
        let index = primary(&["zebra", "zen", "Apple", "apply", "", "b"]);
        let sections = width(3).build(&index).unwrap();
        let prefixes = sections.iter().map(|s| s.prefix.clone()).collect::<Vec<_>>();
        assert_eq!(
            prefixes,
            vec![
                b"app".to_vec(),
                b"b".to_vec(),
                b"zeb".to_vec(),
                b"zen".to_vec(),
                vec![0xFF]
            ]
        );

        let mut ranges = sections.iter().map(|s| s.range()).collect::<Vec<_>>();
        ranges.sort_by_key(|r| r.start);
        assert_eq!(ranges.first().unwrap().start, 0);
        assert_eq!(ranges.last().unwrap().end, index.size());
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        assert_eq!(sections.iter().map(|s| s.span()).sum::<u64>(), index.size());
    }

    #[test]
    fn test_ambiguous_prefixes_split_sections() {
        let builder = SectionIndexBuilder::new(
            SectionIndexParams::default().with_ambiguous_prefixes(AmbiguousPrefixes::oxford()),
        )
        .unwrap();
        let sections = builder
            .build(&primary(&["con", "concert", "convey", "cook"]))
            .unwrap();
        let prefixes = sections.iter().map(|s| s.prefix.clone()).collect::<Vec<_>>();
        assert_eq!(
            prefixes,
            vec![
                b"con".to_vec(),
                b"conc".to_vec(),
                b"conv".to_vec(),
                b"coo".to_vec()
            ]
        );
    }

    #[test]
    fn test_ungrouped_index_rejected() {
        let err = width(2)
            .build(&primary(&["cat", "dog", "car"]))
            .unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::UngroupedIndex { prefix, position: 24 } if prefix == "ca"
        ));
    }

    #[test]
    fn test_empty_primary_index() {
        assert!(width(3).build(&primary(&[])).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_width() {
        assert!(
            SectionIndexBuilder::new(SectionIndexParams {
                prefix_chars: 0,
                ..Default::default()
            })
            .is_err()
        );
        assert!(
            SectionIndexBuilder::new(SectionIndexParams {
                prefix_chars: 4,
                ..Default::default()
            })
            .is_err()
        );
    }

    #[test]
    fn test_write_layout() {
        let sections = width(2).build(&primary(&["cat", "car", "dog"])).unwrap();
        let summary = SectionIndexBuilder::write(&sections, Box::new(Vec::new())).unwrap();
        assert_eq!(summary.sections, 2);
        assert_eq!(summary.primary_size, 36);
        assert_eq!(summary.largest_span, 24);
        assert_eq!(summary.size, 2 * 11);
    }
}
