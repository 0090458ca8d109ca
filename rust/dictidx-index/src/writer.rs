//! Builds a dictionary: the content blob and its primary index, side by side.

use std::path::Path;

use dictidx_common::{Result, error::Error};
use dictidx_io::{FileWriter, SealingWrite};

use crate::{
    primary::PrimaryIndexWriter,
    record::{IndexRecord, validate_key},
    section::SectionIndexParams,
    sort::section_order,
};

/// Totals reported once both files of a dictionary are sealed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DictionarySummary {
    pub word_count: u64,
    pub idx_file_size: u64,
    pub dict_file_size: u64,
}

/// Appends entries to a content blob and records each one in the primary index.
///
/// Content offsets are tracked by the writer; an entry that would end beyond the
/// 32-bit range of the index record is rejected before anything is written.
pub struct DictionaryWriter {
    index: PrimaryIndexWriter,
    content: Box<dyn SealingWrite>,
    offset: u64,
}

impl DictionaryWriter {
    /// Creates (truncating) the index file `idx_path` and the content file `dict_path`.
    pub fn create(
        idx_path: impl AsRef<Path>,
        dict_path: impl AsRef<Path>,
    ) -> Result<DictionaryWriter> {
        let index = PrimaryIndexWriter::create(idx_path)?;
        let dict_path = dict_path.as_ref();
        let content = FileWriter::create(dict_path)
            .map_err(|e| Error::io(format!("create content {}", dict_path.display()), e))?;
        Ok(Self::new(index, Box::new(content)))
    }

    pub fn new(index: PrimaryIndexWriter, content: Box<dyn SealingWrite>) -> DictionaryWriter {
        DictionaryWriter {
            index,
            content,
            offset: 0,
        }
    }

    /// Current size of the content blob.
    pub fn content_offset(&self) -> u64 {
        self.offset
    }

    /// Appends `content` to the blob and the matching record to the index.
    pub fn add_entry(&mut self, key: &[u8], content: &[u8]) -> Result<IndexRecord> {
        validate_key(key, self.index.options())?;
        let end = self.offset + content.len() as u64;
        if end > u32::MAX as u64 {
            return Err(Error::out_of_range("dictionary content", end, u32::MAX as u64));
        }
        let record = IndexRecord::new(key, self.offset as u32, content.len() as u32);

        self.content
            .write_all(content)
            .map_err(|e| Error::io("write entry content", e))?;
        self.index.append_record(&record)?;
        self.offset = end;
        Ok(record)
    }

    /// Sorts a batch by section prefix under `params`, then by folded key (ties keep
    /// input order), and appends it.
    ///
    /// A dictionary built only through this call is grouped by section prefix, so a
    /// section index can be built from it with the same `params`.
    pub fn add_entries_sorted<K, V>(
        &mut self,
        entries: impl IntoIterator<Item = (K, V)>,
        params: &SectionIndexParams,
    ) -> Result<usize>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        let mut entries = entries.into_iter().collect::<Vec<_>>();
        entries.sort_by_cached_key(|(key, _)| section_order(params, key.as_ref()));
        for (key, content) in &entries {
            self.add_entry(key.as_ref(), content.as_ref())?;
        }
        Ok(entries.len())
    }

    pub fn finish(mut self) -> Result<DictionarySummary> {
        self.content
            .seal()
            .map_err(|e| Error::io("seal content", e))?;
        let index = self.index.finish()?;
        let summary = DictionarySummary {
            word_count: index.records,
            idx_file_size: index.size,
            dict_file_size: self.offset,
        };
        log::info!(
            "dictionary written: {} words, index {} bytes, content {} bytes",
            summary.word_count,
            summary.idx_file_size,
            summary.dict_file_size
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use dictidx_common::error::ErrorKind;
    use dictidx_io::{ContentSource, FlatContent};

    use super::*;
    use crate::{primary::PrimaryIndex, section::builder::SectionIndexBuilder};

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let idx = dir.path().join("words.idx");
        let dict = dir.path().join("words.dict");

        let mut writer = DictionaryWriter::create(&idx, &dict).unwrap();
        assert_eq!(
            writer.add_entry(b"cat", b"a small feline").unwrap(),
            IndexRecord::new("cat", 0, 14)
        );
        assert_eq!(writer.add_entry(b"car", b"vehicle").unwrap().offset, 14);
        assert!(writer.add_entry(b"bad\0", b"never written").is_err());
        assert_eq!(writer.content_offset(), 21);
        let summary = writer.finish().unwrap();
        assert_eq!(
            summary,
            DictionarySummary {
                word_count: 2,
                idx_file_size: 24,
                dict_file_size: 21,
            }
        );

        let index = PrimaryIndex::open(&idx).unwrap();
        let record = index.find_linear(b"car").unwrap().unwrap();
        let content = FlatContent::open(&dict).unwrap();
        assert_eq!(
            content.read_content(record.offset, record.length).unwrap().as_ref(),
            b"vehicle"
        );
    }

    #[test]
    fn test_sorted_batch() {
        let index_writer = PrimaryIndexWriter::new(Box::new(Vec::new()), Default::default());
        let mut writer = DictionaryWriter::new(index_writer, Box::new(Vec::new()));
        let added = writer
            .add_entries_sorted(
                [("dog", "woof"), ("Cat", "meow"), ("car", "vroom")],
                &Default::default(),
            )
            .unwrap();
        assert_eq!(added, 3);
        // car, Cat, dog
        assert_eq!(writer.content_offset(), 13);
        assert_eq!(writer.finish().unwrap().word_count, 3);
    }

    #[test]
    fn test_sorted_batch_with_invalid_utf8_is_grouped() {
        let dir = tempfile::tempdir().unwrap();
        let idx = dir.path().join("mixed.idx");
        let dict = dir.path().join("mixed.dict");
        let params = SectionIndexParams::default();

        let mut writer = DictionaryWriter::create(&idx, &dict).unwrap();
        let keys: [&[u8]; 5] = [
            "abéx".as_bytes(),
            b"ab\xc3\xa9\x80",
            "abéé".as_bytes(),
            b"ab\xc3",
            b"abd",
        ];
        writer
            .add_entries_sorted(keys.iter().map(|k| (*k, b"x".as_slice())), &params)
            .unwrap();
        writer.finish().unwrap();

        let index = PrimaryIndex::open(&idx).unwrap();
        let entries = SectionIndexBuilder::new(params)
            .unwrap()
            .build(&index)
            .unwrap();
        let prefixes = entries.iter().map(|s| s.prefix.clone()).collect::<Vec<_>>();
        assert_eq!(
            prefixes,
            vec![b"abd".to_vec(), b"ab\xc3".to_vec(), "abé".as_bytes().to_vec()]
        );
        let abe = &entries[2];
        assert_eq!(abe.span(), index.size() - abe.begin);
        assert_eq!(
            index.scan_range(abe.begin..abe.end).count(),
            3,
            "every key folding to 'abé' lands in one section"
        );
    }

    #[test]
    fn test_content_beyond_32_bits() {
        let index_writer = PrimaryIndexWriter::new(Box::new(Vec::new()), Default::default());
        let mut writer = DictionaryWriter::new(index_writer, Box::new(Vec::new()));
        writer.offset = u32::MAX as u64 - 2;
        let err = writer.add_entry(b"big", b"four").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::OutOfRange { .. }));
    }
}
