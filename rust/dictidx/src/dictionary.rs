use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use bytes::Bytes;
use dictidx_common::{Result, error::Error};
use dictidx_dictzip::{DictzipContent, DictzipReader, is_gzip};
use dictidx_index::{
    IndexRecord, LookupOptions, PrimaryIndex, RecordCodecOptions, SectionIndex,
};
use dictidx_io::{ContentSource, FileReader, FlatContent, ReadAt};

pub const INDEX_EXTENSION: &str = "idx";
pub const SECTION_INDEX_EXTENSION: &str = "idxidx";
pub const CONTENT_EXTENSION: &str = "dict";
pub const DICTZIP_EXTENSION: &str = "dict.dz";
pub const INFO_EXTENSION: &str = "ifo";

/// Locations of the files making up one dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryPaths {
    pub index: PathBuf,
    pub sections: Option<PathBuf>,
    pub content: PathBuf,
}

impl DictionaryPaths {
    /// Resolves `<base>.idx`, `<base>.idxidx` (when present) and the content file,
    /// preferring `<base>.dict.dz` over `<base>.dict`.
    pub fn from_base(base: impl AsRef<Path>) -> DictionaryPaths {
        let base = base.as_ref();
        let sections = with_extension(base, SECTION_INDEX_EXTENSION);
        let dictzip = with_extension(base, DICTZIP_EXTENSION);
        DictionaryPaths {
            index: with_extension(base, INDEX_EXTENSION),
            sections: sections.exists().then_some(sections),
            content: if dictzip.exists() {
                dictzip
            } else {
                with_extension(base, CONTENT_EXTENSION)
            },
        }
    }
}

/// Appends `.ext` to the full file name of `base`; `Path::with_extension` would
/// replace a dotted suffix such as the `-gb` in `oxford.en-gb`.
fn with_extension(base: &Path, ext: &str) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

#[derive(Debug, Clone, Default)]
pub struct DictionaryOptions {
    pub codec: RecordCodecOptions,
    pub lookup: LookupOptions,
}

/// An opened dictionary: primary index, optional section index and content.
pub struct Dictionary {
    primary: PrimaryIndex,
    sections: Option<SectionIndex>,
    content: Arc<dyn ContentSource>,
    options: DictionaryOptions,
}

impl Dictionary {
    pub fn open(paths: &DictionaryPaths) -> Result<Dictionary> {
        Self::open_with_options(paths, DictionaryOptions::default())
    }

    pub fn open_with_options(
        paths: &DictionaryPaths,
        options: DictionaryOptions,
    ) -> Result<Dictionary> {
        let primary = PrimaryIndex::open_with_options(&paths.index, options.codec.clone())?;
        let sections = paths
            .sections
            .as_ref()
            .map(|path| {
                SectionIndex::load(path).map(|s| s.with_options(options.lookup.clone()))
            })
            .transpose()?;
        if sections.is_none() {
            log::info!(
                "{}: no section index, lookups scan the whole index",
                paths.index.display()
            );
        }
        let content = open_content(&paths.content)?;
        Ok(Self::new(primary, sections, content, options))
    }

    pub fn new(
        primary: PrimaryIndex,
        sections: Option<SectionIndex>,
        content: Arc<dyn ContentSource>,
        options: DictionaryOptions,
    ) -> Dictionary {
        Dictionary {
            primary,
            sections,
            content,
            options,
        }
    }

    pub fn primary(&self) -> &PrimaryIndex {
        &self.primary
    }

    pub fn sections(&self) -> Option<&SectionIndex> {
        self.sections.as_ref()
    }

    pub fn content(&self) -> &Arc<dyn ContentSource> {
        &self.content
    }

    /// Finds the index record of `key`.
    pub fn find(&self, key: &[u8]) -> Result<Option<IndexRecord>> {
        match &self.sections {
            Some(sections) => sections.find(&self.primary, key),
            None => self.find_linear(key),
        }
    }

    /// Looks `key` up and returns its content.
    pub fn lookup(&self, key: &[u8]) -> Result<Option<Bytes>> {
        let Some(record) = self.find(key)? else {
            return Ok(None);
        };
        self.content
            .read_content(record.offset, record.length)
            .map(Some)
    }

    fn find_linear(&self, key: &[u8]) -> Result<Option<IndexRecord>> {
        let key_match = self.options.lookup.key_match;
        for entry in self.primary.scan() {
            let entry = entry?;
            if key_match.matches(&entry.record.key, key) {
                return Ok(Some(entry.record));
            }
        }
        Ok(None)
    }
}

/// Opens a content file, choosing dictzip or flat access from its leading bytes.
pub fn open_content(path: impl AsRef<Path>) -> Result<Arc<dyn ContentSource>> {
    let path = path.as_ref();
    let reader: Arc<dyn ReadAt> = Arc::new(
        FileReader::open(path)
            .map_err(|e| Error::io(format!("open content {}", path.display()), e))?,
    );
    let magic = reader
        .read_at(0..2)
        .map_err(|e| Error::io("read content magic", e))?;
    if is_gzip(&magic) {
        log::debug!("{}: dictzip content", path.display());
        Ok(Arc::new(DictzipContent::new(DictzipReader::from_reader(
            reader,
        )?)))
    } else {
        Ok(Arc::new(FlatContent::new(reader)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_from_base() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("oxford.en-gb");

        let paths = DictionaryPaths::from_base(&base);
        assert_eq!(paths.index, dir.path().join("oxford.en-gb.idx"));
        assert_eq!(paths.sections, None);
        assert_eq!(paths.content, dir.path().join("oxford.en-gb.dict"));

        std::fs::write(dir.path().join("oxford.en-gb.idxidx"), b"").unwrap();
        std::fs::write(dir.path().join("oxford.en-gb.dict.dz"), b"").unwrap();
        let paths = DictionaryPaths::from_base(&base);
        assert_eq!(
            paths.sections,
            Some(dir.path().join("oxford.en-gb.idxidx"))
        );
        assert_eq!(paths.content, dir.path().join("oxford.en-gb.dict.dz"));
    }
}
