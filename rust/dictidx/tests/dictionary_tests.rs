use dictidx::{
    Dictionary, DictionaryPaths,
    dictzip::{DictzipWriter, DictzipWriterParams},
    index::{
        AmbiguousPrefixes, DictionaryInfo, DictionaryWriter, PrimaryIndex, SectionIndexBuilder,
        SectionIndexParams,
    },
};

const ENTRIES: &[(&str, &str)] = &[
    ("cat", "<b>cat</b> a small domesticated feline"),
    ("car", "<b>car</b> a road vehicle"),
    ("concert", "<b>concert</b> a musical performance"),
    ("convey", "<b>convey</b> to transport or carry"),
    ("dog", "<b>dog</b> a domesticated canine"),
    ("Éclair", "<b>éclair</b> a pastry"),
    ("札记", "reading notes"),
];

fn build(dir: &std::path::Path, compress: bool, sections: bool) -> DictionaryPaths {
    let base = dir.join("sample");
    let paths = DictionaryPaths::from_base(&base);

    let params =
        SectionIndexParams::default().with_ambiguous_prefixes(AmbiguousPrefixes::oxford());

    let mut writer = DictionaryWriter::create(&paths.index, &paths.content).unwrap();
    writer
        .add_entries_sorted(
            ENTRIES.iter().map(|(k, v)| (k.as_bytes(), v.as_bytes())),
            &params,
        )
        .unwrap();
    let summary = writer.finish().unwrap();
    DictionaryInfo::new("Sample", &summary)
        .write(dir.join("sample.ifo"))
        .unwrap();

    if compress {
        let data = std::fs::read(&paths.content).unwrap();
        let mut dz = DictzipWriter::create(
            dir.join("sample.dict.dz"),
            DictzipWriterParams {
                chunk_length: 64,
                ..Default::default()
            },
        )
        .unwrap();
        dz.write_all(&data).unwrap();
        dz.finish().unwrap();
        std::fs::remove_file(&paths.content).unwrap();
    }
    if sections {
        let primary = PrimaryIndex::open(&paths.index).unwrap();
        SectionIndexBuilder::new(params)
            .unwrap()
            .build_file(&primary, dir.join("sample.idxidx"))
            .unwrap();
    }
    DictionaryPaths::from_base(&base)
}

fn check_all(dictionary: &Dictionary) {
    for (key, content) in ENTRIES {
        let found = dictionary.lookup(key.as_bytes()).unwrap().unwrap();
        assert_eq!(found.as_ref(), content.as_bytes(), "lookup of '{key}'");
    }
    assert!(dictionary.lookup(b"cow").unwrap().is_none());
    assert!(dictionary.lookup(b"conc").unwrap().is_none());
    assert!(dictionary.lookup(b"").unwrap().is_none());
}

#[test]
fn test_flat_dictionary_with_sections() {
    let dir = tempfile::tempdir().unwrap();
    let paths = build(dir.path(), false, true);
    assert!(paths.sections.is_some());
    let dictionary = Dictionary::open(&paths).unwrap();
    assert_eq!(dictionary.sections().unwrap().get(b"conc"), Some(24..40));
    check_all(&dictionary);

    let info = DictionaryInfo::load(dir.path().join("sample.ifo")).unwrap();
    assert_eq!(info.wordcount, ENTRIES.len() as u64);
    assert_eq!(info.idxfilesize, dictionary.primary().size());
}

#[test]
fn test_dictzip_dictionary_with_sections() {
    let dir = tempfile::tempdir().unwrap();
    let paths = build(dir.path(), true, true);
    assert!(paths.content.to_string_lossy().ends_with(".dict.dz"));
    check_all(&Dictionary::open(&paths).unwrap());
}

#[test]
fn test_dictionary_without_sections() {
    let dir = tempfile::tempdir().unwrap();
    let paths = build(dir.path(), true, false);
    assert!(paths.sections.is_none());
    check_all(&Dictionary::open(&paths).unwrap());
}
