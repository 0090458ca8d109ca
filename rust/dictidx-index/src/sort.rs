//! Prefix-sorted copy of a primary index.

use std::path::Path;

use dictidx_common::Result;

use crate::{
    fold::fold_key,
    primary::{PrimaryIndex, PrimaryIndexSummary, PrimaryIndexWriter},
    record::IndexRecord,
    section::SectionIndexParams,
};

/// Rewrites `source` into `dest` ordered by section prefix, then by folded key.
///
/// The sort is stable: records whose keys fold to the same bytes (including exact
/// duplicates) keep their relative order, so "first match wins" lookups return the
/// same record before and after sorting. The output satisfies the grouping
/// precondition of [`crate::section::builder::SectionIndexBuilder`] for `params`.
///
/// All records are held in memory while sorting.
pub fn sort_primary_index(
    source: &PrimaryIndex,
    params: &SectionIndexParams,
    mut dest: PrimaryIndexWriter,
) -> Result<PrimaryIndexSummary> {
    let mut records = source
        .scan()
        .map(|entry| entry.map(|e| e.record))
        .collect::<Result<Vec<_>>>()?;
    sort_records(&mut records, params);

    for record in &records {
        dest.append_record(record)?;
    }
    let summary = dest.finish()?;
    log::debug!(
        "sorted {} records ({} bytes) by section prefix",
        summary.records,
        summary.size
    );
    Ok(summary)
}

/// File-to-file variant of [`sort_primary_index`]. `dest` is truncated.
pub fn sort_primary_index_file(
    source: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    params: &SectionIndexParams,
) -> Result<PrimaryIndexSummary> {
    let source = PrimaryIndex::open(source)?;
    let writer = PrimaryIndexWriter::create_with_options(dest, source.options().clone())?;
    sort_primary_index(&source, params, writer)
}

/// Sorts records in memory with the same ordering as [`sort_primary_index`].
pub fn sort_records(records: &mut [IndexRecord], params: &SectionIndexParams) {
    records.sort_by_cached_key(|r| section_order(params, &r.key));
}

/// Sort key that keeps every section contiguous: section prefix, then folded key.
pub(crate) fn section_order(params: &SectionIndexParams, key: &[u8]) -> (Vec<u8>, Vec<u8>) {
    (params.section_prefix(key), fold_key(key))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{record::encode_record, section::builder::SectionIndexBuilder};

    fn primary(records: &[IndexRecord]) -> PrimaryIndex {
        let mut bytes = Vec::new();
        for r in records {
            encode_record(&r.key, r.offset, r.length, &Default::default(), &mut bytes).unwrap();
        }
        PrimaryIndex::from_reader(Arc::new(bytes), Default::default()).unwrap()
    }

    #[test]
    fn test_sorted_copy_is_grouped() {
        let params = SectionIndexParams {
            prefix_chars: 2,
            ..Default::default()
        };
        let source = primary(&[
            IndexRecord::new("cat", 0, 120),
            IndexRecord::new("dog", 200, 50),
            IndexRecord::new("car", 120, 80),
        ]);
        let builder = SectionIndexBuilder::new(params.clone()).unwrap();
        assert!(builder.build(&source).is_err());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sorted.idx");
        let summary =
            sort_primary_index(&source, &params, PrimaryIndexWriter::create(&path).unwrap())
                .unwrap();
        assert_eq!(summary.records, 3);
        assert_eq!(summary.size, source.size());

        let sorted = PrimaryIndex::open(&path).unwrap();
        let keys = sorted
            .scan()
            .map(|e| e.unwrap().record.key)
            .collect::<Vec<_>>();
        assert_eq!(keys, vec![b"car".to_vec(), b"cat".to_vec(), b"dog".to_vec()]);
        assert_eq!(builder.build(&sorted).unwrap().len(), 2);
    }

    #[test]
    fn test_sort_is_stable_for_equal_folded_keys() {
        let mut records = vec![
            IndexRecord::new("Bank", 0, 1),
            IndexRecord::new("apple", 1, 1),
            IndexRecord::new("bank", 2, 1),
            IndexRecord::new("BANK", 3, 1),
        ];
        sort_records(&mut records, &SectionIndexParams::default());
        let offsets = records.iter().map(|r| r.offset).collect::<Vec<_>>();
        assert_eq!(offsets, vec![1, 0, 2, 3]);
    }
}
