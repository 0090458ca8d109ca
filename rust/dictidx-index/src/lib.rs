//! Two-level dictionary index.
//!
//! - [`primary`]: the flat primary index of `key -> (offset, length)` records.
//! - [`section`]: the sparse section index over key prefixes, and the bounded lookup
//!   that scans one section of the primary index per query.
//! - [`writer`], [`sort`], [`info`]: building a dictionary and its companion files.

pub mod fold;
pub mod info;
pub mod primary;
pub mod record;
pub mod section;
pub mod sort;
pub mod writer;

pub use fold::{FoldedKey, fold_key};
pub use info::DictionaryInfo;
pub use primary::{IndexEntry, PrimaryIndex, PrimaryIndexSummary, PrimaryIndexWriter};
pub use record::{IndexRecord, RecordCodecOptions};
pub use section::{
    AmbiguousPrefixes, SectionEntry, SectionIndexParams,
    builder::{SectionIndexBuilder, SectionIndexSummary},
    lookup::{KeyMatch, LookupOptions, SectionIndex, SectionMatch, SectionStats},
};
pub use sort::{sort_primary_index, sort_primary_index_file};
pub use writer::{DictionarySummary, DictionaryWriter};
