//! # dictidx: prefix-sectioned dictionary lookup
//!
//! A dictionary is a content blob (plain or dictzip-compressed) plus a primary index
//! mapping every headword to a byte range of that blob. An optional section index
//! groups the primary index by short folded key prefixes, bounding the work of a
//! lookup to one section instead of the whole index.
//!
//! ## Module Organization
//!
//! * [`common`] - Error type and result helpers
//! * [`io`] - Positional readers, sealing writers and content sources
//! * [`index`] - Record codec, primary index, section index, dictionary builder
//! * [`dictzip`] - Random access gzip containers
//! * [`dictionary`] - Opening a dictionary from its files and looking words up

pub mod dictionary;

pub use dictidx_common as common;
pub use dictidx_dictzip as dictzip;
pub use dictidx_index as index;
pub use dictidx_io as io;

pub use dictionary::{Dictionary, DictionaryOptions, DictionaryPaths, open_content};
