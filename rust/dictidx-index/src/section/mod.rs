//! The section index: a sparse directory from folded key prefixes to byte ranges of
//! the primary index.
//!
//! A lookup folds the query, finds the section of its longest known prefix and scans
//! only that section of the primary index. Worst-case lookup cost is therefore bounded
//! by the largest section rather than by the size of the whole index, while the
//! directory itself stays small enough to keep fully in memory.
//!
//! On disk the section index uses the primary-index record layout: the folded prefix
//! takes the place of the key, and `(begin, end - begin)` the place of
//! `(offset, length)`.

use std::{collections::HashSet, ops::Range};

use crate::fold::FoldedKey;

pub mod builder;
pub mod lookup;

/// One section: the primary-index byte range holding every record with `prefix`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionEntry {
    pub prefix: Vec<u8>,
    pub begin: u64,
    pub end: u64,
}

impl SectionEntry {
    pub fn span(&self) -> u64 {
        self.end - self.begin
    }

    pub fn range(&self) -> Range<u64> {
        self.begin..self.end
    }
}

/// Three-character prefixes that are split one character further.
///
/// Common word stems ("con", "pro", "tra", ...) produce oversized sections in large
/// dictionaries; listing them here gives their keys four-character sections instead.
/// Entries are folded on insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AmbiguousPrefixes(HashSet<Vec<u8>>);

impl AmbiguousPrefixes {
    pub fn new<I, K>(prefixes: I) -> AmbiguousPrefixes
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        AmbiguousPrefixes(
            prefixes
                .into_iter()
                .map(|p| FoldedKey::new(p.as_ref()).into_bytes())
                .collect(),
        )
    }

    /// Stems tuned for the Oxford English-Chinese dictionary.
    pub fn oxford() -> AmbiguousPrefixes {
        Self::new(OXFORD_PREFIXES)
    }

    /// Stems tuned for the Langdao English-Chinese dictionary.
    pub fn langdao() -> AmbiguousPrefixes {
        Self::new(LANGDAO_PREFIXES)
    }

    /// Resolves a preset by dictionary name.
    pub fn preset(name: &str) -> Option<AmbiguousPrefixes> {
        match name {
            "oxford" | "oxford-gb" => Some(Self::oxford()),
            "langdao" | "langdao-ec-gb" => Some(Self::langdao()),
            "none" => Some(Self::default()),
            _ => None,
        }
    }

    /// Adds more prefixes, folding them like [`AmbiguousPrefixes::new`].
    pub fn extend<I, K>(&mut self, prefixes: I)
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        self.0.extend(
            prefixes
                .into_iter()
                .map(|p| FoldedKey::new(p.as_ref()).into_bytes()),
        );
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.0.iter().map(Vec::as_slice)
    }

    pub fn contains(&self, folded_prefix: &[u8]) -> bool {
        self.0.contains(folded_prefix)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Configuration of the section index layout.
#[derive(Debug, Clone)]
pub struct SectionIndexParams {
    /// Number of folded characters forming a section prefix, 1 to
    /// [`SectionIndexParams::MAX_PREFIX_CHARS`].
    pub prefix_chars: usize,
    /// Prefixes that are extended by one more character.
    pub ambiguous_prefixes: AmbiguousPrefixes,
}

impl SectionIndexParams {
    pub const MAX_PREFIX_CHARS: usize = 3;

    /// Length of the first prefix a lookup tries; sections are never longer.
    pub const LOOKUP_PREFIX_CHARS: usize = Self::MAX_PREFIX_CHARS + 1;

    pub fn with_ambiguous_prefixes(mut self, prefixes: AmbiguousPrefixes) -> Self {
        self.ambiguous_prefixes = prefixes;
        self
    }

    /// Computes the section prefix of `key`.
    ///
    /// Keys shorter than the prefix width contribute what they have; an ambiguous
    /// prefix is extended only when the key has a further character.
    pub fn section_prefix(&self, key: &[u8]) -> Vec<u8> {
        let folded = FoldedKey::leading(key, self.prefix_chars + 1);
        let prefix = folded.prefix(self.prefix_chars);
        if folded.char_count() > self.prefix_chars && self.ambiguous_prefixes.contains(prefix) {
            folded.prefix(self.prefix_chars + 1).to_vec()
        } else {
            prefix.to_vec()
        }
    }
}

impl Default for SectionIndexParams {
    fn default() -> Self {
        SectionIndexParams {
            prefix_chars: Self::MAX_PREFIX_CHARS,
            ambiguous_prefixes: AmbiguousPrefixes::default(),
        }
    }
}

const OXFORD_PREFIXES: &[&str] = &[
    "con", "dis", "the", "pro", "int", "com", "pre", "per", "tra", "sta",
];

const LANGDAO_PREFIXES: &[&str] = &[
    "con", "int", "pro", "com", "tra", "par", "sta", "dis", "per", "ant", "pre", "car", "ele",
    "met", "str", "tri", "pol", "for", "col", "pri", "sub", "res", "cor", "ind", "mul", "bac",
    "cha", "hyp", "be", "non", "the", "rec", "aut", "ext", "acc", "pla", "sup", "ste", "hyd",
    "art", "rad", "spe", "mon", "gra", "mic", "cal", "ins", "man", "pho", "uni", "pos", "iso",
    "fre", "ope", "gen", "act", "all", "in", "che", "sel", "mar", "inc", "dec", "exp", "app",
    "lin", "imp", "ret", "sec", "lig", "ben", "hem", "qua", "hea", "ove", "chr", "spi", "sto",
    "cap", "hig", "cat", "chl", "bro", "mag", "lea", "dia", "air", "inf", "bas", "cou", "cas",
    "cho", "cer", "thr", "syn", "ven", "sin", "thi", "sal", "gas", "fin", "rea", "reg", "inv",
    "ter", "mus", "eth", "des", "ser", "sem", "ass", "cen", "end", "phe", "clo", "sch", "und",
    "flo", "sod", "cro", "to", "sul", "liq", "min", "rel", "bar", "neu", "dir", "mat", "ace",
    "ver", "ang", "epi", "sho", "bra", "chi", "out", "gro", "dou", "ana", "pse", "tel", "rep",
    "fun", "wor", "cla", "bla", "abs", "pot", "exc", "def", "mac", "tet", "mer", "dep", "hav",
    "equ", "bal", "flu", "nat", "pul", "pen", "fla", "off", "ref", "fil", "cur", "cri", "fac",
    "sol", "can", "low", "har", "mak", "mal", "aci", "bri", "opt", "cos", "ent", "dip", "rat",
    "pha", "bur", "spa", "med", "blo", "dif", "nor", "sca", "bre", "del", "hom", "oil", "mor",
    "tak", "red", "wat", "sim", "cir", "cre", "rev", "not", "lon", "lan", "loc", "den", "mas",
    "mes", "sur", "cyc", "fir", "sha", "mai", "cry", "pyr", "sil", "tub", "fra", "cel", "mol",
    "nit", "vol", "fer", "mod", "cle", "qui", "sym", "ban", "wit", "der", "dat", "ple", "lat",
    "cop", "but", "hol", "her", "het", "spo", "cra", "law", "rig", "val", "leg", "bil", "nuc",
    "tim", "phy", "pan", "sen", "add", "por", "hal", "tur", "amm", "hor", "put", "pat", "pur",
    "han", "alu", "net", "ful", "lim", "ner", "bea", "shi", "lab", "fas", "alk", "men", "gly",
    "mec", "lym", "mil", "amp", "lit", "ram", "mem", "sti", "mis", "dig", "hex", "coa", "gal",
    "pas", "die", "fib", "tem", "alt", "pac", "glo", "num", "eff", "ost", "on", "ten", "gla",
    "pal",
];
