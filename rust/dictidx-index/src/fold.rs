//! Key folding: the canonical form used to compare key prefixes.
//!
//! Builder and lookup must fold identically, otherwise a query lands in the wrong
//! section. Folding lowercases alphabetic characters and keeps every other character
//! as-is. Valid UTF-8 sequences are folded per Unicode scalar value; every byte of an
//! invalid sequence counts as one character of its own and is kept unchanged. The
//! decision is local, so a stray byte late in a key never changes how its prefix folds.

/// Prefix assigned to the empty key. A lone `0xFF` byte is never valid UTF-8, so
/// no UTF-8 key folds to it.
pub const EMPTY_KEY_PREFIX: &[u8] = &[0xFF];

/// A folded key (or folded leading part of a key), split into characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldedKey {
    bytes: Vec<u8>,
    /// End offset in `bytes` of every character.
    boundaries: Vec<usize>,
}

impl FoldedKey {
    /// Folds the whole key.
    pub fn new(key: &[u8]) -> FoldedKey {
        Self::leading(key, usize::MAX)
    }

    /// Folds at most the first `max_chars` characters of the key.
    pub fn leading(key: &[u8], max_chars: usize) -> FoldedKey {
        let mut bytes = Vec::with_capacity(key.len().min(max_chars.saturating_mul(4)));
        let mut boundaries = Vec::new();
        let mut buf = [0u8; 4];
        'chunks: for chunk in key.utf8_chunks() {
            for c in chunk.valid().chars() {
                if boundaries.len() == max_chars {
                    break 'chunks;
                }
                bytes.extend_from_slice(fold_char(c).encode_utf8(&mut buf).as_bytes());
                boundaries.push(bytes.len());
            }
            for &b in chunk.invalid() {
                if boundaries.len() == max_chars {
                    break 'chunks;
                }
                bytes.push(b);
                boundaries.push(bytes.len());
            }
        }
        FoldedKey { bytes, boundaries }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Number of folded characters.
    pub fn char_count(&self) -> usize {
        self.boundaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }

    /// The first `chars` folded characters (at least one, at most all of them).
    /// The empty key yields [`EMPTY_KEY_PREFIX`].
    pub fn prefix(&self, chars: usize) -> &[u8] {
        if self.boundaries.is_empty() {
            return EMPTY_KEY_PREFIX;
        }
        let chars = chars.clamp(1, self.boundaries.len());
        &self.bytes[..self.boundaries[chars - 1]]
    }
}

/// Folds the whole key into a new byte string.
pub fn fold_key(key: &[u8]) -> Vec<u8> {
    FoldedKey::new(key).into_bytes()
}

/// Returns `true` when two keys are equal after folding.
pub fn keys_equal_folded(left: &[u8], right: &[u8]) -> bool {
    left == right || FoldedKey::new(left) == FoldedKey::new(right)
}

/// Lowercases an alphabetic character, ignoring mappings that expand into several
/// characters (such as 'İ'), which would change the character count of the prefix.
fn fold_char(c: char) -> char {
    if !c.is_alphabetic() {
        return c;
    }
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_folding() {
        let key = FoldedKey::new(b"Cat-Walk");
        assert_eq!(key.as_bytes(), b"cat-walk");
        assert_eq!(key.char_count(), 8);
        assert_eq!(key.prefix(3), b"cat");
        assert_eq!(key.prefix(0), b"c");
        assert_eq!(key.prefix(100), b"cat-walk");
    }

    #[test]
    fn test_non_alphabetic_preserved() {
        assert_eq!(fold_key(b"3D-Print"), b"3d-print");
        assert_eq!(fold_key("¿Qué?".as_bytes()), "¿qué?".as_bytes());
    }

    #[test]
    fn test_unicode_prefix_is_per_character() {
        let key = FoldedKey::leading("Éclair".as_bytes(), 4);
        assert_eq!(key.char_count(), 4);
        assert_eq!(key.prefix(1), "é".as_bytes());
        assert_eq!(key.prefix(2), "éc".as_bytes());

        let key = FoldedKey::new("札记".as_bytes());
        assert_eq!(key.char_count(), 2);
        assert_eq!(key.prefix(1), "札".as_bytes());
    }

    #[test]
    fn test_invalid_utf8_falls_back_to_bytes() {
        let key = FoldedKey::new(b"AB\xff\xfeZ");
        assert_eq!(key.as_bytes(), b"ab\xff\xfez");
        assert_eq!(key.prefix(3), b"ab\xff");
    }

    #[test]
    fn test_invalid_tail_keeps_utf8_prefix() {
        let key = FoldedKey::new(b"AB\xc3\x89\x80");
        assert_eq!(key.char_count(), 4);
        assert_eq!(key.prefix(3), "abé".as_bytes());
        assert_eq!(key.as_bytes(), b"ab\xc3\xa9\x80");

        // A truncated sequence folds byte by byte.
        let key = FoldedKey::leading(b"Ab\xc3", 3);
        assert_eq!(key.as_bytes(), b"ab\xc3");
        assert_eq!(key.char_count(), 3);
    }

    #[test]
    fn test_empty_key() {
        let key = FoldedKey::new(b"");
        assert!(key.is_empty());
        assert_eq!(key.prefix(3), EMPTY_KEY_PREFIX);
    }

    #[test]
    fn test_keys_equal_folded() {
        assert!(keys_equal_folded(b"Apple", b"aPPLE"));
        assert!(!keys_equal_folded(b"apple", b"apples"));
    }
}
