use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{
    decode_base, encode_base, word_position, words_for_len, EncodingError, BASES_PER_WORD,
};

/// Nucleotide sequence packed 31 bases per `u64`.
///
/// Sequences longer than one word continue in the next word, so a node of any
/// length is a single `PackedSequence`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PackedSequence {
    words: Vec<u64>,
    len: usize,
}

impl PackedSequence {
    /// Empty sequence (used for deletion placeholders).
    pub fn new() -> Self {
        Self::default()
    }

    /// Pack ASCII nucleotide text.
    pub fn from_ascii(text: &[u8]) -> Result<Self, EncodingError> {
        Ok(Self {
            words: super::encode(text)?,
            len: text.len(),
        })
    }

    /// Adopt words produced by an external packer.
    ///
    /// The word count must match `len` exactly and every unused bit must be zero.
    pub fn from_packed(words: Vec<u64>, len: usize) -> Result<Self, EncodingError> {
        if words.len() != words_for_len(len) {
            return Err(EncodingError::WordCount {
                len,
                words: words.len(),
            });
        }
        for (idx, &word) in words.iter().enumerate() {
            let used = if idx + 1 == words.len() && len % BASES_PER_WORD != 0 {
                len % BASES_PER_WORD
            } else {
                BASES_PER_WORD
            };
            let padding_mask = (1u64 << (64 - 2 * used)) - 1;
            if word & padding_mask != 0 {
                return Err(EncodingError::DirtyPadding { word: idx });
            }
        }
        Ok(Self { words, len })
    }

    /// Number of bases.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` when the sequence holds no bases.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Underlying packed words.
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// 2-bit code of base `idx`.
    pub fn code_at(&self, idx: usize) -> Option<u8> {
        if idx >= self.len {
            return None;
        }
        let (word_idx, shift) = word_position(idx);
        Some(((self.words[word_idx] >> shift) & 0b11) as u8)
    }

    /// Uppercase ASCII base at `idx`.
    pub fn base_at(&self, idx: usize) -> Option<u8> {
        self.code_at(idx).map(decode_base)
    }

    /// Iterate over the 2-bit codes in sequence order, word by word.
    pub fn codes(&self) -> Codes<'_> {
        Codes {
            words: &self.words,
            len: self.len,
            index: 0,
        }
    }

    /// Append a single 2-bit code.
    pub fn push_code(&mut self, code: u8) {
        let (word_idx, shift) = word_position(self.len);
        if word_idx >= self.words.len() {
            self.words.push(0);
        }
        self.words[word_idx] |= ((code & 0b11) as u64) << shift;
        self.len += 1;
    }

    /// Append an ASCII base.
    pub fn push(&mut self, base: u8) -> Result<(), EncodingError> {
        let code = encode_base(base).ok_or(EncodingError::InvalidBase {
            base: base as char,
            position: self.len,
        })?;
        self.push_code(code);
        Ok(())
    }

    /// Append every base of `other`.
    pub fn extend_from(&mut self, other: &PackedSequence) {
        self.words.reserve(words_for_len(self.len + other.len) - self.words.len());
        for code in other.codes() {
            self.push_code(code);
        }
    }

    /// Decode into uppercase ASCII.
    pub fn to_vec(&self) -> Vec<u8> {
        self.codes().map(decode_base).collect()
    }
}

impl fmt::Display for PackedSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let decoded = self.to_vec();
        write!(f, "{}", String::from_utf8_lossy(&decoded))
    }
}

/// Iterator over the 2-bit codes of a [`PackedSequence`].
#[derive(Debug, Clone)]
pub struct Codes<'a> {
    words: &'a [u64],
    len: usize,
    index: usize,
}

impl Iterator for Codes<'_> {
    type Item = u8;

    #[inline]
    fn next(&mut self) -> Option<u8> {
        if self.index >= self.len {
            return None;
        }
        let (word_idx, shift) = word_position(self.index);
        self.index += 1;
        Some(((self.words[word_idx] >> shift) & 0b11) as u8)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Codes<'_> {}
