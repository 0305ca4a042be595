//! 2-bit nucleotide encoding shared by every component of the crate.
//!
//! The layout below is a compatibility contract: frequency lookups and
//! signature comparisons only agree when both sides pack bases identically.
//!
//! - Base codes: `A = 00`, `C = 01`, `G = 10`, `T = 11` (case-insensitive input).
//! - Packed words: 31 bases per `u64`, base `j` at bits `63 - 2j ..= 62 - 2j`.
//!   The two lowest bits and any unused trailing slots are always zero.
//! - K-mers: right-aligned integers of exactly `2k` bits with the first base
//!   in the most significant slot, so numeric order is lexicographic order.

mod kmer;
mod packed;

pub use kmer::{canonical, decode_kmer, encode_kmer, kmer_mask, reverse_complement};
pub use packed::{Codes, PackedSequence};

use thiserror::Error;

/// Bits used to encode a single base.
pub const BITS_PER_BASE: usize = 2;
/// Width of a packed storage word.
pub const WORD_BITS: usize = 64;
/// Number of bases held by one packed word (the high 62 bits are used).
pub const BASES_PER_WORD: usize = (WORD_BITS - BITS_PER_BASE) / BITS_PER_BASE;
/// Largest supported k-mer length.
pub const MAX_K: usize = BASES_PER_WORD;

/// Errors raised while encoding nucleotide text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// Byte outside the strict `ACGT` alphabet.
    #[error("unsupported nucleotide {base:?} at position {position}")]
    InvalidBase {
        /// Offending character.
        base: char,
        /// Position of the character in the input.
        position: usize,
    },

    /// Input longer than a single k-mer register can hold.
    #[error("k-mer of length {len} exceeds the maximum of {max} bases")]
    KmerTooLong {
        /// Length of the rejected input.
        len: usize,
        /// Maximum supported length.
        max: usize,
    },

    /// Packed words do not match the declared base count.
    #[error("{words} packed words cannot hold exactly {len} bases")]
    WordCount {
        /// Declared number of bases.
        len: usize,
        /// Number of words supplied.
        words: usize,
    },

    /// Unused bits of a packed word were not zero.
    #[error("packed word {word} has non-zero padding bits")]
    DirtyPadding {
        /// Index of the offending word.
        word: usize,
    },
}

/// Map an ASCII base to its 2-bit code.
#[inline]
pub const fn encode_base(base: u8) -> Option<u8> {
    match base {
        b'A' | b'a' => Some(0b00),
        b'C' | b'c' => Some(0b01),
        b'G' | b'g' => Some(0b10),
        b'T' | b't' => Some(0b11),
        _ => None,
    }
}

/// Map a 2-bit code back to its uppercase ASCII base.
#[inline]
pub const fn decode_base(code: u8) -> u8 {
    match code & 0b11 {
        0b00 => b'A',
        0b01 => b'C',
        0b10 => b'G',
        _ => b'T',
    }
}

/// Pack nucleotide text into 31-base words.
pub fn encode(text: &[u8]) -> Result<Vec<u64>, EncodingError> {
    let mut words = vec![0u64; words_for_len(text.len())];
    for (idx, &base) in text.iter().enumerate() {
        let code = encode_base(base).ok_or(EncodingError::InvalidBase {
            base: base as char,
            position: idx,
        })?;
        let (word_idx, shift) = word_position(idx);
        words[word_idx] |= (code as u64) << shift;
    }
    Ok(words)
}

/// Decode the first `base_count` bases of a single packed word.
///
/// Counts above [`BASES_PER_WORD`] are clamped to one word's capacity.
pub fn decode(word: u64, base_count: usize) -> String {
    let count = base_count.min(BASES_PER_WORD);
    (0..count)
        .map(|slot| {
            let shift = slot_shift(slot);
            decode_base(((word >> shift) & 0b11) as u8) as char
        })
        .collect()
}

/// Decode `len` bases spread over consecutive packed words.
pub fn decode_words(words: &[u64], len: usize) -> String {
    let mut out = String::with_capacity(len);
    let mut remaining = len;
    for &word in words {
        if remaining == 0 {
            break;
        }
        let take = remaining.min(BASES_PER_WORD);
        out.push_str(&decode(word, take));
        remaining -= take;
    }
    out
}

pub(crate) fn words_for_len(len: usize) -> usize {
    len.div_ceil(BASES_PER_WORD)
}

/// Word index and bit shift of base `idx` within a packed sequence.
#[inline]
pub(crate) fn word_position(idx: usize) -> (usize, usize) {
    (idx / BASES_PER_WORD, slot_shift(idx % BASES_PER_WORD))
}

#[inline]
fn slot_shift(slot: usize) -> usize {
    WORD_BITS - BITS_PER_BASE * (slot + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_codes_follow_documented_mapping() {
        assert_eq!(encode_base(b'A'), Some(0));
        assert_eq!(encode_base(b'c'), Some(1));
        assert_eq!(encode_base(b'G'), Some(2));
        assert_eq!(encode_base(b't'), Some(3));
        assert_eq!(encode_base(b'N'), None);
        assert_eq!(decode_base(0b10), b'G');
    }

    #[test]
    fn words_are_left_aligned_with_clean_padding() {
        let words = encode(b"CA").unwrap();
        assert_eq!(words, vec![0b01u64 << 62]);

        let full = encode(&[b'T'; 31]).unwrap();
        assert_eq!(full.len(), 1);
        assert_eq!(full[0] & 0b11, 0, "lowest two bits stay unused");
        assert_eq!(full[0] >> 2, (1u64 << 62) - 1);
    }

    #[test]
    fn long_text_spills_into_following_words() {
        let text: Vec<u8> = b"ACGT".iter().copied().cycle().take(70).collect();
        let words = encode(&text).unwrap();
        assert_eq!(words.len(), 3);
        assert_eq!(decode_words(&words, text.len()).as_bytes(), text.as_slice());
    }

    #[test]
    fn invalid_base_reports_position() {
        let err = encode(b"ACGNT").unwrap_err();
        assert_eq!(
            err,
            EncodingError::InvalidBase {
                base: 'N',
                position: 3
            }
        );
    }

    #[test]
    fn decode_clamps_to_word_capacity() {
        let words = encode(&[b'G'; 31]).unwrap();
        assert_eq!(decode(words[0], 40).len(), 31);
        assert_eq!(decode(words[0], 0), "");
    }
}
