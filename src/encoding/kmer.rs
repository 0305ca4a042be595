use super::{decode_base, encode_base, EncodingError, BITS_PER_BASE, MAX_K};

/// Mask selecting the low `2k` bits of a k-mer register.
#[inline]
pub const fn kmer_mask(k: usize) -> u64 {
    if k * BITS_PER_BASE >= 64 {
        u64::MAX
    } else {
        (1u64 << (k * BITS_PER_BASE)) - 1
    }
}

/// Pack up to [`MAX_K`] bases into a right-aligned k-mer value.
pub fn encode_kmer(text: &[u8]) -> Result<u64, EncodingError> {
    if text.len() > MAX_K {
        return Err(EncodingError::KmerTooLong {
            len: text.len(),
            max: MAX_K,
        });
    }
    text.iter().enumerate().try_fold(0u64, |acc, (idx, &base)| {
        let code = encode_base(base).ok_or(EncodingError::InvalidBase {
            base: base as char,
            position: idx,
        })?;
        Ok((acc << BITS_PER_BASE) | code as u64)
    })
}

/// Decode a right-aligned k-mer value of length `k`.
pub fn decode_kmer(kmer: u64, k: usize) -> String {
    (0..k)
        .rev()
        .map(|slot| decode_base(((kmer >> (slot * BITS_PER_BASE)) & 0b11) as u8) as char)
        .collect()
}

/// Reverse complement of a k-mer value.
pub fn reverse_complement(kmer: u64, k: usize) -> u64 {
    let mut forward = kmer;
    let mut reversed = 0u64;
    for _ in 0..k {
        reversed = (reversed << BITS_PER_BASE) | ((forward & 0b11) ^ 0b11);
        forward >>= BITS_PER_BASE;
    }
    reversed
}

/// Smaller of a k-mer and its reverse complement.
pub fn canonical(kmer: u64, k: usize) -> u64 {
    kmer.min(reverse_complement(kmer, k))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kmer_values_order_lexicographically() {
        let aac = encode_kmer(b"AAC").unwrap();
        let aca = encode_kmer(b"ACA").unwrap();
        let tga = encode_kmer(b"TGA").unwrap();
        assert_eq!(aac, 0b00_00_01);
        assert_eq!(tga, 0b11_10_00);
        assert!(aac < aca && aca < tga);
        assert_eq!(decode_kmer(tga, 3), "TGA");
    }

    #[test]
    fn reverse_complement_matches_text() {
        let kmer = encode_kmer(b"ACCGT").unwrap();
        let rc = reverse_complement(kmer, 5);
        assert_eq!(decode_kmer(rc, 5), "ACGGT");
        assert_eq!(reverse_complement(rc, 5), kmer);
        assert_eq!(canonical(kmer, 5), kmer.min(rc));
    }

    #[test]
    fn widest_kmer_fits_register() {
        let text = [b'T'; MAX_K];
        let kmer = encode_kmer(&text).unwrap();
        assert_eq!(kmer, kmer_mask(MAX_K));
        assert!(encode_kmer(&[b'A'; MAX_K + 1]).is_err());
    }
}
