//! # varsig: k-mer indexing and variant signatures over sequence graphs
//!
//! This library enumerates fixed-length k-mers over a pangenome sequence graph
//! and derives, per variant, the k-mers that tell the reference allele apart
//! from the alternate allele.
//!
//! ## Components
//!
//! 1. **Encoding**: 2 bits per base, 31 bases per `u64` word ([`encoding`])
//! 2. **Graph**: immutable nodes with packed sequence, edges and reference flags ([`graph`])
//! 3. **Enumeration**: explicit-stack walk bounded by `k - 1` bases and a
//!    cap on non-reference nodes per path ([`enumerate`])
//! 4. **Frequency index**: exact, saturating k-mer counts ([`frequency`])
//! 5. **Signatures**: per-variant distinguishing windows ([`signature`])
//!
//! ## Usage Example
//!
//! ```
//! use varsig::{build_graph, find_variant_signatures, KmerConfig, SignatureOptions};
//!
//! let graph = build_graph(
//!     &["ACTG", "A", "G", "CCCC"],
//!     &[vec![1, 2], vec![3], vec![3]],
//!     Some(&[0, 1, 3]),
//! )?;
//! let config = KmerConfig::new(3, 1)?;
//! let batch = find_variant_signatures(&graph, &[1], &[2], config, None, SignatureOptions::default())?;
//! let (reference, alternate) = batch.results()[0].as_ref().unwrap().decode(3);
//! assert_eq!(reference, vec!["TGA"]);
//! assert_eq!(alternate, vec!["TGG"]);
//! # Ok::<(), varsig::Error>(())
//! ```

#![warn(missing_docs, missing_debug_implementations)]

pub mod config;
pub mod encoding;
pub mod enumerate;
pub mod frequency;
pub mod graph;
pub mod index;
pub mod signature;
/// Python bindings for exposing varsig components to external runtimes.
#[cfg(feature = "python-bindings")]
pub mod python_bindings;

// Re-exports for convenience
pub use config::{Attribution, ConfigError, KmerConfig};
pub use encoding::{
    decode, decode_kmer, encode, encode_kmer, reverse_complement, EncodingError, PackedSequence,
    MAX_K,
};
pub use enumerate::{enumerate_kmers, KmerEnumerator, KmerRecord, KmerSink, NodeHit};
pub use frequency::{build_frequency_index, FrequencyIndex};
pub use graph::{build_graph, Compaction, GraphBuilder, GraphError, NodeId, SequenceGraph};
pub use index::{create_kmer_index, KmerIndex};
pub use signature::{
    find_variant_signatures, OverlapLedger, RankedSelection, RarityPolicy, SelectionStrategy,
    SignatureBatch, SignatureError, SignatureOptions, SignatureWindow, TieBreak, Variant,
    VariantSignature, VariantSignatureFinder,
};

use thiserror::Error;

/// Any error raised by this crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed nucleotide input.
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// Invalid parameters.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Graph integrity violation.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Signature search failure.
    #[error(transparent)]
    Signature(#[from] SignatureError),
}

/// Convenience alias for results carrying [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;
