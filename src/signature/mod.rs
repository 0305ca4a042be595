//! Variant signatures: k-mers that tell a reference allele from its alternate.
//!
//! For each allele node, every window overlapping the node is enumerated
//! (including windows that start upstream) and grouped by its offset from the
//! node. A window qualifies when none of its k-mers occur around the opposite
//! allele and, given a [`FrequencyIndex`](crate::FrequencyIndex), when they are
//! rare genome-wide. One qualifying window per allele becomes the signature.

mod finder;
mod selection;
mod windows;

pub use finder::{find_variant_signatures, VariantSignatureFinder};
pub use selection::{OverlapLedger, RankedSelection, SelectionStrategy, TieBreak};
pub use windows::{RarityPolicy, SignatureWindow};

use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::encoding::decode_kmer;
use crate::graph::{GraphError, NodeId};

/// A pair of allele nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Variant {
    /// Node carrying the reference allele.
    pub reference: NodeId,
    /// Node carrying the alternate allele.
    pub alternate: NodeId,
}

impl Variant {
    /// Pair two allele nodes.
    pub fn new(reference: NodeId, alternate: NodeId) -> Self {
        Self {
            reference,
            alternate,
        }
    }
}

/// Distinguishing k-mers of both alleles. Either side may be empty when no
/// qualifying window exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VariantSignature {
    /// K-mers found only around the reference allele.
    pub reference: Vec<u64>,
    /// K-mers found only around the alternate allele.
    pub alternate: Vec<u64>,
}

impl VariantSignature {
    /// Returns `true` when neither allele has a signature.
    pub fn is_empty(&self) -> bool {
        self.reference.is_empty() && self.alternate.is_empty()
    }

    /// Decode both sides as text.
    pub fn decode(&self, k: usize) -> (Vec<String>, Vec<String>) {
        let decode_all = |kmers: &[u64]| -> Vec<String> {
            kmers.iter().map(|&kmer| decode_kmer(kmer, k)).collect()
        };
        (decode_all(&self.reference), decode_all(&self.alternate))
    }
}

/// Failures of signature search.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// A variant names a node missing from the graph.
    #[error("variant {index} is invalid: {source}")]
    InvalidVariant {
        /// Position of the variant in the batch.
        index: usize,
        /// Offending node.
        source: GraphError,
    },

    /// Reference and alternate node lists differ in length.
    #[error("{reference} reference nodes but {alternate} alternate nodes")]
    LengthMismatch {
        /// Number of reference nodes.
        reference: usize,
        /// Number of alternate nodes.
        alternate: usize,
    },

    /// Invalid search parameters.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Search options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignatureOptions {
    /// Also treat reverse complements as signature k-mers.
    pub reverse_kmers: bool,
    /// Pick reference and alternate windows at the same offset (or the same
    /// overhang past the allele) so both signatures are positionally comparable.
    pub align_windows: bool,
    /// Prefer windows sharing fewer nodes and k-mers with earlier variants.
    pub minimize_overlaps: bool,
    /// Genome-wide rarity requirement when a frequency index is supplied.
    pub rarity: RarityPolicy,
    /// Ordering among otherwise equal candidates.
    pub tie_break: TieBreak,
    /// Abort the batch on the first invalid variant.
    pub fail_fast: bool,
}

impl SignatureOptions {
    /// Toggle reverse-complement k-mers.
    pub fn with_reverse_kmers(mut self, enabled: bool) -> Self {
        self.reverse_kmers = enabled;
        self
    }

    /// Toggle window alignment.
    pub fn with_align_windows(mut self, enabled: bool) -> Self {
        self.align_windows = enabled;
        self
    }

    /// Toggle overlap minimization across variants.
    pub fn with_minimize_overlaps(mut self, enabled: bool) -> Self {
        self.minimize_overlaps = enabled;
        self
    }

    /// Set the rarity requirement.
    pub fn with_rarity(mut self, rarity: RarityPolicy) -> Self {
        self.rarity = rarity;
        self
    }

    /// Set the tie-break rule.
    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// Toggle fail-fast batch behaviour.
    pub fn with_fail_fast(mut self, enabled: bool) -> Self {
        self.fail_fast = enabled;
        self
    }
}

/// Per-variant outcomes of a batch, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureBatch {
    results: Vec<Result<VariantSignature, SignatureError>>,
}

impl SignatureBatch {
    pub(crate) fn new(results: Vec<Result<VariantSignature, SignatureError>>) -> Self {
        Self { results }
    }

    /// Number of variants processed.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns `true` for an empty batch.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Outcome for variant `index`.
    pub fn get(&self, index: usize) -> Option<&Result<VariantSignature, SignatureError>> {
        self.results.get(index)
    }

    /// All outcomes in input order.
    pub fn results(&self) -> &[Result<VariantSignature, SignatureError>] {
        &self.results
    }

    /// Successful signatures with their batch positions.
    pub fn signatures(&self) -> impl Iterator<Item = (usize, &VariantSignature)> {
        self.results
            .iter()
            .enumerate()
            .filter_map(|(idx, result)| result.as_ref().ok().map(|sig| (idx, sig)))
    }

    /// Failed variants.
    pub fn failures(&self) -> impl Iterator<Item = &SignatureError> {
        self.results.iter().filter_map(|result| result.as_ref().err())
    }

    /// Consume into the raw outcomes.
    pub fn into_results(self) -> Vec<Result<VariantSignature, SignatureError>> {
        self.results
    }
}
