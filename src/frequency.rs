//! Exact k-mer frequency index.

use ahash::RandomState;
use hashbrown::{HashMap, HashSet};
use rayon::prelude::*;
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::KmerConfig;
use crate::enumerate::{KmerEnumerator, KmerSink, NodeHit};
use crate::graph::SequenceGraph;

/// Hash map keyed by k-mer value.
pub(crate) type KmerMap<V> = HashMap<u64, V, RandomState>;
/// Hash set of k-mer values.
pub(crate) type KmerSet = HashSet<u64, RandomState>;

const PAR_CHUNK: usize = 1 << 16;

/// Fixed-seed hasher so iteration order is reproducible between runs.
pub(crate) fn kmer_hasher() -> RandomState {
    RandomState::with_seeds(
        0x6b6d_6572_5f66_7265,
        0x7175_656e_6379_5f69,
        0x6e64_6578_5f76_6172,
        0x7369_675f_7365_6564,
    )
}

pub(crate) fn kmer_set() -> KmerSet {
    HashSet::with_hasher(kmer_hasher())
}

/// Exact occurrence counts keyed by the full k-mer value.
///
/// Counts saturate at `u32::MAX`. Any permutation of the same input yields
/// identical query results.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrequencyIndex {
    counts: KmerMap<u32>,
}

impl Default for FrequencyIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for FrequencyIndex {
    fn eq(&self, other: &Self) -> bool {
        self.counts == other.counts
    }
}

impl Eq for FrequencyIndex {}

impl FrequencyIndex {
    /// Empty index.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Empty index sized for `capacity` distinct k-mers.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            counts: HashMap::with_capacity_and_hasher(capacity, kmer_hasher()),
        }
    }

    /// Count every value of a k-mer stream.
    pub fn build<I: IntoIterator<Item = u64>>(kmers: I) -> Self {
        let mut index = Self::new();
        index.extend(kmers);
        index
    }

    /// Count a materialized stream in parallel chunks.
    pub fn par_build(kmers: &[u64]) -> Self {
        let index = kmers
            .par_chunks(PAR_CHUNK)
            .map(|chunk| Self::build(chunk.iter().copied()))
            .reduce(Self::new, |mut left, right| {
                left.merge(&right);
                left
            });
        debug!(input = kmers.len(), distinct = index.len(), "built frequency index");
        index
    }

    /// Count every record `create_kmer_index` would produce for `graph`:
    /// one per attributed node of each window occurrence.
    ///
    /// Equals `build_frequency_index(create_kmer_index(graph, config).kmers)`.
    pub fn from_graph(graph: &SequenceGraph, config: KmerConfig) -> Self {
        let parts: Vec<FrequencyIndex> = KmerEnumerator::new(graph, config).par_per_origin();
        let mut index = Self::new();
        for part in &parts {
            index.merge(part);
        }
        debug!(
            nodes = graph.len(),
            distinct = index.len(),
            "built frequency index from graph"
        );
        index
    }

    /// Count one occurrence of `kmer`.
    #[inline]
    pub fn increment(&mut self, kmer: u64) {
        self.add(kmer, 1);
    }

    /// Add `count` occurrences of `kmer`, saturating.
    pub fn add(&mut self, kmer: u64, count: u32) {
        let slot = self.counts.entry(kmer).or_insert(0);
        *slot = slot.saturating_add(count);
    }

    /// Fold another index into this one.
    pub fn merge(&mut self, other: &FrequencyIndex) {
        self.counts.reserve(other.len());
        for (&kmer, &count) in &other.counts {
            self.add(kmer, count);
        }
    }

    /// Occurrences of `kmer`; zero when absent.
    #[inline]
    pub fn query(&self, kmer: u64) -> u32 {
        self.counts.get(&kmer).copied().unwrap_or(0)
    }

    /// Bulk [`query`](Self::query), in input order.
    pub fn query_many(&self, kmers: &[u64]) -> Vec<u32> {
        kmers.iter().map(|&kmer| self.query(kmer)).collect()
    }

    /// Whether `kmer` has been counted at least once.
    pub fn contains(&self, kmer: u64) -> bool {
        self.counts.contains_key(&kmer)
    }

    /// Number of distinct k-mers.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Returns `true` when nothing has been counted.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.values().map(|&count| u64::from(count)).sum()
    }

    /// `(kmer, count)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, u32)> + '_ {
        self.counts.iter().map(|(&kmer, &count)| (kmer, count))
    }
}

impl KmerSink for FrequencyIndex {
    fn window(&mut self, kmer: u64, hits: &[NodeHit]) {
        if !hits.is_empty() {
            self.add(kmer, u32::try_from(hits.len()).unwrap_or(u32::MAX));
        }
    }
}

impl Extend<u64> for FrequencyIndex {
    fn extend<I: IntoIterator<Item = u64>>(&mut self, iter: I) {
        for kmer in iter {
            self.increment(kmer);
        }
    }
}

impl FromIterator<u64> for FrequencyIndex {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        Self::build(iter)
    }
}

/// Build a [`FrequencyIndex`] from a k-mer stream.
pub fn build_frequency_index<I: IntoIterator<Item = u64>>(kmers: I) -> FrequencyIndex {
    FrequencyIndex::build(kmers)
}
