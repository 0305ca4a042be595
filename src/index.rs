//! Flat k-mer/node index for collaborators that want parallel arrays.

use tracing::info;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::KmerConfig;
use crate::enumerate::{KmerEnumerator, KmerRecord, KmerSink, NodeHit};
use crate::graph::{NodeId, SequenceGraph};

/// Enumeration output as three parallel arrays: record `i` is
/// `(kmers[i], nodes[i], offsets[i])`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KmerIndex {
    /// K-mer values.
    pub kmers: Vec<u64>,
    /// Attributed node per k-mer.
    pub nodes: Vec<NodeId>,
    /// Window offset relative to the attributed node.
    pub offsets: Vec<i64>,
}

impl KmerIndex {
    /// Empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.kmers.len()
    }

    /// Returns `true` when no records are stored.
    pub fn is_empty(&self) -> bool {
        self.kmers.is_empty()
    }

    /// Add one record.
    pub fn push(&mut self, record: KmerRecord) {
        self.kmers.push(record.kmer);
        self.nodes.push(record.node);
        self.offsets.push(record.offset);
    }

    /// Move every record of `other` to the end of `self`.
    pub fn append(&mut self, other: &mut KmerIndex) {
        self.kmers.append(&mut other.kmers);
        self.nodes.append(&mut other.nodes);
        self.offsets.append(&mut other.offsets);
    }

    /// Iterate over the records in order.
    pub fn records(&self) -> impl Iterator<Item = KmerRecord> + '_ {
        self.kmers
            .iter()
            .zip(&self.nodes)
            .zip(&self.offsets)
            .map(|((&kmer, &node), &offset)| KmerRecord { kmer, node, offset })
    }
}

impl KmerSink for KmerIndex {
    fn window(&mut self, kmer: u64, hits: &[NodeHit]) {
        for hit in hits {
            self.kmers.push(kmer);
            self.nodes.push(hit.node);
            self.offsets.push(hit.offset);
        }
    }
}

impl FromIterator<KmerRecord> for KmerIndex {
    fn from_iter<I: IntoIterator<Item = KmerRecord>>(iter: I) -> Self {
        let mut index = KmerIndex::new();
        for record in iter {
            index.push(record);
        }
        index
    }
}

/// Enumerate `graph` into parallel arrays, one origin node per rayon task.
///
/// The result is ordered exactly as a sequential enumeration would be.
pub fn create_kmer_index(graph: &SequenceGraph, config: KmerConfig) -> KmerIndex {
    let parts: Vec<KmerIndex> = KmerEnumerator::new(graph, config).par_per_origin();

    let mut index = KmerIndex::new();
    for mut part in parts {
        index.append(&mut part);
    }
    info!(
        records = index.len(),
        nodes = graph.len(),
        k = config.k(),
        "created k-mer index"
    );
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enumerate::enumerate_kmers;
    use crate::graph::build_graph;

    #[test]
    fn index_matches_record_stream() {
        let graph = build_graph(
            &["ACTG", "A", "G", "CCCC"],
            &[vec![1, 2], vec![3], vec![3], vec![]],
            Some(&[0, 1, 3]),
        )
        .unwrap();
        let config = KmerConfig::new(3, 1).unwrap();
        let index = create_kmer_index(&graph, config);
        let records = enumerate_kmers(&graph, config);
        assert_eq!(index.len(), records.len());
        assert_eq!(index.records().collect::<Vec<_>>(), records);
        assert_eq!(records.into_iter().collect::<KmerIndex>(), index);
    }

    #[test]
    fn empty_graph_gives_empty_index() {
        let graph = build_graph::<&str>(&[], &[], None).unwrap();
        let index = create_kmer_index(&graph, KmerConfig::new(5, 0).unwrap());
        assert!(index.is_empty());
    }
}
