//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Once;

use proptest::prelude::*;
use tracing_subscriber::EnvFilter;
use varsig::{build_graph, NodeId, SequenceGraph};

static TRACING: Once = Once::new();

/// Route `tracing` output to the test harness; `RUST_LOG` selects verbosity.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// `ACTG -> {A (ref) | G (alt)} -> CCCC`, alternate allele at node 2.
pub fn diamond() -> SequenceGraph {
    build_graph(
        &["ACTG", "A", "G", "CCCC"],
        &[vec![1, 2], vec![3], vec![3], vec![]],
        Some(&[0, 1, 3]),
    )
    .expect("diamond graph is valid")
}

/// A chain of segments; each segment holds one or more alternative node
/// sequences and every alternative connects to every alternative of the
/// next segment.
#[derive(Debug, Clone)]
pub struct BubbleChain {
    pub segments: Vec<Vec<String>>,
}

impl BubbleChain {
    /// Node ids of each segment, in graph order.
    pub fn segment_ids(&self) -> Vec<Vec<NodeId>> {
        let mut next = 0;
        self.segments
            .iter()
            .map(|alternatives| {
                let ids = (next..next + alternatives.len() as NodeId).collect();
                next += alternatives.len() as NodeId;
                ids
            })
            .collect()
    }

    /// Build the graph. The first alternative of every segment is reference.
    pub fn graph(&self) -> SequenceGraph {
        let ids = self.segment_ids();
        let sequences: Vec<&str> = self
            .segments
            .iter()
            .flat_map(|alternatives| alternatives.iter().map(String::as_str))
            .collect();
        let mut edges: Vec<Vec<NodeId>> = vec![Vec::new(); sequences.len()];
        for pair in ids.windows(2) {
            for &from in &pair[0] {
                edges[from as usize] = pair[1].clone();
            }
        }
        let reference: Vec<NodeId> = ids.iter().map(|segment| segment[0]).collect();
        build_graph(&sequences, &edges, Some(&reference)).expect("bubble chain is valid")
    }

    /// Every source-to-sink path as a list of node ids.
    pub fn paths(&self) -> Vec<Vec<NodeId>> {
        let mut paths: Vec<Vec<NodeId>> = vec![Vec::new()];
        for segment in self.segment_ids() {
            paths = paths
                .into_iter()
                .flat_map(|path| {
                    segment.iter().map(move |&id| {
                        let mut extended = path.clone();
                        extended.push(id);
                        extended
                    })
                })
                .collect();
        }
        paths
    }
}

/// Concatenated text of a node path plus the start offset of each node.
pub fn path_text(graph: &SequenceGraph, path: &[NodeId]) -> (String, Vec<usize>) {
    let mut text = String::new();
    let mut starts = Vec::with_capacity(path.len());
    for &node in path {
        starts.push(text.len());
        text.push_str(&graph.decode_node(node).expect("path node exists"));
    }
    (text, starts)
}

/// Nucleotide text of the given length range.
pub fn dna(len: std::ops::Range<usize>) -> impl Strategy<Value = String> {
    proptest::collection::vec(prop_oneof![Just('A'), Just('C'), Just('G'), Just('T')], len)
        .prop_map(|bases| bases.into_iter().collect())
}

/// Random bubble chains of at most five segments with short nodes,
/// including empty alternatives.
pub fn bubble_chain() -> impl Strategy<Value = BubbleChain> {
    let segment = prop_oneof![
        dna(1..6).prop_map(|seq| vec![seq]),
        (dna(0..4), dna(0..4)).prop_map(|(a, b)| vec![a, b]),
    ];
    proptest::collection::vec(segment, 1..6).prop_map(|segments| BubbleChain { segments })
}
