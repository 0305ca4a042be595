use bitvec::prelude::*;
use tracing::debug;

use super::{GraphError, Node, NodeId, SequenceGraph};
use crate::encoding::PackedSequence;

/// Fluent builder that validates edges and reference flags on [`build`](Self::build).
#[derive(Debug, Default)]
pub struct GraphBuilder {
    sequences: Vec<PackedSequence>,
    edges: Vec<(NodeId, NodeId)>,
    reference: Option<Vec<NodeId>>,
}

impl GraphBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size for `nodes` nodes.
    pub fn with_capacity(nodes: usize) -> Self {
        Self {
            sequences: Vec::with_capacity(nodes),
            ..Self::default()
        }
    }

    /// Add a node from ASCII nucleotide text and return its id.
    pub fn add_node(&mut self, text: &[u8]) -> Result<NodeId, GraphError> {
        let sequence =
            PackedSequence::from_ascii(text).map_err(|source| GraphError::InvalidSequence {
                node: self.sequences.len(),
                source,
            })?;
        self.push_sequence(sequence)
    }

    /// Add a node from words packed by a collaborator.
    pub fn add_packed_node(&mut self, words: Vec<u64>, len: usize) -> Result<NodeId, GraphError> {
        let sequence = PackedSequence::from_packed(words, len).map_err(|source| {
            GraphError::InvalidSequence {
                node: self.sequences.len(),
                source,
            }
        })?;
        self.push_sequence(sequence)
    }

    /// Add a zero-length node.
    pub fn add_empty_node(&mut self) -> Result<NodeId, GraphError> {
        self.push_sequence(PackedSequence::new())
    }

    pub(crate) fn push_sequence(&mut self, sequence: PackedSequence) -> Result<NodeId, GraphError> {
        let id = self.sequences.len();
        if id > NodeId::MAX as usize {
            return Err(GraphError::TooManyNodes(NodeId::MAX as usize + 1));
        }
        self.sequences.push(sequence);
        Ok(id as NodeId)
    }

    /// Record an edge; endpoints are checked when the graph is built.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) -> &mut Self {
        self.edges.push((from, to));
        self
    }

    /// Mark exactly these nodes as reference; every other node becomes a variant node.
    ///
    /// Without a call to this method all nodes are reference.
    pub fn reference_nodes(&mut self, ids: impl IntoIterator<Item = NodeId>) -> &mut Self {
        self.reference
            .get_or_insert_with(Vec::new)
            .extend(ids);
        self
    }

    /// Validate and freeze the graph.
    pub fn build(self) -> Result<SequenceGraph, GraphError> {
        let node_count = self.sequences.len();
        let mut successors: Vec<Vec<NodeId>> = vec![Vec::new(); node_count];
        for &(from, to) in &self.edges {
            if from as usize >= node_count || to as usize >= node_count {
                return Err(GraphError::DanglingEdge {
                    from,
                    to,
                    node_count,
                });
            }
            let list = &mut successors[from as usize];
            if !list.contains(&to) {
                list.push(to);
            }
        }

        let reference = match &self.reference {
            None => bitvec![u64, Lsb0; 1; node_count],
            Some(ids) => {
                let mut flags = bitvec![u64, Lsb0; 0; node_count];
                for &id in ids {
                    if id as usize >= node_count {
                        return Err(GraphError::ReferenceOutOfRange {
                            node: id,
                            node_count,
                        });
                    }
                    flags.set(id as usize, true);
                }
                flags
            }
        };

        let nodes: Vec<Node> = self
            .sequences
            .into_iter()
            .zip(successors)
            .map(|(sequence, successors)| Node {
                sequence,
                successors,
            })
            .collect();

        debug!(
            nodes = node_count,
            edges = self.edges.len(),
            reference = reference.count_ones(),
            "built sequence graph"
        );
        Ok(SequenceGraph::from_parts(nodes, reference))
    }
}

/// Build a graph from per-node sequences and successor lists.
///
/// `edges[i]` lists the successors of node `i`; it may be shorter than
/// `sequences` (missing lists mean no successors). When `reference_node_ids`
/// is `None` every node is reference.
pub fn build_graph<S: AsRef<[u8]>>(
    sequences: &[S],
    edges: &[Vec<NodeId>],
    reference_node_ids: Option<&[NodeId]>,
) -> Result<SequenceGraph, GraphError> {
    if edges.len() > sequences.len() {
        return Err(GraphError::EdgeListLength {
            lists: edges.len(),
            nodes: sequences.len(),
        });
    }
    let mut builder = GraphBuilder::with_capacity(sequences.len());
    for sequence in sequences {
        builder.add_node(sequence.as_ref())?;
    }
    for (from, targets) in edges.iter().enumerate() {
        for &to in targets {
            builder.add_edge(from as NodeId, to);
        }
    }
    if let Some(ids) = reference_node_ids {
        builder.reference_nodes(ids.iter().copied());
    }
    builder.build()
}
