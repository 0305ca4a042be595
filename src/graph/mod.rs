//! Immutable sequence graph over packed nodes.
//!
//! Nodes are indexed `0..N`. Each holds a [`PackedSequence`] of any length
//! (multi-word when longer than 31 bases), an ordered successor list and a
//! reference/variant flag. Predecessor lists are derived once at build time
//! so neighbourhood searches can walk upstream without touching the nodes.

mod builder;
mod compact;

pub use builder::{build_graph, GraphBuilder};
pub use compact::Compaction;

use bitvec::prelude::*;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::encoding::{Codes, EncodingError, PackedSequence};

/// Node identifier (index into the graph).
pub type NodeId = u32;

/// Structural problems detected while building or addressing a graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// An edge names a node that does not exist.
    #[error("edge {from} -> {to} references a missing node (graph has {node_count} nodes)")]
    DanglingEdge {
        /// Source of the edge.
        from: NodeId,
        /// Target of the edge.
        to: NodeId,
        /// Number of nodes in the graph.
        node_count: usize,
    },

    /// More successor lists than nodes were supplied.
    #[error("{lists} successor lists supplied for {nodes} nodes")]
    EdgeListLength {
        /// Number of successor lists.
        lists: usize,
        /// Number of nodes.
        nodes: usize,
    },

    /// A caller-supplied node id is out of range.
    #[error("node {node} does not exist (graph has {node_count} nodes)")]
    NodeOutOfRange {
        /// Requested node id.
        node: NodeId,
        /// Number of nodes in the graph.
        node_count: usize,
    },

    /// The explicit reference set names a missing node.
    #[error("reference node {node} does not exist (graph has {node_count} nodes)")]
    ReferenceOutOfRange {
        /// Requested node id.
        node: NodeId,
        /// Number of nodes in the graph.
        node_count: usize,
    },

    /// Node text outside the nucleotide alphabet.
    #[error("node {node} has an invalid sequence: {source}")]
    InvalidSequence {
        /// Index of the node being added.
        node: usize,
        /// Underlying encoding failure.
        source: EncodingError,
    },

    /// Node ids are 32-bit.
    #[error("graph cannot hold more than {0} nodes")]
    TooManyNodes(usize),
}

/// Graph node: packed sequence plus ordered successors.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Node {
    sequence: PackedSequence,
    successors: Vec<NodeId>,
}

impl Node {
    /// Packed bases of this node.
    pub fn sequence(&self) -> &PackedSequence {
        &self.sequence
    }

    /// Number of bases.
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Zero-length nodes act as pass-through waypoints (e.g. deletions).
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Ordered successor ids.
    pub fn successors(&self) -> &[NodeId] {
        &self.successors
    }

    /// 2-bit base codes in sequence order.
    pub fn codes(&self) -> Codes<'_> {
        self.sequence.codes()
    }
}

/// Directed sequence graph, read-only once built.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SequenceGraph {
    nodes: Vec<Node>,
    predecessors: Vec<Vec<NodeId>>,
    reference: BitVec<u64, Lsb0>,
}

impl SequenceGraph {
    /// Assemble a graph from nodes whose edges are already known to be valid.
    pub(crate) fn from_parts(nodes: Vec<Node>, reference: BitVec<u64, Lsb0>) -> Self {
        debug_assert_eq!(nodes.len(), reference.len());
        let mut predecessors = vec![Vec::new(); nodes.len()];
        for (id, node) in nodes.iter().enumerate() {
            for &succ in &node.successors {
                predecessors[succ as usize].push(id as NodeId);
            }
        }
        Self {
            nodes,
            predecessors,
            reference,
        }
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` when the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in id order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Iterator over every node id.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(|id| id as NodeId)
    }

    /// Fail with [`GraphError::NodeOutOfRange`] unless `id` exists.
    pub fn check_node(&self, id: NodeId) -> Result<(), GraphError> {
        if (id as usize) < self.nodes.len() {
            Ok(())
        } else {
            Err(GraphError::NodeOutOfRange {
                node: id,
                node_count: self.nodes.len(),
            })
        }
    }

    /// Node by id.
    pub fn node(&self, id: NodeId) -> Result<&Node, GraphError> {
        self.check_node(id)?;
        Ok(&self.nodes[id as usize])
    }

    /// Node by id, without range checking beyond the slice bounds check.
    #[inline]
    pub(crate) fn node_at(&self, id: NodeId) -> &Node {
        &self.nodes[id as usize]
    }

    /// Successors of `id` (empty for unknown ids).
    pub fn successors(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id as usize)
            .map_or(&[], |node| node.successors.as_slice())
    }

    /// Predecessors of `id` in ascending id order (empty for unknown ids).
    pub fn predecessors(&self, id: NodeId) -> &[NodeId] {
        self.predecessors
            .get(id as usize)
            .map_or(&[], |preds| preds.as_slice())
    }

    /// Whether `id` lies on the reference path. Unknown ids are not reference.
    #[inline]
    pub fn is_reference(&self, id: NodeId) -> bool {
        self.reference
            .get(id as usize)
            .map(|bit| *bit)
            .unwrap_or(false)
    }

    /// Number of reference-flagged nodes.
    pub fn reference_count(&self) -> usize {
        self.reference.count_ones()
    }

    /// Sequence length of `id` (0 for unknown ids).
    pub fn node_len(&self, id: NodeId) -> usize {
        self.nodes.get(id as usize).map_or(0, Node::len)
    }

    /// Decoded sequence of `id`.
    pub fn decode_node(&self, id: NodeId) -> Result<String, GraphError> {
        Ok(self.node(id)?.sequence.to_string())
    }

    /// Sum of all node lengths.
    pub fn total_sequence_len(&self) -> usize {
        self.nodes.iter().map(Node::len).sum()
    }
}
