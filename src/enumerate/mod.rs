//! Bounded k-mer enumeration over a [`SequenceGraph`].
//!
//! Every window is discovered exactly once, from the node holding its first
//! base (its origin). Windows that fit inside the origin are read with a
//! rolling register in a single pass. Windows that run past the origin's end
//! are completed by an explicit-stack walk over successors, limited to the
//! `k - 1` bases a window can still borrow and pruned once a path includes
//! more than `max_variant_nodes` non-reference nodes.

mod sink;
mod walker;

pub use sink::{CountingSink, KmerSink, NodeHit};

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::config::KmerConfig;
use crate::graph::{GraphError, NodeId, SequenceGraph};
use walker::Walker;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A k-mer attributed to one node it overlaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KmerRecord {
    /// Right-aligned `2k`-bit k-mer value.
    pub kmer: u64,
    /// Attributed node.
    pub node: NodeId,
    /// Distance from the node's first base to the window's first base;
    /// negative when the window begins upstream of `node`.
    pub offset: i64,
}

/// Enumerates k-mer windows of a borrowed graph.
///
/// Holds no mutable state; each call allocates its own walker scratch, so one
/// enumerator can be shared freely across threads.
#[derive(Debug, Clone, Copy)]
pub struct KmerEnumerator<'g> {
    graph: &'g SequenceGraph,
    config: KmerConfig,
}

impl<'g> KmerEnumerator<'g> {
    /// Create an enumerator over `graph`.
    pub fn new(graph: &'g SequenceGraph, config: KmerConfig) -> Self {
        Self { graph, config }
    }

    /// Graph being enumerated.
    pub fn graph(&self) -> &'g SequenceGraph {
        self.graph
    }

    /// Active configuration.
    pub fn config(&self) -> &KmerConfig {
        &self.config
    }

    /// Every record of the graph, origins visited in id order.
    pub fn enumerate(&self) -> Vec<KmerRecord> {
        let mut records = Vec::new();
        self.enumerate_into(&mut records);
        records
    }

    /// Stream every window of the graph into `sink`.
    pub fn enumerate_into<S: KmerSink + ?Sized>(&self, sink: &mut S) {
        let mut walker = Walker::new(self.graph, &self.config);
        for origin in self.graph.node_ids() {
            walker.walk_origin(origin, sink, None);
        }
        debug!(
            nodes = self.graph.len(),
            k = self.config.k(),
            max_variant_nodes = self.config.max_variant_nodes(),
            "enumerated graph"
        );
    }

    /// Stream the windows whose first base lies in `origin`.
    pub fn enumerate_from<S: KmerSink + ?Sized>(
        &self,
        origin: NodeId,
        sink: &mut S,
    ) -> Result<(), GraphError> {
        self.graph.check_node(origin)?;
        Walker::new(self.graph, &self.config).walk_origin(origin, sink, None);
        Ok(())
    }

    /// Stream every window that overlaps `node`, wherever it starts.
    ///
    /// Upstream origins are found by walking predecessors no further than a
    /// window can reach.
    pub fn enumerate_spanning<S: KmerSink + ?Sized>(
        &self,
        node: NodeId,
        sink: &mut S,
    ) -> Result<(), GraphError> {
        self.graph.check_node(node)?;
        let mut walker = Walker::new(self.graph, &self.config);
        let origins = walker.spanning_origins(node);
        trace!(node, origins = origins.len(), "spanning search");
        for origin in origins {
            walker.walk_origin(origin, sink, Some(node));
        }
        Ok(())
    }

    /// Parallel version of [`enumerate`](Self::enumerate) with identical output order.
    pub fn par_enumerate(&self) -> Vec<KmerRecord> {
        self.par_per_origin::<Vec<KmerRecord>>().concat()
    }

    /// Fill one sink per origin node in parallel; sinks come back in id order.
    pub(crate) fn par_per_origin<S>(&self) -> Vec<S>
    where
        S: KmerSink + Default + Send,
    {
        (0..self.graph.len())
            .into_par_iter()
            .map_init(
                || Walker::new(self.graph, &self.config),
                |walker, origin| {
                    let mut sink = S::default();
                    walker.walk_origin(origin as NodeId, &mut sink, None);
                    sink
                },
            )
            .collect()
    }
}

/// Enumerate every k-mer record of `graph`.
pub fn enumerate_kmers(graph: &SequenceGraph, config: KmerConfig) -> Vec<KmerRecord> {
    KmerEnumerator::new(graph, config).enumerate()
}
