use bitvec::prelude::*;
use tracing::debug;

use super::{Node, NodeId, SequenceGraph};
use crate::encoding::PackedSequence;

/// Result of [`SequenceGraph::compact`].
#[derive(Debug, Clone)]
pub struct Compaction {
    /// Compacted graph.
    pub graph: SequenceGraph,
    /// `id_map[old]` is the compacted node that absorbed `old`.
    pub id_map: Vec<NodeId>,
}

impl SequenceGraph {
    /// A node can be folded into its predecessor when the edge between them is
    /// the only way out of the predecessor and the only way into the node.
    fn absorbable(&self, id: NodeId) -> bool {
        match self.predecessors(id) {
            [pred] => {
                *pred != id
                    && self.successors(*pred).len() == 1
                    && self.is_reference(*pred) == self.is_reference(id)
            }
            _ => false,
        }
    }

    /// Merge unbranching chains into single nodes.
    ///
    /// Chains never cross a reference/variant boundary. Pure cycles with no
    /// entry point are broken at their lowest id.
    pub fn compact(&self) -> Compaction {
        let node_count = self.len();
        let mut placed = bitvec![u64, Lsb0; 0; node_count];
        let mut chains: Vec<Vec<NodeId>> = Vec::new();

        let heads = self.node_ids().filter(|&id| !self.absorbable(id)).collect::<Vec<_>>();
        for head in heads.into_iter().chain(self.node_ids()) {
            if placed[head as usize] {
                continue;
            }
            let mut chain = vec![head];
            placed.set(head as usize, true);
            let mut current = head;
            while let [next] = self.successors(current) {
                if placed[*next as usize] || !self.absorbable(*next) {
                    break;
                }
                placed.set(*next as usize, true);
                chain.push(*next);
                current = *next;
            }
            chains.push(chain);
        }

        let mut id_map = vec![0 as NodeId; node_count];
        for (new_id, chain) in chains.iter().enumerate() {
            for &old in chain {
                id_map[old as usize] = new_id as NodeId;
            }
        }

        let mut reference = bitvec![u64, Lsb0; 0; chains.len()];
        let nodes: Vec<Node> = chains
            .iter()
            .enumerate()
            .map(|(new_id, chain)| {
                let mut sequence = PackedSequence::new();
                for &old in chain {
                    sequence.extend_from(self.node_at(old).sequence());
                }
                let tail = chain[chain.len() - 1];
                let mut successors: Vec<NodeId> = Vec::new();
                for &succ in self.successors(tail) {
                    let mapped = id_map[succ as usize];
                    if !successors.contains(&mapped) {
                        successors.push(mapped);
                    }
                }
                reference.set(new_id, self.is_reference(chain[0]));
                Node {
                    sequence,
                    successors,
                }
            })
            .collect();

        debug!(
            before = node_count,
            after = nodes.len(),
            "compacted unbranching chains"
        );
        Compaction {
            graph: SequenceGraph::from_parts(nodes, reference),
            id_map,
        }
    }
}
