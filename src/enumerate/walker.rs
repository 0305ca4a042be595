use hashbrown::HashMap;
use tracing::trace;

use super::sink::{KmerSink, NodeHit};
use crate::config::{Attribution, KmerConfig};
use crate::graph::{NodeId, SequenceGraph};

/// Pending extension into `node`.
#[derive(Debug, Clone, Copy)]
struct Frame {
    node: NodeId,
    /// Path length before `node` is pushed.
    depth: usize,
    /// Bases appended after the origin before entering `node`.
    appended: usize,
    /// Rolling register as it stood when the frame was created.
    register: u64,
    /// Non-reference nodes on the path so far, origin included.
    variants: usize,
}

#[derive(Debug, Clone, Copy)]
struct PathEntry {
    node: NodeId,
    /// Position of the node's first base, counted from the origin's first base.
    start: i64,
}

/// Explicit-stack walker owning all scratch for one thread of enumeration.
///
/// Frames carry the register and the variant accumulator by value, so
/// popping a frame restores the exact branch state without undo logic.
pub(crate) struct Walker<'g> {
    graph: &'g SequenceGraph,
    k: usize,
    mask: u64,
    max_variants: usize,
    attribution: Attribution,
    stack: Vec<Frame>,
    path: Vec<PathEntry>,
    hits: Vec<NodeHit>,
}

impl<'g> Walker<'g> {
    pub(crate) fn new(graph: &'g SequenceGraph, config: &KmerConfig) -> Self {
        Self {
            graph,
            k: config.k(),
            mask: config.mask(),
            max_variants: config.max_variant_nodes(),
            attribution: config.attribution(),
            stack: Vec::new(),
            path: Vec::with_capacity(config.k()),
            hits: Vec::with_capacity(config.k()),
        }
    }

    #[inline]
    fn variant_weight(&self, node: NodeId) -> usize {
        usize::from(!self.graph.is_reference(node))
    }

    /// Emit every window whose first base lies in `origin`.
    ///
    /// With `required` set, only windows covering that node are reported.
    pub(crate) fn walk_origin<S: KmerSink + ?Sized>(
        &mut self,
        origin: NodeId,
        sink: &mut S,
        required: Option<NodeId>,
    ) {
        let graph = self.graph;
        let node = graph.node_at(origin);
        let len = node.len();
        if len == 0 {
            return;
        }
        let variants = self.variant_weight(origin);
        if variants > self.max_variants {
            trace!(origin, "origin exceeds variant cap");
            return;
        }

        let k = self.k;
        let mut register = 0u64;
        let seed_required = required.map_or(true, |target| target == origin);
        for (idx, code) in node.codes().enumerate() {
            register = ((register << 2) | code as u64) & self.mask;
            if seed_required && idx + 1 >= k {
                let hit = NodeHit {
                    node: origin,
                    offset: (idx + 1 - k) as i64,
                };
                sink.window(register, &[hit]);
            }
        }

        let carried = len.min(k - 1);
        if carried == 0 {
            return;
        }

        self.stack.clear();
        self.path.clear();
        self.path.push(PathEntry {
            node: origin,
            start: 0,
        });
        for &succ in node.successors().iter().rev() {
            self.stack.push(Frame {
                node: succ,
                depth: 1,
                appended: 0,
                register,
                variants,
            });
        }

        while let Some(frame) = self.stack.pop() {
            let variants = frame.variants + self.variant_weight(frame.node);
            if variants > self.max_variants {
                continue;
            }
            self.path.truncate(frame.depth);
            let start = (len + frame.appended) as i64;
            let current = graph.node_at(frame.node);
            if current.is_empty()
                && self
                    .path
                    .iter()
                    .any(|entry| entry.node == frame.node && entry.start == start)
            {
                continue;
            }
            self.path.push(PathEntry {
                node: frame.node,
                start,
            });

            let mut register = frame.register;
            let mut appended = frame.appended;
            let mut finished = false;
            for code in current.codes() {
                register = ((register << 2) | code as u64) & self.mask;
                appended += 1;
                if carried + appended >= k {
                    let window_start = (len + appended - k) as i64;
                    self.emit(register, window_start, required, sink);
                }
                if appended == k - 1 {
                    finished = true;
                    break;
                }
            }
            if finished {
                continue;
            }
            let depth = self.path.len();
            for &succ in current.successors().iter().rev() {
                self.stack.push(Frame {
                    node: succ,
                    depth,
                    appended,
                    register,
                    variants,
                });
            }
        }
    }

    /// Report a window covering every node currently on the path.
    fn emit<S: KmerSink + ?Sized>(
        &mut self,
        kmer: u64,
        window_start: i64,
        required: Option<NodeId>,
        sink: &mut S,
    ) {
        if let Some(target) = required {
            if !self.path.iter().any(|entry| entry.node == target) {
                return;
            }
        }
        self.hits.clear();
        let attributed = match self.attribution {
            Attribution::PathNodes => self.path.len(),
            Attribution::OriginNode => 1,
        };
        self.hits
            .extend(self.path[..attributed].iter().map(|entry| NodeHit {
                node: entry.node,
                offset: window_start - entry.start,
            }));
        sink.window(kmer, &self.hits);
    }

    /// Origins of every window that can cover `target`, in ascending id order.
    ///
    /// Walks predecessors while the gap to `target` still leaves room for a
    /// window to reach it.
    pub(crate) fn spanning_origins(&self, target: NodeId) -> Vec<NodeId> {
        let reach = self.k.saturating_sub(2);
        let mut best_gap: HashMap<NodeId, usize> = HashMap::new();
        let mut origins: Vec<NodeId> = Vec::new();
        if self.graph.node_len(target) > 0 {
            origins.push(target);
        }
        if self.k < 2 {
            return origins;
        }

        let mut pending: Vec<(NodeId, usize)> = self
            .graph
            .predecessors(target)
            .iter()
            .map(|&pred| (pred, 0))
            .collect();
        while let Some((node, gap)) = pending.pop() {
            match best_gap.get(&node) {
                Some(&seen) if seen <= gap => continue,
                _ => {
                    best_gap.insert(node, gap);
                }
            }
            let len = self.graph.node_len(node);
            if len > 0 && gap <= reach && !origins.contains(&node) {
                origins.push(node);
            }
            let upstream_gap = gap + len;
            if upstream_gap <= reach {
                pending.extend(
                    self.graph
                        .predecessors(node)
                        .iter()
                        .map(|&pred| (pred, upstream_gap)),
                );
            }
        }
        origins.sort_unstable();
        origins
    }
}
