use hashbrown::HashSet;

use super::windows::SignatureWindow;
use super::SignatureOptions;
use crate::frequency::{kmer_set, KmerSet};
use crate::graph::NodeId;

/// Final ordering applied after overlap avoidance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TieBreak {
    /// Lowest genome-wide frequency, then path order.
    #[default]
    LowestFrequency,
    /// First candidate in path order (most upstream offset).
    PathOrder,
    /// Window centred closest to the allele node, then path order.
    NearestAllele,
}

/// K-mers and nodes already claimed by earlier variants of a batch.
#[derive(Debug, Clone)]
pub struct OverlapLedger {
    kmers: KmerSet,
    nodes: HashSet<NodeId>,
}

impl Default for OverlapLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlapLedger {
    /// Empty ledger.
    pub fn new() -> Self {
        Self {
            kmers: kmer_set(),
            nodes: HashSet::new(),
        }
    }

    /// Record the k-mers and nodes of a chosen window.
    pub fn claim(&mut self, window: &SignatureWindow) {
        self.kmers.extend(window.kmers.iter().copied());
        self.nodes.extend(window.nodes.iter().copied());
    }

    /// How many of `kmers` are already claimed.
    pub fn kmer_overlap(&self, kmers: &[u64]) -> usize {
        kmers.iter().filter(|kmer| self.kmers.contains(*kmer)).count()
    }

    /// How many of `nodes` are already claimed.
    pub fn node_overlap(&self, nodes: &[NodeId]) -> usize {
        nodes.iter().filter(|node| self.nodes.contains(*node)).count()
    }

    /// Number of claimed k-mers.
    pub fn claimed_kmers(&self) -> usize {
        self.kmers.len()
    }

    /// Number of claimed nodes.
    pub fn claimed_nodes(&self) -> usize {
        self.nodes.len()
    }
}

/// Chooses one window among the candidates of an allele (or aligned pair).
///
/// Candidates arrive in path order. Returning `None` leaves the signature empty.
pub trait SelectionStrategy: Send + Sync {
    /// Index of the chosen candidate.
    fn select(
        &self,
        candidates: &[SignatureWindow],
        ledger: &OverlapLedger,
        options: &SignatureOptions,
    ) -> Option<usize>;
}

/// Default strategy: fewest claimed nodes and k-mers when overlaps are being
/// minimized, then the configured [`TieBreak`], then path order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RankedSelection;

impl SelectionStrategy for RankedSelection {
    fn select(
        &self,
        candidates: &[SignatureWindow],
        ledger: &OverlapLedger,
        options: &SignatureOptions,
    ) -> Option<usize> {
        candidates
            .iter()
            .enumerate()
            .min_by_key(|(idx, window)| {
                let overlap = if options.minimize_overlaps {
                    (
                        ledger.node_overlap(&window.nodes),
                        ledger.kmer_overlap(&window.kmers),
                    )
                } else {
                    (0, 0)
                };
                let tie = match options.tie_break {
                    TieBreak::LowestFrequency => i64::from(window.max_frequency),
                    TieBreak::PathOrder => 0,
                    TieBreak::NearestAllele => window.centre_distance,
                };
                (overlap, tie, *idx)
            })
            .map(|(idx, _)| idx)
    }
}

impl<F> SelectionStrategy for F
where
    F: Fn(&[SignatureWindow], &OverlapLedger, &SignatureOptions) -> Option<usize> + Send + Sync,
{
    fn select(
        &self,
        candidates: &[SignatureWindow],
        ledger: &OverlapLedger,
        options: &SignatureOptions,
    ) -> Option<usize> {
        self(candidates, ledger, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(offset: i64, kmers: &[u64], nodes: &[NodeId], max_frequency: u32) -> SignatureWindow {
        SignatureWindow {
            offset,
            overhang: offset + 3,
            kmers: kmers.to_vec(),
            nodes: nodes.to_vec(),
            max_frequency,
            centre_distance: (2 * offset + 2).abs(),
        }
    }

    fn candidates() -> Vec<SignatureWindow> {
        vec![
            window(-2, &[10], &[0, 1], 4),
            window(-1, &[11], &[1], 1),
            window(0, &[12], &[1, 2], 1),
        ]
    }

    #[test]
    fn tie_breaks_are_configurable() {
        let ledger = OverlapLedger::new();
        let pick = |tie_break| {
            let options = SignatureOptions::default().with_tie_break(tie_break);
            RankedSelection.select(&candidates(), &ledger, &options)
        };
        assert_eq!(pick(TieBreak::PathOrder), Some(0));
        assert_eq!(pick(TieBreak::LowestFrequency), Some(1));
        assert_eq!(pick(TieBreak::NearestAllele), Some(1));
    }

    #[test]
    fn claimed_material_is_avoided() {
        let mut ledger = OverlapLedger::new();
        ledger.claim(&window(5, &[11], &[7], 0));
        let options = SignatureOptions::default()
            .with_minimize_overlaps(true)
            .with_tie_break(TieBreak::LowestFrequency);
        assert_eq!(RankedSelection.select(&candidates(), &ledger, &options), Some(2));

        let ignoring = options.with_minimize_overlaps(false);
        assert_eq!(RankedSelection.select(&candidates(), &ledger, &ignoring), Some(1));
    }

    #[test]
    fn empty_candidates_select_nothing() {
        let options = SignatureOptions::default();
        assert_eq!(RankedSelection.select(&[], &OverlapLedger::new(), &options), None);
    }

    #[test]
    fn closures_are_strategies() {
        let last = |candidates: &[SignatureWindow], _: &OverlapLedger, _: &SignatureOptions| {
            candidates.len().checked_sub(1)
        };
        let options = SignatureOptions::default();
        assert_eq!(last.select(&candidates(), &OverlapLedger::new(), &options), Some(2));
    }
}
