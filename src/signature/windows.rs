use hashbrown::HashMap;

use crate::encoding::reverse_complement;
use crate::enumerate::{KmerSink, NodeHit};
use crate::frequency::{kmer_hasher, kmer_set, FrequencyIndex, KmerMap, KmerSet};
use crate::graph::NodeId;

/// How rare a k-mer must be genome-wide to distinguish an allele.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RarityPolicy {
    /// Every genome-wide occurrence must come from the allele's own windows.
    #[default]
    OwnAlleleOnly,
    /// Genome-wide count must not exceed this value.
    AtMost(u32),
}

impl RarityPolicy {
    fn admits(self, global: u32, local: u32) -> bool {
        match self {
            RarityPolicy::OwnAlleleOnly => global <= local,
            RarityPolicy::AtMost(limit) => global <= limit,
        }
    }
}

/// All k-mers found at one offset around an allele node.
///
/// Several paths can run through the same offset (branches upstream or
/// downstream of the allele), so a window may hold more than one k-mer; a
/// read carrying the allele matches at least one of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureWindow {
    /// Start of the window relative to the allele node's first base.
    pub offset: i64,
    /// Bases the window extends past the allele node's last base.
    pub overhang: i64,
    /// Distinct k-mers in discovery order, each followed by its reverse
    /// complement when reverse k-mers are requested.
    pub kmers: Vec<u64>,
    /// Nodes covered by any path through this window, ascending.
    pub nodes: Vec<NodeId>,
    /// Largest genome-wide count among `kmers` (0 without a frequency index).
    pub max_frequency: u32,
    /// Twice the distance between the window centre and the allele centre.
    pub centre_distance: i64,
}

impl SignatureWindow {
    /// Combine a reference window and an alternate window into one
    /// candidate so aligned pairs can be ranked like single windows.
    pub(crate) fn pair(reference: &SignatureWindow, alternate: &SignatureWindow) -> Self {
        let mut nodes = reference.nodes.clone();
        nodes.extend(alternate.nodes.iter().copied());
        nodes.sort_unstable();
        nodes.dedup();
        let mut kmers = reference.kmers.clone();
        kmers.extend(alternate.kmers.iter().copied());
        Self {
            offset: reference.offset,
            overhang: reference.overhang,
            kmers,
            nodes,
            max_frequency: reference.max_frequency.saturating_add(alternate.max_frequency),
            centre_distance: reference.centre_distance + alternate.centre_distance,
        }
    }
}

/// Windows around one allele node, ordered by offset.
#[derive(Debug, Clone)]
pub(crate) struct AlleleWindows {
    pub(crate) windows: Vec<SignatureWindow>,
    /// Every k-mer form seen around the allele.
    kmers: KmerSet,
    /// Records of each form across the allele's windows, counted like
    /// [`FrequencyIndex::from_graph`].
    local: KmerMap<u32>,
}

impl AlleleWindows {
    pub(crate) fn contains(&self, kmer: u64) -> bool {
        self.kmers.contains(&kmer)
    }

    /// Windows whose every k-mer is absent from `opposite` and rare enough.
    pub(crate) fn candidates(
        &self,
        opposite: &AlleleWindows,
        frequency: Option<&FrequencyIndex>,
        rarity: RarityPolicy,
    ) -> Vec<SignatureWindow> {
        self.windows
            .iter()
            .filter(|window| {
                window.kmers.iter().all(|&kmer| {
                    if opposite.contains(kmer) {
                        return false;
                    }
                    match frequency {
                        Some(index) => {
                            let local = self.local.get(&kmer).copied().unwrap_or(0);
                            rarity.admits(index.query(kmer), local)
                        }
                        None => true,
                    }
                })
            })
            .cloned()
            .collect()
    }
}

#[derive(Debug, Default)]
struct WindowSlot {
    kmers: Vec<u64>,
    nodes: Vec<NodeId>,
}

/// Sink grouping spanning windows of one allele node by offset.
#[derive(Debug)]
pub(crate) struct WindowCollector {
    allele: NodeId,
    k: usize,
    reverse: bool,
    slots: HashMap<i64, WindowSlot>,
    local: KmerMap<u32>,
}

impl WindowCollector {
    pub(crate) fn new(allele: NodeId, k: usize, reverse: bool) -> Self {
        Self {
            allele,
            k,
            reverse,
            slots: HashMap::new(),
            local: HashMap::with_hasher(kmer_hasher()),
        }
    }

    fn forms(&self, kmer: u64) -> impl Iterator<Item = u64> {
        let rc = reverse_complement(kmer, self.k);
        let extra = (self.reverse && rc != kmer).then_some(rc);
        std::iter::once(kmer).chain(extra)
    }

    /// Freeze into offset-ordered windows, scoring them against `frequency`.
    pub(crate) fn finish(
        self,
        allele_len: usize,
        frequency: Option<&FrequencyIndex>,
    ) -> AlleleWindows {
        let mut kmers = kmer_set();
        let mut offsets: Vec<i64> = self.slots.keys().copied().collect();
        offsets.sort_unstable();
        let k = self.k as i64;
        let len = allele_len as i64;

        let mut windows = Vec::with_capacity(offsets.len());
        for offset in offsets {
            let Some(slot) = self.slots.get(&offset) else {
                continue;
            };
            let mut forms: Vec<u64> = Vec::with_capacity(slot.kmers.len() * 2);
            for &kmer in &slot.kmers {
                for form in self.forms(kmer) {
                    if !forms.contains(&form) {
                        forms.push(form);
                    }
                }
            }
            kmers.extend(forms.iter().copied());
            let max_frequency = frequency
                .map(|index| forms.iter().map(|&kmer| index.query(kmer)).max().unwrap_or(0))
                .unwrap_or(0);
            let mut nodes = slot.nodes.clone();
            nodes.sort_unstable();
            windows.push(SignatureWindow {
                offset,
                overhang: offset + k - len,
                kmers: forms,
                nodes,
                max_frequency,
                centre_distance: (2 * offset + k - len).abs(),
            });
        }

        AlleleWindows {
            windows,
            kmers,
            local: self.local,
        }
    }
}

impl KmerSink for WindowCollector {
    fn window(&mut self, kmer: u64, hits: &[NodeHit]) {
        let Some(hit) = hits.iter().find(|hit| hit.node == self.allele) else {
            return;
        };
        // same unit as the frequency index: one per attributed node
        let records = u32::try_from(hits.len()).unwrap_or(u32::MAX);
        let rc = reverse_complement(kmer, self.k);
        let slot = self.local.entry(kmer).or_insert(0);
        *slot = slot.saturating_add(records);
        if self.reverse && rc != kmer {
            let slot = self.local.entry(rc).or_insert(0);
            *slot = slot.saturating_add(records);
        }

        let slot = self.slots.entry(hit.offset).or_default();
        if !slot.kmers.contains(&kmer) {
            slot.kmers.push(kmer);
        }
        for hit in hits {
            if !slot.nodes.contains(&hit.node) {
                slot.nodes.push(hit.node);
            }
        }
    }
}
