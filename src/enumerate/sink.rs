use super::KmerRecord;
use crate::graph::NodeId;

/// One node covered by a k-mer window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHit {
    /// Covered node.
    pub node: NodeId,
    /// Distance from the node's first base to the window's first base.
    pub offset: i64,
}

/// Consumer of enumerated k-mer windows.
///
/// `window` is called once per window occurrence. `hits` lists the attributed
/// nodes in path order; the node holding the first base always comes first.
pub trait KmerSink {
    /// Receive one window.
    fn window(&mut self, kmer: u64, hits: &[NodeHit]);
}

impl KmerSink for Vec<KmerRecord> {
    fn window(&mut self, kmer: u64, hits: &[NodeHit]) {
        self.extend(hits.iter().map(|hit| KmerRecord {
            kmer,
            node: hit.node,
            offset: hit.offset,
        }));
    }
}

/// Sink that only counts windows and records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountingSink {
    /// Window occurrences seen.
    pub windows: usize,
    /// Records that would have been produced.
    pub records: usize,
}

impl KmerSink for CountingSink {
    fn window(&mut self, _kmer: u64, hits: &[NodeHit]) {
        self.windows += 1;
        self.records += hits.len();
    }
}

impl<S: KmerSink + ?Sized> KmerSink for &mut S {
    fn window(&mut self, kmer: u64, hits: &[NodeHit]) {
        (**self).window(kmer, hits);
    }
}
