mod common;

use std::collections::BTreeSet;

use common::{bubble_chain, diamond, dna, init_tracing, path_text, BubbleChain};
use proptest::prelude::*;
use test_case::test_case;
use varsig::enumerate::CountingSink;
use varsig::{
    build_graph, decode_kmer, encode_kmer, Attribution, KmerConfig, KmerEnumerator, KmerRecord,
    NodeId, SequenceGraph,
};

type Triple = (u64, NodeId, i64);

/// Brute-force records: every window of every source-to-sink path, attributed
/// to each node it covers, kept when the covered nodes hold at most `cap`
/// non-reference nodes.
fn oracle(chain: &BubbleChain, graph: &SequenceGraph, k: usize, cap: usize) -> BTreeSet<Triple> {
    let mut expected = BTreeSet::new();
    for path in chain.paths() {
        let (text, starts) = path_text(graph, &path);
        if text.len() < k {
            continue;
        }
        for ws in 0..=text.len() - k {
            let kmer = encode_kmer(text[ws..ws + k].as_bytes()).expect("path text is dna");
            let covered: Vec<(NodeId, usize)> = path
                .iter()
                .zip(&starts)
                .filter(|(&node, &start)| {
                    let len = graph.node_len(node);
                    if len > 0 {
                        start < ws + k && start + len > ws
                    } else {
                        ws < start && start < ws + k
                    }
                })
                .map(|(&node, &start)| (node, start))
                .collect();
            let variants = covered
                .iter()
                .filter(|(node, _)| !graph.is_reference(*node))
                .count();
            if variants > cap {
                continue;
            }
            for (node, start) in covered {
                expected.insert((kmer, node, ws as i64 - start as i64));
            }
        }
    }
    expected
}

fn triples(records: &[KmerRecord]) -> BTreeSet<Triple> {
    records.iter().map(|r| (r.kmer, r.node, r.offset)).collect()
}

fn chain_graph(pieces: &[&str]) -> SequenceGraph {
    let edges: Vec<Vec<NodeId>> = (1..pieces.len()).map(|next| vec![next as NodeId]).collect();
    build_graph(pieces, &edges, None).expect("chain is valid")
}

#[test_case(3, &["ACGTACGT"] ; "single node")]
#[test_case(3, &["AC", "GT", "ACGT"] ; "short nodes")]
#[test_case(4, &["A", "", "C", "G", "", "TTA"] ; "empty waypoints")]
#[test_case(5, &["ACG"] ; "shorter than k")]
#[test_case(31, &["ACGTACGTACGTACGTACGTACGTACGTACGTACGT", "GATTACA"] ; "widest k")]
#[test_case(1, &["AC", "", "GT"] ; "unit k")]
fn linear_chain_yields_one_window_per_position(k: usize, pieces: &[&str]) {
    init_tracing();
    let graph = chain_graph(pieces);
    let total = graph.total_sequence_len();
    let expected = if total >= k { total - k + 1 } else { 0 };

    let config = KmerConfig::new(k, 0).expect("k in range");
    let mut counter = CountingSink::default();
    KmerEnumerator::new(&graph, config).enumerate_into(&mut counter);
    assert_eq!(counter.windows, expected);

    let origin_only = config.with_attribution(Attribution::OriginNode);
    assert_eq!(KmerEnumerator::new(&graph, origin_only).enumerate().len(), expected);
}

#[test]
fn single_node_record_count_is_linear() {
    let graph = chain_graph(&["ACGTTGCAAC"]);
    let config = KmerConfig::new(4, 0).expect("k in range");
    assert_eq!(KmerEnumerator::new(&graph, config).enumerate().len(), 10 - 4 + 1);
}

#[test]
fn variant_cap_restricts_traversal_to_reference_branch() {
    init_tracing();
    let graph = diamond();
    let strict = KmerEnumerator::new(&graph, KmerConfig::new(3, 0).expect("valid")).enumerate();
    let relaxed = KmerEnumerator::new(&graph, KmerConfig::new(3, 1).expect("valid")).enumerate();
    assert!(strict.len() < relaxed.len());
    assert!(strict.iter().all(|r| r.node != 2));
    assert!(relaxed.iter().any(|r| r.node == 2));

    let from_first: Vec<String> = strict
        .iter()
        .filter(|r| r.node == 0 && r.offset == 2)
        .map(|r| decode_kmer(r.kmer, 3))
        .collect();
    assert_eq!(from_first, vec!["TGA"]);
}

#[test]
fn multi_word_nodes_are_read_across_words() {
    let long: String = "ACGGT".repeat(20);
    let graph = chain_graph(&[long.as_str(), "TTTTT", long.as_str()]);
    let k = 31;
    let config = KmerConfig::new(k, 0).expect("k in range");
    let records = KmerEnumerator::new(&graph, config).enumerate();

    let text = format!("{long}TTTTT{long}");
    let starts = [0usize, 100, 105];
    for record in &records {
        let start = (starts[record.node as usize] as i64 + record.offset) as usize;
        assert_eq!(decode_kmer(record.kmer, k), &text[start..start + k]);
    }
    let windows: BTreeSet<usize> = records
        .iter()
        .map(|r| (starts[r.node as usize] as i64 + r.offset) as usize)
        .collect();
    assert_eq!(windows.len(), text.len() - k + 1);
}

#[test]
fn compaction_preserves_window_multiset() {
    let graph = build_graph(
        &["ACG", "T", "TG", "", "CAT", "GG", "A", "CCA"],
        &[vec![1], vec![2, 3], vec![4], vec![4], vec![5], vec![6, 7], vec![], vec![]],
        None,
    )
    .expect("valid graph");
    let compacted = graph.compact();
    assert!(compacted.graph.len() < graph.len());

    let config = KmerConfig::new(4, 8)
        .expect("valid")
        .with_attribution(Attribution::OriginNode);
    let mut before: Vec<u64> = KmerEnumerator::new(&graph, config)
        .enumerate()
        .iter()
        .map(|r| r.kmer)
        .collect();
    let mut after: Vec<u64> = KmerEnumerator::new(&compacted.graph, config)
        .enumerate()
        .iter()
        .map(|r| r.kmer)
        .collect();
    before.sort_unstable();
    after.sort_unstable();
    assert_eq!(before, after);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn records_match_brute_force_paths(chain in bubble_chain(), k in 1usize..6, cap in 0usize..3) {
        let graph = chain.graph();
        let config = KmerConfig::new(k, cap).expect("k in range");
        let records = KmerEnumerator::new(&graph, config).enumerate();
        prop_assert_eq!(triples(&records), oracle(&chain, &graph, k, cap));
    }

    #[test]
    fn every_record_is_rederivable_from_its_node(chain in bubble_chain(), k in 2usize..6) {
        let graph = chain.graph();
        let config = KmerConfig::new(k, graph.len()).expect("k in range");
        for record in KmerEnumerator::new(&graph, config).enumerate() {
            let text = graph.decode_node(record.node).expect("record node exists");
            // bases of the window that fall inside the attributed node
            let from = record.offset.max(0) as usize;
            let to = ((record.offset + k as i64).min(text.len() as i64)).max(0) as usize;
            if from < to {
                let window = decode_kmer(record.kmer, k);
                let inner = &window[(from as i64 - record.offset) as usize..(to as i64 - record.offset) as usize];
                prop_assert_eq!(inner, &text[from..to]);
            }
        }
    }

    #[test]
    fn raising_a_saturated_cap_changes_nothing(chain in bubble_chain(), k in 1usize..6, extra in 1usize..4) {
        let graph = chain.graph();
        let saturated = graph.len() - graph.reference_count();
        let at_cap = KmerEnumerator::new(&graph, KmerConfig::new(k, saturated).expect("valid")).enumerate();
        let above = KmerEnumerator::new(&graph, KmerConfig::new(k, saturated + extra).expect("valid")).enumerate();
        prop_assert_eq!(at_cap, above);
    }

    #[test]
    fn parallel_matches_sequential(chain in bubble_chain(), k in 1usize..6) {
        let graph = chain.graph();
        let enumerator = KmerEnumerator::new(&graph, KmerConfig::new(k, 1).expect("valid"));
        prop_assert_eq!(enumerator.enumerate(), enumerator.par_enumerate());
    }

    #[test]
    fn spanning_search_agrees_with_full_enumeration(chain in bubble_chain(), k in 1usize..6) {
        let graph = chain.graph();
        let enumerator = KmerEnumerator::new(&graph, KmerConfig::new(k, 2).expect("valid"));
        let all = enumerator.enumerate();
        for node in graph.node_ids() {
            let mut spanning = Vec::new();
            enumerator.enumerate_spanning(node, &mut spanning).expect("node exists");
            let mut expected: Vec<KmerRecord> = all.iter().copied().filter(|r| r.node == node).collect();
            let mut found: Vec<KmerRecord> = spanning.into_iter().filter(|r| r.node == node).collect();
            expected.sort();
            found.sort();
            prop_assert_eq!(found, expected);
        }
    }

    #[test]
    fn single_node_linear_count(text in dna(0..120), k in 1usize..32) {
        let graph = chain_graph(&[text.as_str()]);
        let records = KmerEnumerator::new(&graph, KmerConfig::new(k, 0).expect("valid")).enumerate();
        let expected = if text.len() >= k { text.len() - k + 1 } else { 0 };
        prop_assert_eq!(records.len(), expected);
    }
}
