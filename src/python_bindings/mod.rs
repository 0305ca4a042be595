//! Python bindings that expose graph construction, k-mer indexing and
//! signature search via PyO3.
use std::sync::Arc;

use pyo3::{exceptions::PyValueError, prelude::*, types::PyModule};

use crate::config::KmerConfig;
use crate::encoding::encode_kmer;
use crate::enumerate::KmerEnumerator;
use crate::frequency::FrequencyIndex;
use crate::graph::{build_graph, NodeId, SequenceGraph};
use crate::index::{create_kmer_index, KmerIndex};
use crate::signature::{find_variant_signatures, SignatureOptions};

fn value_error(err: impl std::fmt::Display) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// Immutable sequence graph.
#[pyclass(name = "Graph")]
#[derive(Debug, Clone)]
pub struct PyGraph {
    inner: Arc<SequenceGraph>,
}

#[pymethods]
impl PyGraph {
    #[new]
    #[pyo3(signature = (sequences, edges, reference_nodes=None))]
    /// Build a graph from node sequences and per-node successor lists.
    ///
    /// Args:
    ///     sequences: Nucleotide text per node (empty string for deletions).
    ///     edges: `edges[i]` lists the successors of node `i`.
    ///     reference_nodes: Reference node ids; all nodes when omitted.
    pub fn new(
        sequences: Vec<String>,
        edges: Vec<Vec<NodeId>>,
        reference_nodes: Option<Vec<NodeId>>,
    ) -> PyResult<Self> {
        let graph =
            build_graph(&sequences, &edges, reference_nodes.as_deref()).map_err(value_error)?;
        Ok(Self {
            inner: Arc::new(graph),
        })
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    /// Decoded sequence of one node.
    pub fn node_sequence(&self, node: NodeId) -> PyResult<String> {
        self.inner.decode_node(node).map_err(value_error)
    }

    /// Merge unbranching chains; returns the new graph and the old-to-new id map.
    pub fn compact(&self) -> (PyGraph, Vec<NodeId>) {
        let compaction = self.inner.compact();
        (
            PyGraph {
                inner: Arc::new(compaction.graph),
            },
            compaction.id_map,
        )
    }
}

/// Exact k-mer counts.
#[pyclass(name = "FrequencyIndex")]
#[derive(Debug, Clone)]
pub struct PyFrequencyIndex {
    inner: FrequencyIndex,
}

#[pymethods]
impl PyFrequencyIndex {
    #[new]
    /// Count a list of k-mer values.
    pub fn new(kmers: Vec<u64>) -> Self {
        Self {
            inner: FrequencyIndex::par_build(&kmers),
        }
    }

    /// Occurrences of one k-mer.
    pub fn query(&self, kmer: u64) -> u32 {
        self.inner.query(kmer)
    }

    /// Occurrences of each k-mer in order.
    pub fn query_many(&self, kmers: Vec<u64>) -> Vec<u32> {
        self.inner.query_many(&kmers)
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }
}

/// Signature search bound to one graph and k.
#[pyclass(name = "KmerFinder")]
#[derive(Debug)]
pub struct PyKmerFinder {
    graph: Arc<SequenceGraph>,
    k: i64,
    reverse_kmers: bool,
    frequency: Option<FrequencyIndex>,
}

impl PyKmerFinder {
    fn config(&self, max_variant_nodes: i64) -> PyResult<KmerConfig> {
        KmerConfig::from_signed(self.k, max_variant_nodes).map_err(value_error)
    }
}

#[pymethods]
impl PyKmerFinder {
    #[new]
    #[pyo3(signature = (graph, k, reverse_kmers=false))]
    /// Create a finder over `graph` for k-mers of length `k`.
    pub fn new(graph: PyRef<'_, PyGraph>, k: i64, reverse_kmers: bool) -> PyResult<Self> {
        KmerConfig::from_signed(k, 0).map_err(value_error)?;
        Ok(Self {
            graph: Arc::clone(&graph.inner),
            k,
            reverse_kmers,
            frequency: None,
        })
    }

    /// Use an externally built frequency index for rarity checks.
    pub fn set_frequency_index(&mut self, index: PyRef<'_, PyFrequencyIndex>) {
        self.frequency = Some(index.inner.clone());
    }

    #[pyo3(signature = (max_variant_nodes=4))]
    /// Count every window of the graph and use the counts for rarity checks.
    pub fn create_frequency_index(&mut self, max_variant_nodes: i64) -> PyResult<usize> {
        let config = self.config(max_variant_nodes)?;
        let index = FrequencyIndex::from_graph(&self.graph, config);
        let distinct = index.len();
        self.frequency = Some(index);
        Ok(distinct)
    }

    #[pyo3(signature = (node, max_variant_nodes=4))]
    /// K-mers overlapping `node` as parallel `(kmers, nodes)` lists.
    pub fn find_kmers_spanning_node(
        &self,
        node: NodeId,
        max_variant_nodes: i64,
    ) -> PyResult<(Vec<u64>, Vec<NodeId>)> {
        let config = self.config(max_variant_nodes)?;
        let mut index = KmerIndex::new();
        KmerEnumerator::new(&self.graph, config)
            .enumerate_spanning(node, &mut index)
            .map_err(value_error)?;
        Ok((index.kmers, index.nodes))
    }

    #[pyo3(signature = (ref_nodes, var_nodes, max_variant_nodes=4, align_windows=false, minimize_overlaps=false))]
    /// Signatures for each `(ref_nodes[i], var_nodes[i])` pair.
    ///
    /// Returns:
    ///     `(ref_signatures, var_signatures)`, one k-mer list per variant.
    pub fn find_variant_signatures(
        &self,
        py: Python<'_>,
        ref_nodes: Vec<NodeId>,
        var_nodes: Vec<NodeId>,
        max_variant_nodes: i64,
        align_windows: bool,
        minimize_overlaps: bool,
    ) -> PyResult<(Vec<Vec<u64>>, Vec<Vec<u64>>)> {
        let config = self.config(max_variant_nodes)?;
        let options = SignatureOptions::default()
            .with_reverse_kmers(self.reverse_kmers)
            .with_align_windows(align_windows)
            .with_minimize_overlaps(minimize_overlaps)
            .with_fail_fast(true);
        let batch = py
            .allow_threads(|| {
                find_variant_signatures(
                    &self.graph,
                    &ref_nodes,
                    &var_nodes,
                    config,
                    self.frequency.as_ref(),
                    options,
                )
            })
            .map_err(value_error)?;

        let mut reference = Vec::with_capacity(batch.len());
        let mut alternate = Vec::with_capacity(batch.len());
        for result in batch.into_results() {
            let signature = result.map_err(value_error)?;
            reference.push(signature.reference);
            alternate.push(signature.alternate);
        }
        Ok((reference, alternate))
    }
}

/// Enumerate every k-mer of `graph` as parallel `(kmers, nodes)` lists.
#[pyfunction(name = "create_kmer_index")]
#[pyo3(signature = (graph, k, max_variant_nodes=4))]
pub fn create_kmer_index_py(
    py: Python<'_>,
    graph: PyRef<'_, PyGraph>,
    k: i64,
    max_variant_nodes: i64,
) -> PyResult<(Vec<u64>, Vec<NodeId>)> {
    let config = KmerConfig::from_signed(k, max_variant_nodes).map_err(value_error)?;
    let inner = Arc::clone(&graph.inner);
    let index = py.allow_threads(|| create_kmer_index(&inner, config));
    Ok((index.kmers, index.nodes))
}

/// Pack k-mer text into its integer value.
#[pyfunction]
pub fn hash_kmer(kmer: &str) -> PyResult<u64> {
    encode_kmer(kmer.as_bytes()).map_err(value_error)
}

/// Create Python module.
#[pymodule]
pub fn varsig(_py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyGraph>()?;
    m.add_class::<PyFrequencyIndex>()?;
    m.add_class::<PyKmerFinder>()?;
    m.add_function(wrap_pyfunction!(create_kmer_index_py, m)?)?;
    m.add_function(wrap_pyfunction!(hash_kmer, m)?)?;
    Ok(())
}
