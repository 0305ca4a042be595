use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::selection::{OverlapLedger, RankedSelection, SelectionStrategy};
use super::windows::{AlleleWindows, SignatureWindow, WindowCollector};
use super::{SignatureBatch, SignatureError, SignatureOptions, Variant, VariantSignature};
use crate::config::{Attribution, KmerConfig};
use crate::enumerate::KmerEnumerator;
use crate::frequency::FrequencyIndex;
use crate::graph::{GraphError, NodeId, SequenceGraph};

/// Qualifying windows of one variant, before selection.
#[derive(Debug)]
enum Candidates {
    Independent {
        reference: Vec<SignatureWindow>,
        alternate: Vec<SignatureWindow>,
    },
    Aligned {
        pairs: Vec<(SignatureWindow, SignatureWindow)>,
        merged: Vec<SignatureWindow>,
    },
}

/// Signature search over a shared graph and optional frequency index.
///
/// Discovery of candidate windows runs per variant in parallel; selection then
/// walks the batch in order so overlap avoidance sees earlier choices.
#[derive(Debug, Clone)]
pub struct VariantSignatureFinder<'a, S = RankedSelection> {
    graph: &'a SequenceGraph,
    config: KmerConfig,
    frequency: Option<&'a FrequencyIndex>,
    options: SignatureOptions,
    strategy: S,
}

impl<'a> VariantSignatureFinder<'a> {
    /// Finder with default options and [`RankedSelection`].
    pub fn new(graph: &'a SequenceGraph, config: KmerConfig) -> Self {
        Self {
            graph,
            // Window grouping needs every node a window covers.
            config: config.with_attribution(Attribution::PathNodes),
            frequency: None,
            options: SignatureOptions::default(),
            strategy: RankedSelection,
        }
    }
}

impl<'a, S: SelectionStrategy> VariantSignatureFinder<'a, S> {
    /// Require genome-wide rarity against `index`.
    pub fn with_frequency_index(mut self, index: &'a FrequencyIndex) -> Self {
        self.frequency = Some(index);
        self
    }

    /// Replace the search options.
    pub fn with_options(mut self, options: SignatureOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the selection strategy.
    pub fn with_strategy<T: SelectionStrategy>(self, strategy: T) -> VariantSignatureFinder<'a, T> {
        VariantSignatureFinder {
            graph: self.graph,
            config: self.config,
            frequency: self.frequency,
            options: self.options,
            strategy,
        }
    }

    /// Active options.
    pub fn options(&self) -> &SignatureOptions {
        &self.options
    }

    /// Signature of a single variant.
    pub fn find_one(&self, variant: Variant) -> Result<VariantSignature, SignatureError> {
        let candidates = self.discover(0, variant)?;
        Ok(self.select(candidates, &mut OverlapLedger::new()))
    }

    /// Signatures of a batch, one outcome per variant in input order.
    ///
    /// Invalid variants are reported in place unless `fail_fast` is set, in
    /// which case the first one aborts the batch.
    pub fn find(&self, variants: &[Variant]) -> Result<SignatureBatch, SignatureError> {
        let discovered: Vec<Result<Candidates, SignatureError>> = variants
            .par_iter()
            .enumerate()
            .map(|(index, &variant)| self.discover(index, variant))
            .collect();

        if self.options.fail_fast {
            if let Some(err) = discovered.iter().find_map(|result| result.as_ref().err()) {
                return Err(err.clone());
            }
        }

        let mut ledger = OverlapLedger::new();
        let results: Vec<Result<VariantSignature, SignatureError>> = discovered
            .into_iter()
            .map(|result| {
                result
                    .map(|candidates| self.select(candidates, &mut ledger))
                    .inspect_err(|err| warn!(%err, "skipping variant"))
            })
            .collect();

        let batch = SignatureBatch::new(results);
        info!(
            variants = batch.len(),
            failed = batch.failures().count(),
            empty = batch.signatures().filter(|(_, sig)| sig.is_empty()).count(),
            "variant signature search finished"
        );
        Ok(batch)
    }

    fn allele_windows(&self, allele: NodeId) -> Result<AlleleWindows, GraphError> {
        let mut collector =
            WindowCollector::new(allele, self.config.k(), self.options.reverse_kmers);
        KmerEnumerator::new(self.graph, self.config).enumerate_spanning(allele, &mut collector)?;
        Ok(collector.finish(self.graph.node_len(allele), self.frequency))
    }

    fn discover(&self, index: usize, variant: Variant) -> Result<Candidates, SignatureError> {
        let invalid = |source| SignatureError::InvalidVariant { index, source };
        let reference = self.allele_windows(variant.reference).map_err(invalid)?;
        let alternate = self.allele_windows(variant.alternate).map_err(invalid)?;

        let rarity = self.options.rarity;
        let reference_only = reference.candidates(&alternate, self.frequency, rarity);
        let alternate_only = alternate.candidates(&reference, self.frequency, rarity);
        debug!(
            index,
            reference = variant.reference,
            alternate = variant.alternate,
            reference_windows = reference.windows.len(),
            alternate_windows = alternate.windows.len(),
            reference_candidates = reference_only.len(),
            alternate_candidates = alternate_only.len(),
            "discovered candidate windows"
        );

        if !self.options.align_windows {
            return Ok(Candidates::Independent {
                reference: reference_only,
                alternate: alternate_only,
            });
        }

        let mut pairs = Vec::new();
        for reference in &reference_only {
            for alternate in &alternate_only {
                if reference.offset == alternate.offset || reference.overhang == alternate.overhang
                {
                    pairs.push((reference.clone(), alternate.clone()));
                }
            }
        }
        let merged = pairs
            .iter()
            .map(|(reference, alternate)| SignatureWindow::pair(reference, alternate))
            .collect();
        Ok(Candidates::Aligned { pairs, merged })
    }

    fn select(&self, candidates: Candidates, ledger: &mut OverlapLedger) -> VariantSignature {
        match candidates {
            Candidates::Independent {
                reference,
                alternate,
            } => {
                let chosen_reference = self
                    .strategy
                    .select(&reference, ledger, &self.options)
                    .and_then(|idx| reference.get(idx));
                let chosen_alternate = self
                    .strategy
                    .select(&alternate, ledger, &self.options)
                    .and_then(|idx| alternate.get(idx));
                for window in chosen_reference.iter().chain(chosen_alternate.iter()) {
                    ledger.claim(window);
                }
                VariantSignature {
                    reference: chosen_reference.map(|w| w.kmers.clone()).unwrap_or_default(),
                    alternate: chosen_alternate.map(|w| w.kmers.clone()).unwrap_or_default(),
                }
            }
            Candidates::Aligned { pairs, merged } => {
                let chosen = self
                    .strategy
                    .select(&merged, ledger, &self.options)
                    .and_then(|idx| Some((pairs.get(idx)?, merged.get(idx)?)));
                match chosen {
                    Some(((reference, alternate), combined)) => {
                        ledger.claim(combined);
                        VariantSignature {
                            reference: reference.kmers.clone(),
                            alternate: alternate.kmers.clone(),
                        }
                    }
                    None => VariantSignature::default(),
                }
            }
        }
    }
}

/// Batch signature search over parallel reference/alternate node lists.
pub fn find_variant_signatures(
    graph: &SequenceGraph,
    reference_nodes: &[NodeId],
    alternate_nodes: &[NodeId],
    config: KmerConfig,
    frequency: Option<&FrequencyIndex>,
    options: SignatureOptions,
) -> Result<SignatureBatch, SignatureError> {
    if reference_nodes.len() != alternate_nodes.len() {
        return Err(SignatureError::LengthMismatch {
            reference: reference_nodes.len(),
            alternate: alternate_nodes.len(),
        });
    }
    let variants: Vec<Variant> = reference_nodes
        .iter()
        .zip(alternate_nodes)
        .map(|(&reference, &alternate)| Variant::new(reference, alternate))
        .collect();

    let mut finder = VariantSignatureFinder::new(graph, config).with_options(options);
    if let Some(index) = frequency {
        finder = finder.with_frequency_index(index);
    }
    finder.find(&variants)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::encode_kmer;
    use crate::graph::build_graph;

    fn diamond() -> SequenceGraph {
        build_graph(
            &["ACTG", "A", "G", "CCCC"],
            &[vec![1, 2], vec![3], vec![3], vec![]],
            Some(&[0, 1, 3]),
        )
        .unwrap()
    }

    #[test]
    fn branch_signature_distinguishes_alleles() {
        let graph = diamond();
        let config = KmerConfig::new(3, 1).unwrap();
        let signature = VariantSignatureFinder::new(&graph, config)
            .find_one(Variant::new(1, 2))
            .unwrap();
        assert_eq!(signature.reference, vec![encode_kmer(b"TGA").unwrap()]);
        assert_eq!(signature.alternate, vec![encode_kmer(b"TGG").unwrap()]);
    }

    #[test]
    fn invalid_variant_is_reported_in_place() {
        let graph = diamond();
        let config = KmerConfig::new(3, 1).unwrap();
        let batch = VariantSignatureFinder::new(&graph, config)
            .find(&[Variant::new(1, 2), Variant::new(1, 9)])
            .unwrap();
        assert!(batch.results()[0].is_ok());
        assert_eq!(
            batch.results()[1],
            Err(SignatureError::InvalidVariant {
                index: 1,
                source: GraphError::NodeOutOfRange {
                    node: 9,
                    node_count: 4
                }
            })
        );
    }

    #[test]
    fn mismatched_lists_are_rejected() {
        let graph = diamond();
        let config = KmerConfig::new(3, 1).unwrap();
        let err = find_variant_signatures(
            &graph,
            &[1, 1],
            &[2],
            config,
            None,
            SignatureOptions::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            SignatureError::LengthMismatch {
                reference: 2,
                alternate: 1
            }
        );
    }
}
