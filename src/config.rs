//! Validated enumeration parameters.

use thiserror::Error;

use crate::encoding::{kmer_mask, MAX_K};

/// Invalid caller-supplied parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// `k` outside `1..=MAX_K`.
    #[error("k={k} is outside the supported range 1..={max}")]
    KmerLength {
        /// Requested k.
        k: i64,
        /// Largest supported k.
        max: usize,
    },

    /// Negative cap on non-reference nodes.
    #[error("max_variant_nodes must be non-negative (got {0})")]
    NegativeVariantCap(i64),
}

/// Which nodes a k-mer window is reported against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Attribution {
    /// One record per node on the path covered by the window.
    #[default]
    PathNodes,
    /// One record per window, against the node holding its first base.
    OriginNode,
}

/// Parameters shared by enumeration, indexing and signature search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KmerConfig {
    k: usize,
    max_variant_nodes: usize,
    attribution: Attribution,
}

impl KmerConfig {
    /// Validate `k` and build a configuration with path attribution.
    pub fn new(k: usize, max_variant_nodes: usize) -> Result<Self, ConfigError> {
        if k == 0 || k > MAX_K {
            return Err(ConfigError::KmerLength {
                k: k as i64,
                max: MAX_K,
            });
        }
        Ok(Self {
            k,
            max_variant_nodes,
            attribution: Attribution::default(),
        })
    }

    /// Validate signed parameters arriving from a foreign boundary.
    pub fn from_signed(k: i64, max_variant_nodes: i64) -> Result<Self, ConfigError> {
        if k <= 0 || k > MAX_K as i64 {
            return Err(ConfigError::KmerLength { k, max: MAX_K });
        }
        if max_variant_nodes < 0 {
            return Err(ConfigError::NegativeVariantCap(max_variant_nodes));
        }
        Self::new(k as usize, max_variant_nodes as usize)
    }

    /// Set how windows are attributed to nodes.
    pub fn with_attribution(mut self, attribution: Attribution) -> Self {
        self.attribution = attribution;
        self
    }

    /// Change the non-reference node cap.
    pub fn with_max_variant_nodes(mut self, max_variant_nodes: usize) -> Self {
        self.max_variant_nodes = max_variant_nodes;
        self
    }

    /// K-mer length.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Maximum number of non-reference nodes a window's path may include.
    pub fn max_variant_nodes(&self) -> usize {
        self.max_variant_nodes
    }

    /// Attribution mode.
    pub fn attribution(&self) -> Attribution {
        self.attribution
    }

    /// Mask for the `2k`-bit k-mer register.
    pub fn mask(&self) -> u64 {
        kmer_mask(self.k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_k() {
        assert!(matches!(
            KmerConfig::new(0, 1),
            Err(ConfigError::KmerLength { k: 0, .. })
        ));
        assert!(KmerConfig::new(MAX_K + 1, 1).is_err());
        assert_eq!(KmerConfig::new(MAX_K, 0).unwrap().k(), 31);
    }

    #[test]
    fn signed_boundary_rejects_negative_cap() {
        assert_eq!(
            KmerConfig::from_signed(5, -1),
            Err(ConfigError::NegativeVariantCap(-1))
        );
        assert!(matches!(
            KmerConfig::from_signed(-3, 0),
            Err(ConfigError::KmerLength { k: -3, .. })
        ));
        let config = KmerConfig::from_signed(3, 0).unwrap();
        assert_eq!(config.max_variant_nodes(), 0);
        assert_eq!(config.mask(), 0b111111);
    }

    #[test]
    fn attribution_defaults_to_path_nodes() {
        let config = KmerConfig::new(4, 2).unwrap();
        assert_eq!(config.attribution(), Attribution::PathNodes);
        let origin = config.with_attribution(Attribution::OriginNode);
        assert_eq!(origin.attribution(), Attribution::OriginNode);
    }
}
