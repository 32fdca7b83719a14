// Copyright 2025 mobile_rag_engine contributors
// SPDX-License-Identifier: MIT
//
// Licensed under the MIT License. You may obtain a copy of the License at
// https://opensource.org/licenses/MIT
//
// This software is provided "AS IS", without warranty of any kind, express or
// implied, including but not limited to the warranties of merchantability,
// fitness for a particular purpose, and noninfringement. In no event shall the
// authors or copyright holders be liable for any claim, damages, or other
// liability arising from the use of this software.
//
//! Tunables for chunking, embedding and hybrid ranking.

use serde::{Deserialize, Serialize};

use crate::api::error::RagError;

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;
pub const DEFAULT_DIMENSION: usize = 384;
pub const DEFAULT_MAX_WORDS: usize = 50;
pub const DEFAULT_SPREAD_SLOTS: usize = 5;
pub const DEFAULT_SPREAD_STRIDE: usize = 77;
pub const DEFAULT_TOP_K: usize = 5;

/// Index configuration.
///
/// Every field has a default, so a host may deserialize a partial config
/// (e.g. only `chunk_size`) and get the rest from [`IndexConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Soft upper bound on chunk length, in characters.
    pub chunk_size: usize,
    /// Accepted and carried through to the chunker, which currently ignores it.
    pub chunk_overlap: usize,
    /// Embedding dimension shared by every vector in the corpus.
    pub dimension: usize,
    /// Only the first `max_words` words of a text contribute to its embedding.
    pub max_words: usize,
    /// Number of slots each word is spread across.
    pub spread_slots: usize,
    /// Distance between consecutive spread slots, taken modulo `dimension`.
    pub spread_stride: usize,
    /// Weight of cosine similarity in the hybrid score.
    pub vector_weight: f64,
    /// Weight of lexical overlap in the hybrid score.
    pub keyword_weight: f64,
    /// Result count used by question answering.
    pub default_top_k: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            dimension: DEFAULT_DIMENSION,
            max_words: DEFAULT_MAX_WORDS,
            spread_slots: DEFAULT_SPREAD_SLOTS,
            spread_stride: DEFAULT_SPREAD_STRIDE,
            vector_weight: 0.7,
            keyword_weight: 0.3,
            default_top_k: DEFAULT_TOP_K,
        }
    }
}

impl IndexConfig {
    pub fn validate(&self) -> Result<(), RagError> {
        if self.dimension == 0 {
            return Err(RagError::InvalidConfig("dimension must be >= 1".to_string()));
        }
        if self.chunk_size == 0 {
            return Err(RagError::InvalidConfig("chunk_size must be >= 1".to_string()));
        }
        if self.max_words == 0 {
            return Err(RagError::InvalidConfig("max_words must be >= 1".to_string()));
        }
        if self.spread_slots == 0 {
            return Err(RagError::InvalidConfig("spread_slots must be >= 1".to_string()));
        }
        if self.default_top_k == 0 {
            return Err(RagError::InvalidConfig("default_top_k must be >= 1".to_string()));
        }
        let weights = [
            ("vector_weight", self.vector_weight),
            ("keyword_weight", self.keyword_weight),
        ];
        for (name, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(RagError::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = IndexConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.dimension, 384);
        assert_eq!(config.chunk_size, 1000);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: IndexConfig = serde_json::from_str(r#"{"chunk_size": 250}"#).unwrap();
        assert_eq!(config.chunk_size, 250);
        assert_eq!(config.dimension, DEFAULT_DIMENSION);
        assert!((config.vector_weight - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn test_validate_rejects_zero_dimension() {
        let config = IndexConfig { dimension: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(RagError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_nan_weight() {
        let config = IndexConfig { keyword_weight: f64::NAN, ..Default::default() };
        assert!(matches!(config.validate(), Err(RagError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_zero_max_words() {
        let config = IndexConfig { max_words: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(RagError::InvalidConfig(_))));
    }

    #[test]
    fn test_huge_spread_stride_is_accepted() {
        let config: IndexConfig =
            serde_json::from_str(r#"{"spread_stride": 18446744073709551615}"#).unwrap();
        assert_eq!(config.spread_stride, usize::MAX);
        assert!(config.validate().is_ok());
    }
}
