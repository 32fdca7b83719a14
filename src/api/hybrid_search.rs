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
//! Hybrid Search: weighted cosine similarity + lexical word overlap.

use std::cmp::Ordering;
use std::collections::HashSet;

use ndarray::{Array1, Array2, ArrayView1};
use serde::Serialize;

use crate::api::config::IndexConfig;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub chunk_id: String,
    pub content: String,
    /// Combined hybrid score, not raw cosine.
    pub similarity: f64,
    pub filename: String,
    pub document_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HybridWeights {
    pub vector_weight: f64,
    pub keyword_weight: f64,
}

impl Default for HybridWeights {
    fn default() -> Self {
        Self { vector_weight: 0.7, keyword_weight: 0.3 }
    }
}

impl From<&IndexConfig> for HybridWeights {
    fn from(config: &IndexConfig) -> Self {
        Self { vector_weight: config.vector_weight, keyword_weight: config.keyword_weight }
    }
}

impl HybridWeights {
    pub fn combine(&self, cosine: f64, overlap: f64) -> f64 {
        self.vector_weight * cosine + self.keyword_weight * overlap
    }
}

/// Lower-cased whitespace-separated words of `text`, deduplicated.
pub fn word_set(text: &str) -> HashSet<String> {
    text.to_lowercase().split_whitespace().map(str::to_string).collect()
}

/// |query ∩ chunk| / max(|query|, 1). An empty query word set scores 0.
pub fn lexical_overlap(query_words: &HashSet<String>, chunk_words: &HashSet<String>) -> f64 {
    let matches = query_words.intersection(chunk_words).count();
    matches as f64 / query_words.len().max(1) as f64
}

/// Cosine similarity of `query` against every row of `matrix`.
///
/// `row_norms[i]` must be the L2 norm of row `i`. Zero-norm rows, or a
/// zero-norm query, score 0 rather than NaN.
pub fn cosine_scores(
    matrix: &Array2<f32>,
    row_norms: &Array1<f32>,
    query: ArrayView1<f32>,
    query_norm: f32,
) -> Vec<f64> {
    let dots = matrix.dot(&query);
    dots.iter()
        .zip(row_norms.iter())
        .map(|(&dot, &norm)| {
            if norm == 0.0 || query_norm == 0.0 {
                0.0
            } else {
                (dot / (norm * query_norm)) as f64
            }
        })
        .collect()
}

/// Sort by score descending, breaking ties by ascending chunk id.
pub fn rank_candidates(candidates: &mut [(f64, &str)]) {
    candidates.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.1.cmp(b.1))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    #[test]
    fn test_default_weights() {
        let weights = HybridWeights::default();
        assert!((weights.combine(1.0, 1.0) - 1.0).abs() < 1e-12);
        assert!((weights.combine(0.5, 0.0) - 0.35).abs() < 1e-12);
    }

    #[test]
    fn test_lexical_overlap() {
        let query = word_set("Quick FOX");
        let chunk = word_set("the quick brown fox jumps");
        assert!((lexical_overlap(&query, &chunk) - 1.0).abs() < 1e-12);

        let query = word_set("quick cat");
        assert!((lexical_overlap(&query, &chunk) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_lexical_overlap_empty_query() {
        assert_eq!(lexical_overlap(&HashSet::new(), &word_set("anything")), 0.0);
    }

    #[test]
    fn test_cosine_scores_zero_query_is_zero() {
        let matrix = arr2(&[[1.0f32, 0.0], [0.6, 0.8]]);
        let norms = arr1(&[1.0f32, 1.0]);
        let query = arr1(&[0.0f32, 0.0]);
        assert_eq!(cosine_scores(&matrix, &norms, query.view(), 0.0), vec![0.0, 0.0]);
    }

    #[test]
    fn test_cosine_scores_handles_zero_rows() {
        let matrix = arr2(&[[1.0f32, 0.0], [0.0, 0.0], [0.6, 0.8]]);
        let norms = arr1(&[1.0f32, 0.0, 1.0]);
        let query = arr1(&[1.0f32, 0.0]);
        let scores = cosine_scores(&matrix, &norms, query.view(), 1.0);

        assert_eq!(scores.len(), 3);
        assert!((scores[0] - 1.0).abs() < 1e-6);
        assert_eq!(scores[1], 0.0);
        assert!((scores[2] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_rank_candidates_breaks_ties_by_chunk_id() {
        let mut candidates = vec![(0.5, "b_0"), (0.9, "z_0"), (0.5, "a_1"), (0.5, "a_0")];
        rank_candidates(&mut candidates);
        let order: Vec<&str> = candidates.iter().map(|c| c.1).collect();
        assert_eq!(order, vec!["z_0", "a_0", "a_1", "b_0"]);
    }
}
