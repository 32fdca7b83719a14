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
//! Deterministic hashed bag-of-words embeddings (no model required).
//!
//! Each of the first `max_words` lower-cased words is hashed with 32-bit
//! FNV-1a over its UTF-8 bytes, and its position weight `1 / (1 + 0.1 * i)`
//! is added to `spread_slots` slots spaced `spread_stride` apart. The result
//! is unit-normalized unless it is the zero vector.

use crate::api::config::IndexConfig;

const FNV_OFFSET_BASIS: u32 = 0x811c9dc5;
const FNV_PRIME: u32 = 0x01000193;

/// 32-bit FNV-1a hash over the UTF-8 bytes of `word`.
pub fn fnv1a_32(word: &str) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in word.bytes() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Embedder {
    dimension: usize,
    max_words: usize,
    spread_slots: usize,
    spread_stride: usize,
}

impl Default for Embedder {
    fn default() -> Self {
        Self::from_config(&IndexConfig::default())
    }
}

impl Embedder {
    pub fn from_config(config: &IndexConfig) -> Self {
        let dimension = config.dimension.max(1);
        Self {
            dimension,
            max_words: config.max_words,
            spread_slots: config.spread_slots,
            spread_stride: config.spread_stride % dimension,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Embed `text` into a `dimension`-length vector.
    ///
    /// Identical input always yields a bit-identical vector. Empty or
    /// whitespace-only text yields the all-zero vector.
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimension];
        let lowered = text.trim().to_lowercase();

        for (i, word) in lowered.split_whitespace().take(self.max_words).enumerate() {
            let base_slot = fnv1a_32(word) as usize % self.dimension;
            let position_weight = 1.0 / (1.0 + 0.1 * i as f32);

            // stride < dimension, so the step never overflows
            let mut slot = base_slot;
            for _ in 0..self.spread_slots {
                embedding[slot] += position_weight;
                slot = (slot + self.spread_stride) % self.dimension;
            }
        }

        let norm = l2_norm(&embedding);
        if norm > 0.0 {
            for x in embedding.iter_mut() {
                *x /= norm;
            }
        }
        embedding
    }
}

pub(crate) fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}
