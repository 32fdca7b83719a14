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
//! In-memory retrieval index: documents, chunks, and a dense embedding matrix.
//!
//! The three coupled structures (ordered chunk ids, chunk map, matrix) live in
//! one immutable [`Corpus`] snapshot. Writers build the next snapshot off to
//! the side and publish it with a single pointer swap, so every search sees a
//! state that is entirely before or entirely after any add or clear.
//!
//! The matrix is rebuilt from the full ordered sequence on every add. That is
//! O(corpus size) per add and is the scalability ceiling of this index.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use ndarray::{Array1, Array2, ArrayView1};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::api::config::IndexConfig;
use crate::api::embedder::{l2_norm, Embedder};
use crate::api::error::RagError;
use crate::api::hybrid_search::{
    cosine_scores, lexical_overlap, rank_candidates, word_set, HybridWeights, SearchResult,
};
use crate::api::text_chunker::chunk_text;

/// Content-addressed document id: SHA-256 hex of the raw bytes.
pub fn content_id(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub filename: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub chunk_ids: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Chunk {
    pub id: String,
    pub document_id: String,
    pub filename: String,
    pub content: String,
    pub embedding: Vec<f32>,
    terms: HashSet<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSummary {
    pub document_id: String,
    pub filename: String,
    pub chunk_count: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub document_count: usize,
    pub chunk_count: usize,
    pub dimension: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddDocumentResult {
    pub document_id: String,
    pub chunk_count: usize,
}

/// One published state of the index. Never mutated after publication.
#[derive(Debug, Clone)]
struct Corpus {
    documents: Vec<Arc<Document>>,
    chunks: HashMap<String, Arc<Chunk>>,
    /// Row `i` of `matrix` is the embedding of `order[i]`.
    order: Vec<String>,
    matrix: Array2<f32>,
    row_norms: Array1<f32>,
}

impl Corpus {
    fn empty(dimension: usize) -> Self {
        Self {
            documents: Vec::new(),
            chunks: HashMap::new(),
            order: Vec::new(),
            matrix: Array2::zeros((0, dimension)),
            row_norms: Array1::zeros(0),
        }
    }

    fn contains_document(&self, id: &str) -> bool {
        self.documents.iter().any(|doc| doc.id == id)
    }

    /// Chunks already owned by entries with this id, so a re-added id keeps
    /// chunk ids unique.
    fn next_sequence(&self, id: &str) -> usize {
        self.documents.iter().filter(|doc| doc.id == id).map(|doc| doc.chunk_ids.len()).sum()
    }

    fn chunk(&self, id: &str) -> Result<&Arc<Chunk>, RagError> {
        self.chunks
            .get(id)
            .ok_or_else(|| RagError::Internal(format!("chunk {} missing from chunk map", id)))
    }

    fn rebuild_matrix(&mut self, dimension: usize) -> Result<(), RagError> {
        let rows: Vec<&[f32]> = self
            .order
            .iter()
            .map(|id| self.chunk(id).map(|chunk| chunk.embedding.as_slice()))
            .collect::<Result<_, _>>()?;

        if let Some(bad) = rows.iter().find(|row| row.len() != dimension) {
            return Err(RagError::Internal(format!(
                "embedding has {} dims, expected {}",
                bad.len(),
                dimension
            )));
        }

        let matrix = Array2::from_shape_fn((rows.len(), dimension), |(r, c)| rows[r][c]);
        let row_norms: Array1<f32> = rows.iter().map(|row| l2_norm(row)).collect();
        self.matrix = matrix;
        self.row_norms = row_norms;
        Ok(())
    }
}

/// Thread-safe retrieval index. Share it behind an `Arc` between handlers.
pub struct RetrievalIndex {
    config: IndexConfig,
    embedder: Embedder,
    weights: HybridWeights,
    snapshot: RwLock<Arc<Corpus>>,
    /// Serializes writers; readers never take it.
    writer: Mutex<()>,
}

impl Default for RetrievalIndex {
    fn default() -> Self {
        Self::build(IndexConfig::default())
    }
}

impl RetrievalIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: IndexConfig) -> Result<Self, RagError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: IndexConfig) -> Self {
        let embedder = Embedder::from_config(&config);
        let weights = HybridWeights::from(&config);
        let snapshot = RwLock::new(Arc::new(Corpus::empty(embedder.dimension())));
        Self { config, embedder, weights, snapshot, writer: Mutex::new(()) }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn embedder(&self) -> &Embedder {
        &self.embedder
    }

    fn current(&self) -> Arc<Corpus> {
        Arc::clone(&self.snapshot.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn publish(&self, corpus: Corpus) {
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(corpus);
    }

    /// Chunk, embed and index `text` as a new document.
    ///
    /// No deduplication: re-adding an existing id creates a second, independent
    /// entry. Use [`add_document_if_absent`](Self::add_document_if_absent) to
    /// skip known ids.
    pub fn add_document(
        &self,
        id: &str,
        filename: &str,
        text: &str,
    ) -> Result<AddDocumentResult, RagError> {
        let pieces = self.prepare(text);
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.current();
        self.insert(&current, id, filename, text, pieces)
    }

    /// Like [`add_document`](Self::add_document), but returns `Ok(None)` without
    /// indexing if a document with `id` already exists. The check and the
    /// insert are atomic with respect to other writers. A known id returns
    /// before any chunking or embedding work.
    pub fn add_document_if_absent(
        &self,
        id: &str,
        filename: &str,
        text: &str,
    ) -> Result<Option<AddDocumentResult>, RagError> {
        if self.current().contains_document(id) {
            debug!("[index] Document {} already indexed, skipping", id);
            return Ok(None);
        }

        let pieces = self.prepare(text);
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.current();
        // Another writer may have added it while this one was embedding
        if current.contains_document(id) {
            debug!("[index] Document {} indexed concurrently, skipping", id);
            return Ok(None);
        }
        self.insert(&current, id, filename, text, pieces).map(Some)
    }

    /// Chunking and embedding are pure, so they run before the writer lock is taken.
    fn prepare(&self, text: &str) -> Vec<(String, Vec<f32>)> {
        chunk_text(text, self.config.chunk_size, self.config.chunk_overlap)
            .into_iter()
            .map(|content| {
                let embedding = self.embedder.embed(&content);
                (content, embedding)
            })
            .collect()
    }

    fn insert(
        &self,
        current: &Corpus,
        id: &str,
        filename: &str,
        text: &str,
        pieces: Vec<(String, Vec<f32>)>,
    ) -> Result<AddDocumentResult, RagError> {
        let mut next = current.clone();
        let first_seq = current.next_sequence(id);
        let mut chunk_ids = Vec::with_capacity(pieces.len());

        for (offset, (content, embedding)) in pieces.into_iter().enumerate() {
            let chunk_id = format!("{}_{}", id, first_seq + offset);
            let chunk = Chunk {
                id: chunk_id.clone(),
                document_id: id.to_string(),
                filename: filename.to_string(),
                terms: word_set(&content),
                content,
                embedding,
            };
            next.chunks.insert(chunk_id.clone(), Arc::new(chunk));
            next.order.push(chunk_id.clone());
            chunk_ids.push(chunk_id);
        }

        let chunk_count = chunk_ids.len();
        next.documents.push(Arc::new(Document {
            id: id.to_string(),
            filename: filename.to_string(),
            text: text.to_string(),
            created_at: Utc::now(),
            chunk_ids,
        }));
        next.rebuild_matrix(self.embedder.dimension())?;

        let total_chunks = next.order.len();
        self.publish(next);
        info!(
            "[index] Added document {} ({}) with {} chunks, corpus now {} chunks",
            id, filename, chunk_count, total_chunks
        );
        Ok(AddDocumentResult { document_id: id.to_string(), chunk_count })
    }

    /// Rank every chunk by `vector_weight * cosine + keyword_weight * overlap`.
    ///
    /// Returns at most `top_k` results in descending score order (ties by
    /// ascending chunk id), then drops those scoring below `threshold`.
    pub fn search(
        &self,
        query: &str,
        top_k: usize,
        threshold: f64,
    ) -> Result<Vec<SearchResult>, RagError> {
        if top_k < 1 {
            warn!("[search] Rejected top_k={}", top_k);
            return Err(RagError::InvalidQuery(format!("top_k must be >= 1, got {}", top_k)));
        }
        if !threshold.is_finite() || threshold < 0.0 {
            warn!("[search] Rejected threshold={}", threshold);
            return Err(RagError::InvalidQuery(format!(
                "threshold must be a non-negative number, got {}",
                threshold
            )));
        }

        let corpus = self.current();
        if corpus.order.is_empty() {
            debug!("[search] Empty corpus");
            return Ok(vec![]);
        }

        let query_embedding = self.embedder.embed(query);
        let query_norm = l2_norm(&query_embedding);
        if query_norm == 0.0 {
            debug!("[search] Query produced a zero vector");
            return Ok(vec![]);
        }

        let similarities = cosine_scores(
            &corpus.matrix,
            &corpus.row_norms,
            ArrayView1::from(&query_embedding[..]),
            query_norm,
        );
        let query_words = word_set(query);

        let mut candidates: Vec<(f64, &str)> = Vec::with_capacity(corpus.order.len());
        for (chunk_id, cosine) in corpus.order.iter().zip(similarities) {
            let chunk = corpus.chunk(chunk_id)?;
            let overlap = lexical_overlap(&query_words, &chunk.terms);
            candidates.push((self.weights.combine(cosine, overlap), chunk_id.as_str()));
        }

        rank_candidates(&mut candidates);
        candidates.truncate(top_k);

        let mut results = Vec::with_capacity(candidates.len());
        for (score, chunk_id) in candidates {
            if score < threshold {
                continue;
            }
            if let Some(chunk) = corpus.chunks.get(chunk_id) {
                results.push(SearchResult {
                    chunk_id: chunk.id.clone(),
                    content: chunk.content.clone(),
                    similarity: score,
                    filename: chunk.filename.clone(),
                    document_id: chunk.document_id.clone(),
                });
            }
        }

        debug!(
            "[search] {} of {} chunks returned (top_k={}, threshold={})",
            results.len(),
            corpus.order.len(),
            top_k,
            threshold
        );
        Ok(results)
    }

    /// Document summaries in insertion order.
    pub fn list_documents(&self) -> Vec<DocumentSummary> {
        self.current().documents.iter()
            .map(|doc| DocumentSummary {
                document_id: doc.id.clone(),
                filename: doc.filename.clone(),
                chunk_count: doc.chunk_ids.len(),
                created_at: doc.created_at,
            })
            .collect()
    }

    pub fn contains_document(&self, id: &str) -> bool {
        self.current().contains_document(id)
    }

    /// Chunk texts of every entry with this id, in sequence order.
    pub fn document_chunks(&self, id: &str) -> Vec<String> {
        let corpus = self.current();
        corpus.documents.iter()
            .filter(|doc| doc.id == id)
            .flat_map(|doc| doc.chunk_ids.iter())
            .filter_map(|chunk_id| corpus.chunks.get(chunk_id))
            .map(|chunk| chunk.content.clone())
            .collect()
    }

    pub fn stats(&self) -> IndexStats {
        let corpus = self.current();
        IndexStats {
            document_count: corpus.documents.len(),
            chunk_count: corpus.order.len(),
            dimension: self.embedder.dimension(),
        }
    }

    /// Drop every document, chunk and matrix row in one swap.
    pub fn clear(&self) {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.publish(Corpus::empty(self.embedder.dimension()));
        info!("[index] All documents and chunks cleared");
    }
}
