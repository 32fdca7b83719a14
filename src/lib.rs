// Copyright 2025 mobile_rag_engine contributors
// SPDX-License-Identifier: MIT

//! Retrieval core for a document chat backend: chunking, deterministic
//! hashed embeddings, and a hybrid (cosine + word overlap) in-memory index.

pub mod api;

pub use api::config::IndexConfig;
pub use api::error::RagError;
pub use api::hybrid_search::SearchResult;
pub use api::retrieval_index::{DocumentSummary, IndexStats, RetrievalIndex};
pub use api::rag_service::RagService;
