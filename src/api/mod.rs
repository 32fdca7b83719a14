// Copyright 2025 mobile_rag_engine contributors
// SPDX-License-Identifier: MIT

pub mod config;
pub mod error;
pub mod logger;
pub mod text_chunker;
pub mod embedder;
pub mod hybrid_search;
pub mod retrieval_index;
pub mod document_parser;
pub mod answer_prompt;
pub mod rag_service;
