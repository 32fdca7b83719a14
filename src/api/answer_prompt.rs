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
//! LLM prompt assembly from ranked search results.

use serde::Serialize;

use crate::api::error::RagError;
use crate::api::hybrid_search::SearchResult;

pub const GROUNDED_SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant. Use the provided context from uploaded documents to answer the user's question. If the answer is not in the context, say so.";

pub const UNGROUNDED_SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant. The user hasn't uploaded any documents yet, so answer their question directly.";

/// Everything the answer-generation service receives for one question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub system_prompt: String,
    /// Empty when no document matched.
    pub context: String,
    pub query: String,
}

impl GenerationRequest {
    /// User message: the context block followed by the question, or the bare
    /// question when there is no context.
    pub fn user_prompt(&self) -> String {
        if self.context.is_empty() {
            self.query.clone()
        } else {
            format!("Context from documents:\n{}\n\nQuestion: {}", self.context, self.query)
        }
    }
}

/// External large-language-model call.
pub trait AnswerGenerator: Send + Sync {
    fn generate(&self, request: &GenerationRequest) -> Result<String, RagError>;
}

impl<F> AnswerGenerator for F
where
    F: Fn(&GenerationRequest) -> Result<String, RagError> + Send + Sync,
{
    fn generate(&self, request: &GenerationRequest) -> Result<String, RagError> {
        self(request)
    }
}

/// `Source: <filename>\nContent: <content>` per result, in ranked order,
/// separated by blank lines.
pub fn build_context(results: &[SearchResult]) -> String {
    results.iter()
        .map(|r| format!("Source: {}\nContent: {}", r.filename, r.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_request(query: &str, results: &[SearchResult]) -> GenerationRequest {
    let context = build_context(results);
    let system_prompt = if context.is_empty() {
        UNGROUNDED_SYSTEM_PROMPT
    } else {
        GROUNDED_SYSTEM_PROMPT
    };
    GenerationRequest {
        system_prompt: system_prompt.to_string(),
        context,
        query: query.to_string(),
    }
}
