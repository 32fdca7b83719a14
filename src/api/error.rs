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

use thiserror::Error;

/// Structured error type returned by the retrieval engine and its collaborators.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RagError {
    /// Search called with `top_k < 1` or an unusable threshold.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Index configuration that cannot produce a usable corpus.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// The text extractor has no reader for this file type.
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// The text extractor recognised the file but could not read it.
    #[error("Extraction failed: {0}")]
    ExtractionFailure(String),

    /// The answer-generation service returned an error.
    #[error("Generation failed: {0}")]
    GenerationFailure(String),

    /// Internal system error.
    #[error("Internal error: {0}")]
    Internal(String),
}
