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
//! Upload ingestion and question answering on top of a shared [`RetrievalIndex`].

use std::sync::Arc;

use log::{info, warn};
use serde::Serialize;

use crate::api::answer_prompt::{build_request, AnswerGenerator};
use crate::api::document_parser::{DocumentParser, TextExtractor};
use crate::api::error::RagError;
use crate::api::hybrid_search::SearchResult;
use crate::api::retrieval_index::{content_id, DocumentSummary, RetrievalIndex};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IngestStatus {
    Processed { chunk_count: usize },
    AlreadyExists,
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    pub filename: String,
    /// Absent when extraction failed.
    pub document_id: Option<String>,
    #[serde(flatten)]
    pub status: IngestStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<SearchResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentListing {
    pub total_documents: usize,
    pub total_chunks: usize,
    pub documents: Vec<DocumentSummary>,
}

pub struct RagService {
    index: Arc<RetrievalIndex>,
    extractor: Box<dyn TextExtractor>,
    generator: Box<dyn AnswerGenerator>,
}

impl RagService {
    pub fn new(
        index: Arc<RetrievalIndex>,
        extractor: impl TextExtractor + 'static,
        generator: impl AnswerGenerator + 'static,
    ) -> Self {
        Self { index, extractor: Box::new(extractor), generator: Box::new(generator) }
    }

    /// Default index and [`DocumentParser`].
    pub fn with_generator(generator: impl AnswerGenerator + 'static) -> Self {
        Self::new(Arc::new(RetrievalIndex::new()), DocumentParser::default(), generator)
    }

    pub fn index(&self) -> &Arc<RetrievalIndex> {
        &self.index
    }

    /// Extract, then index under the content hash of `bytes` unless that hash
    /// is already present. Extraction failures are reported, never indexed.
    pub fn ingest(&self, filename: &str, bytes: &[u8]) -> IngestReport {
        let text = match self.extractor.extract(filename, bytes) {
            Ok(text) => text,
            Err(e) => {
                warn!("[ingest] {} rejected: {}", filename, e);
                return IngestReport {
                    filename: filename.to_string(),
                    document_id: None,
                    status: IngestStatus::Error { message: e.to_string() },
                };
            }
        };

        let document_id = content_id(bytes);
        let status = match self.index.add_document_if_absent(&document_id, filename, &text) {
            Ok(Some(added)) => IngestStatus::Processed { chunk_count: added.chunk_count },
            Ok(None) => {
                info!("[ingest] {} already indexed as {}", filename, document_id);
                IngestStatus::AlreadyExists
            }
            Err(e) => IngestStatus::Error { message: e.to_string() },
        };

        IngestReport { filename: filename.to_string(), document_id: Some(document_id), status }
    }

    /// Ingest files in order, one report per file.
    pub fn ingest_batch<'a, I>(&self, files: I) -> Vec<IngestReport>
    where
        I: IntoIterator<Item = (&'a str, &'a [u8])>,
    {
        files.into_iter().map(|(filename, bytes)| self.ingest(filename, bytes)).collect()
    }

    /// Retrieve the top `default_top_k` chunks and ask the generator.
    ///
    /// Generator failures are returned as errors, not as answer text.
    pub fn answer(&self, query: &str) -> Result<Answer, RagError> {
        let sources = self.index.search(query, self.index.config().default_top_k, 0.0)?;
        let request = build_request(query, &sources);
        info!("[answer] {} sources in context", sources.len());

        let answer = self.generator.generate(&request).map_err(|e| match e {
            RagError::GenerationFailure(message) => RagError::GenerationFailure(message),
            other => RagError::GenerationFailure(other.to_string()),
        })?;
        Ok(Answer { answer, sources })
    }

    pub fn documents(&self) -> DocumentListing {
        let documents = self.index.list_documents();
        DocumentListing {
            total_documents: documents.len(),
            total_chunks: documents.iter().map(|d| d.chunk_count).sum(),
            documents,
        }
    }

    pub fn clear(&self) {
        self.index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::answer_prompt::{
        GenerationRequest, GROUNDED_SYSTEM_PROMPT, UNGROUNDED_SYSTEM_PROMPT,
    };
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingGenerator {
        requests: Arc<Mutex<Vec<GenerationRequest>>>,
    }

    impl AnswerGenerator for RecordingGenerator {
        fn generate(&self, request: &GenerationRequest) -> Result<String, RagError> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(format!("answered: {}", request.query))
        }
    }

    fn service() -> (RagService, Arc<Mutex<Vec<GenerationRequest>>>) {
        let generator = RecordingGenerator::default();
        let requests = Arc::clone(&generator.requests);
        (RagService::with_generator(generator), requests)
    }

    #[test]
    fn test_ingest_then_duplicate() {
        let (service, _) = service();
        let bytes = b"The quick brown fox jumps over the lazy dog.";

        let first = service.ingest("notes.txt", bytes);
        assert_eq!(first.status, IngestStatus::Processed { chunk_count: 1 });
        assert_eq!(first.document_id, Some(content_id(bytes)));

        let second = service.ingest("copy.txt", bytes);
        assert_eq!(second.status, IngestStatus::AlreadyExists);
        assert_eq!(service.documents().total_documents, 1);
    }

    #[test]
    fn test_failed_extraction_is_not_indexed() {
        let (service, _) = service();
        let report = service.ingest("image.png", b"\x89PNG");
        assert!(matches!(report.status, IngestStatus::Error { .. }));
        assert_eq!(report.document_id, None);

        let report = service.ingest("bad.txt", &[0xff, 0xff]);
        assert!(matches!(report.status, IngestStatus::Error { .. }));
        assert_eq!(service.index().stats().document_count, 0);
    }

    #[test]
    fn test_ingest_batch_reports_each_file() {
        let (service, _) = service();
        let files: Vec<(&str, &[u8])> = vec![
            ("a.txt", &b"alpha content"[..]),
            ("b.md", &b"beta content"[..]),
            ("c.exe", &b"MZ"[..]),
        ];
        let reports = service.ingest_batch(files);
        let names: Vec<&str> = reports.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.md", "c.exe"]);
        assert!(matches!(reports[2].status, IngestStatus::Error { .. }));

        let listing = service.documents();
        assert_eq!(listing.total_documents, 2);
        assert_eq!(listing.total_chunks, 2);
    }

    #[test]
    fn test_answer_uses_ranked_context() {
        let (service, requests) = service();
        service.ingest("fox.txt", b"The quick brown fox jumps over the lazy dog.");

        let answer = service.answer("quick fox").unwrap();
        assert_eq!(answer.answer, "answered: quick fox");
        assert_eq!(answer.sources.len(), 1);
        assert_eq!(answer.sources[0].filename, "fox.txt");

        let recorded = requests.lock().unwrap();
        assert_eq!(recorded[0].system_prompt, GROUNDED_SYSTEM_PROMPT);
        assert!(recorded[0].context.starts_with("Source: fox.txt\nContent: The quick brown fox"));
    }

    #[test]
    fn test_answer_without_documents() {
        let (service, requests) = service();
        let answer = service.answer("hello").unwrap();
        assert!(answer.sources.is_empty());
        assert_eq!(requests.lock().unwrap()[0].system_prompt, UNGROUNDED_SYSTEM_PROMPT);
    }

    #[test]
    fn test_generator_failure_propagates() {
        let service = RagService::with_generator(|_: &GenerationRequest| {
            Err::<String, _>(RagError::Internal("connection refused".to_string()))
        });
        let err = service.answer("anything").unwrap_err();
        assert!(
            matches!(err, RagError::GenerationFailure(ref m) if m.contains("connection refused"))
        );
    }

    #[test]
    fn test_clear_empties_listing() {
        let (service, _) = service();
        service.ingest("a.txt", b"some text");
        service.clear();
        let listing = service.documents();
        assert_eq!(listing.total_documents, 0);
        assert!(listing.documents.is_empty());
        let report = service.ingest("a.txt", b"some text");
        assert_eq!(report.status, IngestStatus::Processed { chunk_count: 1 });
    }

    #[test]
    fn test_report_serialization_shape() {
        let report = IngestReport {
            filename: "a.txt".to_string(),
            document_id: Some("abc".to_string()),
            status: IngestStatus::Processed { chunk_count: 3 },
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json, serde_json::json!({
            "filename": "a.txt",
            "document_id": "abc",
            "status": "processed",
            "chunk_count": 3
        }));

        let exists = IngestReport { status: IngestStatus::AlreadyExists, ..report };
        assert_eq!(serde_json::to_value(&exists).unwrap()["status"], "already_exists");
    }
}
