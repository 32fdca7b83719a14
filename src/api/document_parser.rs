// Copyright 2025 mobile_rag_engine contributors
// SPDX-License-Identifier: MIT
//
// Document-to-Text (DTT) module: PDF, DOCX and plain-text extraction

use once_cell::sync::Lazy;
use regex::Regex;

use crate::api::error::RagError;

const MAX_FILE_SIZE: usize = 50 * 1024 * 1024; // 50MB

static HYPHEN_END_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+)-\s*$").expect("hyphen-end regex"));
static WORD_START_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\w+)").expect("word-start regex"));
static INLINE_HYPHEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+)-\s*[\r\n]+\s*([a-z]\w*)").expect("inline-hyphen regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Turns an uploaded file into plain text for indexing.
pub trait TextExtractor: Send + Sync {
    /// Returns `UnsupportedFileType` or `ExtractionFailure` on failure; never
    /// returns error text in place of document text.
    fn extract(&self, filename: &str, bytes: &[u8]) -> Result<String, RagError>;
}

/// Extension-dispatching extractor for `.pdf`, `.docx`, `.txt` and `.md`.
#[derive(Debug, Clone)]
pub struct DocumentParser {
    max_file_size: usize,
}

impl Default for DocumentParser {
    fn default() -> Self {
        Self { max_file_size: MAX_FILE_SIZE }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentKind {
    Pdf,
    Docx,
    PlainText,
}

impl DocumentKind {
    fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "docx" => Some(DocumentKind::Docx),
            "txt" | "md" => Some(DocumentKind::PlainText),
            _ => None,
        }
    }
}

impl DocumentParser {
    pub fn with_max_file_size(max_file_size: usize) -> Self {
        Self { max_file_size }
    }
}

impl TextExtractor for DocumentParser {
    fn extract(&self, filename: &str, bytes: &[u8]) -> Result<String, RagError> {
        let kind = DocumentKind::from_filename(filename)
            .ok_or_else(|| RagError::UnsupportedFileType(filename.to_string()))?;

        if bytes.len() > self.max_file_size {
            return Err(RagError::ExtractionFailure(format!(
                "File too large ({} bytes). Maximum supported size is {} bytes.",
                bytes.len(),
                self.max_file_size
            )));
        }

        match kind {
            DocumentKind::Pdf => extract_text_from_pdf(bytes),
            DocumentKind::Docx => extract_text_from_docx(bytes),
            DocumentKind::PlainText => extract_text_from_plain(bytes),
        }
    }
}

/// Remove page number from the end of a page text (if present)
/// Only removes if the last non-empty line is purely numeric
fn remove_trailing_page_number(page_text: &str) -> String {
    let lines: Vec<&str> = page_text.lines().collect();
    if lines.is_empty() {
        return page_text.to_string();
    }

    let mut last_content_idx = lines.len() - 1;
    while last_content_idx > 0 && lines[last_content_idx].trim().is_empty() {
        last_content_idx -= 1;
    }

    let last_line = lines[last_content_idx].trim();
    if !last_line.is_empty() && last_line.chars().all(|c| c.is_ascii_digit()) {
        let mut result: Vec<&str> = lines[..last_content_idx].to_vec();
        result.extend_from_slice(&lines[last_content_idx + 1..]);
        result.join("\n")
    } else {
        page_text.to_string()
    }
}

/// Join pages, rejoining a word hyphenated across a page boundary
/// ("hyphen-" + "ated" -> "hyphenated"), then normalize whitespace.
fn join_pages(pages: Vec<String>) -> String {
    let mut result = String::new();

    for (i, page) in pages.iter().map(|p| remove_trailing_page_number(p)).enumerate() {
        if i == 0 {
            result = page;
            continue;
        }

        let trimmed_len = result.trim_end().len();
        let hyphen_start = HYPHEN_END_RE
            .captures(&result[..trimmed_len])
            .map(|caps| (caps[0].len(), caps[1].to_string()));
        let page_trimmed = page.trim_start();
        let next_word = WORD_START_RE.captures(page_trimmed);

        if let (Some((match_len, head)), Some(next_caps)) = (hyphen_start, next_word) {
            result.truncate(trimmed_len - match_len);
            result.push_str(&head);
            result.push_str(&next_caps[1]);
            result.push_str(&page_trimmed[next_caps[0].len()..]);
            continue;
        }

        result.push(' ');
        result.push_str(&page);
    }

    // In-line hyphenation: only join word- + newline + lowercase continuation,
    // so compounds like "user-facing" survive.
    let dehyphenated = INLINE_HYPHEN_RE.replace_all(&result, "$1$2");
    WHITESPACE_RE.replace_all(&dehyphenated, " ").trim().to_string()
}

/// Extract text content from a PDF file (bytes)
/// Uses page-by-page extraction for safe page number removal and hyphenation handling
fn extract_text_from_pdf(bytes: &[u8]) -> Result<String, RagError> {
    if !bytes.starts_with(b"%PDF") {
        return Err(RagError::ExtractionFailure("missing %PDF header".to_string()));
    }
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| RagError::ExtractionFailure(format!("PDF extraction failed: {:?}", e)))?;
    Ok(join_pages(pages))
}

fn extract_text_from_docx(bytes: &[u8]) -> Result<String, RagError> {
    if !bytes.starts_with(b"PK") {
        return Err(RagError::ExtractionFailure("not a DOCX (ZIP) archive".to_string()));
    }
    docx_lite::extract_text_from_bytes(bytes)
        .map_err(|e| RagError::ExtractionFailure(format!("DOCX extraction failed: {}", e)))
}

fn extract_text_from_plain(bytes: &[u8]) -> Result<String, RagError> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| RagError::ExtractionFailure(format!("Text is not valid UTF-8: {}", e)))
}
