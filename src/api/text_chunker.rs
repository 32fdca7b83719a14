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
//! Paragraph-first text chunking with sentence fallback for oversized paragraphs.

/// Split text into retrievable chunks.
///
/// Strategy:
/// 1. Text shorter than `chunk_size` is returned as-is, as a single chunk
/// 2. Otherwise split by double newlines (\n\n) - paragraph boundaries - and
///    greedily pack paragraphs while the buffer stays under `chunk_size`
/// 3. A paragraph longer than `chunk_size` is split at sentence ends
///    (`.`, `!`, `?` followed by whitespace) and packed the same way
///
/// Lengths are counted in characters. `chunk_size` is a soft limit: a single
/// sentence longer than it becomes its own chunk.
///
/// `_overlap` is accepted for API compatibility; chunks never share text.
pub fn chunk_text(text: &str, chunk_size: usize, _overlap: usize) -> Vec<String> {
    if text.is_empty() {
        return vec![];
    }
    if char_len(text) < chunk_size {
        return vec![text.to_string()];
    }

    let mut chunks = ChunkBuffer::default();

    for para in text.split("\n\n") {
        let para_len = char_len(para);
        if chunks.buffer_len + para_len < chunk_size {
            chunks.append(para, "\n\n");
            continue;
        }

        chunks.flush();
        if para_len > chunk_size {
            for sentence in split_sentences(para) {
                if chunks.buffer_len + char_len(sentence) >= chunk_size {
                    chunks.flush();
                }
                chunks.append(sentence, " ");
            }
        } else {
            chunks.append(para, "\n\n");
        }
    }

    chunks.finish()
}

/// Running buffer plus the chunks flushed so far.
#[derive(Default)]
struct ChunkBuffer {
    chunks: Vec<String>,
    buffer: String,
    buffer_len: usize,
}

impl ChunkBuffer {
    fn append(&mut self, piece: &str, separator: &str) {
        self.buffer.push_str(piece);
        self.buffer.push_str(separator);
        self.buffer_len += char_len(piece) + char_len(separator);
    }

    fn flush(&mut self) {
        let trimmed = self.buffer.trim();
        if !trimmed.is_empty() {
            self.chunks.push(trimmed.to_string());
        }
        self.buffer.clear();
        self.buffer_len = 0;
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.chunks
    }
}

/// Split at sentence ends: `.`, `!` or `?` followed by whitespace.
/// The whitespace run after the terminator is dropped.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if !matches!(ch, '.' | '!' | '?') {
            continue;
        }
        let end = idx + ch.len_utf8();
        let mut resume = end;
        while let Some(&(ws_idx, ws)) = chars.peek() {
            if !ws.is_whitespace() {
                break;
            }
            resume = ws_idx + ws.len_utf8();
            chars.next();
        }
        if resume > end {
            sentences.push(&text[start..end]);
            start = resume;
        }
    }

    sentences.push(&text[start..]);
    sentences
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text() {
        assert!(chunk_text("", 100, 20).is_empty());
    }

    #[test]
    fn test_short_text_returned_unmodified() {
        let text = "  The quick brown fox.\n\n";
        assert_eq!(chunk_text(text, 1000, 200), vec![text.to_string()]);
    }

    #[test]
    fn test_paragraphs_are_packed_greedily() {
        let para = "a".repeat(30);
        let text = format!("{para}\n\n{para}\n\n{para}");
        let chunks = chunk_text(&text, 70, 0);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], format!("{para}\n\n{para}"));
        assert_eq!(chunks[1], para);
    }

    #[test]
    fn test_long_paragraph_splits_at_sentences() {
        let sentence = format!("{}.", "word ".repeat(8).trim_end());
        let para = vec![sentence.as_str(); 6].join(" ");
        let chunks = chunk_text(&para, 100, 0);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.ends_with('.'), "chunk should end at a sentence: {chunk}");
            assert!(chunk.chars().count() < 100);
        }
        assert_eq!(chunks.join(" "), para);
    }

    #[test]
    fn test_overlap_is_inert() {
        let para = "b".repeat(40);
        let text = format!("{para}\n\n{para}\n\n{para}");
        assert_eq!(chunk_text(&text, 50, 0), chunk_text(&text, 50, 25));
    }

    #[test]
    fn test_chunk_size_counts_characters() {
        // 10 chars, 20+ bytes
        let text = "가나다라마바사아자차";
        assert_eq!(chunk_text(text, 11, 0), vec![text.to_string()]);
    }

    #[test]
    fn test_split_sentences() {
        let sentences = split_sentences("One. Two!  Three? Four");
        assert_eq!(sentences, vec!["One.", "Two!", "Three?", "Four"]);
        assert_eq!(split_sentences("v1.2 is out."), vec!["v1.2 is out."]);
    }

    #[test]
    fn test_blank_paragraphs_are_not_emitted() {
        let para = "c".repeat(45);
        let text = format!("{para}\n\n\n\n\n\n{para}");
        let chunks = chunk_text(&text, 50, 0);
        assert!(chunks.iter().all(|c| !c.is_empty()));
        assert_eq!(chunks.len(), 2);
    }
}
