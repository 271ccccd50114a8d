//! Text splitting for the knowledge base.
//!
//! Splits a document into overlapping chunks, preferring paragraph breaks,
//! then line breaks, then spaces, and finally single characters. Sizes are
//! measured in Unicode scalar values.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;

/// Configuration for the splitter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitterConfig {
    /// Maximum chunk size in characters
    pub chunk_size: usize,
    /// Overlap between neighbouring chunks
    pub chunk_overlap: usize,
    /// Separators tried in order; the empty string splits into characters
    pub separators: Vec<String>,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 150,
            separators: ["\n\n", "\n", " ", ""].iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// A text chunk with source information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChunk {
    /// The text content
    pub text: String,
    /// Source identifier (file name)
    pub source: String,
    /// Byte offset in the original document
    pub start_offset: usize,
    /// Chunk index within the source
    pub chunk_index: usize,
}

/// Recursive character splitter.
pub struct RAGEngine {
    config: SplitterConfig,
}

impl RAGEngine {
    pub fn new(config: SplitterConfig) -> Result<Self, ApiError> {
        if config.chunk_size == 0 {
            return Err(ApiError::Config("chunk_size must be positive".to_string()));
        }
        if config.chunk_overlap >= config.chunk_size {
            return Err(ApiError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }
        Ok(Self { config })
    }

    pub fn with_sizes(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ApiError> {
        Self::new(SplitterConfig {
            chunk_size,
            chunk_overlap,
            ..Default::default()
        })
    }

    pub fn config(&self) -> &SplitterConfig {
        &self.config
    }

    /// Split a document into chunks tagged with `source`.
    pub fn collect_from_text(&self, text: &str, source: &str) -> Vec<TextChunk> {
        self.split_with_offsets(text)
            .into_iter()
            .enumerate()
            .map(|(chunk_index, (start_offset, text))| TextChunk {
                text,
                source: source.to_string(),
                start_offset,
                chunk_index,
            })
            .collect()
    }

    /// Split text into trimmed, non-empty chunk strings.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_with_offsets(text)
            .into_iter()
            .map(|(_, chunk)| chunk)
            .collect()
    }

    fn split_with_offsets(&self, text: &str) -> Vec<(usize, String)> {
        self.split_recursive(text, 0, &self.config.separators)
    }

    /// `base` is the byte offset of `text` in the document.
    fn split_recursive(&self, text: &str, base: usize, separators: &[String]) -> Vec<(usize, String)> {
        let mut final_chunks = Vec::new();

        // First separator present in the text wins; "" always matches.
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut finer: &[String] = &[];
        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = "";
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate.as_str();
                finer = &separators[i + 1..];
                break;
            }
        }

        let mut good_splits: Vec<Span> = Vec::new();
        for (offset, piece) in split_keeping_separator(text, separator) {
            let span = Span {
                start: base + offset,
                text: piece,
            };
            if char_len(piece) < self.config.chunk_size {
                good_splits.push(span);
                continue;
            }

            if !good_splits.is_empty() {
                final_chunks.extend(self.merge_splits(&good_splits));
                good_splits.clear();
            }

            if finer.is_empty() {
                // unsplittable: keep the oversized piece whole
                if let Some(trimmed) = trimmed_span(span.start, piece) {
                    final_chunks.push(trimmed);
                }
            } else {
                final_chunks.extend(self.split_recursive(piece, span.start, finer));
            }
        }

        if !good_splits.is_empty() {
            final_chunks.extend(self.merge_splits(&good_splits));
        }

        final_chunks
    }

    /// Greedily pack small splits into chunks, carrying up to
    /// `chunk_overlap` characters of trailing splits into the next chunk.
    /// The splits are contiguous in the document.
    fn merge_splits(&self, splits: &[Span]) -> Vec<(usize, String)> {
        let chunk_size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;

        let mut docs = Vec::new();
        let mut current: VecDeque<Span> = VecDeque::new();
        let mut total = 0usize;

        for &split in splits {
            let len = char_len(split.text);

            if total + len > chunk_size && !current.is_empty() {
                if total > chunk_size {
                    tracing::warn!(
                        "Created a chunk of size {}, which is longer than the specified {}",
                        total,
                        chunk_size
                    );
                }
                if let Some(doc) = join_splits(&current) {
                    docs.push(doc);
                }

                while total > overlap || (total + len > chunk_size && total > 0) {
                    match current.pop_front() {
                        Some(front) => total -= char_len(front.text),
                        None => break,
                    }
                }
            }

            current.push_back(split);
            total += len;
        }

        if let Some(doc) = join_splits(&current) {
            docs.push(doc);
        }

        docs
    }
}

/// A piece of the document and its byte offset.
#[derive(Debug, Clone, Copy)]
struct Span<'a> {
    start: usize,
    text: &'a str,
}

/// Split on `separator`, attaching each separator to the start of the piece
/// that follows it. Pieces come with their byte offset in `text`. Empty
/// pieces are dropped; an empty separator yields single characters.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<(usize, &'a str)> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| (i, &text[i..i + c.len_utf8()]))
            .collect();
    }

    let mut pieces = Vec::new();
    let mut last = 0;
    for (idx, _) in text.match_indices(separator) {
        pieces.push((last, &text[last..idx]));
        last = idx;
    }
    pieces.push((last, &text[last..]));
    pieces.retain(|(_, piece)| !piece.is_empty());
    pieces
}

fn join_splits(splits: &VecDeque<Span>) -> Option<(usize, String)> {
    let start = splits.front()?.start;
    let joined: String = splits.iter().map(|span| span.text).collect();
    trimmed_span(start, &joined)
}

/// Trims `text` found at `start`, shifting the offset past leading whitespace.
fn trimmed_span(start: usize, text: &str) -> Option<(usize, String)> {
    let leading = text.len() - text.trim_start().len();
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| (start + leading, trimmed.to_string()))
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
