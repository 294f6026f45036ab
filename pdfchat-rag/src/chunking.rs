//! Document chunking.
//!
//! This module provides the [`Chunker`] trait and [`RecursiveChunker`], which
//! splits page text on a prioritized list of separators (paragraph, line,
//! sentence punctuation, comma, whitespace, hard cut) and merges the pieces
//! back into overlapping windows.

use std::collections::VecDeque;
use std::ops::Range;

use tracing::debug;

use crate::config::{DEFAULT_SEPARATORS, RagConfig};
use crate::document::{DocumentChunk, PageText};

/// A strategy for splitting extracted pages into chunks.
///
/// Implementations never produce a chunk that spans two pages. Chunk
/// positions are assigned in document order across all pages.
pub trait Chunker: Send + Sync {
    /// Split pages into chunks. Returns an empty `Vec` if no page has content.
    fn chunk(&self, pages: &[PageText]) -> Vec<DocumentChunk>;
}

/// A byte range of the text passed to [`RecursiveChunker::split_spans`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSpan {
    /// Inclusive start byte offset.
    pub start: usize,
    /// Exclusive end byte offset.
    pub end: usize,
}

impl TextSpan {
    /// The slice of `text` covered by this span.
    pub fn as_str<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }
}

/// Splits text recursively by a prioritized separator list.
///
/// At each level the first separator that occurs in the text is used. The
/// separator is kept at the start of the piece that follows it. Pieces shorter
/// than `chunk_size` are merged into windows of at most `chunk_size`
/// characters; consecutive windows share up to `chunk_overlap` characters of
/// whole pieces. Pieces that are too long are split again with the remaining
/// separators. The empty separator cuts between characters and always
/// terminates the recursion.
///
/// Lengths are counted in `char`s. Emitted chunks are trimmed and blank
/// chunks are dropped.
///
/// # Example
///
/// ```rust,ignore
/// use pdfchat_rag::RecursiveChunker;
///
/// let chunker = RecursiveChunker::new(500, 50);
/// let chunks = chunker.split_text("The sky is blue.");
/// assert_eq!(chunks, vec!["The sky is blue.".to_string()]);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self::from_config(&RagConfig::default())
    }
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker` with the default separators.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk
    /// * `chunk_overlap`: maximum number of characters shared by consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Create a chunker from the chunking fields of a [`RagConfig`].
    pub fn from_config(config: &RagConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            separators: config.separators.clone(),
        }
    }

    /// Replace the separator list.
    pub fn with_separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.separators = separators.into_iter().map(Into::into).collect();
        self
    }

    /// Split `text` and return the byte ranges of the resulting chunks, in order.
    pub fn split_spans(&self, text: &str) -> Vec<TextSpan> {
        let separators: Vec<&str> = self.separators.iter().map(String::as_str).collect();
        let mut spans = Vec::new();
        self.split_range(text, 0..text.len(), &separators, &mut spans);
        spans
    }

    /// Split `text` into chunk strings.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_spans(text).into_iter().map(|span| span.as_str(text).to_string()).collect()
    }

    fn split_range(
        &self,
        text: &str,
        range: Range<usize>,
        separators: &[&str],
        spans: &mut Vec<TextSpan>,
    ) {
        let segment = &text[range.clone()];
        let (separator, remaining) = pick_separator(segment, separators);

        let mut pending: Vec<Piece> = Vec::new();
        for piece in split_keeping_separator(segment, separator, range.start) {
            if piece.chars < self.chunk_size {
                pending.push(piece);
                continue;
            }
            if !pending.is_empty() {
                self.merge_pieces(text, &pending, spans);
                pending.clear();
            }
            if remaining.is_empty() {
                push_trimmed(text, piece.start..piece.end, spans);
            } else {
                self.split_range(text, piece.start..piece.end, remaining, spans);
            }
        }

        if !pending.is_empty() {
            self.merge_pieces(text, &pending, spans);
        }
    }

    /// Merge contiguous short pieces into overlapping windows.
    fn merge_pieces(&self, text: &str, pieces: &[Piece], spans: &mut Vec<TextSpan>) {
        let mut window: VecDeque<Piece> = VecDeque::new();
        let mut total = 0;

        for &piece in pieces {
            if total + piece.chars > self.chunk_size {
                push_window(text, &window, spans);
                // Keep at most `chunk_overlap` characters, and always leave room for `piece`.
                while total > self.chunk_overlap
                    || (total > 0 && total + piece.chars > self.chunk_size)
                {
                    match window.pop_front() {
                        Some(front) => total -= front.chars,
                        None => break,
                    }
                }
            }
            total += piece.chars;
            window.push_back(piece);
        }

        push_window(text, &window, spans);
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, pages: &[PageText]) -> Vec<DocumentChunk> {
        let mut chunks = Vec::new();
        for page in pages {
            for span in self.split_spans(&page.text) {
                let position = chunks.len();
                chunks.push(DocumentChunk::new(span.as_str(&page.text), page.index, position));
            }
        }
        debug!(page_count = pages.len(), chunk_count = chunks.len(), "split document");
        chunks
    }
}

/// A piece of the text being split: byte range plus length in characters.
#[derive(Debug, Clone, Copy)]
struct Piece {
    start: usize,
    end: usize,
    chars: usize,
}

/// Pick the first separator present in `text`, returning it with the
/// separators that remain for deeper levels.
fn pick_separator<'a, 's>(text: &str, separators: &'a [&'s str]) -> (&'s str, &'a [&'s str]) {
    for (i, separator) in separators.iter().enumerate() {
        if separator.is_empty() {
            return ("", &[]);
        }
        if text.contains(*separator) {
            return (*separator, &separators[i + 1..]);
        }
    }
    (separators.last().copied().unwrap_or(""), &[])
}

/// Split `segment` at `separator`, keeping the separator at the start of the
/// following piece. Offsets are shifted by `base` so pieces index the full text.
fn split_keeping_separator(segment: &str, separator: &str, base: usize) -> Vec<Piece> {
    if separator.is_empty() {
        return segment
            .char_indices()
            .map(|(i, c)| Piece { start: base + i, end: base + i + c.len_utf8(), chars: 1 })
            .collect();
    }

    let piece = |start: usize, end: usize| Piece {
        start: base + start,
        end: base + end,
        chars: segment[start..end].chars().count(),
    };

    let mut pieces = Vec::new();
    let mut start = 0;
    for (pos, _) in segment.match_indices(separator) {
        if pos > start {
            pieces.push(piece(start, pos));
        }
        start = pos;
    }
    if start < segment.len() {
        pieces.push(piece(start, segment.len()));
    }
    pieces
}

fn push_window(text: &str, window: &VecDeque<Piece>, spans: &mut Vec<TextSpan>) {
    if let (Some(first), Some(last)) = (window.front(), window.back()) {
        push_trimmed(text, first.start..last.end, spans);
    }
}

fn push_trimmed(text: &str, range: Range<usize>, spans: &mut Vec<TextSpan>) {
    let slice = &text[range.clone()];
    let trimmed = slice.trim();
    if trimmed.is_empty() {
        return;
    }
    let start = range.start + (slice.len() - slice.trim_start().len());
    spans.push(TextSpan { start, end: start + trimmed.len() });
}
