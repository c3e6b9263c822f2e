// src/chunker.rs
//! Fixed-size page chunker.
//!
//! Every page of a document is cut into consecutive pieces of `chunk_size`
//! characters (the last piece takes the remainder) and each piece is labeled
//! `Page {p} Part {k}`. Part numbers restart at 1 on every page. Pieces never
//! overlap, so joining the parts of a page gives back the page text.

use serde::{Deserialize, Serialize};

use crate::errors::{GraderError, GraderResult};

pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// A titled piece of page text used as grounding context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    pub title: String,
    pub text: String,
}

impl Snippet {
    pub fn new(page: usize, part: usize, text: &str) -> Self {
        Self {
            title: format!("Page {} Part {}", page, part),
            text: text.to_string(),
        }
    }
}

/// Something that hands out extracted page text, one page at a time.
pub trait PageSource {
    /// Name used in error messages and logs (usually the file path).
    fn name(&self) -> &str;
    fn page_count(&self) -> usize;
    /// Text of the page at 0-based `index`.
    fn page_text(&self, index: usize) -> GraderResult<String>;
}

fn validate_chunk_size(chunk_size: usize) -> GraderResult<()> {
    if chunk_size == 0 {
        return Err(GraderError::InvalidArgument(
            "chunk_size must be a positive integer".to_string(),
        ));
    }
    Ok(())
}

/// Splits `text` into pieces of at most `chunk_size` characters.
/// Cuts land on char boundaries; empty text yields no pieces.
fn split_chars(text: &str, chunk_size: usize) -> Vec<&str> {
    let mut pieces = Vec::with_capacity(text.len() / chunk_size + 1);
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in text.char_indices() {
        if count == chunk_size {
            pieces.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }

    if start < text.len() {
        pieces.push(&text[start..]);
    }

    pieces
}

/// Chunks a single page. `page_number` is 1-based.
pub fn chunk_page(page_number: usize, text: &str, chunk_size: usize) -> GraderResult<Vec<Snippet>> {
    validate_chunk_size(chunk_size)?;
    Ok(split_chars(text, chunk_size)
        .into_iter()
        .enumerate()
        .map(|(i, piece)| Snippet::new(page_number, i + 1, piece))
        .collect())
}

/// Chunks already-extracted pages, preserving page order then part order.
pub fn chunk_pages<S: AsRef<str>>(pages: &[S], chunk_size: usize) -> GraderResult<Vec<Snippet>> {
    validate_chunk_size(chunk_size)?;

    let mut snippets = Vec::new();
    for (i, page) in pages.iter().enumerate() {
        snippets.extend(chunk_page(i + 1, page.as_ref(), chunk_size)?);
    }
    Ok(snippets)
}

/// Chunks every page pulled from `source`.
///
/// The first page that cannot be read aborts the whole call; no partial
/// result is returned.
pub fn chunk_document(source: &dyn PageSource, chunk_size: usize) -> GraderResult<Vec<Snippet>> {
    validate_chunk_size(chunk_size)?;

    let mut snippets = Vec::new();
    for index in 0..source.page_count() {
        let text = source.page_text(index)?;
        snippets.extend(chunk_page(index + 1, &text, chunk_size)?);
    }

    tracing::debug!(
        source = %source.name(),
        pages = source.page_count(),
        snippets = snippets.len(),
        "Chunked document"
    );
    Ok(snippets)
}
