//! Overlapping word-window chunker.
//!
//! Splits document text into [`Chunk`]s of at most `chunk_size` words.
//! Consecutive windows share `overlap` words.
//!
//! # Algorithm
//!
//! 1. Split the text on whitespace into words.
//! 2. Start a window at word 0 and advance by `chunk_size - overlap`.
//! 3. Before emitting a window, if fewer than `chunk_size / 2` words remain
//!    and a chunk has already been emitted, append the remaining words to
//!    that chunk and stop (tail merge).
//! 4. Stop after the first window that reaches the end of the text.
//!
//! Each chunk carries a SHA-256 hash of its content and the metadata of its
//! source document.
//!
//! # Example
//!
//! ```rust
//! use cv_harness_core::chunk::chunk_words;
//!
//! let windows = chunk_words("a b c d e f g h i j k l m", 10, 3).unwrap();
//! assert_eq!(windows, vec!["a b c d e f g h i j", "h i j k l m"]);
//! ```

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::models::{Chunk, Document};

/// Split `text` into overlapping windows of `chunk_size` words.
///
/// Returns the window contents with words joined by single spaces.
/// Whitespace-only text yields no windows.
///
/// # Errors
///
/// [`Error::InvalidArgument`] if `chunk_size == 0` or `overlap >= chunk_size`.
pub fn chunk_words(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>> {
    validate(chunk_size, overlap)?;

    let words: Vec<&str> = text.split_whitespace().collect();
    let step = chunk_size - overlap;
    let mut windows: Vec<Vec<&str>> = Vec::new();
    let mut start = 0;

    while start < words.len() {
        let remaining = words.len() - start;
        if remaining < chunk_size / 2 {
            if let Some(last) = windows.last_mut() {
                last.extend_from_slice(&words[start..]);
                break;
            }
        }

        let end = (start + chunk_size).min(words.len());
        windows.push(words[start..end].to_vec());
        if end >= words.len() {
            break;
        }
        start += step;
    }

    Ok(windows.into_iter().map(|w| w.join(" ")).collect())
}

/// Chunk a single document, attaching its metadata to every chunk.
pub fn chunk_document(doc: &Document, chunk_size: usize, overlap: usize) -> Result<Vec<Chunk>> {
    let metadata = doc.metadata();
    let chunks = chunk_words(&doc.text, chunk_size, overlap)?
        .into_iter()
        .enumerate()
        .map(|(index, content)| Chunk {
            source: doc.name.clone(),
            index,
            hash: content_hash(&content),
            content,
            metadata: metadata.clone(),
        })
        .collect();
    Ok(chunks)
}

/// Chunk every document, preserving document order.
pub fn chunk_documents(docs: &[Document], chunk_size: usize, overlap: usize) -> Result<Vec<Chunk>> {
    let mut all = Vec::new();
    for doc in docs {
        let chunks = chunk_document(doc, chunk_size, overlap)?;
        tracing::debug!(source = %doc.name, chunks = chunks.len(), "chunked document");
        all.extend(chunks);
    }
    Ok(all)
}

fn validate(chunk_size: usize, overlap: usize) -> Result<()> {
    if chunk_size == 0 {
        return Err(Error::InvalidArgument(
            "chunk_size must be greater than 0".to_string(),
        ));
    }
    if overlap >= chunk_size {
        return Err(Error::InvalidArgument(format!(
            "overlap ({}) must be smaller than chunk_size ({})",
            overlap, chunk_size
        )));
    }
    Ok(())
}

fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
