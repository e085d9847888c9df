//! Data types that flow through the ingestion and retrieval pipeline.

use serde::{Deserialize, Serialize};

/// A candidate's plain-text CV.
///
/// `name` is the stable candidate identifier (the corpus file stem).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub name: String,
    pub text: String,
}

impl Document {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Metadata propagated to every chunk cut from this document.
    pub fn metadata(&self) -> ChunkMetadata {
        ChunkMetadata {
            candidate_name: self.name.clone(),
        }
    }
}

/// Provenance carried by each chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub candidate_name: String,
}

/// A word window cut from a [`Document`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Name of the owning document.
    pub source: String,
    /// Position of the chunk within its document, starting at 0.
    pub index: usize,
    /// Words joined by single spaces.
    pub content: String,
    /// SHA-256 of `content`, hex encoded.
    pub hash: String,
    pub metadata: ChunkMetadata,
}

/// A chunk returned from similarity search.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    /// Cosine similarity between the query and the chunk embedding.
    pub score: f64,
}
