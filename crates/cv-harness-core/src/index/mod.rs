//! Vector index abstraction.
//!
//! The [`VectorIndex`] trait is the seam between the retrieval pipeline and
//! whatever persists chunk embeddings. The app crate provides a SQLite
//! implementation; [`memory::InMemoryIndex`] backs tests.
//!
//! Rebuilds are full-replace: callers [`clear`](VectorIndex::clear) the
//! index and then [`add`](VectorIndex::add) the complete chunk set. Nothing
//! here guards against a query running concurrently with a rebuild.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Chunk, ScoredChunk};

/// A chunk paired with its embedding, ready to be written.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// Storage for chunk embeddings with nearest-neighbour lookup.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`clear`](VectorIndex::clear) | Remove every entry, returning how many were removed |
/// | [`add`](VectorIndex::add) | Append entries |
/// | [`similarity_search`](VectorIndex::similarity_search) | Top-`k` chunks by cosine similarity |
/// | [`count`](VectorIndex::count) | Number of stored entries |
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Remove every entry.
    async fn clear(&self) -> Result<usize>;

    /// Append entries to the index.
    async fn add(&self, entries: &[IndexEntry]) -> Result<()>;

    /// Return up to `k` chunks ranked by descending similarity to `query_vec`.
    async fn similarity_search(&self, query_vec: &[f32], k: usize) -> Result<Vec<ScoredChunk>>;

    /// Number of stored entries.
    async fn count(&self) -> Result<usize>;
}
