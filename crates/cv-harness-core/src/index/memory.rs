//! In-memory [`VectorIndex`] implementation for tests.
//!
//! Entries live in a `Vec` behind `std::sync::RwLock`. Search is
//! brute-force cosine similarity over every stored vector.

use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::embedding::rank_by_similarity;
use crate::models::ScoredChunk;

use super::{IndexEntry, VectorIndex};

/// In-memory vector index.
#[derive(Default)]
pub struct InMemoryIndex {
    entries: RwLock<Vec<IndexEntry>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("in-memory index lock poisoned")
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn clear(&self) -> Result<usize> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        let removed = entries.len();
        entries.clear();
        Ok(removed)
    }

    async fn add(&self, new_entries: &[IndexEntry]) -> Result<()> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.extend_from_slice(new_entries);
        Ok(())
    }

    async fn similarity_search(&self, query_vec: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        let entries = self.entries.read().map_err(poisoned)?;
        let ranked = rank_by_similarity(query_vec, entries.iter().collect(), |e| e.vector.as_slice(), k);
        Ok(ranked
            .into_iter()
            .map(|(entry, score)| ScoredChunk {
                chunk: entry.chunk.clone(),
                score,
            })
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.entries.read().map_err(poisoned)?.len())
    }
}
