//! Index rebuild and query pipeline.
//!
//! Operates only through the [`EmbeddingProvider`] and [`VectorIndex`]
//! traits. The caller supplies documents (read from the corpus) and the
//! chunking parameters from its configuration.

use anyhow::{Context, Result};

use crate::chunk::chunk_documents;
use crate::embedding::{check_dims, EmbeddingProvider};
use crate::index::{IndexEntry, VectorIndex};
use crate::models::{Document, ScoredChunk};

/// Chunking and batching parameters for [`rebuild_index`].
#[derive(Debug, Clone, Copy)]
pub struct RebuildParams {
    pub chunk_size: usize,
    pub overlap: usize,
    /// Number of chunks sent to the embedding provider per call.
    pub batch_size: usize,
}

/// Outcome of a rebuild.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildReport {
    /// Entries removed by the clear step.
    pub cleared: usize,
    pub documents: usize,
    /// Chunks embedded and written.
    pub chunks: usize,
}

/// Replace the whole index with embeddings of `docs`.
///
/// Chunking errors (bad parameters) surface before anything is cleared.
/// The index is then cleared, and every chunk is embedded and written in
/// batches. An embedding failure aborts the rebuild and leaves the index
/// holding only the batches written so far.
pub async fn rebuild_index(
    index: &dyn VectorIndex,
    embedder: &dyn EmbeddingProvider,
    docs: &[Document],
    params: RebuildParams,
) -> Result<RebuildReport> {
    let chunks = chunk_documents(docs, params.chunk_size, params.overlap)?;
    let cleared = index.clear().await?;
    tracing::info!(cleared, "cleared vector index");

    let batch_size = params.batch_size.max(1);
    for batch in chunks.chunks(batch_size) {
        let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
        let vectors = embedder
            .embed(&texts)
            .await
            .with_context(|| format!("embedding {} chunks with {}", texts.len(), embedder.model_name()))?;
        if vectors.len() != batch.len() {
            anyhow::bail!(
                "embedding provider returned {} vectors for {} chunks",
                vectors.len(),
                batch.len()
            );
        }
        check_dims(&vectors, embedder.dims())?;

        let entries: Vec<IndexEntry> = batch
            .iter()
            .cloned()
            .zip(vectors)
            .map(|(chunk, vector)| IndexEntry { chunk, vector })
            .collect();
        index.add(&entries).await?;
        tracing::debug!(written = entries.len(), "wrote index batch");
    }

    Ok(RebuildReport {
        cleared,
        documents: docs.len(),
        chunks: chunks.len(),
    })
}

/// Embed `query` and return the `k` most similar chunks.
pub async fn retrieve(
    index: &dyn VectorIndex,
    embedder: &dyn EmbeddingProvider,
    query: &str,
    k: usize,
) -> Result<Vec<ScoredChunk>> {
    let query_vec = embedder
        .embed(&[query.to_string()])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("Empty embedding response"))?;
    let hits = index.similarity_search(&query_vec, k).await?;
    tracing::info!(hits = hits.len(), k, "retrieved chunks");
    Ok(hits)
}
