//! Embedding provider trait and vector utilities.
//!
//! Defines the [`EmbeddingProvider`] trait that all embedding backends
//! implement, plus pure helper functions for vector serialization and
//! similarity computation.
//!
//! Concrete providers (Ollama, OpenAI, fastembed) live in the `cv-harness`
//! app crate.

use anyhow::Result;
use async_trait::async_trait;

/// Trait for embedding providers.
///
/// Implementations are created by the application from its embedding
/// configuration and passed to [`crate::retrieval`] functions.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"nomic-embed-text"`).
    fn model_name(&self) -> &str;
    /// Returns the embedding vector dimensionality (e.g. `768`).
    fn dims(&self) -> usize;
    /// Embed a batch of texts, returning one vector per input in order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Encode a vector as little-endian `f32` bytes for BLOB storage.
///
/// ```rust
/// use cv_harness_core::embedding::{blob_to_vec, vec_to_blob};
///
/// let v = vec![0.5f32, -1.25];
/// assert_eq!(blob_to_vec(&vec_to_blob(&v)), v);
/// ```
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Decode a BLOB written by [`vec_to_blob`]. Trailing partial values are ignored.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

/// Cosine similarity in `[-1.0, 1.0]`, accumulated in `f64`.
///
/// Returns `0.0` for empty vectors, vectors of different lengths, or a
/// zero-magnitude vector.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f64::EPSILON {
        return 0.0;
    }
    dot / denom
}

/// Score `candidates` against `query` and keep the `k` most similar.
///
/// Ties keep their input order, so an index that stores vectors in
/// insertion order returns deterministic results.
pub fn rank_by_similarity<T, F>(query: &[f32], candidates: Vec<T>, vector_of: F, k: usize) -> Vec<(T, f64)>
where
    F: Fn(&T) -> &[f32],
{
    let mut scored: Vec<(T, f64)> = candidates
        .into_iter()
        .map(|c| {
            let sim = cosine_similarity(query, vector_of(&c));
            (c, sim)
        })
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(k);
    scored
}

/// Check that every vector has the provider's advertised dimensionality.
pub fn check_dims(vectors: &[Vec<f32>], dims: usize) -> Result<()> {
    if let Some(bad) = vectors.iter().find(|v| v.len() != dims) {
        anyhow::bail!(
            "embedding has {} dimensions, expected {}",
            bad.len(),
            dims
        );
    }
    Ok(())
}
