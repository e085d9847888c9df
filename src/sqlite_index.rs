//! SQLite-backed [`VectorIndex`].
//!
//! Each chunk is one row keyed by `(source, chunk_index)` with its
//! embedding stored as a little-endian `f32` BLOB. Search is brute-force
//! cosine similarity over every stored row, which is fine for a corpus of
//! a few hundred CVs.

use anyhow::{Context, Result};
use async_trait::async_trait;
use cv_harness_core::embedding::{blob_to_vec, rank_by_similarity, vec_to_blob};
use cv_harness_core::index::{IndexEntry, VectorIndex};
use cv_harness_core::models::{Chunk, ChunkMetadata, ScoredChunk};
use sqlx::{Row, SqlitePool};
use std::path::Path;

use crate::{db, migrate};

pub struct SqliteIndex {
    pool: SqlitePool,
}

impl SqliteIndex {
    /// Wrap an already-migrated pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to `path` and make sure the schema exists.
    pub async fn open(path: &Path) -> Result<Self> {
        let pool = db::connect(path).await?;
        migrate::run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    /// Dimensionality of the stored embeddings, or `None` when the index is empty.
    pub async fn stored_dims(&self) -> Result<Option<usize>> {
        let dims: Option<i64> = sqlx::query_scalar("SELECT dims FROM chunks LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(dims.map(|d| d as usize))
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl VectorIndex for SqliteIndex {
    async fn clear(&self) -> Result<usize> {
        let result = sqlx::query("DELETE FROM chunks").execute(&self.pool).await?;
        Ok(result.rows_affected() as usize)
    }

    async fn add(&self, entries: &[IndexEntry]) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;
        for entry in entries {
            let chunk = &entry.chunk;
            let metadata_json = serde_json::to_string(&chunk.metadata)?;
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO chunks
                    (source, chunk_index, content, hash, metadata_json, embedding, dims, indexed_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&chunk.source)
            .bind(chunk.index as i64)
            .bind(&chunk.content)
            .bind(&chunk.hash)
            .bind(&metadata_json)
            .bind(vec_to_blob(&entry.vector))
            .bind(entry.vector.len() as i64)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn similarity_search(&self, query_vec: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        let rows = sqlx::query(
            r#"
            SELECT source, chunk_index, content, hash, metadata_json, embedding
            FROM chunks
            ORDER BY rowid
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut candidates = Vec::with_capacity(rows.len());
        for row in &rows {
            let source: String = row.get("source");
            let index: i64 = row.get("chunk_index");
            let metadata_json: String = row.get("metadata_json");
            let metadata: ChunkMetadata = serde_json::from_str(&metadata_json)
                .with_context(|| format!("Corrupt metadata for chunk {} #{}", source, index))?;
            let blob: Vec<u8> = row.get("embedding");
            let chunk = Chunk {
                source,
                index: index as usize,
                content: row.get("content"),
                hash: row.get("hash"),
                metadata,
            };
            candidates.push((chunk, blob_to_vec(&blob)));
        }

        Ok(rank_by_similarity(query_vec, candidates, |c| c.1.as_slice(), k)
            .into_iter()
            .map(|((chunk, _), score)| ScoredChunk { chunk, score })
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }
}
