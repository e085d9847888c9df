use anyhow::{bail, Result};
use cv_harness_core::embedding::EmbeddingProvider;
use cv_harness_core::retrieval::{rebuild_index, RebuildParams};

use crate::config::Config;
use crate::corpus::Corpus;
use crate::embedding;
use crate::sqlite_index::SqliteIndex;

/// Open the persisted index together with the configured embedding provider.
///
/// Fails when embeddings are disabled.
pub async fn open_retrieval(config: &Config) -> Result<(SqliteIndex, Box<dyn EmbeddingProvider>)> {
    if !config.embedding.is_enabled() {
        bail!("Embedding provider is disabled. Set [embedding] provider in config.");
    }
    let provider = embedding::create_provider(&config.embedding)?;
    let index = SqliteIndex::open(&config.index.path).await?;
    Ok((index, provider))
}

/// Fail when the stored vectors were produced with a different dimensionality.
pub async fn ensure_compatible(index: &SqliteIndex, provider: &dyn EmbeddingProvider) -> Result<()> {
    match index.stored_dims().await? {
        Some(stored) if stored != provider.dims() => bail!(
            "Index holds {}-dimensional embeddings but {} produces {}. Run `cvh index` to rebuild.",
            stored,
            provider.model_name(),
            provider.dims()
        ),
        None => {
            tracing::warn!("vector index is empty; run `cvh index` after ingesting CVs");
            Ok(())
        }
        _ => Ok(()),
    }
}

/// `cvh index`: rebuild the vector index from the corpus.
pub async fn run_index(config: &Config) -> Result<()> {
    let (index, provider) = open_retrieval(config).await?;
    let corpus = Corpus::open(&config.paths.corpus_dir)?;
    let docs = corpus.list_documents()?;

    let params = RebuildParams {
        chunk_size: config.chunking.chunk_size,
        overlap: config.chunking.overlap,
        batch_size: config.embedding.batch_size,
    };

    let report = rebuild_index(&index, provider.as_ref(), &docs, params).await?;
    index.close().await;

    if report.documents == 0 {
        println!("index");
        println!("  no documents to embed");
        if report.cleared > 0 {
            println!("  removed stale chunks: {}", report.cleared);
        }
        return Ok(());
    }

    println!("index");
    println!("  model: {} ({} dims)", provider.model_name(), provider.dims());
    println!("  documents: {}", report.documents);
    println!("  chunks embedded: {}", report.chunks);
    println!("  replaced chunks: {}", report.cleared);
    println!("  path: {}", config.index.path.display());
    println!("ok");
    Ok(())
}
