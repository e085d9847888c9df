//! Single-candidate CV summaries.

use anyhow::Result;

use crate::ask::print_stream;
use crate::config::Config;
use crate::corpus::Corpus;
use crate::llm::{ChatClient, LanguageModel, TokenStream};
use crate::prompts;

/// Read `candidate`'s full CV and start streaming its summary.
///
/// Fails with `NotFound` before contacting the model when the candidate
/// has no CV in the corpus.
pub async fn stream_summary(
    corpus: &Corpus,
    llm: &dyn LanguageModel,
    candidate: &str,
    temperature: f32,
) -> Result<TokenStream> {
    let doc = corpus.read_document(candidate)?;
    let preview: String = doc.text.chars().take(500).collect();
    tracing::debug!(%candidate, %preview, "summarizing CV");
    llm.stream(&prompts::summary_prompt(&doc.text), temperature)
        .await
}

/// `cvh summarize`
pub async fn run_summarize(config: &Config, candidate: &str) -> Result<()> {
    let corpus = Corpus::open(&config.paths.corpus_dir)?;
    // NotFound takes precedence over LLM configuration errors.
    corpus.read_document(candidate)?;
    let llm = ChatClient::from_config(&config.llm)?;

    println!("Summarizing {} CV", candidate);
    println!();
    let tokens = stream_summary(&corpus, &llm, candidate, config.llm.summary_temperature).await?;
    print_stream(tokens).await?;
    Ok(())
}
