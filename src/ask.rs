//! Question answering over the indexed corpus, plus raw similarity search.

use anyhow::Result;
use cv_harness_core::context::assemble_context;
use cv_harness_core::embedding::EmbeddingProvider;
use cv_harness_core::index::VectorIndex;
use cv_harness_core::retrieval::retrieve;
use cv_harness_core::Error;
use std::io::Write;

use crate::config::Config;
use crate::index_cmd::{ensure_compatible, open_retrieval};
use crate::llm::{drain_tokens, ChatClient, LanguageModel, TokenStream};
use crate::prompts;

/// A generation in progress together with the context it was given.
pub struct Answer {
    pub context: String,
    /// Number of chunks retrieved.
    pub hits: usize,
    pub tokens: TokenStream,
}

/// Retrieve `top_k` chunks for `question`, assemble them, and start streaming the answer.
pub async fn stream_answer(
    index: &dyn VectorIndex,
    embedder: &dyn EmbeddingProvider,
    llm: &dyn LanguageModel,
    question: &str,
    top_k: usize,
    temperature: f32,
) -> Result<Answer> {
    let question = question.trim();
    if question.is_empty() {
        return Err(Error::InvalidArgument("question must not be empty".to_string()).into());
    }

    let hits = retrieve(index, embedder, question, top_k).await?;
    let context = assemble_context(hits.iter().map(|h| &h.chunk));
    tracing::debug!(%question, %context, "assembled answer context");

    let tokens = llm
        .stream(&prompts::answer_prompt(&context, question), temperature)
        .await?;
    Ok(Answer {
        context,
        hits: hits.len(),
        tokens,
    })
}

/// Write each token to stdout as soon as it arrives.
pub async fn print_stream(tokens: TokenStream) -> Result<String> {
    let stdout = std::io::stdout();
    let text = drain_tokens(tokens, |token| {
        let mut out = stdout.lock();
        out.write_all(token.as_bytes())?;
        out.flush()?;
        Ok(())
    })
    .await?;
    println!();
    Ok(text)
}

/// `cvh ask`
pub async fn run_ask(config: &Config, question: &str, show_context: bool) -> Result<()> {
    let (index, provider) = open_retrieval(config).await?;
    ensure_compatible(&index, provider.as_ref()).await?;
    let llm = ChatClient::from_config(&config.llm)?;

    let answer = stream_answer(
        &index,
        provider.as_ref(),
        &llm,
        question,
        config.retrieval.top_k,
        config.llm.answer_temperature,
    )
    .await?;

    if show_context {
        println!("context ({} chunks):", answer.hits);
        println!("{}", answer.context);
        println!();
        println!("answer:");
    }
    print_stream(answer.tokens).await?;

    index.close().await;
    Ok(())
}

/// `cvh search`: print the raw similarity hits for `query`.
pub async fn run_search(config: &Config, query: &str, limit: Option<usize>) -> Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    let (index, provider) = open_retrieval(config).await?;
    ensure_compatible(&index, provider.as_ref()).await?;
    let k = limit.unwrap_or(config.retrieval.top_k);
    let hits = retrieve(&index, provider.as_ref(), query, k).await?;
    index.close().await;

    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, hit) in hits.iter().enumerate() {
        println!(
            "{}. [{:.4}] {} #{}",
            i + 1,
            hit.score,
            hit.chunk.source,
            hit.chunk.index
        );
        println!("    candidate: {}", hit.chunk.metadata.candidate_name);
        println!("    excerpt: \"{}\"", excerpt(&hit.chunk.content, 160));
        println!();
    }
    Ok(())
}

fn excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}…", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::fake::ScriptedModel;
    use async_trait::async_trait;
    use cv_harness_core::index::memory::InMemoryIndex;
    use cv_harness_core::models::Document;
    use cv_harness_core::retrieval::{rebuild_index, RebuildParams};
    use futures::StreamExt;

    /// Two-dimensional embedding: (mentions of rust, mentions of python).
    struct LanguageEmbedder;

    #[async_trait]
    impl EmbeddingProvider for LanguageEmbedder {
        fn model_name(&self) -> &str {
            "languages"
        }
        fn dims(&self) -> usize {
            2
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    let t = t.to_lowercase();
                    vec![
                        t.matches("rust").count() as f32 + 0.01,
                        t.matches("python").count() as f32 + 0.01,
                    ]
                })
                .collect())
        }
    }

    async fn indexed() -> InMemoryIndex {
        let index = InMemoryIndex::new();
        let docs = vec![
            Document::new("alice", "Rust engineer writing Rust services"),
            Document::new("bob", "Python analyst using Python notebooks"),
        ];
        let params = RebuildParams {
            chunk_size: 50,
            overlap: 10,
            batch_size: 8,
        };
        rebuild_index(&index, &LanguageEmbedder, &docs, params)
            .await
            .unwrap();
        index
    }

    #[tokio::test]
    async fn test_stream_answer_uses_retrieved_context() {
        let index = indexed().await;
        let model = ScriptedModel::new(&["Alice ", "knows Rust."]);

        let answer = stream_answer(&index, &LanguageEmbedder, &model, "Who knows Rust?", 1, 0.2)
            .await
            .unwrap();
        assert_eq!(answer.hits, 1);
        assert_eq!(
            answer.context,
            "------The following chunk belongs to alice------\nRust engineer writing Rust services"
        );

        let tokens: Vec<String> = answer.tokens.map(|t| t.unwrap()).collect().await;
        assert_eq!(tokens.concat(), "Alice knows Rust.");

        let (prompt, temperature) = model.last_prompt();
        assert!(prompt.contains(&answer.context));
        assert!(prompt.contains("Question:\nWho knows Rust?"));
        assert_eq!(temperature, 0.2);
    }

    #[tokio::test]
    async fn test_stream_answer_rejects_empty_question() {
        let index = indexed().await;
        let model = ScriptedModel::new(&["unused"]);
        let err = stream_answer(&index, &LanguageEmbedder, &model, "   ", 5, 0.2)
            .await
            .err()
            .unwrap();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::InvalidArgument(_))
        ));
        assert!(model.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stream_answer_propagates_model_failure() {
        let index = indexed().await;
        let model = ScriptedModel::failing();
        assert!(
            stream_answer(&index, &LanguageEmbedder, &model, "python?", 2, 0.2)
                .await
                .is_err()
        );
    }

    #[test]
    fn test_excerpt() {
        assert_eq!(excerpt("short", 10), "short");
        assert_eq!(excerpt("abcdef ghij", 7), "abcdef…");
    }
}
