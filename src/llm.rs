//! Chat-model client with incremental token streaming.
//!
//! Two wire formats are supported:
//!
//! | Provider | Endpoint | Stream framing |
//! |----------|----------|----------------|
//! | `ollama` | `POST /api/chat` | newline-delimited JSON, `{"message":{"content":..},"done":..}` |
//! | `openai` | `POST /v1/chat/completions` | server-sent events, `data: {..}` ending with `data: [DONE]` |
//!
//! A [`TokenStream`] is built lazily over the HTTP body: nothing is read
//! until the consumer polls, and dropping the stream drops the response.
//! A network or decode failure ends the stream with a single `Err` item.
//! The client never retries a generation.

use anyhow::{bail, Result};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

use crate::config::LlmConfig;

/// Finite, non-restartable sequence of generated text fragments.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// A text generator. Implemented over HTTP by [`ChatClient`].
#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn model_name(&self) -> &str;

    /// Generate the whole response at once.
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String>;

    /// Start a generation and return its tokens as they arrive.
    async fn stream(&self, prompt: &str, temperature: f32) -> Result<TokenStream>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    Ollama,
    OpenAi,
}

impl WireFormat {
    fn parse(provider: &str) -> Result<Self> {
        match provider {
            "ollama" => Ok(WireFormat::Ollama),
            "openai" => Ok(WireFormat::OpenAi),
            other => bail!("Unknown llm provider: {}", other),
        }
    }

    fn default_url(self) -> &'static str {
        match self {
            WireFormat::Ollama => "http://localhost:11434",
            WireFormat::OpenAi => "https://api.openai.com",
        }
    }

    fn endpoint(self) -> &'static str {
        match self {
            WireFormat::Ollama => "/api/chat",
            WireFormat::OpenAi => "/v1/chat/completions",
        }
    }
}

/// HTTP chat client for Ollama or an OpenAI-compatible server.
pub struct ChatClient {
    format: WireFormat,
    model: String,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
    client: reqwest::Client,
}

impl ChatClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let format = WireFormat::parse(&config.provider)?;
        let api_key = std::env::var("OPENAI_API_KEY").ok();
        if format == WireFormat::OpenAi && config.url.is_none() && api_key.is_none() {
            bail!("OPENAI_API_KEY environment variable not set");
        }
        let base_url = config
            .url
            .clone()
            .unwrap_or_else(|| format.default_url().to_string());
        let timeout = Duration::from_secs(config.timeout_secs);

        // Total request timeout applies to `complete` only; streams are unbounded.
        let client = reqwest::Client::builder().connect_timeout(timeout).build()?;

        Ok(Self {
            format,
            model: config.model.clone(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            timeout,
            client,
        })
    }

    fn request_body(&self, prompt: &str, temperature: f32, stream: bool) -> Value {
        let messages = json!([{ "role": "user", "content": prompt }]);
        match self.format {
            WireFormat::Ollama => json!({
                "model": self.model,
                "messages": messages,
                "stream": stream,
                "options": { "temperature": temperature },
            }),
            WireFormat::OpenAi => json!({
                "model": self.model,
                "messages": messages,
                "stream": stream,
                "temperature": temperature,
            }),
        }
    }

    fn post(&self, body: &Value) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, self.format.endpoint());
        let mut request = self.client.post(url).json(body);
        if self.format == WireFormat::OpenAi {
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key);
            }
        }
        request
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = request.send().await.map_err(|e| {
            anyhow::anyhow!("LLM connection error (is the server running at {}?): {}", self.base_url, e)
        })?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!("LLM API error {}: {}", status, text);
        }
        Ok(response)
    }
}

#[async_trait]
impl LanguageModel for ChatClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        let body = self.request_body(prompt, temperature, false);
        let response = self.send(self.post(&body).timeout(self.timeout)).await?;
        let payload: Value = response.json().await?;

        let content = match self.format {
            WireFormat::Ollama => payload["message"]["content"].as_str(),
            WireFormat::OpenAi => payload["choices"][0]["message"]["content"].as_str(),
        };
        content
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("LLM response has no message content"))
    }

    async fn stream(&self, prompt: &str, temperature: f32) -> Result<TokenStream> {
        let body = self.request_body(prompt, temperature, true);
        let response = self.send(self.post(&body)).await?;
        tracing::debug!(model = %self.model, "streaming generation started");
        Ok(decode_token_stream(response.bytes_stream(), self.format))
    }
}

/// Result of decoding one framed line.
#[derive(Debug, PartialEq)]
struct Frame {
    token: Option<String>,
    done: bool,
}

impl Frame {
    const SKIP: Frame = Frame {
        token: None,
        done: false,
    };
}

fn parse_line(format: WireFormat, line: &str) -> Result<Frame> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Frame::SKIP);
    }

    let payload = match format {
        WireFormat::Ollama => line,
        WireFormat::OpenAi => match line.strip_prefix("data:") {
            Some(data) => {
                let data = data.trim_start();
                if data == "[DONE]" {
                    return Ok(Frame {
                        token: None,
                        done: true,
                    });
                }
                data
            }
            // `event:`, `id:` and `:` comment lines carry no tokens
            None => return Ok(Frame::SKIP),
        },
    };

    let value: Value = serde_json::from_str(payload)
        .map_err(|e| anyhow::anyhow!("malformed stream line {:?}: {}", payload, e))?;
    if let Some(err) = value.get("error") {
        let message = err
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| err.as_str())
            .unwrap_or("unknown error");
        bail!("LLM stream error: {}", message);
    }

    let (token, done) = match format {
        WireFormat::Ollama => (
            value["message"]["content"].as_str(),
            value["done"].as_bool().unwrap_or(false),
        ),
        WireFormat::OpenAi => (value["choices"][0]["delta"]["content"].as_str(), false),
    };
    Ok(Frame {
        token: token.filter(|t| !t.is_empty()).map(str::to_string),
        done,
    })
}

struct DecodeState<S> {
    inner: Pin<Box<S>>,
    format: WireFormat,
    buf: Vec<u8>,
    pending: VecDeque<Result<String>>,
    finished: bool,
}

impl<S> DecodeState<S> {
    /// Decode one complete line. Returns `false` once the stream is over.
    fn push_line(&mut self, line: &[u8]) -> bool {
        match parse_line(self.format, &String::from_utf8_lossy(line)) {
            Ok(frame) => {
                if let Some(token) = frame.token {
                    self.pending.push_back(Ok(token));
                }
                if frame.done {
                    self.finished = true;
                }
            }
            Err(e) => {
                self.pending.push_back(Err(e));
                self.finished = true;
            }
        }
        !self.finished
    }
}

/// Turn a raw HTTP body into a [`TokenStream`].
///
/// Lines may be split across body chunks; bytes are buffered until a
/// newline arrives. A trailing line without a newline is decoded when the
/// body ends.
pub fn decode_token_stream<S, B, E>(body: S, format: WireFormat) -> TokenStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<anyhow::Error> + Send + 'static,
{
    let state = DecodeState {
        inner: Box::pin(body),
        format,
        buf: Vec::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    Box::pin(futures::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.pending.pop_front() {
                return Some((item, st));
            }
            if st.finished {
                return None;
            }
            match st.inner.next().await {
                Some(Ok(bytes)) => {
                    st.buf.extend_from_slice(bytes.as_ref());
                    while let Some(pos) = st.buf.iter().position(|b| *b == b'\n') {
                        let line: Vec<u8> = st.buf.drain(..=pos).collect();
                        if !st.push_line(&line) {
                            break;
                        }
                    }
                }
                Some(Err(e)) => {
                    st.finished = true;
                    return Some((Err(e.into()), st));
                }
                None => {
                    st.finished = true;
                    let rest = std::mem::take(&mut st.buf);
                    st.push_line(&rest);
                }
            }
        }
    }))
}

/// Drain a stream, writing each token through `sink` as it arrives.
/// Returns the concatenated text.
pub async fn drain_tokens<F>(mut tokens: TokenStream, mut sink: F) -> Result<String>
where
    F: FnMut(&str) -> Result<()>,
{
    let mut full = String::new();
    while let Some(token) = tokens.next().await {
        let token = token?;
        sink(&token)?;
        full.push_str(&token);
    }
    Ok(full)
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::sync::Mutex;

    /// Scripted model that records every prompt it receives.
    pub struct ScriptedModel {
        pub reply: Vec<String>,
        pub prompts: Mutex<Vec<(String, f32)>>,
        pub fail: bool,
    }

    impl ScriptedModel {
        pub fn new(reply: &[&str]) -> Self {
            Self {
                reply: reply.iter().map(|s| s.to_string()).collect(),
                prompts: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new(&[])
            }
        }

        pub fn last_prompt(&self) -> (String, f32) {
            self.prompts.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        fn model_name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
            self.prompts.lock().unwrap().push((prompt.to_string(), temperature));
            if self.fail {
                bail!("model unavailable");
            }
            Ok(self.reply.concat())
        }

        async fn stream(&self, prompt: &str, temperature: f32) -> Result<TokenStream> {
            self.prompts.lock().unwrap().push((prompt.to_string(), temperature));
            if self.fail {
                bail!("model unavailable");
            }
            let items: Vec<Result<String>> = self.reply.iter().cloned().map(Ok).collect();
            Ok(Box::pin(futures::stream::iter(items)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(parts: &[&str]) -> impl Stream<Item = Result<Vec<u8>>> + Send + 'static {
        let items: Vec<Result<Vec<u8>>> = parts.iter().map(|p| Ok(p.as_bytes().to_vec())).collect();
        futures::stream::iter(items)
    }

    async fn collect(stream: TokenStream) -> Vec<Result<String>> {
        stream.collect().await
    }

    fn ok_tokens(items: Vec<Result<String>>) -> Vec<String> {
        items.into_iter().map(|r| r.unwrap()).collect()
    }

    #[test]
    fn test_parse_ollama_lines() {
        let frame = parse_line(
            WireFormat::Ollama,
            r#"{"message":{"role":"assistant","content":"Hel"},"done":false}"#,
        )
        .unwrap();
        assert_eq!(frame.token.as_deref(), Some("Hel"));
        assert!(!frame.done);

        let frame = parse_line(
            WireFormat::Ollama,
            r#"{"message":{"role":"assistant","content":""},"done":true}"#,
        )
        .unwrap();
        assert_eq!(frame, Frame { token: None, done: true });

        assert!(parse_line(WireFormat::Ollama, r#"{"error":"model 'x' not found"}"#).is_err());
        assert!(parse_line(WireFormat::Ollama, "not json").is_err());
    }

    #[test]
    fn test_parse_sse_lines() {
        let frame = parse_line(
            WireFormat::OpenAi,
            r#"data: {"choices":[{"delta":{"content":"lo"}}]}"#,
        )
        .unwrap();
        assert_eq!(frame.token.as_deref(), Some("lo"));
        assert!(parse_line(WireFormat::OpenAi, "data: [DONE]").unwrap().done);
        assert_eq!(parse_line(WireFormat::OpenAi, ": keep-alive").unwrap(), Frame::SKIP);
        assert_eq!(parse_line(WireFormat::OpenAi, "event: message").unwrap(), Frame::SKIP);
        assert_eq!(
            parse_line(WireFormat::OpenAi, r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#)
                .unwrap(),
            Frame::SKIP
        );
    }

    #[tokio::test]
    async fn test_ollama_stream_with_split_lines() {
        let stream = decode_token_stream(
            body(&[
                "{\"message\":{\"content\":\"Alice \"},\"done\":false}\n{\"message\":",
                "{\"content\":\"knows Rust\"},\"done\":false}\n",
                "{\"message\":{\"content\":\"\"},\"done\":true}\n",
            ]),
            WireFormat::Ollama,
        );
        assert_eq!(ok_tokens(collect(stream).await), vec!["Alice ", "knows Rust"]);
    }

    #[tokio::test]
    async fn test_sse_stream_stops_at_done() {
        let stream = decode_token_stream(
            body(&[
                "data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n\n",
                "data: {\"choices\":[{\"delta\":{\"content\":\"b\"}}]}\n\ndata: [DONE]\n\n",
                "data: {\"choices\":[{\"delta\":{\"content\":\"ignored\"}}]}\n",
            ]),
            WireFormat::OpenAi,
        );
        assert_eq!(ok_tokens(collect(stream).await), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_trailing_line_without_newline() {
        let stream = decode_token_stream(
            body(&["{\"message\":{\"content\":\"tail\"},\"done\":true}"]),
            WireFormat::Ollama,
        );
        assert_eq!(ok_tokens(collect(stream).await), vec!["tail"]);
    }

    #[tokio::test]
    async fn test_transport_error_ends_stream() {
        let items: Vec<Result<Vec<u8>>> = vec![
            Ok(b"{\"message\":{\"content\":\"par\"},\"done\":false}\n".to_vec()),
            Err(anyhow::anyhow!("connection reset")),
            Ok(b"{\"message\":{\"content\":\"never\"},\"done\":false}\n".to_vec()),
        ];
        let out = collect(decode_token_stream(futures::stream::iter(items), WireFormat::Ollama)).await;
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].as_ref().unwrap(), "par");
        assert!(out[1].as_ref().unwrap_err().to_string().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_decode_error_after_tokens() {
        let stream = decode_token_stream(
            body(&["{\"message\":{\"content\":\"ok\"},\"done\":false}\n{broken\n"]),
            WireFormat::Ollama,
        );
        let out = collect(stream).await;
        assert_eq!(out.len(), 2);
        assert!(out[1].is_err());
    }

    #[tokio::test]
    async fn test_empty_body_is_empty_stream() {
        let stream = decode_token_stream(body(&[]), WireFormat::OpenAi);
        assert!(collect(stream).await.is_empty());
    }

    #[tokio::test]
    async fn test_drain_tokens_forwards_in_order() {
        let model = fake::ScriptedModel::new(&["one ", "two"]);
        let mut seen = Vec::new();
        let full = drain_tokens(model.stream("p", 0.5).await.unwrap(), |t| {
            seen.push(t.to_string());
            Ok(())
        })
        .await
        .unwrap();
        assert_eq!(full, "one two");
        assert_eq!(seen, vec!["one ", "two"]);
    }

    #[test]
    fn test_request_body_shapes() {
        let config = LlmConfig {
            url: Some("http://127.0.0.1:1/".to_string()),
            ..Default::default()
        };
        let client = ChatClient::from_config(&config).unwrap();
        assert_eq!(client.base_url, "http://127.0.0.1:1");
        let body = client.request_body("hi", 0.2, true);
        assert_eq!(body["stream"], true);
        assert_eq!(body["messages"][0]["content"], "hi");
        assert!(body["options"]["temperature"].is_number());

        let config = LlmConfig {
            provider: "openai".to_string(),
            url: Some("http://127.0.0.1:1".to_string()),
            ..Default::default()
        };
        let client = ChatClient::from_config(&config).unwrap();
        let body = client.request_body("hi", 0.2, false);
        assert_eq!(body["stream"], false);
        assert!(body["temperature"].is_number());
    }
}
