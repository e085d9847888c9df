//! # CV Harness
//!
//! Local-first retrieval, summarization, and skill scoring over a corpus
//! of candidate CVs.
//!
//! Uploaded PDF, DOCX, and TXT files are reduced to plain text and stored
//! one file per candidate. The corpus is chunked and embedded into a
//! SQLite vector index; questions retrieve the closest chunks, which are
//! grouped by candidate and handed to a chat model whose tokens stream
//! back to the terminal. Skill scoring counts n-gram mentions directly
//! over the raw text and needs no model.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌────────────┐   ┌──────────────┐
//! │ Uploads  │──▶│ Extract  │──▶│  Corpus    │──▶│ Chunk+Embed  │
//! │ pdf/docx │   │ + name   │   │ <name>.txt │   │ SQLite index │
//! └──────────┘   └──────────┘   └─────┬──────┘   └──────┬───────┘
//!                                     │                 │
//!                    ┌────────────────┤                 ▼
//!                    ▼                ▼          ┌──────────────┐
//!              ┌──────────┐    ┌──────────┐      │ Retrieve +   │
//!              │  Skills  │    │ Summary  │      │ Context → LLM│
//!              └──────────┘    └──────────┘      └──────────────┘
//! ```
//!
//! The pure pipeline (chunking, context assembly, skill scoring,
//! retrieval) lives in the `cv-harness-core` crate.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`logging`] | tracing subscriber setup |
//! | [`extract`] | PDF / DOCX / TXT text extraction |
//! | [`corpus`] | Processed CV storage |
//! | [`ingest`] | Upload session, parsing, and saving |
//! | [`naming`] | Candidate identifiers |
//! | [`embedding`] | Embedding providers |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_index`] | Persisted vector index |
//! | [`index_cmd`] | Index rebuild |
//! | [`llm`] | Chat-model client and token streaming |
//! | [`prompts`] | Prompt templates |
//! | [`ask`] | Question answering and raw search |
//! | [`summary`] | CV summaries |
//! | [`skills_cmd`] | Skill report rendering |

pub mod ask;
pub mod config;
pub mod corpus;
pub mod db;
pub mod embedding;
pub mod extract;
pub mod index_cmd;
pub mod ingest;
pub mod llm;
pub mod logging;
pub mod migrate;
pub mod naming;
pub mod prompts;
pub mod skills_cmd;
pub mod sqlite_index;
pub mod summary;
