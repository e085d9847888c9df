//! # CV Harness Core
//!
//! Pure retrieval and scoring logic for CV Harness: data models, the
//! word-window chunker, the context assembler, the skill scorer, the
//! embedding trait, the vector-index abstraction, and the generic
//! rebuild/retrieve pipeline.
//!
//! This crate contains no tokio, sqlx, HTTP, or filesystem I/O. The
//! application crate supplies concrete embedding providers and a
//! persistent index.

pub mod chunk;
pub mod context;
pub mod embedding;
pub mod error;
pub mod index;
pub mod models;
pub mod retrieval;
pub mod skills;

pub use error::{Error, Result};
