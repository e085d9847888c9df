//! Error kinds surfaced by the core operations.
//!
//! Every variant is raised immediately to the caller; nothing in the core
//! retries or substitutes a fallback value.

/// Core error type.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// A parameter is out of range (e.g. `overlap >= chunk_size`).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The extractor does not handle this container format.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    /// A score was requested for a document that is not in the scored set.
    #[error("unknown document: {0}")]
    UnknownDocument(String),
    /// The requested document or candidate has no backing file.
    #[error("not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;
