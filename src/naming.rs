//! Candidate identifiers for processed CVs.
//!
//! The identifier doubles as the corpus file stem, so whatever the model
//! returns is reduced to a filesystem-safe form. An empty or failed
//! extraction falls back to the uploaded file's stem.

use std::path::Path;

use crate::llm::LanguageModel;
use crate::prompts;

/// Characters of CV text sent to the model for name extraction.
const NAME_PROMPT_CHARS: usize = 4000;

/// Longest identifier kept, in characters.
const MAX_IDENTIFIER_CHARS: usize = 100;

/// Reduce a name to letters, digits, `-`, `_` and single spaces.
///
/// Path separators and other punctuation are dropped and whitespace runs
/// collapse to one space.
pub fn sanitize_identifier(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else if c.is_whitespace() {
                ' '
            } else {
                '\u{0}'
            }
        })
        .filter(|c| *c != '\u{0}')
        .collect();
    let joined = kept.split_whitespace().collect::<Vec<_>>().join(" ");
    joined.chars().take(MAX_IDENTIFIER_CHARS).collect::<String>().trim().to_string()
}

/// Pick the identifier for an uploaded file.
///
/// Uses the extracted name when it sanitizes to something non-empty,
/// otherwise the file stem. Returns `"candidate"` if both are empty.
pub fn document_identifier(extracted: Option<&str>, filename: &Path) -> String {
    if let Some(name) = extracted.map(sanitize_identifier).filter(|n| !n.is_empty()) {
        return name;
    }
    let stem = filename
        .file_stem()
        .map(|s| sanitize_identifier(&s.to_string_lossy()))
        .unwrap_or_default();
    if stem.is_empty() {
        "candidate".to_string()
    } else {
        stem
    }
}

/// Ask the model for the candidate's full name.
///
/// Returns `None` (and logs) when the call fails or the reply is blank.
pub async fn extract_candidate_name(
    llm: &dyn LanguageModel,
    cv_text: &str,
    temperature: f32,
) -> Option<String> {
    let excerpt: String = cv_text.chars().take(NAME_PROMPT_CHARS).collect();
    match llm.complete(&prompts::name_prompt(&excerpt), temperature).await {
        Ok(reply) => {
            let name = reply.lines().find(|l| !l.trim().is_empty())?.trim().to_string();
            tracing::debug!(%name, "extracted candidate name");
            Some(name)
        }
        Err(e) => {
            tracing::warn!(error = %e, "candidate name extraction failed");
            None
        }
    }
}
