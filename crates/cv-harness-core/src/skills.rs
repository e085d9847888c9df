//! Term-frequency skill scoring.
//!
//! Counts how often each queried skill is mentioned in each CV. Both CV
//! bodies and skill names go through the same [`preprocess`] step so that
//! "Node.js," in a CV matches the query "node.js", and multi-word skills
//! such as "machine learning" match as n-grams of up to four tokens.
//!
//! Scores are raw counts. There is no inverse-document-frequency weighting
//! and no length normalization; [`normalize_frequencies`] is a separate
//! display transform.
//!
//! # Example
//!
//! ```rust
//! use cv_harness_core::models::Document;
//! use cv_harness_core::skills::score;
//!
//! let docs = vec![Document::new("alice", "Python Python Java")];
//! let matrix = score(&docs, &["python", "go"]);
//! assert_eq!(matrix.get("alice", "python").unwrap(), Some(2.0));
//! assert_eq!(matrix.get("alice", "go").unwrap(), Some(0.0));
//! ```

use std::collections::HashMap;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::Document;

/// Longest n-gram, in tokens, that can be matched as a term.
pub const MAX_NGRAM: usize = 4;

/// Normalize text for matching.
///
/// Lowercases, turns `_`, `-` and `,` into spaces, drops a `.` that ends a
/// sentence (followed by whitespace or end of text) while keeping dots
/// inside tokens such as `node.js` or `.net`, replaces every character
/// other than `a-z`, `0-9`, `+`, `#`, `.` and space with a space, then
/// collapses whitespace.
pub fn preprocess(text: &str) -> String {
    let lowered: Vec<char> = text
        .to_lowercase()
        .chars()
        .map(|c| if matches!(c, '_' | '-' | ',') { ' ' } else { c })
        .collect();

    let mut kept = String::with_capacity(lowered.len());
    for (i, &c) in lowered.iter().enumerate() {
        if c == '.' {
            let ends_sentence = lowered.get(i + 1).map_or(true, |next| next.is_whitespace());
            if ends_sentence {
                continue;
            }
        }
        let allowed =
            c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '+' | '#' | '.' | ' ');
        kept.push(if allowed { c } else { ' ' });
    }

    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split preprocessed text into tokens. No stemming or stopword removal.
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// Split a comma-separated skill list, trimming entries and dropping blanks.
pub fn parse_skill_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Log-scale raw frequencies for display.
///
/// Each `f > 0` becomes `ln(f + 1)` rounded to 4 decimals; zeros stay `0.0`.
pub fn normalize_frequencies(freqs: &[usize]) -> Vec<f64> {
    let scaled: Vec<f64> = freqs
        .iter()
        .map(|&f| if f == 0 { 0.0 } else { ((f + 1) as f64).ln() })
        .collect();

    if scaled.iter().all(|&v| v == 0.0) {
        return vec![0.0; freqs.len()];
    }

    scaled.into_iter().map(round4).collect()
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

/// N-gram counts for every document in a corpus.
///
/// Built once per scoring request and discarded afterwards.
#[derive(Debug, Clone)]
pub struct SkillIndex {
    documents: Vec<String>,
    counts: Vec<HashMap<String, usize>>,
}

impl SkillIndex {
    /// Count every 1..=4-gram of every document.
    ///
    /// Documents keep their input order. A repeated document name keeps
    /// only its first occurrence.
    pub fn build(docs: &[Document]) -> Self {
        let mut documents = Vec::with_capacity(docs.len());
        let mut counts = Vec::with_capacity(docs.len());

        for doc in docs {
            if documents.contains(&doc.name) {
                tracing::warn!(document = %doc.name, "duplicate document name ignored for scoring");
                continue;
            }
            documents.push(doc.name.clone());
            counts.push(count_ngrams(&preprocess(&doc.text)));
        }

        Self { documents, counts }
    }

    /// Document names in row order.
    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    /// Whether the preprocessed `term` occurs anywhere in the corpus.
    pub fn contains_term(&self, term: &str) -> bool {
        let term = preprocess(term);
        self.counts.iter().any(|c| c.contains_key(&term))
    }

    /// Raw number of occurrences of `term` in `document`.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownDocument`] if `document` was not part of the build.
    pub fn frequency(&self, term: &str, document: &str) -> Result<usize> {
        let row = self.row_of(document)?;
        Ok(self.count_at(row, &preprocess(term)))
    }

    /// Score of `term` in `document`: the raw frequency as a float.
    pub fn score(&self, term: &str, document: &str) -> Result<f64> {
        self.frequency(term, document).map(|f| f as f64)
    }

    /// Occurrences of an already preprocessed term in row `row`.
    fn count_at(&self, row: usize, term: &str) -> usize {
        self.counts[row].get(term).copied().unwrap_or(0)
    }

    fn row_of(&self, document: &str) -> Result<usize> {
        self.documents
            .iter()
            .position(|d| d == document)
            .ok_or_else(|| Error::UnknownDocument(document.to_string()))
    }
}

fn count_ngrams(preprocessed: &str) -> HashMap<String, usize> {
    let tokens = tokenize(preprocessed);
    let mut counts = HashMap::new();
    for n in 1..=MAX_NGRAM {
        for window in tokens.windows(n) {
            *counts.entry(window.join(" ")).or_insert(0) += 1;
        }
    }
    counts
}

/// Score every document against every query term.
///
/// Columns are the distinct, non-empty preprocessed terms in the order
/// supplied. Terms that are not in the corpus vocabulary yield a column of
/// zeros. An empty term list yields rows with no score columns.
pub fn score<S: AsRef<str>>(docs: &[Document], query_terms: &[S]) -> ScoreMatrix {
    let index = SkillIndex::build(docs);

    let mut terms: Vec<String> = Vec::new();
    for raw in query_terms {
        let term = preprocess(raw.as_ref());
        if !term.is_empty() && !terms.contains(&term) {
            terms.push(term);
        }
    }

    for term in &terms {
        if !index.contains_term(term) {
            tracing::debug!(%term, "term not found in any document");
        }
    }

    let scores = (0..index.documents.len())
        .map(|row| terms.iter().map(|t| index.count_at(row, t) as f64).collect())
        .collect();

    ScoreMatrix {
        documents: index.documents,
        terms,
        scores,
    }
}

/// Documents × terms table of skill scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreMatrix {
    documents: Vec<String>,
    terms: Vec<String>,
    scores: Vec<Vec<f64>>,
}

impl ScoreMatrix {
    /// Row labels, in discovery order.
    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    /// Column labels, in query order, already preprocessed.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Cell for `(document, term)`. `Ok(None)` if `term` is not a column.
    pub fn get(&self, document: &str, term: &str) -> Result<Option<f64>> {
        let row = self.row(document)?;
        let term = preprocess(term);
        Ok(self.terms.iter().position(|t| *t == term).map(|col| row[col]))
    }

    /// All scores of one document, in column order.
    pub fn row(&self, document: &str) -> Result<&[f64]> {
        self.documents
            .iter()
            .position(|d| d == document)
            .map(|i| self.scores[i].as_slice())
            .ok_or_else(|| Error::UnknownDocument(document.to_string()))
    }

    /// All scores of one term, in row order.
    pub fn column(&self, term: &str) -> Option<Vec<f64>> {
        let term = preprocess(term);
        let col = self.terms.iter().position(|t| *t == term)?;
        Some(self.scores.iter().map(|r| r[col]).collect())
    }

    /// `(document, scores)` pairs in row order.
    pub fn rows(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.documents
            .iter()
            .map(String::as_str)
            .zip(self.scores.iter().map(Vec::as_slice))
    }

    /// A copy with every column passed through [`normalize_frequencies`].
    pub fn normalized(&self) -> ScoreMatrix {
        let mut scores = vec![vec![0.0; self.terms.len()]; self.documents.len()];
        for col in 0..self.terms.len() {
            let freqs: Vec<usize> = self
                .scores
                .iter()
                .map(|r| r[col].max(0.0).round() as usize)
                .collect();
            for (row, value) in normalize_frequencies(&freqs).into_iter().enumerate() {
                scores[row][col] = value;
            }
        }
        ScoreMatrix {
            documents: self.documents.clone(),
            terms: self.terms.clone(),
            scores,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<Document> {
        vec![
            Document::new(
                "alice",
                "Senior Python developer. Python, Django and machine learning. Built ML pipelines in Python.",
            ),
            Document::new("bob", "Java_Spring engineer; some C++ and C#. Node.js, .NET Core."),
            Document::new("carol", "Machine-learning researcher with deep learning experience."),
        ]
    }

    #[test]
    fn test_preprocess_example() {
        assert_eq!(
            preprocess("Node.js, C++ Developer - 5 yrs."),
            "node.js c++ developer 5 yrs"
        );
    }

    #[test]
    fn test_preprocess_keeps_leading_dot_tokens() {
        assert_eq!(preprocess("Experience with .NET and ASP.NET."), "experience with .net and asp.net");
    }

    #[test]
    fn test_preprocess_strips_symbols_and_whitespace() {
        assert_eq!(preprocess("  (Rust)\t& Go!\n\nSQL/NoSQL  "), "rust go sql nosql");
        assert_eq!(preprocess("C#/F# — Café"), "c# f# caf");
        assert_eq!(preprocess(""), "");
        assert_eq!(preprocess("..."), "..");
    }

    #[test]
    fn test_preprocess_is_idempotent() {
        let once = preprocess("Node.js, C++ Developer - 5 yrs. e.g. Vue.js.");
        assert_eq!(preprocess(&once), once);
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("machine learning  c++"), vec!["machine", "learning", "c++"]);
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_parse_skill_list() {
        assert_eq!(
            parse_skill_list(" Python, TensorFlow ,, Docker ,"),
            vec!["Python", "TensorFlow", "Docker"]
        );
        assert!(parse_skill_list(" , ").is_empty());
    }

    #[test]
    fn test_single_document_count() {
        let docs = vec![Document::new("alice", "Python Python Java")];
        let m = score(&docs, &["python"]);
        assert_eq!(m.documents(), &["alice".to_string()]);
        assert_eq!(m.terms(), &["python".to_string()]);
        assert_eq!(m.get("alice", "python").unwrap(), Some(2.0));
    }

    #[test]
    fn test_multi_word_and_symbol_terms() {
        let m = score(&corpus(), &["Machine Learning", "C++", "node.js", ".net", "python"]);
        assert_eq!(m.column("machine learning").unwrap(), vec![1.0, 0.0, 1.0]);
        assert_eq!(m.column("c++").unwrap(), vec![0.0, 1.0, 0.0]);
        assert_eq!(m.column("node.js").unwrap(), vec![0.0, 1.0, 0.0]);
        assert_eq!(m.column(".net").unwrap(), vec![0.0, 1.0, 0.0]);
        assert_eq!(m.column("python").unwrap(), vec![3.0, 0.0, 0.0]);
    }

    #[test]
    fn test_absent_term_is_zero_column() {
        let m = score(&corpus(), &["kubernetes"]);
        assert_eq!(m.column("kubernetes").unwrap(), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_terms_longer_than_four_tokens_never_match() {
        let docs = vec![Document::new("d", "a b c d e")];
        let m = score(&docs, &["a b c d", "a b c d e"]);
        assert_eq!(m.row("d").unwrap(), &[1.0, 0.0]);
    }

    #[test]
    fn test_ngrams_do_not_span_documents() {
        let docs = vec![Document::new("x", "deep"), Document::new("y", "learning")];
        let index = SkillIndex::build(&docs);
        assert!(!index.contains_term("deep learning"));
        assert!(index.contains_term("Deep"));
    }

    #[test]
    fn test_unknown_document_fails() {
        let index = SkillIndex::build(&corpus());
        assert_eq!(
            index.score("python", "mallory"),
            Err(Error::UnknownDocument("mallory".to_string()))
        );
        assert_eq!(
            index.score("kubernetes", "mallory"),
            Err(Error::UnknownDocument("mallory".to_string()))
        );
        let m = score(&corpus(), &["python"]);
        assert!(matches!(m.row("mallory"), Err(Error::UnknownDocument(_))));
        assert!(matches!(m.get("mallory", "python"), Err(Error::UnknownDocument(_))));
    }

    #[test]
    fn test_index_score_preprocesses_term() {
        let index = SkillIndex::build(&corpus());
        assert_eq!(index.score("PYTHON", "alice").unwrap(), 3.0);
        assert_eq!(index.frequency("Machine-Learning", "carol").unwrap(), 1);
    }

    #[test]
    fn test_matrix_cells_match_index_frequency() {
        let docs = corpus();
        let terms = ["python", "machine learning", "c++", "kubernetes"];
        let index = SkillIndex::build(&docs);
        let m = score(&docs, &terms);
        for doc in m.documents() {
            for term in terms {
                let expected = index.frequency(term, doc).unwrap() as f64;
                assert_eq!(m.get(doc, term).unwrap(), Some(expected), "{} / {}", doc, term);
            }
        }
    }

    #[test]
    fn test_columns_dedupe_after_preprocessing() {
        let m = score(&corpus(), &["Python", "python", "python.", "Java", "  ", "!!"]);
        assert_eq!(m.terms(), &["python".to_string(), "java".to_string()]);
    }

    #[test]
    fn test_empty_terms_keeps_rows_without_columns() {
        let m = score::<&str>(&corpus(), &[]);
        assert!(m.terms().is_empty());
        assert_eq!(m.documents().len(), 3);
        assert!(m.row("alice").unwrap().is_empty());
    }

    #[test]
    fn test_rows_follow_discovery_order() {
        let docs = vec![
            Document::new("zed", "rust"),
            Document::new("amy", "rust rust"),
            Document::new("zed", "ignored duplicate"),
        ];
        let m = score(&docs, &["rust"]);
        let rows: Vec<(&str, Vec<f64>)> = m.rows().map(|(d, s)| (d, s.to_vec())).collect();
        assert_eq!(rows, vec![("zed", vec![1.0]), ("amy", vec![2.0])]);
    }

    #[test]
    fn test_normalize_all_zero() {
        assert_eq!(normalize_frequencies(&[0, 0, 0]), vec![0.0, 0.0, 0.0]);
        assert!(normalize_frequencies(&[]).is_empty());
    }

    #[test]
    fn test_normalize_log_scale() {
        let n = normalize_frequencies(&[1, 3, 0]);
        assert_eq!(n, vec![0.6931, 1.3863, 0.0]);
        assert!(n[0] > 0.0 && n[1] > 0.0);
    }

    #[test]
    fn test_matrix_normalized_per_column() {
        let m = score(&corpus(), &["python", "kubernetes"]).normalized();
        assert_eq!(m.column("python").unwrap(), vec![1.3863, 0.0, 0.0]);
        assert_eq!(m.column("kubernetes").unwrap(), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_matrix_serializes() {
        let docs = vec![Document::new("alice", "Python")];
        let json = serde_json::to_value(score(&docs, &["python"])).unwrap();
        assert_eq!(json["documents"][0], "alice");
        assert_eq!(json["terms"][0], "python");
        assert_eq!(json["scores"][0][0], 1.0);
    }
}
