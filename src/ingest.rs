//! CV ingestion: upload → parse → name → save.
//!
//! `cvh ingest <files…>` copies files into the upload area, extracts text
//! from everything found there, picks a candidate identifier for each CV,
//! and writes `<identifier>.txt` into the corpus. A file that fails at any
//! step is logged and skipped; the rest of the batch continues.
//!
//! State for one invocation lives in an [`UploadSession`] owned by the
//! caller.

use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Config;
use crate::corpus::{self, Corpus};
use crate::extract;
use crate::llm::{ChatClient, LanguageModel};
use crate::naming;

/// Text extracted from one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCv {
    pub path: PathBuf,
    /// Whitespace-collapsed text.
    pub text: String,
}

/// Files handled by one ingestion run.
#[derive(Debug, Default)]
pub struct UploadSession {
    /// Copies made in the upload area during this session.
    pub uploaded: Vec<PathBuf>,
    pub parsed: Vec<ParsedCv>,
}

impl UploadSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy `files` into `upload_dir`. Unreadable sources are logged and skipped.
    pub fn upload(&mut self, upload_dir: &Path, files: &[PathBuf]) -> Result<usize> {
        std::fs::create_dir_all(upload_dir)
            .with_context(|| format!("Failed to create upload directory: {}", upload_dir.display()))?;

        let mut copied = 0;
        for file in files {
            let Some(name) = file.file_name() else {
                tracing::warn!(path = %file.display(), "not a file path, skipping");
                continue;
            };
            let dest = upload_dir.join(name);
            if is_same_file(file, &dest) {
                tracing::info!(path = %dest.display(), "already in upload area");
                self.uploaded.push(dest);
                copied += 1;
                continue;
            }
            match std::fs::copy(file, &dest) {
                Ok(_) => {
                    tracing::info!(from = %file.display(), to = %dest.display(), "uploaded");
                    self.uploaded.push(dest);
                    copied += 1;
                }
                Err(e) => tracing::warn!(path = %file.display(), error = %e, "upload failed"),
            }
        }
        Ok(copied)
    }

    /// Parse every file currently in `upload_dir`, replacing `self.parsed`.
    pub fn parse_upload_area(&mut self, upload_dir: &Path) -> Result<usize> {
        self.parsed = parse_files(&list_uploads(upload_dir)?);
        Ok(self.parsed.len())
    }
}

/// Whether `a` and `b` resolve to the same existing file.
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Regular files directly under `upload_dir`, sorted. Missing directory → empty.
pub fn list_uploads(upload_dir: &Path) -> Result<Vec<PathBuf>> {
    if !upload_dir.exists() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(upload_dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Extract text from each path. Unsupported or unreadable files are logged and skipped.
pub fn parse_files(paths: &[PathBuf]) -> Vec<ParsedCv> {
    let mut parsed = Vec::with_capacity(paths.len());
    for path in paths {
        match extract::extract_file(path) {
            Ok(text) => {
                tracing::debug!(path = %path.display(), chars = text.len(), "parsed");
                parsed.push(ParsedCv {
                    path: path.clone(),
                    text,
                });
            }
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to parse CV"),
        }
    }
    parsed
}

/// Name each parsed CV and write it into the corpus.
///
/// With `namer` set, the model is asked for the candidate's name; a blank
/// or failed reply falls back to the file stem. Returns the written paths.
pub async fn structure_and_save(
    parsed: &[ParsedCv],
    corpus: &Corpus,
    namer: Option<(&dyn LanguageModel, f32)>,
) -> Vec<PathBuf> {
    let mut saved = Vec::with_capacity(parsed.len());
    let mut seen = HashSet::new();

    for cv in parsed {
        let extracted = match namer {
            Some((llm, temperature)) => {
                naming::extract_candidate_name(llm, &cv.text, temperature).await
            }
            None => None,
        };
        let id = naming::document_identifier(extracted.as_deref(), &cv.path);
        if !seen.insert(id.clone()) {
            tracing::warn!(candidate = %id, path = %cv.path.display(), "duplicate candidate name, overwriting");
        }

        match corpus.write_document(&id, &cv.text) {
            Ok(path) => saved.push(path),
            Err(e) => tracing::warn!(path = %cv.path.display(), error = %e, "failed to save CV"),
        }
    }
    saved
}

/// `cvh ingest`: upload `files`, then process everything in the upload area.
pub async fn run_ingest(config: &Config, files: &[PathBuf], no_llm_names: bool) -> Result<()> {
    let upload_dir = &config.paths.upload_dir;
    let corpus = Corpus::open(&config.paths.corpus_dir)?;
    let mut session = UploadSession::new();

    if !files.is_empty() {
        session.upload(upload_dir, files)?;
    }
    let found = list_uploads(upload_dir)?.len();
    if found == 0 {
        println!("ingest");
        println!("  no uploaded files found");
        return Ok(());
    }

    session.parse_upload_area(upload_dir)?;
    if session.parsed.is_empty() {
        bail!("Parsing failed for all {} uploaded file(s)", found);
    }

    let client = if no_llm_names || !config.llm.extract_names {
        None
    } else {
        match ChatClient::from_config(&config.llm) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "name extraction unavailable, using file names");
                None
            }
        }
    };
    let namer = client
        .as_ref()
        .map(|c| (c as &dyn LanguageModel, config.llm.name_temperature));

    let saved = structure_and_save(&session.parsed, &corpus, namer).await;
    if saved.is_empty() {
        bail!("No CVs could be saved to {}", corpus.root().display());
    }

    println!("ingest");
    println!("  uploaded: {}", session.uploaded.len());
    println!("  parsed: {} of {}", session.parsed.len(), found);
    println!("  saved: {}", saved.len());
    for path in &saved {
        println!("    {}", path.display());
    }
    println!("ok");
    Ok(())
}

/// `cvh clear`: delete every uploaded and processed file.
pub fn run_clear(config: &Config) -> Result<()> {
    let uploads = corpus::remove_files_in(&config.paths.upload_dir)?;
    let processed = Corpus::open(&config.paths.corpus_dir)?.clear()?;

    println!("clear");
    if uploads > 0 {
        println!("  uploaded files removed: {}", uploads);
    } else {
        println!("  no uploaded files to clear");
    }
    if processed > 0 {
        println!("  processed CVs removed: {}", processed);
    } else {
        println!("  no processed CVs to clear");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::fake::ScriptedModel;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_upload_and_parse_skips_bad_files() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        std::fs::create_dir_all(&src).unwrap();
        let good = write(&src, "alice.txt", "Alice  Smith\nRust  developer");
        let bad = write(&src, "notes.odt", "binary");
        let missing = src.join("missing.txt");

        let upload_dir = tmp.path().join("uploads");
        let mut session = UploadSession::new();
        let copied = session.upload(&upload_dir, &[good, bad, missing]).unwrap();
        assert_eq!(copied, 2);
        assert_eq!(session.uploaded.len(), 2);

        assert_eq!(session.parse_upload_area(&upload_dir).unwrap(), 1);
        assert_eq!(session.parsed[0].text, "Alice Smith Rust developer");
        assert!(session.parsed[0].path.ends_with("alice.txt"));
    }

    #[test]
    fn test_upload_from_upload_area_keeps_content() {
        let tmp = TempDir::new().unwrap();
        let upload_dir = tmp.path().join("uploads");
        std::fs::create_dir_all(&upload_dir).unwrap();
        let existing = write(&upload_dir, "alice.txt", "Alice Smith Rust developer");

        let mut session = UploadSession::new();
        let copied = session
            .upload(&upload_dir, &[existing.clone(), upload_dir.join("./alice.txt")])
            .unwrap();
        assert_eq!(copied, 2);
        assert_eq!(
            std::fs::read_to_string(&existing).unwrap(),
            "Alice Smith Rust developer"
        );

        assert_eq!(session.parse_upload_area(&upload_dir).unwrap(), 1);
        assert_eq!(session.parsed[0].text, "Alice Smith Rust developer");
    }

    #[test]
    fn test_list_uploads_missing_dir() {
        assert!(list_uploads(Path::new("/nonexistent/uploads")).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_structure_and_save_with_file_stems() {
        let tmp = TempDir::new().unwrap();
        let corpus = Corpus::open(&tmp.path().join("cvs")).unwrap();
        let parsed = vec![
            ParsedCv {
                path: PathBuf::from("uploads/bob_cv.pdf"),
                text: "Bob Python".to_string(),
            },
            ParsedCv {
                path: PathBuf::from("uploads/alice.docx"),
                text: "Alice Rust".to_string(),
            },
        ];
        let saved = structure_and_save(&parsed, &corpus, None).await;
        assert_eq!(saved.len(), 2);
        assert_eq!(corpus.candidate_names().unwrap(), vec!["alice", "bob_cv"]);
        assert_eq!(corpus.read_document("bob_cv").unwrap().text, "Bob Python");
    }

    #[tokio::test]
    async fn test_structure_and_save_uses_model_name() {
        let tmp = TempDir::new().unwrap();
        let corpus = Corpus::open(&tmp.path().join("cvs")).unwrap();
        let parsed = vec![ParsedCv {
            path: PathBuf::from("uploads/cv1.pdf"),
            text: "Jane Doe Rust".to_string(),
        }];
        let model = ScriptedModel::new(&["Jane Doe"]);
        let llm: &dyn LanguageModel = &model;
        structure_and_save(&parsed, &corpus, Some((llm, 0.1))).await;
        assert_eq!(corpus.candidate_names().unwrap(), vec!["Jane Doe"]);

        let failing = ScriptedModel::failing();
        let llm: &dyn LanguageModel = &failing;
        structure_and_save(&parsed, &corpus, Some((llm, 0.1))).await;
        assert_eq!(corpus.candidate_names().unwrap(), vec!["Jane Doe", "cv1"]);
    }
}
