//! The processed CV corpus: a directory of `<candidate>.txt` files.
//!
//! The file stem is the candidate identifier. Listing is sorted by file
//! name so that skill tables and index rebuilds are reproducible.

use anyhow::{Context, Result};
use cv_harness_core::models::Document;
use cv_harness_core::Error;
use globset::{Glob, GlobMatcher};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Handle on a corpus directory.
#[derive(Debug, Clone)]
pub struct Corpus {
    root: PathBuf,
    matcher: GlobMatcher,
}

impl Corpus {
    /// Open (and create if missing) the corpus at `root`.
    pub fn open(root: &Path) -> Result<Self> {
        std::fs::create_dir_all(root)
            .with_context(|| format!("Failed to create corpus directory: {}", root.display()))?;
        Ok(Self {
            root: root.to_path_buf(),
            matcher: Glob::new("*.txt")?.compile_matcher(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<name>.txt`. Names that could escape the root are rejected.
    fn path_for(&self, name: &str) -> Result<PathBuf> {
        let escapes = name.is_empty()
            || name == "."
            || name == ".."
            || name.chars().any(|c| c == '/' || c == '\\' || std::path::is_separator(c));
        if escapes {
            return Err(Error::InvalidArgument(format!("invalid candidate name '{}'", name)).into());
        }
        Ok(self.root.join(format!("{}.txt", name)))
    }

    /// Paths of every `.txt` file directly under the root, sorted.
    fn files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = entry?;
            if entry.file_type().is_file() && self.matcher.is_match(entry.file_name()) {
                files.push(entry.into_path());
            }
        }
        files.sort();
        Ok(files)
    }

    /// Candidate identifiers, in listing order.
    pub fn candidate_names(&self) -> Result<Vec<String>> {
        Ok(self.files()?.iter().filter_map(|p| stem_of(p)).collect())
    }

    /// Read every document. Unreadable files are logged and skipped.
    pub fn list_documents(&self) -> Result<Vec<Document>> {
        let mut docs = Vec::new();
        for path in self.files()? {
            let Some(name) = stem_of(&path) else { continue };
            match std::fs::read_to_string(&path) {
                Ok(text) => docs.push(Document::new(name, text.trim())),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to read CV"),
            }
        }
        Ok(docs)
    }

    /// Read one candidate's CV.
    ///
    /// Fails with [`Error::NotFound`] when no `<name>.txt` exists.
    pub fn read_document(&self, name: &str) -> Result<Document> {
        let path = self.path_for(name)?;
        if !path.is_file() {
            return Err(Error::NotFound(format!("no CV for candidate '{}'", name)).into());
        }
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Document::new(name, text.trim()))
    }

    /// Write `<name>.txt`, replacing any existing file.
    pub fn write_document(&self, name: &str, text: &str) -> Result<PathBuf> {
        let path = self.path_for(name)?;
        std::fs::write(&path, text)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Delete every file in the corpus, returning how many were removed.
    pub fn clear(&self) -> Result<usize> {
        remove_files_in(&self.root)
    }
}

fn stem_of(path: &Path) -> Option<String> {
    path.file_stem().map(|s| s.to_string_lossy().to_string())
}

/// Delete the regular files directly under `dir`. Failures are logged and skipped.
pub fn remove_files_in(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }
    let mut removed = 0;
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        match std::fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(e) => {
                tracing::warn!(path = %entry.path().display(), error = %e, "could not delete file")
            }
        }
    }
    Ok(removed)
}
