//! Plain-text extraction for uploaded CVs (PDF, DOCX, TXT).
//!
//! The container format is chosen by file extension. Anything else fails
//! with [`Error::UnsupportedFormat`](cv_harness_core::Error::UnsupportedFormat),
//! which the ingestion batch logs and skips.

use std::io::Read;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use cv_harness_core::Error;

/// Extensions accepted by [`Format::from_path`], lowercase, without the dot.
const EXTENSIONS: &[(&str, Format)] = &[
    ("pdf", Format::Pdf),
    ("docx", Format::Docx),
    ("txt", Format::Txt),
];

/// Maximum decompressed bytes read from `word/document.xml` (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// A supported document container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Pdf,
    Docx,
    Txt,
}

impl Format {
    /// Detect the format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Format, Error> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if ext.is_empty() {
            return Err(Error::UnsupportedFormat(format!(
                "{} has no file extension",
                path.display()
            )));
        }
        EXTENSIONS
            .iter()
            .find(|(known, _)| *known == ext)
            .map(|(_, format)| *format)
            .ok_or_else(|| Error::UnsupportedFormat(format!(".{}", ext)))
    }
}

/// Extract raw text from in-memory bytes of the given format.
pub fn extract_text(bytes: &[u8], format: Format) -> Result<String> {
    match format {
        Format::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| anyhow!("PDF extraction failed: {}", e)),
        Format::Docx => extract_docx(bytes),
        Format::Txt => String::from_utf8(bytes.to_vec()).context("text file is not valid UTF-8"),
    }
}

/// Read a file, extract its text, and collapse whitespace.
pub fn extract_file(path: &Path) -> Result<String> {
    let format = Format::from_path(path)?;
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let raw = extract_text(&bytes, format)
        .with_context(|| format!("Failed to extract text from {}", path.display()))?;
    Ok(clean_text(&raw))
}

/// Trim and collapse every whitespace run to a single space.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn extract_docx(bytes: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| anyhow!("DOCX is not a valid archive: {}", e))?;
    let entry = archive
        .by_name("word/document.xml")
        .map_err(|_| anyhow!("word/document.xml not found"))?;

    let mut doc_xml = Vec::new();
    entry.take(MAX_XML_ENTRY_BYTES).read_to_end(&mut doc_xml)?;
    if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        anyhow::bail!("word/document.xml exceeds size limit");
    }
    extract_wordprocessing_text(&doc_xml)
}

/// Collect `<w:t>` runs, ending each paragraph with a newline and turning
/// tabs and breaks into whitespace so words from adjacent runs stay apart.
fn extract_wordprocessing_text(xml: &[u8]) -> Result<String> {
    use quick_xml::events::Event;

    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut in_text = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text = true,
            Ok(Event::Text(te)) if in_text => {
                let text = te.unescape().map_err(|e| anyhow!("DOCX XML: {}", e))?;
                out.push_str(&text);
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => out.push('\t'),
                b"br" | b"cr" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(anyhow!("DOCX XML: {}", e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}
