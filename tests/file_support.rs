//! Ingestion of the supported upload formats through the `cvh` binary:
//! DOCX and TXT are extracted, broken or unsupported files are skipped
//! with a warning while the rest of the batch is saved.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn cvh_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop();
    path.pop();
    path.push("cvh");
    path
}

fn docx_with_paragraphs(paragraphs: &[&str]) -> Vec<u8> {
    use std::io::Write;
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
        zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        let xml = format!(
            "<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>{}</w:body></w:document>",
            body
        );
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    buf
}

fn setup_env() -> (TempDir, PathBuf, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();
    let files_dir = root.join("files");
    fs::create_dir_all(&files_dir).unwrap();

    let config_path = root.join("cvh.toml");
    fs::write(
        &config_path,
        format!(
            r#"[paths]
upload_dir = "{root}/uploads"
corpus_dir = "{root}/cvs"

[embedding]
provider = "disabled"

[llm]
extract_names = false
"#,
            root = root.display()
        ),
    )
    .unwrap();

    (tmp, config_path, files_dir)
}

fn run_cvh(config_path: &Path, args: &[String]) -> (String, String, bool) {
    let output = Command::new(cvh_binary())
        .arg("--config")
        .arg(config_path)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run cvh");
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.success(),
    )
}

fn ingest_args(files: &[PathBuf]) -> Vec<String> {
    let mut args = vec!["ingest".to_string()];
    args.extend(files.iter().map(|f| f.to_string_lossy().to_string()));
    args
}

#[test]
fn file_support_docx_extracted() {
    let (tmp, config_path, files_dir) = setup_env();
    let docx = files_dir.join("jane_doe.docx");
    fs::write(&docx, docx_with_paragraphs(&["Jane Doe", "Rust &amp; Go engineer"])).unwrap();

    let (stdout, stderr, success) = run_cvh(&config_path, &ingest_args(&[docx]));
    assert!(success, "ingest failed: {}", stderr);
    assert!(stdout.contains("saved: 1"));

    let text = fs::read_to_string(tmp.path().join("cvs/jane_doe.txt")).unwrap();
    assert_eq!(text, "Jane Doe Rust & Go engineer");
}

#[test]
fn file_support_bad_files_skipped() {
    let (tmp, config_path, files_dir) = setup_env();
    let good = files_dir.join("alice.txt");
    fs::write(&good, "Alice\nPython").unwrap();
    let bad_pdf = files_dir.join("broken.pdf");
    fs::write(&bad_pdf, b"not a valid pdf").unwrap();
    let odt = files_dir.join("carol.odt");
    fs::write(&odt, b"odt bytes").unwrap();

    let (stdout, stderr, success) = run_cvh(&config_path, &ingest_args(&[good, bad_pdf, odt]));
    assert!(success, "ingest failed: {}", stderr);
    assert!(stdout.contains("uploaded: 3"), "stdout: {}", stdout);
    assert!(stdout.contains("parsed: 1 of 3"), "stdout: {}", stdout);
    assert!(stdout.contains("saved: 1"), "stdout: {}", stdout);
    assert!(stderr.contains("failed to parse CV"), "stderr: {}", stderr);
    assert!(stderr.contains("unsupported format: .odt"), "stderr: {}", stderr);

    let saved: Vec<_> = fs::read_dir(tmp.path().join("cvs"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(saved, vec!["alice.txt"]);
}

#[test]
fn file_support_all_unparseable_fails() {
    let (_tmp, config_path, files_dir) = setup_env();
    let odt = files_dir.join("carol.odt");
    fs::write(&odt, b"odt bytes").unwrap();

    let (_, stderr, success) = run_cvh(&config_path, &ingest_args(&[odt]));
    assert!(!success);
    assert!(stderr.contains("Parsing failed"), "stderr: {}", stderr);
}

#[test]
fn file_support_reprocess_upload_area() {
    let (tmp, config_path, files_dir) = setup_env();
    let first = files_dir.join("first.txt");
    fs::write(&first, "First candidate").unwrap();
    let (_, stderr, success) = run_cvh(&config_path, &ingest_args(&[first]));
    assert!(success, "{}", stderr);

    // Earlier uploads are processed again together with the new one.
    let second = files_dir.join("second.txt");
    fs::write(&second, "Second candidate").unwrap();
    let (stdout, _, success) = run_cvh(&config_path, &ingest_args(&[second]));
    assert!(success);
    assert!(stdout.contains("uploaded: 1"));
    assert!(stdout.contains("saved: 2"));
    assert!(tmp.path().join("cvs/first.txt").exists());
    assert!(tmp.path().join("cvs/second.txt").exists());
}
