//! `cvh skills`: term-frequency skill report over the corpus.
//!
//! Three views of the same [`ScoreMatrix`]: the full table, one skill
//! across candidates (ascending, with a text bar), and one candidate
//! across skills (sorted by skill name).

use anyhow::Result;
use cv_harness_core::skills::{self, parse_skill_list, preprocess, ScoreMatrix};

use crate::config::Config;
use crate::corpus::Corpus;

const BAR_WIDTH: usize = 30;

/// Which slice of the matrix to print.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkillView {
    Table,
    Skill(String),
    Candidate(String),
}

fn format_score(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{:.0}", v)
    } else {
        format!("{:.4}", v)
    }
}

fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let len = ((value / max) * BAR_WIDTH as f64).round().max(1.0) as usize;
    "#".repeat(len)
}

/// Full documents × terms table with aligned columns.
pub fn render_table(matrix: &ScoreMatrix) -> String {
    if matrix.documents().is_empty() {
        return "No data available.\n".to_string();
    }

    let mut header = vec!["Candidate".to_string()];
    header.extend(matrix.terms().iter().cloned());
    let mut rows = vec![header];
    for (doc, scores) in matrix.rows() {
        let mut row = vec![doc.to_string()];
        row.extend(scores.iter().map(|v| format_score(*v)));
        rows.push(row);
    }

    let widths: Vec<usize> = (0..rows[0].len())
        .map(|col| rows.iter().map(|r| r[col].chars().count()).max().unwrap_or(0))
        .collect();

    let mut out = String::new();
    for (i, row) in rows.iter().enumerate() {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(col, cell)| {
                if col == 0 {
                    format!("{:<w$}", cell, w = widths[col])
                } else {
                    format!("{:>w$}", cell, w = widths[col])
                }
            })
            .collect();
        out.push_str(cells.join("  ").trim_end());
        out.push('\n');
        if i == 0 {
            let rule: usize = widths.iter().sum::<usize>() + 2 * (widths.len() - 1);
            out.push_str(&"-".repeat(rule));
            out.push('\n');
        }
    }
    out
}

/// One skill per candidate, ascending by score.
pub fn render_skill(matrix: &ScoreMatrix, skill: &str) -> String {
    if matrix.documents().is_empty() {
        return "No data available.\n".to_string();
    }
    let Some(column) = matrix.column(skill) else {
        return format!("No mentions of skill: {}\n", skill);
    };

    let mut entries: Vec<(&String, f64)> = matrix.documents().iter().zip(column).collect();
    entries.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    let max = entries.iter().map(|e| e.1).fold(0.0, f64::max);
    let name_width = entries.iter().map(|e| e.0.chars().count()).max().unwrap_or(0);

    let mut out = format!("Mentions of {} per Candidate\n", preprocess(skill));
    for (doc, value) in entries {
        out.push_str(
            format!(
                "  {:<w$}  {:>8}  {}",
                doc,
                format_score(value),
                bar(value, max),
                w = name_width
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

/// One candidate's skills, sorted by skill name.
pub fn render_candidate(matrix: &ScoreMatrix, candidate: &str) -> String {
    if matrix.documents().is_empty() {
        return "No data available.\n".to_string();
    }
    let Ok(row) = matrix.row(candidate) else {
        return format!("No data for candidate: {}\n", candidate);
    };

    let mut entries: Vec<(&String, f64)> = matrix.terms().iter().zip(row.iter().copied()).collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    let max = entries.iter().map(|e| e.1).fold(0.0, f64::max);
    let term_width = entries.iter().map(|e| e.0.chars().count()).max().unwrap_or(0);

    let mut out = format!("Skill Mentions for {}\n", candidate);
    for (term, value) in entries {
        out.push_str(
            format!(
                "  {:<w$}  {:>8}  {}",
                term,
                format_score(value),
                bar(value, max),
                w = term_width
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

/// Score `input` (comma-separated skills) against the corpus and render `view`.
pub fn skill_report(
    corpus: &Corpus,
    input: &str,
    view: &SkillView,
    normalize: bool,
    json: bool,
) -> Result<String> {
    let terms = parse_skill_list(input);
    let docs = corpus.list_documents()?;
    let mut matrix = skills::score(&docs, &terms);
    if normalize {
        matrix = matrix.normalized();
    }
    tracing::info!(
        documents = matrix.documents().len(),
        terms = matrix.terms().len(),
        "scored skills"
    );

    if json {
        return Ok(serde_json::to_string_pretty(&matrix)? + "\n");
    }
    Ok(match view {
        SkillView::Table => render_table(&matrix),
        SkillView::Skill(skill) => render_skill(&matrix, skill),
        SkillView::Candidate(candidate) => render_candidate(&matrix, candidate),
    })
}

pub fn run_skills(
    config: &Config,
    input: &str,
    view: SkillView,
    normalize: bool,
    json: bool,
) -> Result<()> {
    let corpus = Corpus::open(&config.paths.corpus_dir)?;
    print!("{}", skill_report(&corpus, input, &view, normalize, json)?);
    Ok(())
}

/// `cvh candidates`
pub fn run_candidates(config: &Config) -> Result<()> {
    let corpus = Corpus::open(&config.paths.corpus_dir)?;
    let names = corpus.candidate_names()?;
    if names.is_empty() {
        println!("No candidates.");
        return Ok(());
    }
    for name in names {
        println!("{}", name);
    }
    Ok(())
}
