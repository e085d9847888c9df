//! # CV Harness CLI (`cvh`)
//!
//! ## Usage
//!
//! ```bash
//! cvh --config ./config/cvh.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `cvh ingest <files…>` | Upload CVs, extract text, and save one file per candidate |
//! | `cvh candidates` | List processed candidates |
//! | `cvh index` | Rebuild the vector index from the corpus |
//! | `cvh ask "<question>"` | Answer a question from retrieved CV excerpts |
//! | `cvh search "<query>"` | Show raw similarity hits |
//! | `cvh summarize <candidate>` | Summarize one candidate's CV |
//! | `cvh skills "<a, b>"` | Score skill mentions across the corpus |
//! | `cvh clear` | Delete uploaded and processed files |
//!
//! ## Examples
//!
//! ```bash
//! cvh ingest ~/cvs/*.pdf
//! cvh index
//! cvh ask "Who has production Kubernetes experience?"
//! cvh skills "python, docker, machine learning" --skill docker
//! cvh summarize "Jane Doe"
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use cv_harness::skills_cmd::SkillView;
use cv_harness::{ask, config, index_cmd, ingest, logging, skills_cmd, summary};

/// CV Harness: retrieval, summaries, and skill scoring over candidate CVs.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. A missing file means built-in defaults.
#[derive(Parser)]
#[command(
    name = "cvh",
    about = "CV Harness: local-first retrieval, summaries, and skill scoring over candidate CVs",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/cvh.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload CV files and process the upload area into the corpus.
    ///
    /// Files are copied into the upload directory, then every file there
    /// is parsed (PDF, DOCX, TXT), named, and saved as `<candidate>.txt`.
    /// With no files, only the existing upload area is processed.
    Ingest {
        files: Vec<PathBuf>,

        /// Name candidates after their file instead of asking the model.
        #[arg(long)]
        no_llm_names: bool,
    },

    /// List processed candidates.
    Candidates,

    /// Rebuild the vector index from the processed corpus.
    Index,

    /// Answer a question using the CVs most relevant to it.
    Ask {
        question: String,

        /// Print the assembled context before the answer.
        #[arg(long)]
        show_context: bool,
    },

    /// Show the raw similarity hits for a query.
    Search {
        query: String,

        /// Maximum number of hits (defaults to retrieval.top_k).
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Summarize a candidate's full CV.
    Summarize { candidate: String },

    /// Score comma-separated skills across all candidates.
    Skills {
        /// Comma-separated skill list, e.g. "python, docker, machine learning".
        skills: String,

        /// Show one skill across candidates, lowest first.
        #[arg(long, conflicts_with = "candidate")]
        skill: Option<String>,

        /// Show one candidate across skills, sorted by skill name.
        #[arg(long)]
        candidate: Option<String>,

        /// Log-scale each column: ln(count + 1).
        #[arg(long)]
        normalize: bool,

        /// Print the score matrix as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Delete every uploaded and processed file.
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let cfg = config::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Ingest {
            files,
            no_llm_names,
        } => {
            ingest::run_ingest(&cfg, &files, no_llm_names).await?;
        }
        Commands::Candidates => {
            skills_cmd::run_candidates(&cfg)?;
        }
        Commands::Index => {
            index_cmd::run_index(&cfg).await?;
        }
        Commands::Ask {
            question,
            show_context,
        } => {
            ask::run_ask(&cfg, &question, show_context).await?;
        }
        Commands::Search { query, limit } => {
            ask::run_search(&cfg, &query, limit).await?;
        }
        Commands::Summarize { candidate } => {
            summary::run_summarize(&cfg, &candidate).await?;
        }
        Commands::Skills {
            skills,
            skill,
            candidate,
            normalize,
            json,
        } => {
            let view = match (skill, candidate) {
                (Some(s), _) => SkillView::Skill(s),
                (None, Some(c)) => SkillView::Candidate(c),
                (None, None) => SkillView::Table,
            };
            skills_cmd::run_skills(&cfg, &skills, view, normalize, json)?;
        }
        Commands::Clear => {
            ingest::run_clear(&cfg)?;
        }
    }

    Ok(())
}
