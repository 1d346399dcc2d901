use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod assign;
mod config;
mod embedding;
mod linker;
mod matrix;
mod models;
mod pipeline;
mod rank;
mod report;
mod scoring;
mod tables;
mod text;

use config::MatchConfig;
use pipeline::MatchPaths;

#[derive(Parser)]
#[command(name = "poster-judge-match")]
#[command(about = "Scores, assigns and ranks conference poster judges", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct MatchArgs {
    #[arg(long)]
    posters: PathBuf,
    #[arg(long)]
    judges: PathBuf,
    #[arg(long)]
    professors: PathBuf,
    #[arg(long, default_value = "posters_with_judges.csv")]
    posters_out: PathBuf,
    #[arg(long, default_value = "judges_with_posters.csv")]
    judges_out: PathBuf,
    /// Optional markdown summary of the assignment
    #[arg(long)]
    summary: Option<PathBuf>,
    /// Use deterministic hash embeddings instead of loading a model
    #[arg(long)]
    stub_embeddings: bool,
    #[arg(long)]
    model_dir: Option<PathBuf>,
    /// Component weights as `semantic,lexical,field,expertise`
    #[arg(long)]
    weights: Option<String>,
    #[arg(long)]
    poster_capacity: Option<usize>,
    #[arg(long)]
    judge_capacity: Option<usize>,
}

impl MatchArgs {
    fn paths(&self) -> MatchPaths {
        MatchPaths {
            posters: self.posters.clone(),
            judges: self.judges.clone(),
            professors: self.professors.clone(),
            posters_out: self.posters_out.clone(),
            judges_out: self.judges_out.clone(),
            summary_out: self.summary.clone(),
        }
    }

    fn config(&self) -> anyhow::Result<MatchConfig> {
        let mut config = MatchConfig::from_env().context("reading POSTER_MATCH_* environment")?;
        if let Some(raw) = &self.weights {
            config.weights = config::parse_weights(raw)?;
        }
        if let Some(poster) = self.poster_capacity {
            anyhow::ensure!(poster > 0, "--poster-capacity must be at least 1");
            config.capacities.poster = poster;
        }
        if let Some(judge) = self.judge_capacity {
            anyhow::ensure!(judge > 0, "--judge-capacity must be at least 1");
            config.capacities.judge = judge;
        }
        if let Some(dir) = &self.model_dir {
            config.model_dir = Some(dir.clone());
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Score every eligible poster/judge pair and assign judges
    Match(MatchArgs),
    /// Build the poster x judge incidence matrix from the assignment tables
    Matrix {
        #[arg(long, default_value = "posters_with_judges.csv")]
        posters_out: PathBuf,
        #[arg(long, default_value = "judges_with_posters.csv")]
        judges_out: PathBuf,
        #[arg(long, default_value = "incidence_matrix.csv")]
        out: PathBuf,
    },
    /// Expand the incidence matrix into an empty rubric score table
    Reshape {
        #[arg(long, default_value = "incidence_matrix.csv")]
        matrix: PathBuf,
        #[arg(long, default_value = "rubric_scores.csv")]
        out: PathBuf,
    },
    /// Record one judge's rubric scores for a poster
    Record {
        #[arg(long, default_value = "rubric_scores.csv")]
        rubric: PathBuf,
        #[arg(long)]
        poster: u32,
        #[arg(long)]
        judge: u32,
        #[arg(long)]
        innovation: u32,
        #[arg(long)]
        clarity: u32,
        #[arg(long)]
        presentation: u32,
    },
    /// Rank posters from the rubric score table
    Rank {
        #[arg(long, default_value = "rubric_scores.csv")]
        rubric: PathBuf,
        #[arg(long, default_value = "ranked_rubric_scores.csv")]
        out: PathBuf,
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Match, build the matrix and prepare the rubric table in one go
    Run {
        #[command(flatten)]
        matching: MatchArgs,
        #[arg(long, default_value = "incidence_matrix.csv")]
        matrix_out: PathBuf,
        #[arg(long, default_value = "rubric_scores.csv")]
        rubric_out: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Match(args) => {
            let config = args.config()?;
            let paths = args.paths();
            let outcome = pipeline::run_match(&paths, &config, args.stub_embeddings)
                .context("matching stage")?;
            println!(
                "Assigned {} poster/judge pairs from {} scored pairs.",
                outcome.assignment.pair_count(),
                outcome.scores.len()
            );
            println!("Posters written to {}.", paths.posters_out.display());
            println!("Judges written to {}.", paths.judges_out.display());
        }
        Commands::Matrix {
            posters_out,
            judges_out,
            out,
        } => {
            let matrix = pipeline::run_matrix(&posters_out, &judges_out, &out).context("matrix stage")?;
            println!(
                "Incidence matrix ({} posters x {} judges) written to {}.",
                matrix.poster_ids().len(),
                matrix.judge_ids().len(),
                out.display()
            );
        }
        Commands::Reshape { matrix, out } => {
            let rows = pipeline::run_reshape(&matrix, &out).context("reshape stage")?;
            println!("Rubric table with {} rows written to {}.", rows.len(), out.display());
        }
        Commands::Record {
            rubric,
            poster,
            judge,
            innovation,
            clarity,
            presentation,
        } => {
            let row = pipeline::run_record(&rubric, poster, judge, (innovation, clarity, presentation))
                .context("record stage")?;
            println!(
                "Poster {} judge {} total {}.",
                row.poster_id, row.judge_id, row.total
            );
        }
        Commands::Rank {
            rubric,
            out,
            report,
        } => {
            let ranked = pipeline::run_rank(&rubric, &out, report.as_deref()).context("ranking stage")?;
            if ranked.is_empty() {
                println!("No rubric scores recorded.");
                return Ok(());
            }
            println!("Top posters:");
            for poster in ranked.iter().take(10) {
                println!(
                    "- #{} poster {} total {} (innovation {:.2}, clarity {:.2}, presentation {:.2})",
                    poster.rank,
                    poster.poster_id,
                    poster.sum_total,
                    poster.innovation,
                    poster.clarity,
                    poster.presentation
                );
            }
            println!("Ranked rows written to {}.", out.display());
            if let Some(report) = report {
                println!("Report written to {}.", report.display());
            }
        }
        Commands::Run {
            matching,
            matrix_out,
            rubric_out,
        } => {
            let config = matching.config()?;
            let paths = matching.paths();
            let outcome = pipeline::run_match(&paths, &config, matching.stub_embeddings)
                .context("matching stage")?;
            let matrix = pipeline::run_matrix(&paths.posters_out, &paths.judges_out, &matrix_out)
                .context("matrix stage")?;
            if matrix != pipeline::matrix_from_assignment(&outcome.assignment, config.capacities.poster) {
                tracing::warn!("matrix read back from the output tables differs from the in-memory assignment");
            }
            let rows = pipeline::run_reshape(&matrix_out, &rubric_out).context("reshape stage")?;
            println!(
                "Assigned {} pairs; matrix {} x {}; {} rubric rows written to {}.",
                outcome.assignment.pair_count(),
                matrix.poster_ids().len(),
                matrix.judge_ids().len(),
                rows.len(),
                rubric_out.display()
            );
        }
    }

    Ok(())
}
