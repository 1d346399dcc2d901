use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Local;
use tracing::info;

use crate::assign::{score_pairs, AssignmentStrategy, GreedyAssigner};
use crate::config::MatchConfig;
use crate::embedding::SentenceEmbedder;
use crate::linker::link_judges;
use crate::matrix::IncidenceMatrix;
use crate::models::{Assignment, PairScore, PosterAssignmentRow, RankedPoster, RubricScore};
use crate::rank::{attach_ranks, rank_posters, RubricTable};
use crate::report;
use crate::scoring::lexical::KeywordOverlap;
use crate::scoring::MatchScorer;
use crate::tables;

#[derive(Debug, Clone)]
pub struct MatchPaths {
    pub posters: PathBuf,
    pub judges: PathBuf,
    pub professors: PathBuf,
    pub posters_out: PathBuf,
    pub judges_out: PathBuf,
    pub summary_out: Option<PathBuf>,
}

#[derive(Debug)]
pub struct MatchOutcome {
    pub scores: Vec<PairScore>,
    pub assignment: Assignment,
}

/// Scores every eligible pair, assigns judges and writes both output tables.
pub fn run_match(paths: &MatchPaths, config: &MatchConfig, stub_embeddings: bool) -> anyhow::Result<MatchOutcome> {
    let posters = tables::read_posters(&paths.posters).context("loading posters")?;
    let judges = tables::read_judges(&paths.judges).context("loading judges")?;
    let professors = tables::read_professors(&paths.professors).context("loading professors")?;
    info!(
        posters = posters.len(),
        judges = judges.len(),
        professors = professors.len(),
        "input tables loaded"
    );

    let links = link_judges(&judges, &professors);
    let linked = links.values().filter(|link| link.is_some()).count();
    info!(linked, unlinked = links.len() - linked, "judges linked to professor profiles");

    let embedder = SentenceEmbedder::load(config.embedder_config(stub_embeddings))
        .context("loading sentence embedding model")?;
    let scorer = MatchScorer::new(&embedder, KeywordOverlap::new(config.max_features), config.weights);
    info!(weights = ?scorer.weights(), stub = embedder.is_stub(), "scorer ready");

    let scores = score_pairs(&scorer, &posters, &judges, &links);
    let poster_ids: Vec<u32> = posters.iter().map(|p| p.id).collect();
    let judge_ids: Vec<u32> = judges.iter().map(|j| j.id).collect();
    let assignment = GreedyAssigner::new(config.capacities).assign(&scores, &poster_ids, &judge_ids);

    tables::write_poster_assignments(&paths.posters_out, &posters, &assignment, config.capacities.poster)
        .context("writing poster assignments")?;
    tables::write_judge_assignments(&paths.judges_out, &judges, &assignment, config.capacities.judge)
        .context("writing judge assignments")?;

    if let Some(summary_out) = &paths.summary_out {
        let summary = report::build_assignment_report(
            Local::now().date_naive(),
            &scores,
            &assignment,
            config.capacities.poster,
        );
        std::fs::write(summary_out, summary)
            .with_context(|| format!("writing assignment summary to {}", summary_out.display()))?;
    }

    Ok(MatchOutcome { scores, assignment })
}

/// Builds the incidence matrix from the poster and judge output tables.
pub fn run_matrix(posters_out: &Path, judges_out: &Path, matrix_out: &Path) -> anyhow::Result<IncidenceMatrix> {
    let rows = tables::read_poster_assignments(posters_out).context("loading poster assignments")?;
    let judge_ids = tables::read_judge_ids(judges_out).context("loading judge ids")?;
    let matrix = IncidenceMatrix::build(&rows, judge_ids);
    tables::write_matrix(matrix_out, &matrix).context("writing incidence matrix")?;
    info!(
        posters = matrix.poster_ids().len(),
        judges = matrix.judge_ids().len(),
        "incidence matrix written"
    );
    Ok(matrix)
}

/// Builds the matrix straight from an in-memory assignment.
pub fn matrix_from_assignment(assignment: &Assignment, poster_slots: usize) -> IncidenceMatrix {
    let rows = PosterAssignmentRow::from_assignment(assignment, poster_slots);
    let judge_ids = assignment.judge_posters.keys().map(u32::to_string);
    IncidenceMatrix::build(&rows, judge_ids)
}

/// Expands the matrix into an empty rubric score table.
pub fn run_reshape(matrix_path: &Path, rubric_out: &Path) -> anyhow::Result<Vec<RubricScore>> {
    let matrix = tables::read_matrix(matrix_path).context("loading incidence matrix")?;
    let rows = matrix.rubric_rows();
    tables::write_serialized(rubric_out, &rows).context("writing rubric table")?;
    Ok(rows)
}

/// Records one judge's scores for one poster in the rubric table on disk.
pub fn run_record(
    rubric_path: &Path,
    poster_id: u32,
    judge_id: u32,
    scores: (u32, u32, u32),
) -> anyhow::Result<RubricScore> {
    let rows = tables::read_rubric(rubric_path).context("loading rubric table")?;
    let mut table = RubricTable::new(rows);
    let (innovation, clarity, presentation) = scores;
    let updated = table
        .record(poster_id, judge_id, innovation, clarity, presentation)
        .context("recording rubric scores")?
        .clone();
    table.validate().context("checking rubric table")?;
    tables::write_serialized(rubric_path, table.rows()).context("saving rubric table")?;
    Ok(updated)
}

/// Ranks posters from the rubric table and writes ranked rows plus a summary.
pub fn run_rank(rubric_path: &Path, ranked_out: &Path, report_out: Option<&Path>) -> anyhow::Result<Vec<RankedPoster>> {
    let rows = tables::read_rubric(rubric_path).context("loading rubric table")?;
    let table = RubricTable::new(rows);
    table.validate().context("checking rubric table")?;
    let rows = table.rows();
    let ranked = rank_posters(rows);
    let with_ranks = attach_ranks(rows, &ranked);
    tables::write_serialized(ranked_out, &with_ranks).context("writing ranked rubric table")?;

    if let Some(report_out) = report_out {
        let report = report::build_ranking_report(Local::now().date_naive(), &ranked);
        std::fs::write(report_out, report)
            .with_context(|| format!("writing ranking report to {}", report_out.display()))?;
    }
    Ok(ranked)
}
