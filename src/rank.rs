use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

use crate::models::{RankedPoster, RankedRubricRow, RubricScore};

/// Highest score a judge may give on any rubric criterion.
pub const MAX_CRITERION_SCORE: u32 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RubricError {
    #[error("no rubric row for poster {poster_id} and judge {judge_id}")]
    MissingRow { poster_id: u32, judge_id: u32 },

    #[error("{criterion} score {value} for poster {poster_id} is outside 0..={max}", max = MAX_CRITERION_SCORE)]
    OutOfRange {
        poster_id: u32,
        criterion: &'static str,
        value: u32,
    },

    #[error("total {total} for poster {poster_id} and judge {judge_id} does not match its criteria sum {expected}")]
    InconsistentTotal {
        poster_id: u32,
        judge_id: u32,
        total: u32,
        expected: u32,
    },
}

fn check_criteria(poster_id: u32, innovation: u32, clarity: u32, presentation: u32) -> Result<(), RubricError> {
    for (criterion, value) in [
        ("innovation", innovation),
        ("clarity", clarity),
        ("presentation", presentation),
    ] {
        if value > MAX_CRITERION_SCORE {
            return Err(RubricError::OutOfRange {
                poster_id,
                criterion,
                value,
            });
        }
    }
    Ok(())
}

/// The rubric score table judges fill in, one row per assigned pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RubricTable {
    rows: Vec<RubricScore>,
}

impl RubricTable {
    pub fn new(rows: Vec<RubricScore>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[RubricScore] {
        &self.rows
    }

    /// Checks every stored row: criteria in range and a total equal to their sum.
    pub fn validate(&self) -> Result<(), RubricError> {
        for row in &self.rows {
            check_criteria(row.poster_id, row.innovation, row.clarity, row.presentation)?;
            let expected = row.innovation + row.clarity + row.presentation;
            if row.total != expected {
                return Err(RubricError::InconsistentTotal {
                    poster_id: row.poster_id,
                    judge_id: row.judge_id,
                    total: row.total,
                    expected,
                });
            }
        }
        Ok(())
    }

    /// Stores one judge's scores for a poster and recomputes the total.
    pub fn record(
        &mut self,
        poster_id: u32,
        judge_id: u32,
        innovation: u32,
        clarity: u32,
        presentation: u32,
    ) -> Result<&RubricScore, RubricError> {
        check_criteria(poster_id, innovation, clarity, presentation)?;

        let row = self
            .rows
            .iter_mut()
            .find(|row| row.poster_id == poster_id && row.judge_id == judge_id)
            .ok_or(RubricError::MissingRow {
                poster_id,
                judge_id,
            })?;

        row.innovation = innovation;
        row.clarity = clarity;
        row.presentation = presentation;
        row.total = innovation + clarity + presentation;
        Ok(&*row)
    }
}

#[derive(Default)]
struct Tally {
    total: u64,
    innovation: u64,
    clarity: u64,
    presentation: u64,
    rows: u64,
}

/// Aggregates rubric rows per poster and assigns dense ranks.
///
/// Posters are ordered by (sum of totals, mean innovation, mean clarity,
/// mean presentation), all descending. Equal tuples share a rank and the
/// next distinct tuple gets the following rank, with no gaps.
pub fn rank_posters(rows: &[RubricScore]) -> Vec<RankedPoster> {
    let mut tallies: BTreeMap<u32, Tally> = BTreeMap::new();
    for row in rows {
        let tally = tallies.entry(row.poster_id).or_default();
        tally.total += u64::from(row.total);
        tally.innovation += u64::from(row.innovation);
        tally.clarity += u64::from(row.clarity);
        tally.presentation += u64::from(row.presentation);
        tally.rows += 1;
    }

    let mut ranked: Vec<RankedPoster> = tallies
        .into_iter()
        .map(|(poster_id, tally)| {
            let count = tally.rows as f64;
            RankedPoster {
                poster_id,
                sum_total: tally.total,
                innovation: tally.innovation as f64 / count,
                clarity: tally.clarity as f64 / count,
                presentation: tally.presentation as f64 / count,
                rank: 0,
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.sum_total
            .cmp(&a.sum_total)
            .then_with(|| b.innovation.total_cmp(&a.innovation))
            .then_with(|| b.clarity.total_cmp(&a.clarity))
            .then_with(|| b.presentation.total_cmp(&a.presentation))
    });

    let mut rank = 0;
    let mut previous: Option<(u64, f64, f64, f64)> = None;
    for poster in &mut ranked {
        let key = (
            poster.sum_total,
            poster.innovation,
            poster.clarity,
            poster.presentation,
        );
        if previous != Some(key) {
            rank += 1;
        }
        poster.rank = rank;
        previous = Some(key);
    }

    ranked
}

/// Copies each poster's rank onto its rubric rows, keeping row order.
pub fn attach_ranks(rows: &[RubricScore], ranked: &[RankedPoster]) -> Vec<RankedRubricRow> {
    let ranks: HashMap<u32, u32> = ranked.iter().map(|p| (p.poster_id, p.rank)).collect();
    rows.iter()
        .filter_map(|row| {
            ranks.get(&row.poster_id).map(|rank| RankedRubricRow {
                poster_id: row.poster_id,
                judge_id: row.judge_id,
                innovation: row.innovation,
                clarity: row.clarity,
                presentation: row.presentation,
                total: row.total,
                rank: *rank,
            })
        })
        .collect()
}
