use std::collections::BTreeSet;

use tracing::warn;

use crate::models::{PosterAssignmentRow, RubricScore};

/// Width judge ids are left-padded to when ordering matrix columns.
const JUDGE_KEY_WIDTH: usize = 4;

/// Binary poster x judge table of final assignments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncidenceMatrix {
    poster_ids: Vec<u32>,
    judge_ids: Vec<String>,
    cells: Vec<Vec<u8>>,
}

/// Sort/lookup key for a judge id: trimmed and zero-padded to four characters.
pub fn judge_key(id: &str) -> String {
    format!("{:0>width$}", id.trim(), width = JUDGE_KEY_WIDTH)
}

impl IncidenceMatrix {
    /// All-zero matrix; posters ascending, judges by padded key.
    pub fn zeroed(poster_ids: impl IntoIterator<Item = u32>, judge_ids: impl IntoIterator<Item = String>) -> Self {
        let poster_ids: Vec<u32> = poster_ids
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut seen = BTreeSet::new();
        let mut judge_ids: Vec<String> = judge_ids
            .into_iter()
            .map(|id| id.trim().to_string())
            .filter(|id| seen.insert(id.clone()))
            .collect();
        judge_ids.sort_by_key(|id| judge_key(id));

        let cells = vec![vec![0; judge_ids.len()]; poster_ids.len()];
        Self {
            poster_ids,
            judge_ids,
            cells,
        }
    }

    /// Builds the matrix, warning about (and skipping) unknown judge ids.
    pub fn build(rows: &[PosterAssignmentRow], judge_ids: impl IntoIterator<Item = String>) -> Self {
        let mut matrix = Self::zeroed(rows.iter().map(|row| row.poster_id), judge_ids);
        for row in rows {
            for judge in &row.assigned_judges {
                if !matrix.mark(row.poster_id, judge) {
                    warn!(
                        poster_id = row.poster_id,
                        judge_id = %judge,
                        "assigned judge not found in judges list, cell left unset"
                    );
                }
            }
        }
        matrix
    }

    /// Sets a cell to 1. Returns false when the poster or judge has no row/column.
    pub fn mark(&mut self, poster_id: u32, judge_id: &str) -> bool {
        match (self.row_index(poster_id), self.column_index(judge_id)) {
            (Some(row), Some(col)) => {
                self.cells[row][col] = 1;
                true
            }
            _ => false,
        }
    }

    pub fn poster_ids(&self) -> &[u32] {
        &self.poster_ids
    }

    pub fn judge_ids(&self) -> &[String] {
        &self.judge_ids
    }

    pub fn rows(&self) -> impl Iterator<Item = (u32, &[u8])> + '_ {
        self.poster_ids
            .iter()
            .copied()
            .zip(self.cells.iter().map(Vec::as_slice))
    }

    #[cfg(test)]
    pub fn get(&self, poster_id: u32, judge_id: &str) -> Option<u8> {
        let row = self.row_index(poster_id)?;
        let col = self.column_index(judge_id)?;
        Some(self.cells[row][col])
    }

    pub fn row_sum(&self, poster_id: u32) -> usize {
        self.row_index(poster_id)
            .map(|row| self.cells[row].iter().map(|c| usize::from(*c)).sum())
            .unwrap_or(0)
    }

    fn row_index(&self, poster_id: u32) -> Option<usize> {
        self.poster_ids.binary_search(&poster_id).ok()
    }

    fn column_index(&self, judge_id: &str) -> Option<usize> {
        let trimmed = judge_id.trim();
        if trimmed.is_empty() {
            return None;
        }
        let key = judge_key(trimmed);
        self.judge_ids
            .iter()
            .position(|id| id == trimmed)
            .or_else(|| self.judge_ids.iter().position(|id| judge_key(id) == key))
    }

    /// Loads a matrix from already-ordered parts, e.g. one read back from disk.
    pub fn from_parts(poster_ids: Vec<u32>, judge_ids: Vec<String>, cells: Vec<Vec<u8>>) -> Self {
        Self {
            poster_ids,
            judge_ids,
            cells,
        }
    }

    /// One zeroed rubric row per assigned cell, in poster then column order.
    /// Columns whose id is not numeric are skipped with a warning.
    pub fn rubric_rows(&self) -> Vec<RubricScore> {
        let mut rows = Vec::new();
        for (poster_id, cells) in self.rows() {
            for (judge, cell) in self.judge_ids.iter().zip(cells) {
                if *cell != 1 {
                    continue;
                }
                match judge.parse::<u32>() {
                    Ok(judge_id) => rows.push(RubricScore::empty(poster_id, judge_id)),
                    Err(_) => warn!(poster_id, judge_id = %judge, "non-numeric judge column skipped"),
                }
            }
        }
        rows
    }
}
