use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{Assignment, PairScore, RankedPoster};

pub fn build_ranking_report(generated_on: NaiveDate, ranked: &[RankedPoster]) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Poster Rankings");
    let _ = writeln!(output, "Generated on {generated_on}");
    let _ = writeln!(output);

    if ranked.is_empty() {
        let _ = writeln!(output, "No rubric scores recorded.");
        return output;
    }

    let _ = writeln!(
        output,
        "| Rank | Poster | Total | Innovation | Clarity | Presentation |"
    );
    let _ = writeln!(output, "|---:|---:|---:|---:|---:|---:|");

    let mut by_rank: Vec<&RankedPoster> = ranked.iter().collect();
    by_rank.sort_by_key(|poster| poster.rank);
    for poster in by_rank {
        let _ = writeln!(
            output,
            "| {} | {} | {} | {:.2} | {:.2} | {:.2} |",
            poster.rank,
            poster.poster_id,
            poster.sum_total,
            poster.innovation,
            poster.clarity,
            poster.presentation
        );
    }

    output
}

pub fn build_assignment_report(
    generated_on: NaiveDate,
    scores: &[PairScore],
    assignment: &Assignment,
    poster_capacity: usize,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Judge Assignment Summary");
    let _ = writeln!(output, "Generated on {generated_on}");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Totals");
    let _ = writeln!(output, "- {} eligible pairs scored", scores.len());
    let _ = writeln!(output, "- {} pairs assigned", assignment.pair_count());

    let degraded = scores
        .iter()
        .filter(|score| !score.components.failures.is_empty())
        .count();
    let _ = writeln!(output, "- {degraded} pairs with a zeroed component");

    let short: Vec<(u32, usize)> = assignment
        .poster_judges
        .iter()
        .filter(|(_, judges)| judges.len() < poster_capacity)
        .map(|(poster_id, judges)| (*poster_id, judges.len()))
        .collect();

    let _ = writeln!(output);
    let _ = writeln!(output, "## Under-staffed Posters");
    if short.is_empty() {
        let _ = writeln!(output, "Every poster has {poster_capacity} judges.");
    } else {
        for (poster_id, count) in short {
            let _ = writeln!(output, "- Poster {poster_id}: {count} of {poster_capacity} judges");
        }
    }

    let idle: Vec<u32> = assignment
        .judge_posters
        .iter()
        .filter(|(_, posters)| posters.is_empty())
        .map(|(judge_id, _)| *judge_id)
        .collect();

    let _ = writeln!(output);
    let _ = writeln!(output, "## Idle Judges");
    if idle.is_empty() {
        let _ = writeln!(output, "Every judge has at least one poster.");
    } else {
        let ids: Vec<String> = idle.iter().map(u32::to_string).collect();
        let _ = writeln!(output, "{}", ids.join(", "));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Component, ScoreComponents, TimeSlot};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, 17).unwrap()
    }

    fn ranked(poster_id: u32, sum_total: u64, rank: u32) -> RankedPoster {
        RankedPoster {
            poster_id,
            sum_total,
            innovation: 8.0,
            clarity: 7.5,
            presentation: 7.0,
            rank,
        }
    }

    #[test]
    fn ranking_report_lists_posters_by_rank() {
        let report = build_ranking_report(date(), &[ranked(4, 30, 2), ranked(9, 45, 1)]);
        assert!(report.contains("Generated on 2026-04-17"));
        let first = report.find("| 1 | 9 | 45 |").unwrap();
        let second = report.find("| 2 | 4 | 30 |").unwrap();
        assert!(first < second);
        assert!(report.contains("| 8.00 | 7.50 | 7.00 |"));
    }

    #[test]
    fn empty_ranking_report_says_so() {
        let report = build_ranking_report(date(), &[]);
        assert!(report.contains("No rubric scores recorded."));
    }

    #[test]
    fn assignment_report_flags_gaps() {
        let mut assignment = Assignment::new([1, 2], [10, 11]);
        assignment.commit(1, 10);
        assignment.commit(1, 11);
        let scores = vec![PairScore {
            poster_id: 1,
            judge_id: 10,
            time_slot: TimeSlot::First,
            score: 0.4,
            components: ScoreComponents {
                failures: vec![Component::Lexical],
                ..ScoreComponents::default()
            },
        }];

        let report = build_assignment_report(date(), &scores, &assignment, 2);
        assert!(report.contains("- 2 pairs assigned"));
        assert!(report.contains("- 1 pairs with a zeroed component"));
        assert!(report.contains("- Poster 2: 0 of 2 judges"));
        assert!(report.contains("Every judge has at least one poster."));
    }
}
