use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::models::{Assignment, Judge, PairScore, Poster, Professor};
use crate::scoring::MatchScorer;

pub const DEFAULT_POSTER_CAPACITY: usize = 2;
pub const DEFAULT_JUDGE_CAPACITY: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capacities {
    /// Judges per poster.
    pub poster: usize,
    /// Posters per judge.
    pub judge: usize,
}

impl Default for Capacities {
    fn default() -> Self {
        Self {
            poster: DEFAULT_POSTER_CAPACITY,
            judge: DEFAULT_JUDGE_CAPACITY,
        }
    }
}

pub fn is_eligible(poster: &Poster, judge: &Judge) -> bool {
    judge.availability.covers(poster.time_slot())
}

/// Eligible (poster, judge) index pairs, poster-major then judge-minor.
pub fn eligible_pairs<'a>(posters: &'a [Poster], judges: &'a [Judge]) -> Vec<(&'a Poster, &'a Judge)> {
    posters
        .iter()
        .flat_map(|poster| {
            judges
                .iter()
                .filter(move |judge| is_eligible(poster, judge))
                .map(move |judge| (poster, judge))
        })
        .collect()
}

/// Scores every eligible pair in parallel; output keeps enumeration order.
pub fn score_pairs(
    scorer: &MatchScorer<'_>,
    posters: &[Poster],
    judges: &[Judge],
    links: &BTreeMap<u32, Option<&Professor>>,
) -> Vec<PairScore> {
    let pairs = eligible_pairs(posters, judges);
    info!(
        posters = posters.len(),
        judges = judges.len(),
        pairs = pairs.len(),
        "scoring eligible pairs"
    );

    pairs
        .par_iter()
        .map(|(poster, judge)| {
            let professor = links.get(&judge.id).copied().flatten();
            let result = scorer.score(poster, judge, professor);
            debug!(
                poster_id = poster.id,
                judge_id = judge.id,
                score = result.score,
                "pair scored"
            );
            PairScore {
                poster_id: poster.id,
                judge_id: judge.id,
                time_slot: poster.time_slot(),
                score: result.score,
                components: result.components,
            }
        })
        .collect()
}

/// Turns a complete scored pair list into an assignment.
pub trait AssignmentStrategy {
    fn assign(
        &self,
        scores: &[PairScore],
        poster_ids: &[u32],
        judge_ids: &[u32],
    ) -> Assignment;
}

/// Single pass over pairs by descending score, committing while both sides
/// have capacity. No backtracking; ties keep their input order.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyAssigner {
    pub capacities: Capacities,
}

impl GreedyAssigner {
    pub fn new(capacities: Capacities) -> Self {
        Self { capacities }
    }
}

impl AssignmentStrategy for GreedyAssigner {
    fn assign(&self, scores: &[PairScore], poster_ids: &[u32], judge_ids: &[u32]) -> Assignment {
        let mut ordered: Vec<&PairScore> = scores.iter().collect();
        ordered.sort_by(|a, b| b.score.total_cmp(&a.score));

        let mut assignment = Assignment::new(poster_ids.iter().copied(), judge_ids.iter().copied());
        let mut skipped = 0usize;
        for pair in ordered {
            let poster_load = assignment.judges_for(pair.poster_id).len();
            let judge_load = assignment.posters_for(pair.judge_id).len();
            if poster_load < self.capacities.poster && judge_load < self.capacities.judge {
                assignment.commit(pair.poster_id, pair.judge_id);
            } else {
                skipped += 1;
            }
        }

        info!(
            assigned = assignment.pair_count(),
            skipped,
            "greedy assignment complete"
        );
        assignment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Availability, ScoreComponents, TimeSlot};
    use rstest::rstest;

    fn pair(poster_id: u32, judge_id: u32, score: f64) -> PairScore {
        PairScore {
            poster_id,
            judge_id,
            time_slot: TimeSlot::for_poster(poster_id),
            score,
            components: ScoreComponents::default(),
        }
    }

    fn poster(id: u32) -> Poster {
        Poster {
            id,
            program: String::new(),
            abstract_text: String::new(),
        }
    }

    fn judge(id: u32, availability: Availability) -> Judge {
        Judge {
            id,
            first_name: "J".to_string(),
            last_name: id.to_string(),
            department: String::new(),
            availability,
        }
    }

    #[rstest]
    #[case(1, Availability::Both, true)]
    #[case(2, Availability::Both, true)]
    #[case(1, Availability::Slot(TimeSlot::First), true)]
    #[case(2, Availability::Slot(TimeSlot::First), false)]
    #[case(3, Availability::Slot(TimeSlot::Second), false)]
    #[case(4, Availability::Slot(TimeSlot::Second), true)]
    fn eligibility_follows_poster_parity(
        #[case] poster_id: u32,
        #[case] availability: Availability,
        #[case] expected: bool,
    ) {
        assert_eq!(is_eligible(&poster(poster_id), &judge(9, availability)), expected);
    }

    #[test]
    fn pairs_are_poster_major() {
        let posters = vec![poster(1), poster(2)];
        let judges = vec![
            judge(10, Availability::Both),
            judge(11, Availability::Slot(TimeSlot::First)),
        ];
        let ids: Vec<(u32, u32)> = eligible_pairs(&posters, &judges)
            .into_iter()
            .map(|(p, j)| (p.id, j.id))
            .collect();
        assert_eq!(ids, vec![(1, 10), (1, 11), (2, 10)]);
    }

    #[test]
    fn ineligible_judge_is_never_assigned() {
        let posters = vec![poster(1), poster(2)];
        let judges = vec![
            judge(10, Availability::Both),
            judge(11, Availability::Slot(TimeSlot::First)),
        ];
        let mut scores = vec![pair(1, 10, 0.9), pair(2, 10, 0.5)];
        scores.retain(|s| {
            eligible_pairs(&posters, &judges)
                .iter()
                .any(|(p, j)| p.id == s.poster_id && j.id == s.judge_id)
        });
        let assignment = GreedyAssigner::default().assign(&scores, &[1, 2], &[10, 11]);

        assert_eq!(assignment.judges_for(1), &[10]);
        assert_eq!(assignment.judges_for(2), &[10]);
        assert!(!assignment.posters_for(11).contains(&2));
    }

    #[test]
    fn exhausted_judge_leaves_later_poster_empty() {
        let scores = vec![pair(1, 10, 0.9), pair(2, 10, 0.5)];
        let capacities = Capacities { poster: 2, judge: 1 };
        let assignment = GreedyAssigner::new(capacities).assign(&scores, &[1, 2], &[10, 11]);
        assert_eq!(assignment.judges_for(1), &[10]);
        assert!(assignment.judges_for(2).is_empty());
    }

    #[test]
    fn respects_both_capacities() {
        let poster_ids: Vec<u32> = (1..=20).collect();
        let judge_ids: Vec<u32> = (100..104).collect();
        let mut scores = Vec::new();
        for p in &poster_ids {
            for j in &judge_ids {
                scores.push(pair(*p, *j, f64::from((p * 7 + j * 13) % 17) / 17.0));
            }
        }

        let assignment = GreedyAssigner::default().assign(&scores, &poster_ids, &judge_ids);
        for p in &poster_ids {
            assert!(assignment.judges_for(*p).len() <= DEFAULT_POSTER_CAPACITY);
        }
        for j in &judge_ids {
            assert!(assignment.posters_for(*j).len() <= DEFAULT_JUDGE_CAPACITY);
        }
        // Judges are the bottleneck: 4 judges x 6 posters.
        assert_eq!(assignment.pair_count(), 24);
    }

    #[test]
    fn highest_scores_claim_capacity_first() {
        let scores = vec![pair(1, 10, 0.2), pair(2, 10, 0.8), pair(3, 10, 0.5)];
        let capacities = Capacities { poster: 2, judge: 2 };
        let assignment = GreedyAssigner::new(capacities).assign(&scores, &[1, 2, 3], &[10]);
        assert_eq!(assignment.posters_for(10), &[2, 3]);
        assert!(assignment.judges_for(1).is_empty());
    }

    #[test]
    fn ties_keep_enumeration_order_and_rerun_is_identical() {
        let scores = vec![pair(1, 10, 0.5), pair(1, 11, 0.5), pair(1, 12, 0.5), pair(2, 10, 0.5)];
        let assigner = GreedyAssigner::default();
        let first = assigner.assign(&scores, &[1, 2], &[10, 11, 12]);
        let second = assigner.assign(&scores, &[1, 2], &[10, 11, 12]);
        assert_eq!(first.judges_for(1), &[10, 11]);
        assert_eq!(first.judges_for(2), &[10]);
        assert_eq!(first, second);
    }

    #[test]
    fn every_known_id_appears_even_when_unassigned() {
        let assignment = GreedyAssigner::default().assign(&[], &[1, 2], &[10]);
        assert_eq!(assignment.poster_judges.len(), 2);
        assert_eq!(assignment.judge_posters.len(), 1);
        assert_eq!(assignment.pair_count(), 0);
    }
}
