use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::models::{Judge, Professor};

/// Finds the professor profile behind a judge.
///
/// A professor whose full name equals "first last" wins outright. Otherwise the
/// first professor in table order whose name contains both the first and last
/// name (case-insensitive) is taken. When several professors qualify only by
/// substring, the choice depends on table order and a warning is logged.
pub fn link_judge<'p>(judge: &Judge, professors: &'p [Professor]) -> Option<&'p Professor> {
    let first = judge.first_name.trim().to_lowercase();
    let last = judge.last_name.trim().to_lowercase();
    if first.is_empty() || last.is_empty() {
        debug!(judge_id = judge.id, "judge has a blank name, leaving unlinked");
        return None;
    }

    let full = format!("{first} {last}");
    if let Some(exact) = professors
        .iter()
        .find(|prof| collapse(&prof.name.to_lowercase()) == full)
    {
        return Some(exact);
    }

    let mut candidates = professors.iter().filter(|prof| {
        let name = prof.name.to_lowercase();
        name.contains(&first) && name.contains(&last)
    });
    let chosen = candidates.next()?;
    let others = candidates.count();
    if others > 0 {
        warn!(
            judge_id = judge.id,
            professor = %chosen.name,
            other_matches = others,
            "ambiguous professor match, keeping first in table order"
        );
    }
    Some(chosen)
}

/// Links every judge once, keyed by judge id. Unlinked judges map to `None`.
pub fn link_judges<'p>(
    judges: &[Judge],
    professors: &'p [Professor],
) -> BTreeMap<u32, Option<&'p Professor>> {
    judges
        .iter()
        .map(|judge| (judge.id, link_judge(judge, professors)))
        .collect()
}

fn collapse(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Availability;

    fn professor(name: &str) -> Professor {
        Professor {
            name: name.to_string(),
            ..Professor::default()
        }
    }

    fn judge(id: u32, first: &str, last: &str) -> Judge {
        Judge {
            id,
            first_name: first.to_string(),
            last_name: last.to_string(),
            department: "Computer Science".to_string(),
            availability: Availability::Both,
        }
    }

    #[test]
    fn links_by_case_insensitive_substring() {
        let professors = vec![professor("Dr. Ada LOVELACE, PhD"), professor("Alan Turing")];
        let linked = link_judge(&judge(1, "ada", "Lovelace"), &professors);
        assert_eq!(linked.map(|p| p.name.as_str()), Some("Dr. Ada LOVELACE, PhD"));
    }

    #[test]
    fn unmatched_judge_stays_unlinked() {
        let professors = vec![professor("Alan Turing")];
        assert!(link_judge(&judge(2, "Grace", "Hopper"), &professors).is_none());
    }

    #[test]
    fn first_substring_match_wins() {
        let professors = vec![
            professor("Jon Smithson Lee"),
            professor("Jon Smith Parker"),
        ];
        let linked = link_judge(&judge(3, "Jon", "Smith"), &professors);
        assert_eq!(linked.map(|p| p.name.as_str()), Some("Jon Smithson Lee"));
    }

    #[test]
    fn exact_full_name_beats_earlier_substring() {
        let professors = vec![professor("Jon Smithson"), professor("Jon  Smith")];
        let linked = link_judge(&judge(4, "Jon", "Smith"), &professors);
        assert_eq!(linked.map(|p| p.name.as_str()), Some("Jon  Smith"));
    }

    #[test]
    fn blank_names_never_link() {
        let professors = vec![professor("Anyone At All")];
        assert!(link_judge(&judge(5, "", "All"), &professors).is_none());
    }

    #[test]
    fn link_judges_covers_every_judge() {
        let professors = vec![professor("Alan Turing")];
        let judges = vec![judge(7, "Alan", "Turing"), judge(8, "Grace", "Hopper")];
        let links = link_judges(&judges, &professors);
        assert_eq!(links.len(), 2);
        assert!(links[&7].is_some());
        assert!(links[&8].is_none());
    }
}
