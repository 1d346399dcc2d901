const EXPERTISE_TERMS: [(&str, f64); 9] = [
    ("expert", 0.8),
    ("specialist", 0.8),
    ("research", 0.6),
    ("published", 0.7),
    ("experience", 0.6),
    ("developed", 0.5),
    ("phd", 0.7),
    ("professor", 0.7),
    ("advanced", 0.6),
];

/// Mean weight of the expertise terms present in the profile text, not their sum.
pub fn expertise_score(profile_text: &str) -> f64 {
    let text = profile_text.to_lowercase();
    let (total, matched) = EXPERTISE_TERMS
        .iter()
        .filter(|(term, _)| text.contains(*term))
        .fold((0.0, 0usize), |(total, matched), (_, weight)| {
            (total + weight, matched + 1)
        });

    if matched == 0 {
        0.0
    } else {
        total / matched as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_terms_scores_zero() {
        assert_eq!(expertise_score(""), 0.0);
        assert_eq!(expertise_score("teaches undergraduate courses"), 0.0);
    }

    #[test]
    fn averages_matched_weights() {
        let score = expertise_score("expert in robotics with a phd");
        assert!((score - 0.75).abs() < 1e-12);
    }

    #[test]
    fn repeated_terms_do_not_inflate() {
        let terse = expertise_score("research");
        let verbose = expertise_score("research research research researchers");
        assert_eq!(terse, verbose);
    }

    #[test]
    fn matches_inside_longer_words() {
        // "researcher" carries "research"
        assert!((expertise_score("researcher") - 0.6).abs() < 1e-12);
    }
}
