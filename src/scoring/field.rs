use std::collections::BTreeSet;

/// Discipline keys and the related terms they imply.
const FIELD_RELATIONS: [(&str, &[&str]); 8] = [
    (
        "computer",
        &["software", "programming", "algorithms", "data", "ai", "machine learning"],
    ),
    (
        "electrical",
        &["circuits", "electronics", "signals", "power", "communications"],
    ),
    (
        "mechanical",
        &["mechanics", "dynamics", "thermodynamics", "materials"],
    ),
    (
        "civil",
        &["structures", "construction", "environmental", "geotechnical"],
    ),
    ("chemical", &["chemistry", "process", "materials", "biochemical"]),
    (
        "biomedical",
        &["medical", "biology", "health", "tissue", "biomechanics"],
    ),
    (
        "physics",
        &["quantum", "optics", "mechanics", "electronics", "materials"],
    ),
    (
        "mathematics",
        &["statistics", "analysis", "algorithms", "computation"],
    ),
];

/// Union of related terms for every discipline key found in the field name.
pub fn field_keywords(field: &str) -> BTreeSet<&'static str> {
    let field = field.to_lowercase();
    FIELD_RELATIONS
        .iter()
        .filter(|(key, _)| field.contains(*key))
        .flat_map(|(_, terms)| terms.iter().copied())
        .collect()
}

/// Jaccard index of the two fields' keyword sets; 1.0 for the same field name.
pub fn field_similarity(left: &str, right: &str) -> f64 {
    let (left, right) = (left.trim().to_lowercase(), right.trim().to_lowercase());
    if left == right {
        return 1.0;
    }

    let left_terms = field_keywords(&left);
    let right_terms = field_keywords(&right);
    if left_terms.is_empty() || right_terms.is_empty() {
        return 0.0;
    }

    let shared = left_terms.intersection(&right_terms).count();
    let union = left_terms.union(&right_terms).count();
    shared as f64 / union as f64
}
