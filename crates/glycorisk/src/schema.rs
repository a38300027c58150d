//! The fixed feature schema served by this crate.
//!
//! Every reconciled request row has exactly [`N_FEATURES`] values laid out in
//! [`FEATURE_NAMES`] order. The schema is compiled in; it is never derived from
//! the loaded artifact.

/// Number of raw input features.
pub const N_FEATURES: usize = 21;

/// Raw input feature names, in model column order.
pub const FEATURE_NAMES: [&str; N_FEATURES] = [
    "HighBP",
    "HighChol",
    "CholCheck",
    "BMI",
    "Smoker",
    "Stroke",
    "HeartDiseaseorAttack",
    "PhysActivity",
    "Fruits",
    "Veggies",
    "HvyAlcoholConsump",
    "AnyHealthcare",
    "NoDocbcCost",
    "GenHlth",
    "MentHlth",
    "PhysHlth",
    "DiffWalk",
    "Sex",
    "Age",
    "Education",
    "Income",
];

/// Value substituted for a feature the client did not send.
pub const DEFAULT_FEATURE_VALUE: i64 = 0;

/// Position of a feature in the schema, if it is part of it.
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_NAMES.iter().position(|&f| f == name)
}

/// Compare an artifact's recorded feature names against the schema.
///
/// Returns the names that differ as `(position, recorded, expected)` triples.
/// A length difference is reported through the missing positions with an empty
/// string on the shorter side.
pub fn schema_mismatches(recorded: &[String]) -> Vec<(usize, String, String)> {
    let len = recorded.len().max(N_FEATURES);
    (0..len)
        .filter_map(|i| {
            let got = recorded.get(i).map(String::as_str).unwrap_or("");
            let want = FEATURE_NAMES.get(i).copied().unwrap_or("");
            (got != want).then(|| (i, got.to_string(), want.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_has_unique_names() {
        let mut names = FEATURE_NAMES.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), N_FEATURES);
    }

    #[test]
    fn feature_index_follows_schema_order() {
        assert_eq!(feature_index("HighBP"), Some(0));
        assert_eq!(feature_index("BMI"), Some(3));
        assert_eq!(feature_index("Income"), Some(20));
        assert_eq!(feature_index("Glucose"), None);
    }

    #[test]
    fn matching_names_have_no_mismatches() {
        let recorded: Vec<String> = FEATURE_NAMES.iter().map(|s| s.to_string()).collect();
        assert!(schema_mismatches(&recorded).is_empty());
    }

    #[test]
    fn mismatches_report_position() {
        let mut recorded: Vec<String> = FEATURE_NAMES.iter().map(|s| s.to_string()).collect();
        recorded[3] = "Column_3".to_string();
        recorded.pop();

        let diffs = schema_mismatches(&recorded);
        assert_eq!(diffs.len(), 2);
        assert_eq!(diffs[0], (3, "Column_3".into(), "BMI".into()));
        assert_eq!(diffs[1], (20, String::new(), "Income".into()));
    }
}
