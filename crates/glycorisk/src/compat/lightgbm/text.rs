//! LightGBM text model parser.
//!
//! Reads the line-based `key=value` format written by `Booster.save_model()`:
//! a header block, one block per `Tree=N`, then `end of trees` followed by a
//! footer (feature importances, parameters) that is ignored.

use std::collections::HashMap;
use std::iter::Peekable;
use std::path::Path;
use std::str::Lines;

// =============================================================================
// Error types
// =============================================================================

/// Error type for LightGBM model parsing.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },
    #[error("array size mismatch for {field}: expected {expected}, got {actual}")]
    ArraySizeMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("model contains no trees")]
    NoTrees,
}

// =============================================================================
// Decision type bitfield
// =============================================================================

/// How a split treats missing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingType {
    /// NaN is treated as zero.
    #[default]
    None,
    /// Zero (and NaN) follow the default direction.
    Zero,
    /// NaN follows the default direction.
    NaN,
}

/// Decoded `decision_type` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecisionType {
    pub is_categorical: bool,
    pub default_left: bool,
    pub missing_type: MissingType,
}

impl DecisionType {
    /// Bit 0: categorical. Bit 1: default left. Bits 2-3: missing type.
    pub fn from_i8(value: i8) -> Self {
        let v = value as u8;
        let missing_type = match (v >> 2) & 3 {
            1 => MissingType::Zero,
            2 => MissingType::NaN,
            _ => MissingType::None,
        };
        DecisionType {
            is_categorical: v & 1 != 0,
            default_left: v & 2 != 0,
            missing_type,
        }
    }
}

// =============================================================================
// Objective
// =============================================================================

/// Objective line of the header, e.g. `binary sigmoid:1`.
#[derive(Debug, Clone, PartialEq)]
pub enum LgbObjective {
    Regression,
    Binary { sigmoid: f64 },
    Multiclass { num_class: usize },
    Unknown(String),
}

impl LgbObjective {
    pub fn parse(s: &str) -> Self {
        let mut parts = s.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let param = |key: &str| {
            s.split_whitespace()
                .find_map(|p| p.strip_prefix(key))
                .map(str::to_owned)
        };

        match name {
            "regression" | "regression_l2" | "l2" | "mse" => LgbObjective::Regression,
            "binary" => {
                let sigmoid = param("sigmoid:")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(1.0);
                LgbObjective::Binary { sigmoid }
            }
            "multiclass" | "multiclassova" => {
                let num_class = param("num_class:")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(2);
                LgbObjective::Multiclass { num_class }
            }
            _ => LgbObjective::Unknown(s.to_string()),
        }
    }
}

// =============================================================================
// Parsed structures
// =============================================================================

/// One `Tree=N` block.
#[derive(Debug, Clone, Default)]
pub struct LgbTree {
    pub num_leaves: usize,
    /// Feature of each internal node (`num_leaves - 1` entries).
    pub split_feature: Vec<i32>,
    pub threshold: Vec<f64>,
    pub decision_type: Vec<i8>,
    /// Child pointers; a negative value `!k` refers to leaf `k`.
    pub left_child: Vec<i32>,
    pub right_child: Vec<i32>,
    pub leaf_value: Vec<f64>,
    pub is_linear: bool,
}

impl LgbTree {
    pub fn num_internal(&self) -> usize {
        self.num_leaves.saturating_sub(1)
    }
}

/// Header key/values that affect inference.
#[derive(Debug, Clone, Default)]
pub struct LgbHeader {
    pub version: String,
    pub num_class: usize,
    pub num_tree_per_iteration: usize,
    pub max_feature_idx: usize,
    pub objective: Option<LgbObjective>,
    pub average_output: bool,
    pub feature_names: Vec<String>,
}

/// A parsed LightGBM model.
#[derive(Debug, Clone)]
pub struct LgbModel {
    pub header: LgbHeader,
    pub trees: Vec<LgbTree>,
}

impl LgbModel {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_string(&content)
    }

    pub fn from_string(content: &str) -> Result<Self, ParseError> {
        let mut lines = content.lines().peekable();
        let header = parse_header(&mut lines)?;

        let mut trees = Vec::new();
        while let Some(line) = lines.next() {
            if line.starts_with("Tree=") {
                trees.push(parse_tree(&mut lines)?);
            } else if line.trim() == "end of trees" {
                break;
            }
        }
        if trees.is_empty() {
            return Err(ParseError::NoTrees);
        }
        Ok(LgbModel { header, trees })
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn num_features(&self) -> usize {
        self.header.max_feature_idx + 1
    }
}

// =============================================================================
// Parsing helpers
// =============================================================================

/// Collect `key=value` lines until the next block or a blank line.
fn read_block(lines: &mut Peekable<Lines<'_>>) -> (HashMap<String, String>, Vec<String>) {
    let mut kv = HashMap::new();
    let mut flags = Vec::new();
    while let Some(line) = lines.peek() {
        let line = line.trim();
        if line.starts_with("Tree=") || line == "end of trees" {
            break;
        }
        lines.next();
        if line.is_empty() {
            if kv.is_empty() && flags.is_empty() {
                continue;
            }
            break;
        }
        match line.split_once('=') {
            Some((key, value)) => {
                kv.insert(key.to_string(), value.to_string());
            }
            None => flags.push(line.to_string()),
        }
    }
    (kv, flags)
}

fn parse_header(lines: &mut Peekable<Lines<'_>>) -> Result<LgbHeader, ParseError> {
    let (kv, flags) = read_block(lines);

    let num_class: usize =
        parse_scalar(&kv, "num_class")?.ok_or(ParseError::MissingField("num_class"))?;
    let max_feature_idx = parse_scalar(&kv, "max_feature_idx")?
        .ok_or(ParseError::MissingField("max_feature_idx"))?;
    let num_tree_per_iteration =
        parse_scalar(&kv, "num_tree_per_iteration")?.unwrap_or(num_class.max(1));

    Ok(LgbHeader {
        version: kv.get("version").cloned().unwrap_or_default(),
        num_class,
        num_tree_per_iteration,
        max_feature_idx,
        objective: kv.get("objective").map(|o| LgbObjective::parse(o)),
        average_output: flags.iter().any(|f| f == "average_output"),
        feature_names: kv
            .get("feature_names")
            .map(|names| names.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default(),
    })
}

fn parse_tree(lines: &mut Peekable<Lines<'_>>) -> Result<LgbTree, ParseError> {
    let (kv, _) = read_block(lines);

    let num_leaves: usize =
        parse_scalar(&kv, "num_leaves")?.ok_or(ParseError::MissingField("num_leaves"))?;
    let mut tree = LgbTree {
        num_leaves,
        is_linear: parse_scalar::<i32>(&kv, "is_linear")?.is_some_and(|v| v != 0),
        ..Default::default()
    };

    tree.leaf_value =
        parse_array(&kv, "leaf_value")?.ok_or(ParseError::MissingField("leaf_value"))?;
    check_len("leaf_value", &tree.leaf_value, num_leaves.max(1))?;
    if num_leaves <= 1 {
        return Ok(tree);
    }

    let n = tree.num_internal();
    tree.split_feature = required_array(&kv, "split_feature", n)?;
    tree.threshold = required_array(&kv, "threshold", n)?;
    tree.left_child = required_array(&kv, "left_child", n)?;
    tree.right_child = required_array(&kv, "right_child", n)?;
    tree.decision_type = parse_array(&kv, "decision_type")?.unwrap_or_else(|| vec![0; n]);
    check_len("decision_type", &tree.decision_type, n)?;
    Ok(tree)
}

fn parse_scalar<T: std::str::FromStr>(
    kv: &HashMap<String, String>,
    field: &'static str,
) -> Result<Option<T>, ParseError> {
    kv.get(field)
        .map(|v| {
            v.trim().parse().map_err(|_| ParseError::InvalidValue {
                field,
                message: format!("cannot parse {v:?}"),
            })
        })
        .transpose()
}

fn parse_array<T: std::str::FromStr>(
    kv: &HashMap<String, String>,
    field: &'static str,
) -> Result<Option<Vec<T>>, ParseError> {
    kv.get(field)
        .map(|s| {
            s.split_whitespace()
                .map(|v| {
                    v.parse().map_err(|_| ParseError::InvalidValue {
                        field,
                        message: format!("invalid entry {v:?}"),
                    })
                })
                .collect()
        })
        .transpose()
}

fn required_array<T: std::str::FromStr>(
    kv: &HashMap<String, String>,
    field: &'static str,
    expected: usize,
) -> Result<Vec<T>, ParseError> {
    let values = parse_array(kv, field)?.ok_or(ParseError::MissingField(field))?;
    check_len(field, &values, expected)?;
    Ok(values)
}

fn check_len<T>(field: &'static str, arr: &[T], expected: usize) -> Result<(), ParseError> {
    if arr.len() != expected {
        return Err(ParseError::ArraySizeMismatch {
            field,
            expected,
            actual: arr.len(),
        });
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const TWO_TREES: &str = "tree
version=v4
num_class=1
num_tree_per_iteration=1
label_index=0
max_feature_idx=2
objective=binary sigmoid:1
feature_names=a b c
feature_infos=[0:1] [0:1] [0:1]
tree_sizes=200 100

Tree=0
num_leaves=3
num_cat=0
split_feature=0 2
split_gain=1 1
threshold=0.5 10
decision_type=2 0
left_child=-1 -2
right_child=1 -3
leaf_value=0.1 -0.2 0.3
leaf_weight=1 1 1
leaf_count=1 1 1
internal_value=0 0
internal_weight=0 0
internal_count=3 2
is_linear=0
shrinkage=1


Tree=1
num_leaves=1
num_cat=0
leaf_value=0.05
is_linear=0
shrinkage=1


end of trees

feature_importances:
a=1
";

    #[rstest]
    #[case(0, false, false, MissingType::None)]
    #[case(2, false, true, MissingType::None)]
    #[case(1, true, false, MissingType::None)]
    #[case(4, false, false, MissingType::Zero)]
    #[case(10, false, true, MissingType::NaN)]
    fn decision_type_bits(
        #[case] raw: i8,
        #[case] categorical: bool,
        #[case] default_left: bool,
        #[case] missing: MissingType,
    ) {
        let dt = DecisionType::from_i8(raw);
        assert_eq!(dt.is_categorical, categorical);
        assert_eq!(dt.default_left, default_left);
        assert_eq!(dt.missing_type, missing);
    }

    #[test]
    fn objectives() {
        assert_eq!(LgbObjective::parse("regression"), LgbObjective::Regression);
        assert_eq!(
            LgbObjective::parse("binary sigmoid:0.5"),
            LgbObjective::Binary { sigmoid: 0.5 }
        );
        assert_eq!(
            LgbObjective::parse("multiclass num_class:3"),
            LgbObjective::Multiclass { num_class: 3 }
        );
        assert!(matches!(
            LgbObjective::parse("lambdarank"),
            LgbObjective::Unknown(_)
        ));
    }

    #[test]
    fn parses_header_and_trees() {
        let model = LgbModel::from_string(TWO_TREES).unwrap();
        assert_eq!(model.header.version, "v4");
        assert_eq!(model.header.num_class, 1);
        assert_eq!(model.num_features(), 3);
        assert_eq!(model.header.feature_names, vec!["a", "b", "c"]);
        assert_eq!(
            model.header.objective,
            Some(LgbObjective::Binary { sigmoid: 1.0 })
        );
        assert_eq!(model.num_trees(), 2);

        let t0 = &model.trees[0];
        assert_eq!(t0.num_leaves, 3);
        assert_eq!(t0.split_feature, vec![0, 2]);
        assert_eq!(t0.left_child, vec![-1, -2]);
        assert_eq!(t0.decision_type, vec![2, 0]);

        let t1 = &model.trees[1];
        assert_eq!(t1.num_leaves, 1);
        assert_eq!(t1.leaf_value, vec![0.05]);
    }

    #[test]
    fn missing_header_field() {
        let err =
            LgbModel::from_string("tree\nversion=v4\nmax_feature_idx=1\n\nTree=0\n").unwrap_err();
        assert!(matches!(err, ParseError::MissingField("num_class")));
    }

    #[test]
    fn rejects_short_arrays() {
        let text = TWO_TREES.replace("threshold=0.5 10", "threshold=0.5");
        let err = LgbModel::from_string(&text).unwrap_err();
        assert!(matches!(
            err,
            ParseError::ArraySizeMismatch { field: "threshold", expected: 2, actual: 1 }
        ));
    }

    #[test]
    fn rejects_bad_numbers() {
        let text = TWO_TREES.replace("leaf_value=0.05", "leaf_value=nope");
        assert!(matches!(
            LgbModel::from_string(&text),
            Err(ParseError::InvalidValue { field: "leaf_value", .. })
        ));
    }

    #[test]
    fn empty_model_has_no_trees() {
        let err = LgbModel::from_string("tree\nnum_class=1\nmax_feature_idx=0\n\nend of trees\n")
            .unwrap_err();
        assert!(matches!(err, ParseError::NoTrees));
    }
}
