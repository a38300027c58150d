//! Tree node identifiers and the split rule.

/// Canonical node identifier: an index into a tree's SoA arrays.
///
/// The root is always node 0, so 0 doubles as the "no child" marker in
/// child arrays.
pub type NodeId = u32;

/// Child marker for leaves.
pub const NO_CHILD: NodeId = 0;

/// Route a value at a numeric split.
///
/// Values strictly below the threshold go left. NaN follows the node's default
/// direction.
#[inline]
pub fn goes_left(value: f64, threshold: f64, default_left: bool) -> bool {
    if value.is_nan() {
        default_left
    } else {
        value < threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_exclusive_on_the_left() {
        assert!(goes_left(0.49, 0.5, false));
        assert!(!goes_left(0.5, 0.5, true));
    }

    #[test]
    fn nan_uses_default_direction() {
        assert!(goes_left(f64::NAN, 0.5, true));
        assert!(!goes_left(f64::NAN, 0.5, false));
    }
}
