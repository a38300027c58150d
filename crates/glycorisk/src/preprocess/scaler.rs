//! Standardization: `(x - mean) / scale`.

use ndarray::{Array1, ArrayView1, Zip};

use super::Transform;
use crate::error::InferenceError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScalerError {
    #[error("scaler has neither mean nor scale")]
    Empty,
    #[error("mean has {mean} entries but scale has {scale}")]
    LenMismatch { mean: usize, scale: usize },
    #[error("{field}[{index}] is not finite")]
    NonFinite { field: &'static str, index: usize },
}

/// Per-feature standard scaler.
#[derive(Debug, Clone, PartialEq)]
pub struct Scaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl Scaler {
    /// Build from optional mean and scale vectors.
    ///
    /// A missing mean centers nothing; a missing scale divides by 1. Zero
    /// scale entries (constant training columns) are replaced by 1.
    pub fn new(mean: Option<Vec<f64>>, scale: Option<Vec<f64>>) -> Result<Self, ScalerError> {
        let (mean, scale) = match (mean, scale) {
            (None, None) => return Err(ScalerError::Empty),
            (Some(m), None) => {
                let n = m.len();
                (m, vec![1.0; n])
            }
            (None, Some(s)) => (vec![0.0; s.len()], s),
            (Some(m), Some(s)) => {
                if m.len() != s.len() {
                    return Err(ScalerError::LenMismatch {
                        mean: m.len(),
                        scale: s.len(),
                    });
                }
                (m, s)
            }
        };
        if mean.is_empty() {
            return Err(ScalerError::Empty);
        }
        check_finite("mean", &mean)?;
        check_finite("scale", &scale)?;

        let scale = scale
            .into_iter()
            .map(|s| if s == 0.0 { 1.0 } else { s })
            .collect();
        Ok(Self {
            mean: Array1::from_vec(mean),
            scale,
        })
    }
}

fn check_finite(field: &'static str, values: &[f64]) -> Result<(), ScalerError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(ScalerError::NonFinite { field, index }),
        None => Ok(()),
    }
}

impl Transform for Scaler {
    fn name(&self) -> &'static str {
        "scaler"
    }

    fn n_features_in(&self) -> Option<usize> {
        Some(self.mean.len())
    }

    fn n_features_out(&self) -> Option<usize> {
        Some(self.mean.len())
    }

    fn transform(&self, row: ArrayView1<'_, f64>) -> Result<Array1<f64>, InferenceError> {
        InferenceError::check_width(self.name(), self.mean.len(), row.len())?;
        Ok(Zip::from(&row)
            .and(&self.mean)
            .and(&self.scale)
            .map_collect(|&x, &m, &s| (x - m) / s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn standardizes() {
        let scaler = Scaler::new(Some(vec![1.0, 10.0]), Some(vec![2.0, 5.0])).unwrap();
        let out = scaler.transform(array![3.0, 0.0].view()).unwrap();
        assert_abs_diff_eq!(out[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out[1], -2.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_scale_becomes_one() {
        let scaler = Scaler::new(Some(vec![4.0]), Some(vec![0.0])).unwrap();
        assert_eq!(scaler.transform(array![6.0].view()).unwrap(), array![2.0]);
    }

    #[test]
    fn partial_parameters() {
        let center = Scaler::new(Some(vec![1.0, 1.0]), None).unwrap();
        assert_eq!(center.transform(array![1.0, 3.0].view()).unwrap(), array![0.0, 2.0]);

        let scale = Scaler::new(None, Some(vec![2.0])).unwrap();
        assert_eq!(scale.transform(array![3.0].view()).unwrap(), array![1.5]);
    }

    #[test]
    fn invalid_parameters() {
        assert_eq!(Scaler::new(None, None), Err(ScalerError::Empty));
        assert_eq!(
            Scaler::new(Some(vec![0.0]), Some(vec![1.0, 1.0])),
            Err(ScalerError::LenMismatch { mean: 1, scale: 2 })
        );
        assert_eq!(
            Scaler::new(Some(vec![0.0, f64::NAN]), None),
            Err(ScalerError::NonFinite {
                field: "mean",
                index: 1
            })
        );
    }

    #[test]
    fn width_mismatch() {
        let scaler = Scaler::new(Some(vec![0.0; 3]), None).unwrap();
        assert!(scaler.transform(array![1.0].view()).is_err());
    }
}
