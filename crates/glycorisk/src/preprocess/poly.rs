//! Polynomial feature expansion.

use ndarray::{Array1, ArrayView1};

use super::Transform;
use crate::error::InferenceError;

/// Largest total degree of a single output term.
const MAX_DEGREE: usize = 8;

/// Largest number of output terms an expander may produce.
const MAX_TERMS: usize = 1 << 16;

/// Errors building a [`PolynomialExpander`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolyError {
    #[error("degree must be at least 1")]
    ZeroDegree,
    #[error("polynomial expander has no input features")]
    NoInputs,
    #[error("powers row {row} has {len} entries, expected {n_features_in}")]
    RaggedPowers {
        row: usize,
        len: usize,
        n_features_in: usize,
    },
    #[error("expansion produces no output terms")]
    NoTerms,
    #[error("degree {degree} exceeds the maximum of {}", MAX_DEGREE)]
    DegreeTooHigh { degree: usize },
    #[error("expansion would produce more than {} terms", MAX_TERMS)]
    TooManyTerms,
}

/// Expands a row into monomials of its features.
///
/// Each output term is the product of the input features listed in its index
/// multiset; the empty multiset is the bias term.
#[derive(Debug, Clone, PartialEq)]
pub struct PolynomialExpander {
    n_features_in: usize,
    terms: Vec<Vec<usize>>,
}

impl PolynomialExpander {
    /// Generate terms in the conventional order: bias, then each degree
    /// ascending with index combinations in lexicographic order.
    pub fn new(
        n_features_in: usize,
        degree: usize,
        interaction_only: bool,
        include_bias: bool,
    ) -> Result<Self, PolyError> {
        if degree == 0 {
            return Err(PolyError::ZeroDegree);
        }
        if n_features_in == 0 {
            return Err(PolyError::NoInputs);
        }
        if degree > MAX_DEGREE {
            return Err(PolyError::DegreeTooHigh { degree });
        }
        let count = term_count(n_features_in, degree, interaction_only, include_bias)
            .filter(|&n| n <= MAX_TERMS)
            .ok_or(PolyError::TooManyTerms)?;
        let mut terms = Vec::with_capacity(count);
        if include_bias {
            terms.push(Vec::new());
        }
        for d in 1..=degree {
            combinations(n_features_in, d, !interaction_only, &mut terms);
        }
        if terms.is_empty() {
            return Err(PolyError::NoTerms);
        }
        Ok(Self {
            n_features_in,
            terms,
        })
    }

    /// Build from an explicit exponent matrix, one row per output term.
    pub fn from_powers(n_features_in: usize, powers: &[Vec<u32>]) -> Result<Self, PolyError> {
        if n_features_in == 0 {
            return Err(PolyError::NoInputs);
        }
        if powers.is_empty() {
            return Err(PolyError::NoTerms);
        }
        if powers.len() > MAX_TERMS {
            return Err(PolyError::TooManyTerms);
        }
        let mut terms = Vec::with_capacity(powers.len());
        for (row, exps) in powers.iter().enumerate() {
            if exps.len() != n_features_in {
                return Err(PolyError::RaggedPowers {
                    row,
                    len: exps.len(),
                    n_features_in,
                });
            }
            let degree = exps.iter().map(|&p| p as usize).sum();
            if degree > MAX_DEGREE {
                return Err(PolyError::DegreeTooHigh { degree });
            }
            let term = exps
                .iter()
                .enumerate()
                .flat_map(|(idx, &p)| std::iter::repeat(idx).take(p as usize))
                .collect();
            terms.push(term);
        }
        Ok(Self {
            n_features_in,
            terms,
        })
    }

    pub fn n_terms(&self) -> usize {
        self.terms.len()
    }
}

/// Number of generated terms, or `None` on overflow.
fn term_count(
    n: usize,
    degree: usize,
    interaction_only: bool,
    include_bias: bool,
) -> Option<usize> {
    (1..=degree).try_fold(usize::from(include_bias), |acc, d| {
        let per_degree = if interaction_only {
            binomial(n, d)
        } else {
            binomial(n + d - 1, d)
        };
        acc.checked_add(per_degree?)
    })
}

fn binomial(n: usize, k: usize) -> Option<usize> {
    if k > n {
        return Some(0);
    }
    (0..k).try_fold(1usize, |acc, i| Some(acc.checked_mul(n - i)? / (i + 1)))
}

/// Append all index combinations of size `k` from `0..n`.
fn combinations(n: usize, k: usize, with_replacement: bool, out: &mut Vec<Vec<usize>>) {
    fn rec(
        start: usize,
        n: usize,
        k: usize,
        with_replacement: bool,
        cur: &mut Vec<usize>,
        out: &mut Vec<Vec<usize>>,
    ) {
        if cur.len() == k {
            out.push(cur.clone());
            return;
        }
        for i in start..n {
            cur.push(i);
            let next = if with_replacement { i } else { i + 1 };
            rec(next, n, k, with_replacement, cur, out);
            cur.pop();
        }
    }
    rec(0, n, k, with_replacement, &mut Vec::with_capacity(k), out);
}

impl Transform for PolynomialExpander {
    fn name(&self) -> &'static str {
        "polynomial expander"
    }

    fn n_features_in(&self) -> Option<usize> {
        Some(self.n_features_in)
    }

    fn n_features_out(&self) -> Option<usize> {
        Some(self.n_terms())
    }

    fn transform(&self, row: ArrayView1<'_, f64>) -> Result<Array1<f64>, InferenceError> {
        InferenceError::check_width(self.name(), self.n_features_in, row.len())?;
        Ok(self
            .terms
            .iter()
            .map(|term| term.iter().map(|&i| row[i]).product())
            .collect())
    }
}
