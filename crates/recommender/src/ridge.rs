//! Closed-form ridge regression.
//!
//! Minimizes `‖Xw − y‖² + λ‖w‖²` by solving the normal equations
//! `(XᵀX + λI) w = Xᵀy` with a Cholesky factorization. A constant 1.0 column is
//! appended to `X`, so the last weight is the bias (and is penalized like the
//! others).

use crate::error::{RecommendError, Result};
use ndarray::{Array1, Array2};
use pipeline::FeatureVector;
use serde::{Deserialize, Serialize};

/// Weights of one request's model; the final entry is the bias.
///
/// Request-scoped: built, used to score candidates, then dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ModelParts")]
pub struct FittedModel {
    weights: Vec<f64>,
    lambda: f64,
}

/// Unchecked wire form of `FittedModel`
#[derive(Deserialize)]
struct ModelParts {
    weights: Vec<f64>,
    lambda: f64,
}

impl TryFrom<ModelParts> for FittedModel {
    type Error = RecommendError;

    /// Accepts only what `fit_ridge` can produce: at least the bias weight, all
    /// weights finite, and a finite non-negative λ.
    fn try_from(parts: ModelParts) -> Result<Self> {
        if parts.weights.is_empty() {
            return Err(RecommendError::InvalidArgument(
                "model weights must include the bias".to_string(),
            ));
        }
        if parts.weights.iter().any(|w| !w.is_finite()) {
            return Err(RecommendError::InvalidArgument(
                "model weights must be finite".to_string(),
            ));
        }
        if !parts.lambda.is_finite() || parts.lambda < 0.0 {
            return Err(RecommendError::InvalidArgument(format!(
                "invalid model lambda {}",
                parts.lambda
            )));
        }
        Ok(Self {
            weights: parts.weights,
            lambda: parts.lambda,
        })
    }
}

impl FittedModel {
    /// All weights, bias last (`feature_count() + 1` entries)
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Per-feature weights without the bias
    pub fn coefficients(&self) -> &[f64] {
        &self.weights[..self.weights.len() - 1]
    }

    pub fn bias(&self) -> f64 {
        self.weights[self.weights.len() - 1]
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn feature_count(&self) -> usize {
        self.weights.len() - 1
    }

    /// `w·x + bias`
    pub fn predict(&self, features: &FeatureVector) -> f64 {
        debug_assert_eq!(features.len(), self.feature_count());
        features.dot(self.coefficients()) + self.bias()
    }
}

/// Fit ridge weights for `rows` against `labels`.
///
/// Every row must have the same length. Fails with `InvalidArgument` for
/// mismatched inputs and `Fit` when the system is not positive definite or the
/// solution is not finite.
pub fn fit_ridge<'a, I>(rows: I, labels: &[f64], lambda: f64) -> Result<FittedModel>
where
    I: IntoIterator<Item = &'a FeatureVector>,
{
    let rows: Vec<&FeatureVector> = rows.into_iter().collect();
    if rows.len() != labels.len() {
        return Err(RecommendError::InvalidArgument(format!(
            "{} feature rows but {} labels",
            rows.len(),
            labels.len()
        )));
    }
    if !lambda.is_finite() || lambda < 0.0 {
        return Err(RecommendError::InvalidArgument(format!(
            "lambda must be a finite, non-negative number (got {})",
            lambda
        )));
    }
    let Some(first) = rows.first() else {
        return Err(RecommendError::Fit("no training rows".to_string()));
    };
    if labels.iter().any(|y| !y.is_finite()) {
        return Err(RecommendError::Fit("non-finite label".to_string()));
    }

    let dim = first.len();
    if let Some(bad) = rows.iter().find(|r| r.len() != dim) {
        return Err(RecommendError::InvalidArgument(format!(
            "feature rows differ in length ({} vs {})",
            bad.len(),
            dim
        )));
    }

    // Design matrix with the bias column last
    let cols = dim + 1;
    let mut x = Array2::<f64>::zeros((rows.len(), cols));
    for (i, row) in rows.iter().enumerate() {
        for (j, &v) in row.as_slice().iter().enumerate() {
            x[[i, j]] = v;
        }
        x[[i, dim]] = 1.0;
    }
    let y = Array1::from_vec(labels.to_vec());

    let mut a = x.t().dot(&x);
    for i in 0..cols {
        a[[i, i]] += lambda;
    }
    let b = x.t().dot(&y);

    let w = cholesky_solve(&a, &b)?;
    if w.iter().any(|v| !v.is_finite()) {
        return Err(RecommendError::Fit("solution has non-finite weights".to_string()));
    }

    Ok(FittedModel {
        weights: w.to_vec(),
        lambda,
    })
}

/// Solve `A x = b` for symmetric positive definite `A`
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    let n = a.nrows();

    // A = L Lᵀ
    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }

            if i == j {
                let diag = a[[i, i]] - sum;
                if !diag.is_finite() || diag <= 0.0 {
                    return Err(RecommendError::Fit(format!(
                        "normal-equation matrix is not positive definite (pivot {} = {:e})",
                        i, diag
                    )));
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // Forward substitution: L y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * y[j];
        }
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    // Back substitution: Lᵀ x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(values: &[&[f64]]) -> Vec<FeatureVector> {
        values.iter().map(|r| FeatureVector::new(r.to_vec())).collect()
    }

    #[test]
    fn test_recovers_line_with_tiny_penalty() {
        // y = 2x + 1
        let x = rows(&[&[0.0], &[1.0], &[2.0], &[3.0]]);
        let model = fit_ridge(&x, &[1.0, 3.0, 5.0, 7.0], 1e-10).unwrap();

        assert_eq!(model.weights().len(), 2);
        assert!((model.coefficients()[0] - 2.0).abs() < 1e-6);
        assert!((model.bias() - 1.0).abs() < 1e-6);
        assert!((model.predict(&FeatureVector::new(vec![10.0])) - 21.0).abs() < 1e-5);
    }

    #[test]
    fn test_penalty_shrinks_weights() {
        let x = rows(&[&[0.0], &[1.0], &[2.0], &[3.0]]);
        let y = [1.0, 3.0, 5.0, 7.0];
        let loose = fit_ridge(&x, &y, 1e-6).unwrap();
        let tight = fit_ridge(&x, &y, 100.0).unwrap();

        let norm = |m: &FittedModel| m.weights().iter().map(|w| w * w).sum::<f64>();
        assert!(norm(&tight) < norm(&loose));
        assert_eq!(tight.lambda(), 100.0);
    }

    #[test]
    fn test_more_features_than_samples_is_solvable() {
        let x = rows(&[&[1.0, 0.0, 1.0, 0.0, 0.3], &[0.0, 1.0, 0.0, 1.0, 0.7]]);
        let model = fit_ridge(&x, &[5.0, 1.0], 1.0).unwrap();
        assert_eq!(model.feature_count(), 5);
        assert!(model.predict(&x[0]) > model.predict(&x[1]));
    }

    #[test]
    fn test_singular_system_without_penalty_fails() {
        // Identical rows with lambda = 0 leave XᵀX rank deficient
        let x = rows(&[&[1.0, 1.0], &[1.0, 1.0]]);
        let err = fit_ridge(&x, &[3.0, 4.0], 0.0).unwrap_err();
        assert!(matches!(err, RecommendError::Fit(_)));
    }

    #[test]
    fn test_input_validation() {
        let x = rows(&[&[1.0], &[2.0, 3.0]]);
        assert!(matches!(
            fit_ridge(&x, &[1.0, 2.0], 1.0),
            Err(RecommendError::InvalidArgument(_))
        ));
        assert!(matches!(
            fit_ridge(&x, &[1.0], 1.0),
            Err(RecommendError::InvalidArgument(_))
        ));
        assert!(matches!(
            fit_ridge(Vec::<&FeatureVector>::new(), &[], 1.0),
            Err(RecommendError::Fit(_))
        ));
        let ok = rows(&[&[1.0], &[2.0]]);
        assert!(matches!(
            fit_ridge(&ok, &[1.0, f64::NAN], 1.0),
            Err(RecommendError::Fit(_))
        ));
    }

    #[test]
    fn test_model_json_is_validated() {
        let x = rows(&[&[0.0], &[1.0], &[2.0]]);
        let model = fit_ridge(&x, &[1.0, 2.0, 3.0], 1.0).unwrap();
        let json = serde_json::to_string(&model).unwrap();
        let back: FittedModel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, model);

        let parse = |json: &str| serde_json::from_str::<FittedModel>(json);
        assert!(parse(r#"{"weights":[],"lambda":1.0}"#).is_err());
        assert!(parse(r#"{"weights":[1.0],"lambda":-1.0}"#).is_err());
        assert!(parse(r#"{"weights":[1.0, 2.0],"lambda":0.0}"#).is_ok());
    }
}
