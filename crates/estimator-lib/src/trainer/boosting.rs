//! Gradient-boosted regression trees
//!
//! Squared loss: each round fits a leaf-wise tree to the current residuals
//! on a row subsample and a column subsample, then adds it scaled by the
//! learning rate.

use super::search::GbmParams;
use super::tree::{self, RegressionTree, TreeParams};
use super::{Contributions, FitError, Regressor};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingModel {
    init: f64,
    learning_rate: f64,
    n_features: usize,
    trees: Vec<RegressionTree>,
}

/// Draw `fraction` of `0..n` without replacement, sorted; at least one
fn subsample(rng: &mut StdRng, n: usize, fraction: f64) -> Vec<usize> {
    if fraction >= 1.0 || n == 0 {
        return (0..n).collect();
    }
    let amount = ((n as f64 * fraction).round() as usize).clamp(1, n);
    let mut picked = index::sample(rng, n, amount).into_vec();
    picked.sort_unstable();
    picked
}

fn validate(params: &GbmParams) -> Result<(), FitError> {
    let invalid = |msg: &str| -> Result<(), FitError> {
        Err(FitError::InvalidParameter(format!("{msg} ({params})")))
    };
    if params.n_estimators == 0 {
        return invalid("n_estimators must be positive");
    }
    if !(params.learning_rate.is_finite() && params.learning_rate > 0.0) {
        return invalid("learning_rate must be a positive number");
    }
    if params.num_leaves < 2 {
        return invalid("num_leaves must be at least 2");
    }
    if params.max_depth == 0 {
        return invalid("max_depth must be positive");
    }
    for (name, fraction) in [
        ("subsample", params.subsample),
        ("colsample_bytree", params.colsample_bytree),
    ] {
        if !(fraction > 0.0 && fraction <= 1.0) {
            return invalid(&format!("{name} must be in (0, 1]"));
        }
    }
    Ok(())
}

impl GradientBoostingModel {
    pub(crate) fn fit(
        x: &[Vec<f64>],
        y: &[f64],
        params: &GbmParams,
        seed: u64,
    ) -> Result<Self, FitError> {
        validate(params)?;
        if x.is_empty() || x.len() != y.len() {
            return Err(FitError::EmptyTrainingSet);
        }
        let n = x.len();
        let n_features = x[0].len();

        let init = y.iter().sum::<f64>() / n as f64;
        let mut predictions = vec![init; n];
        let mut rng = StdRng::seed_from_u64(seed);
        let tree_params = TreeParams {
            max_depth: params.max_depth,
            max_leaves: params.num_leaves,
            min_samples_split: 2,
            min_samples_leaf: params.min_child_samples.max(1),
        };

        let mut trees = Vec::with_capacity(params.n_estimators);
        for _ in 0..params.n_estimators {
            let residuals: Vec<f64> = y.iter().zip(&predictions).map(|(t, p)| t - p).collect();
            let rows = subsample(&mut rng, n, params.subsample);
            let columns = subsample(&mut rng, n_features, params.colsample_bytree);

            let tree = tree::grow(x, &residuals, &rows, &columns, &tree_params)?;
            for (pred, row) in predictions.iter_mut().zip(x) {
                *pred += params.learning_rate * tree.predict(row);
            }
            trees.push(tree);
        }

        if predictions.iter().any(|p| !p.is_finite()) {
            return Err(FitError::Diverged);
        }

        Ok(Self {
            init,
            learning_rate: params.learning_rate,
            n_features,
            trees,
        })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for GradientBoostingModel {
    fn predict_row(&self, row: &[f64]) -> f64 {
        self.init
            + self.learning_rate * self.trees.iter().map(|t| t.predict(row)).sum::<f64>()
    }

    fn contributions(&self, row: &[f64]) -> Contributions {
        let mut values = vec![0.0; self.n_features];
        let mut bias = self.init;
        for tree in &self.trees {
            bias += tree.add_contributions(row, self.learning_rate, &mut values);
        }
        Contributions { bias, values }
    }

    fn n_features(&self) -> usize {
        self.n_features
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> GbmParams {
        GbmParams {
            num_leaves: 8,
            n_estimators: 50,
            learning_rate: 0.1,
            max_depth: 4,
            min_child_samples: 1,
            subsample: 1.0,
            colsample_bytree: 1.0,
        }
    }

    fn linear_data() -> (Vec<Vec<f64>>, Vec<f64>) {
        let x: Vec<Vec<f64>> = (0..40).map(|i| vec![i as f64, (i % 3) as f64]).collect();
        let y = x.iter().map(|r| 10.0 * r[0] + 5.0).collect();
        (x, y)
    }

    #[test]
    fn test_fit_reduces_training_error() {
        let (x, y) = linear_data();
        let model = GradientBoostingModel::fit(&x, &y, &params(), 42).unwrap();
        let mean = y.iter().sum::<f64>() / y.len() as f64;

        let sse = |pred: &dyn Fn(&[f64]) -> f64| -> f64 {
            x.iter().zip(&y).map(|(r, t)| (pred(r) - t).powi(2)).sum()
        };
        assert!(sse(&|r| model.predict_row(r)) < 0.05 * sse(&|_| mean));
        assert_eq!(model.n_trees(), 50);
    }

    #[test]
    fn test_seeded_fit_is_reproducible() {
        let (x, y) = linear_data();
        let p = GbmParams {
            subsample: 0.8,
            colsample_bytree: 0.5,
            ..params()
        };
        let a = GradientBoostingModel::fit(&x, &y, &p, 7).unwrap();
        let b = GradientBoostingModel::fit(&x, &y, &p, 7).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_contributions_are_additive() {
        let (x, y) = linear_data();
        let model = GradientBoostingModel::fit(&x, &y, &params(), 42).unwrap();
        for row in x.iter().take(10) {
            let c = model.contributions(row);
            assert!((c.total() - model.predict_row(row)).abs() < 1e-6);
        }
    }

    #[test]
    fn test_invalid_params_rejected() {
        let (x, y) = linear_data();
        let bad = GbmParams {
            subsample: 0.0,
            ..params()
        };
        assert!(matches!(
            GradientBoostingModel::fit(&x, &y, &bad, 42),
            Err(FitError::InvalidParameter(_))
        ));
        let no_trees = GbmParams {
            n_estimators: 0,
            ..params()
        };
        assert!(GradientBoostingModel::fit(&x, &y, &no_trees, 42).is_err());
    }

    #[test]
    fn test_min_child_samples_larger_than_data_predicts_mean() {
        let x = vec![vec![1.0], vec![2.0], vec![3.0]];
        let y = vec![10.0, 20.0, 30.0];
        let p = GbmParams {
            min_child_samples: 20,
            ..params()
        };
        let model = GradientBoostingModel::fit(&x, &y, &p, 42).unwrap();
        assert!((model.predict_row(&[1.0]) - 20.0).abs() < 1e-9);
    }
}
