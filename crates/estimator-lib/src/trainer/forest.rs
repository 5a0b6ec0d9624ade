//! Bagged regression forest used when the boosting search fails

use super::tree::{self, RegressionTree, TreeParams};
use super::{Contributions, FitError, Regressor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Fixed fallback configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,
    #[serde(default = "default_bootstrap")]
    pub bootstrap: bool,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_n_estimators() -> usize {
    200
}

fn default_max_depth() -> usize {
    10
}

fn default_min_samples_split() -> usize {
    5
}

fn default_bootstrap() -> bool {
    true
}

fn default_seed() -> u64 {
    42
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: default_n_estimators(),
            max_depth: default_max_depth(),
            min_samples_split: default_min_samples_split(),
            bootstrap: default_bootstrap(),
            seed: default_seed(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestModel {
    n_features: usize,
    trees: Vec<RegressionTree>,
}

impl RandomForestModel {
    /// Trees are grown in parallel; tree `t` draws its bootstrap from `seed + t`
    pub(crate) fn fit(x: &[Vec<f64>], y: &[f64], params: &ForestParams) -> Result<Self, FitError> {
        if x.is_empty() || x.len() != y.len() {
            return Err(FitError::EmptyTrainingSet);
        }
        if params.n_estimators == 0 {
            return Err(FitError::InvalidParameter("n_estimators must be positive".into()));
        }
        let n = x.len();
        let n_features = x[0].len();
        let features: Vec<usize> = (0..n_features).collect();
        let tree_params = TreeParams {
            max_depth: params.max_depth,
            max_leaves: usize::MAX,
            min_samples_split: params.min_samples_split,
            min_samples_leaf: 1,
        };

        let trees = (0..params.n_estimators)
            .into_par_iter()
            .map(|t| {
                let rows: Vec<usize> = if params.bootstrap {
                    let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(t as u64));
                    (0..n).map(|_| rng.random_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                tree::grow(x, y, &rows, &features, &tree_params)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { n_features, trees })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for RandomForestModel {
    fn predict_row(&self, row: &[f64]) -> f64 {
        self.trees.iter().map(|t| t.predict(row)).sum::<f64>() / self.trees.len() as f64
    }

    fn contributions(&self, row: &[f64]) -> Contributions {
        let scale = 1.0 / self.trees.len() as f64;
        let mut values = vec![0.0; self.n_features];
        let bias = self
            .trees
            .iter()
            .map(|t| t.add_contributions(row, scale, &mut values))
            .sum();
        Contributions { bias, values }
    }

    fn n_features(&self) -> usize {
        self.n_features
    }
}
