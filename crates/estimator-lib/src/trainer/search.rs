//! Hyperparameter grid search with K-fold cross-validation
//!
//! Grid points are scored in parallel. The reduction afterwards is
//! sequential in scan order, so the first best point wins regardless of
//! which thread finished first.

use super::boosting::GradientBoostingModel;
use super::metrics::rmse;
use super::{Regressor, SearchError};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// One gradient-boosting configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GbmParams {
    pub num_leaves: usize,
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_child_samples: usize,
    pub subsample: f64,
    pub colsample_bytree: f64,
}

impl fmt::Display for GbmParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "num_leaves={} n_estimators={} learning_rate={} max_depth={} min_child_samples={} subsample={} colsample_bytree={}",
            self.num_leaves,
            self.n_estimators,
            self.learning_rate,
            self.max_depth,
            self.min_child_samples,
            self.subsample,
            self.colsample_bytree
        )
    }
}

/// Candidate values per hyperparameter; the grid is their cartesian product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamGrid {
    pub num_leaves: Vec<usize>,
    pub n_estimators: Vec<usize>,
    pub learning_rate: Vec<f64>,
    pub max_depth: Vec<usize>,
    pub min_child_samples: Vec<usize>,
    pub subsample: Vec<f64>,
    pub colsample_bytree: Vec<f64>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            num_leaves: vec![15, 31],
            n_estimators: vec![100, 300],
            learning_rate: vec![0.05, 0.1],
            max_depth: vec![4, 6],
            min_child_samples: vec![10, 20],
            subsample: vec![0.8, 1.0],
            colsample_bytree: vec![0.8, 1.0],
        }
    }
}

impl ParamGrid {
    /// Full three-values-per-axis grid (2187 points)
    pub fn exhaustive() -> Self {
        Self {
            num_leaves: vec![15, 31, 63],
            n_estimators: vec![100, 300, 500],
            learning_rate: vec![0.01, 0.05, 0.1],
            max_depth: vec![4, 6, 8],
            min_child_samples: vec![10, 20, 30],
            subsample: vec![0.8, 0.9, 1.0],
            colsample_bytree: vec![0.8, 0.9, 1.0],
        }
    }

    /// A grid with a single point
    pub fn single(params: GbmParams) -> Self {
        Self {
            num_leaves: vec![params.num_leaves],
            n_estimators: vec![params.n_estimators],
            learning_rate: vec![params.learning_rate],
            max_depth: vec![params.max_depth],
            min_child_samples: vec![params.min_child_samples],
            subsample: vec![params.subsample],
            colsample_bytree: vec![params.colsample_bytree],
        }
    }

    pub fn len(&self) -> usize {
        self.num_leaves.len()
            * self.n_estimators.len()
            * self.learning_rate.len()
            * self.max_depth.len()
            * self.min_child_samples.len()
            * self.subsample.len()
            * self.colsample_bytree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every grid point in scan order; the last axis varies fastest
    pub fn points(&self) -> Vec<GbmParams> {
        let mut points = Vec::with_capacity(self.len());
        for &num_leaves in &self.num_leaves {
            for &n_estimators in &self.n_estimators {
                for &learning_rate in &self.learning_rate {
                    for &max_depth in &self.max_depth {
                        for &min_child_samples in &self.min_child_samples {
                            for &subsample in &self.subsample {
                                for &colsample_bytree in &self.colsample_bytree {
                                    points.push(GbmParams {
                                        num_leaves,
                                        n_estimators,
                                        learning_rate,
                                        max_depth,
                                        min_child_samples,
                                        subsample,
                                        colsample_bytree,
                                    });
                                }
                            }
                        }
                    }
                }
            }
        }
        points
    }
}

/// Contiguous, unshuffled K-fold splitter
///
/// The first `n % k` folds hold one extra row.
#[derive(Debug, Clone, Copy)]
pub struct KFold {
    n_splits: usize,
}

impl KFold {
    pub fn new(n_splits: usize) -> Self {
        Self { n_splits }
    }

    /// `(train, validation)` index pairs, or `None` when `n` rows cannot fill every fold
    pub fn split(&self, n: usize) -> Option<Vec<(Vec<usize>, Vec<usize>)>> {
        if self.n_splits < 2 || n < self.n_splits {
            return None;
        }
        let base = n / self.n_splits;
        let extra = n % self.n_splits;
        let mut start = 0;
        let folds = (0..self.n_splits)
            .map(|k| {
                let size = base + usize::from(k < extra);
                let val: Vec<usize> = (start..start + size).collect();
                let train: Vec<usize> = (0..start).chain(start + size..n).collect();
                start += size;
                (train, val)
            })
            .collect();
        Some(folds)
    }
}

/// Winning configuration and its cross-validated error
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SearchOutcome {
    pub params: GbmParams,
    pub cv_rmse: f64,
    pub evaluated: usize,
}

fn select_rows(x: &[Vec<f64>], y: &[f64], idx: &[usize]) -> (Vec<Vec<f64>>, Vec<f64>) {
    (
        idx.iter().map(|&i| x[i].clone()).collect(),
        idx.iter().map(|&i| y[i]).collect(),
    )
}

/// Mean negative validation RMSE over the folds
fn cross_val_score(
    x: &[Vec<f64>],
    y: &[f64],
    folds: &[(Vec<usize>, Vec<usize>)],
    params: &GbmParams,
    seed: u64,
) -> Result<f64, SearchError> {
    let mut total = 0.0;
    for (train, val) in folds {
        let (x_train, y_train) = select_rows(x, y, train);
        let model = GradientBoostingModel::fit(&x_train, &y_train, params, seed)?;
        let predicted: Vec<f64> = val.iter().map(|&i| model.predict_row(&x[i])).collect();
        let actual: Vec<f64> = val.iter().map(|&i| y[i]).collect();
        total -= rmse(&actual, &predicted);
    }
    let score = total / folds.len() as f64;
    if !score.is_finite() {
        return Err(SearchError::NonFiniteScore {
            params: params.to_string(),
        });
    }
    Ok(score)
}

pub(crate) fn grid_search(
    x: &[Vec<f64>],
    y: &[f64],
    grid: &ParamGrid,
    n_folds: usize,
    seed: u64,
) -> Result<SearchOutcome, SearchError> {
    let points = grid.points();
    if points.is_empty() {
        return Err(SearchError::EmptyGrid);
    }
    let folds = KFold::new(n_folds)
        .split(x.len())
        .ok_or(SearchError::TooFewRows {
            rows: x.len(),
            folds: n_folds,
        })?;

    let scores: Vec<Result<f64, SearchError>> = points
        .par_iter()
        .map(|params| cross_val_score(x, y, &folds, params, seed))
        .collect();

    let mut best: Option<(usize, f64)> = None;
    for (i, score) in scores.into_iter().enumerate() {
        let score = score?;
        debug!(point = i, score, "Scored grid point");
        if best.map_or(true, |(_, b)| score > b) {
            best = Some((i, score));
        }
    }

    let (idx, score) = best.ok_or(SearchError::EmptyGrid)?;
    Ok(SearchOutcome {
        params: points[idx],
        cv_rmse: -score,
        evaluated: points.len(),
    })
}
