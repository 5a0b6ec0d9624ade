//! Model training
//!
//! Splits the data, searches gradient-boosting hyperparameters by K-fold
//! cross-validation, falls back to a fixed random forest when the search
//! cannot produce a model, evaluates on the held-out rows and attributes
//! the model's predictions to features.
//!
//! Search and attribution failures never reach the caller: the first becomes
//! [`TrainingPath::Fallback`], the second an absent attribution table.

mod attribution;
mod boosting;
mod forest;
mod metrics;
mod search;
mod tree;

pub use attribution::{AttributionTable, FeatureImportance, DEFAULT_ATTRIBUTION_SAMPLE};
pub use boosting::GradientBoostingModel;
pub use forest::{ForestParams, RandomForestModel};
pub use metrics::{r2, rmse};
pub use search::{GbmParams, KFold, ParamGrid};
pub use tree::{Node, RegressionTree};

use crate::error::{Error, Result};
use crate::features::FeatureFrame;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

/// Learner-level fit failure
#[derive(Debug, Error)]
pub(crate) enum FitError {
    #[error("no training rows")]
    EmptyTrainingSet,
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("training diverged to non-finite predictions")]
    Diverged,
}

/// Reasons the hyperparameter search produced no model
#[derive(Debug, Error)]
pub(crate) enum SearchError {
    #[error("parameter grid is empty")]
    EmptyGrid,
    #[error("{rows} training rows cannot fill {folds} cross-validation folds")]
    TooFewRows { rows: usize, folds: usize },
    #[error("non-finite cross-validation score for {params}")]
    NonFiniteScore { params: String },
    #[error("fit failed: {0}")]
    Fit(#[from] FitError),
}

#[derive(Debug, Error)]
pub(crate) enum AttributionError {
    #[error("no validation rows to explain")]
    EmptySample,
    #[error("model has {found} features, schema has {expected}")]
    WidthMismatch { expected: usize, found: usize },
    #[error("non-finite attribution for feature {0}")]
    NonFinite(String),
}

/// Additive decomposition of one prediction
#[derive(Debug, Clone, PartialEq)]
pub struct Contributions {
    pub bias: f64,
    /// One entry per feature, in schema order
    pub values: Vec<f64>,
}

impl Contributions {
    pub fn total(&self) -> f64 {
        self.bias + self.values.iter().sum::<f64>()
    }
}

/// Trait for fitted regressors
pub trait Regressor: Send + Sync {
    fn predict_row(&self, row: &[f64]) -> f64;

    /// Path attribution of `predict_row`; `total()` equals the prediction
    fn contributions(&self, row: &[f64]) -> Contributions;

    fn n_features(&self) -> usize;
}

/// The fitted model behind an estimator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrainedModel {
    GradientBoosting(GradientBoostingModel),
    RandomForest(RandomForestModel),
}

impl TrainedModel {
    fn as_regressor(&self) -> &dyn Regressor {
        match self {
            TrainedModel::GradientBoosting(m) => m as &dyn Regressor,
            TrainedModel::RandomForest(m) => m as &dyn Regressor,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TrainedModel::GradientBoosting(_) => "gradient_boosting",
            TrainedModel::RandomForest(_) => "random_forest",
        }
    }
}

impl Regressor for TrainedModel {
    fn predict_row(&self, row: &[f64]) -> f64 {
        self.as_regressor().predict_row(row)
    }

    fn contributions(&self, row: &[f64]) -> Contributions {
        self.as_regressor().contributions(row)
    }

    fn n_features(&self) -> usize {
        self.as_regressor().n_features()
    }
}

/// How the final model was produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "path", rename_all = "snake_case")]
pub enum TrainingPath {
    /// Grid search succeeded; `params` won with cross-validated `cv_rmse`
    Primary { params: GbmParams, cv_rmse: f64 },
    /// Grid search failed and the fixed forest was trained instead
    Fallback { reason: String },
}

impl TrainingPath {
    pub fn is_fallback(&self) -> bool {
        matches!(self, TrainingPath::Fallback { .. })
    }
}

/// Trainer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Fraction of rows held out for validation
    #[serde(default = "default_validation_fraction")]
    pub validation_fraction: f64,

    /// Seed for the split shuffle and the boosting subsamples
    #[serde(default = "default_seed")]
    pub seed: u64,

    #[serde(default = "default_cv_folds")]
    pub cv_folds: usize,

    #[serde(default)]
    pub grid: ParamGrid,

    #[serde(default)]
    pub forest: ForestParams,

    /// Validation rows used for attribution
    #[serde(default = "default_attribution_sample")]
    pub attribution_sample: usize,

    /// Logged as achieved or not; never gates training
    #[serde(default)]
    pub target_rmse: Option<f64>,
}

fn default_validation_fraction() -> f64 {
    0.2
}

fn default_seed() -> u64 {
    42
}

fn default_cv_folds() -> usize {
    3
}

fn default_attribution_sample() -> usize {
    DEFAULT_ATTRIBUTION_SAMPLE
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            validation_fraction: default_validation_fraction(),
            seed: default_seed(),
            cv_folds: default_cv_folds(),
            grid: ParamGrid::default(),
            forest: ForestParams::default(),
            attribution_sample: default_attribution_sample(),
            target_rmse: None,
        }
    }
}

/// Everything a training run produced
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub model: TrainedModel,
    pub path: TrainingPath,
    /// Columns the model was trained on, in order
    pub feature_names: Vec<String>,
    /// Validation RMSE
    pub rmse: f64,
    /// Validation R²; NaN with fewer than two validation rows
    pub r2: f64,
    pub attribution: Option<AttributionTable>,
    pub n_train: usize,
    pub n_validation: usize,
}

pub struct ModelTrainer {
    config: TrainerConfig,
}

impl Default for ModelTrainer {
    fn default() -> Self {
        Self::new(TrainerConfig::default())
    }
}

impl ModelTrainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Shuffled `(train, validation)` row indices
    ///
    /// The validation side holds `ceil(fraction * n)` rows, clamped so both
    /// sides keep at least one row.
    fn split(&self, n: usize) -> (Vec<usize>, Vec<usize>) {
        let wanted = (self.config.validation_fraction * n as f64 - 1e-9).ceil();
        let n_val = (wanted.max(0.0) as usize).clamp(1, n - 1);

        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut StdRng::seed_from_u64(self.config.seed));
        let train = indices.split_off(n_val);
        (train, indices)
    }

    pub fn train(&self, x: &FeatureFrame, y: &[f64]) -> Result<TrainReport> {
        let n = x.n_rows();
        if n != y.len() {
            return Err(Error::Data(format!(
                "feature frame has {n} rows but {} targets were given",
                y.len()
            )));
        }
        if n < 2 {
            return Err(Error::Data(format!(
                "at least 2 samples are required for training, got {n}"
            )));
        }
        if let Some(i) = y.iter().position(|v| !v.is_finite()) {
            return Err(Error::Data(format!("target at row {i} is not finite")));
        }

        let started = Instant::now();
        let rows: Vec<Vec<f64>> = (0..n).map(|i| x.row(i)).collect();
        let (train_idx, val_idx) = self.split(n);
        let x_train: Vec<Vec<f64>> = train_idx.iter().map(|&i| rows[i].clone()).collect();
        let y_train: Vec<f64> = train_idx.iter().map(|&i| y[i]).collect();
        let x_val: Vec<Vec<f64>> = val_idx.iter().map(|&i| rows[i].clone()).collect();
        let y_val: Vec<f64> = val_idx.iter().map(|&i| y[i]).collect();

        info!(
            samples = n,
            train = x_train.len(),
            validation = x_val.len(),
            features = x.n_cols(),
            grid_points = self.config.grid.len(),
            "Starting model training"
        );

        let (model, path) = match self.fit_primary(&x_train, &y_train) {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "Hyperparameter search failed, training fallback forest");
                let forest = RandomForestModel::fit(&x_train, &y_train, &self.config.forest)
                    .map_err(|fe| Error::Data(format!("fallback forest failed: {fe}")))?;
                (
                    TrainedModel::RandomForest(forest),
                    TrainingPath::Fallback {
                        reason: e.to_string(),
                    },
                )
            }
        };

        let predicted: Vec<f64> = x_val.iter().map(|r| model.predict_row(r)).collect();
        let val_rmse = rmse(&y_val, &predicted);
        let val_r2 = r2(&y_val, &predicted);

        if let Some(target) = self.config.target_rmse {
            if val_rmse <= target {
                info!(rmse = val_rmse, target, "Target RMSE achieved");
            } else {
                info!(rmse = val_rmse, target, "Target RMSE not achieved");
            }
        }

        let attribution = match attribution::explain(
            &model,
            &x_val,
            x.columns(),
            self.config.attribution_sample,
        ) {
            Ok(table) => Some(table),
            Err(e) => {
                warn!(error = %e, "Feature attribution unavailable");
                None
            }
        };

        info!(
            model = model.kind(),
            fallback = path.is_fallback(),
            rmse = val_rmse,
            r2 = val_r2,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Model training complete"
        );

        Ok(TrainReport {
            model,
            path,
            feature_names: x.columns().to_vec(),
            rmse: val_rmse,
            r2: val_r2,
            attribution,
            n_train: x_train.len(),
            n_validation: x_val.len(),
        })
    }

    fn fit_primary(
        &self,
        x: &[Vec<f64>],
        y: &[f64],
    ) -> std::result::Result<(TrainedModel, TrainingPath), SearchError> {
        let outcome = search::grid_search(
            x,
            y,
            &self.config.grid,
            self.config.cv_folds,
            self.config.seed,
        )?;
        info!(
            params = %outcome.params,
            cv_rmse = outcome.cv_rmse,
            evaluated = outcome.evaluated,
            "Grid search selected parameters"
        );
        let model = GradientBoostingModel::fit(x, y, &outcome.params, self.config.seed)?;
        Ok((
            TrainedModel::GradientBoosting(model),
            TrainingPath::Primary {
                params: outcome.params,
                cv_rmse: outcome.cv_rmse,
            },
        ))
    }
}
