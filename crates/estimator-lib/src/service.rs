//! Prediction service
//!
//! An [`Estimator`] pairs a read-only feature engine with the model it was
//! trained alongside. The [`PredictionService`] holds the currently published
//! estimator and swaps it atomically on reload.

use crate::error::{Error, Result};
use crate::features::FeatureEngine;
use crate::models::PropertyRecord;
use crate::observability::{EstimatorMetrics, StructuredLogger};
use crate::persistence::{self, ModelArtifact, ModelBundle};
use crate::trainer::{AttributionTable, Regressor};
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::Instant;
use tracing::{debug, info};

/// One prediction broken down into per-feature contributions
#[derive(Debug, Clone, Serialize)]
pub struct Explanation {
    pub prediction: f64,
    pub bias: f64,
    /// `(feature, contribution)` sorted by absolute contribution, largest first
    pub contributions: Vec<(String, f64)>,
}

/// A fitted engine and model that together turn records into prices
#[derive(Debug)]
pub struct Estimator {
    engine: FeatureEngine,
    model: ModelArtifact,
    attribution: Option<AttributionTable>,
}

impl Estimator {
    /// Restore the vectorizer into a fresh engine and attach the model
    pub fn from_bundle(bundle: ModelBundle) -> Result<Self> {
        let ModelBundle {
            model,
            vectorizer,
            attribution,
        } = bundle;

        if model.regressor.n_features() != model.feature_names.len() {
            return Err(Error::Data(format!(
                "model expects {} features but the bundle lists {} names",
                model.regressor.n_features(),
                model.feature_names.len()
            )));
        }

        let mut engine = FeatureEngine::new(model.feature_config.clone());
        if let Some(state) = vectorizer {
            engine = engine.with_vectorizer(Arc::new(state));
        }
        Ok(Self {
            engine,
            model,
            attribution,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_bundle(persistence::load(path)?)
    }

    pub fn model(&self) -> &ModelArtifact {
        &self.model
    }

    pub fn attribution(&self) -> Option<&AttributionTable> {
        self.attribution.as_ref()
    }

    /// Engineered features of one record, in frame order
    ///
    /// Unlike [`Estimator::predict`] this does not require the columns to
    /// match the model, so partial records show what they would produce.
    pub fn features(&self, record: &PropertyRecord) -> Result<Vec<(String, f64)>> {
        let frame = self.engine.transform(std::slice::from_ref(record))?;
        Ok(frame.columns().iter().cloned().zip(frame.row(0)).collect())
    }

    fn feature_row(&self, record: &PropertyRecord) -> Result<Vec<f64>> {
        let frame = self.engine.transform(std::slice::from_ref(record))?;
        if frame.columns() != self.model.feature_names.as_slice() {
            return Err(Error::schema_mismatch(&self.model.feature_names, frame.columns()));
        }
        Ok(frame.row(0))
    }

    /// Predict the price of one record
    pub fn predict(&self, record: &PropertyRecord) -> Result<f64> {
        let row = self.feature_row(record)?;
        Ok(self.model.predict_row(&row))
    }

    /// Predict and attribute the price of one record
    pub fn explain(&self, record: &PropertyRecord) -> Result<Explanation> {
        let row = self.feature_row(record)?;
        let c = self.model.regressor.contributions(&row);
        let prediction = c.total();
        let mut contributions: Vec<(String, f64)> = self
            .model
            .feature_names
            .iter()
            .cloned()
            .zip(c.values)
            .collect();
        contributions.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
        Ok(Explanation {
            prediction,
            bias: c.bias,
            contributions,
        })
    }
}

/// Serves predictions from the currently published estimator
pub struct PredictionService {
    current: RwLock<Option<Arc<Estimator>>>,
    metrics: EstimatorMetrics,
    logger: StructuredLogger,
}

impl PredictionService {
    pub fn new(instance_name: impl Into<String>) -> Self {
        Self {
            current: RwLock::new(None),
            metrics: EstimatorMetrics::new(),
            logger: StructuredLogger::new(instance_name),
        }
    }

    /// Replace the served estimator
    pub fn publish(&self, estimator: Estimator) {
        let kind = estimator.model.regressor.kind();
        let features = estimator.model.feature_names.len();
        let estimator = Arc::new(estimator);
        match self.current.write() {
            Ok(mut guard) => *guard = Some(estimator),
            Err(poisoned) => *poisoned.into_inner() = Some(estimator),
        }
        self.metrics.set_model_info(kind, features);
        info!(model = kind, features, "Published estimator");
    }

    /// Load a bundle from disk and publish it
    pub fn reload(&self, path: &Path) -> Result<()> {
        match Estimator::load(path) {
            Ok(estimator) => {
                self.publish(estimator);
                self.metrics.inc_reloads();
                Ok(())
            }
            Err(e) => {
                self.metrics.inc_reload_errors();
                Err(e)
            }
        }
    }

    /// The published estimator, if any
    pub fn current(&self) -> Option<Arc<Estimator>> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.current().is_some()
    }

    /// Predict with the published estimator; `None` when nothing is published
    pub fn predict(&self, record: &PropertyRecord) -> Option<Result<f64>> {
        let estimator = self.current()?;
        let start = Instant::now();
        let result = estimator.predict(record);
        let elapsed = start.elapsed();
        self.metrics.observe_prediction_latency(elapsed.as_secs_f64());

        match &result {
            Ok(price) => {
                self.metrics.inc_predictions();
                self.logger.log_prediction(*price, elapsed.as_micros() as u64);
            }
            Err(e) => {
                self.metrics.inc_prediction_errors(e.is_client_error());
                debug!(error = %e, "Prediction failed");
            }
        }
        Some(result)
    }
}
