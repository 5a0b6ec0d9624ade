//! Observability infrastructure for the price estimator
//!
//! Provides:
//! - Prometheus metrics (prediction latency and outcomes, model info, reloads)
//! - Structured logging with tracing

use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_counter_vec,
    register_int_gauge, GaugeVec, Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00005, 0.0001, 0.00025, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<EstimatorMetricsInner> = OnceLock::new();

struct EstimatorMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions: IntCounter,
    prediction_errors: IntCounterVec,
    model_info: GaugeVec,
    model_features: IntGauge,
    model_reloads: IntCounter,
    model_reload_errors: IntCounter,
}

impl EstimatorMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "price_estimator_prediction_latency_seconds",
                "Time spent deriving features and evaluating the model for one record",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions: register_int_counter!(
                "price_estimator_predictions_total",
                "Total number of successful predictions"
            )
            .expect("Failed to register predictions_total"),

            prediction_errors: register_int_counter_vec!(
                "price_estimator_prediction_errors_total",
                "Total number of failed predictions by cause",
                &["cause"]
            )
            .expect("Failed to register prediction_errors_total"),

            model_info: register_gauge_vec!(
                "price_estimator_model_info",
                "Information about the currently published model",
                &["kind"]
            )
            .expect("Failed to register model_info"),

            model_features: register_int_gauge!(
                "price_estimator_model_features",
                "Number of features the published model expects"
            )
            .expect("Failed to register model_features"),

            model_reloads: register_int_counter!(
                "price_estimator_model_reloads_total",
                "Total number of successful model reloads"
            )
            .expect("Failed to register model_reloads_total"),

            model_reload_errors: register_int_counter!(
                "price_estimator_model_reload_errors_total",
                "Total number of failed model reloads"
            )
            .expect("Failed to register model_reload_errors_total"),
        }
    }
}

/// Estimator metrics for Prometheus exposition
///
/// A lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct EstimatorMetrics {
    _private: (),
}

impl Default for EstimatorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EstimatorMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(EstimatorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &EstimatorMetricsInner {
        GLOBAL_METRICS.get_or_init(EstimatorMetricsInner::new)
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn inc_predictions(&self) {
        self.inner().predictions.inc();
    }

    /// Count a failed prediction, split by whether the request was at fault
    pub fn inc_prediction_errors(&self, client_error: bool) {
        let cause = if client_error { "request" } else { "internal" };
        self.inner()
            .prediction_errors
            .with_label_values(&[cause])
            .inc();
    }

    /// Record the kind and width of the published model
    pub fn set_model_info(&self, kind: &str, features: usize) {
        self.inner().model_info.reset();
        self.inner().model_info.with_label_values(&[kind]).set(1.0);
        self.inner().model_features.set(features as i64);
    }

    pub fn inc_reloads(&self) {
        self.inner().model_reloads.inc();
    }

    pub fn inc_reload_errors(&self) {
        self.inner().model_reload_errors.inc();
    }
}

/// Structured logger for estimator events
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn log_prediction(&self, price: f64, latency_us: u64) {
        info!(
            event = "prediction_served",
            instance = %self.instance,
            price = price,
            latency_us = latency_us,
            "Served price prediction"
        );
    }

    pub fn log_startup(&self, version: &str, model_path: &str) {
        info!(
            event = "server_started",
            instance = %self.instance,
            version = %version,
            model_path = %model_path,
            "Price estimator started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "server_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Price estimator shutting down"
        );
    }

    pub fn log_model_reload(&self, model_path: &str, success: bool, detail: &str) {
        if success {
            info!(
                event = "model_reloaded",
                instance = %self.instance,
                model_path = %model_path,
                model = %detail,
                "Model bundle loaded and published"
            );
        } else {
            warn!(
                event = "model_reload_failed",
                instance = %self.instance,
                model_path = %model_path,
                error = %detail,
                "Model reload failed, keeping previous model"
            );
        }
    }

    pub fn log_training_complete(&self, model: &str, fallback: bool, rmse: f64, r2: f64) {
        if fallback {
            warn!(
                event = "training_complete",
                instance = %self.instance,
                model = %model,
                fallback = true,
                rmse = rmse,
                r2 = r2,
                "Training finished on the fallback path"
            );
        } else {
            info!(
                event = "training_complete",
                instance = %self.instance,
                model = %model,
                fallback = false,
                rmse = rmse,
                r2 = r2,
                "Training finished"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimator_metrics_creation() {
        // Metrics live in the global registry; repeated handles share them
        let metrics = EstimatorMetrics::new();
        let again = EstimatorMetrics::new();

        metrics.observe_prediction_latency(0.0004);
        metrics.inc_predictions();
        again.inc_prediction_errors(true);
        again.inc_prediction_errors(false);
        metrics.set_model_info("gradient_boosting", 42);
        metrics.inc_reloads();
        metrics.inc_reload_errors();

        let names: Vec<String> = prometheus::gather()
            .iter()
            .map(|f| f.get_name().to_string())
            .collect();
        assert!(names.contains(&"price_estimator_predictions_total".to_string()));
        assert!(names.contains(&"price_estimator_model_info".to_string()));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("test-instance");
        assert_eq!(logger.instance, "test-instance");
    }
}
