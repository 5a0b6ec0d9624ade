//! HTTP API for predictions, model management, health checks and metrics

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use estimator_lib::{
    health::{ComponentStatus, HealthRegistry},
    persistence::ValidationSummary,
    trainer::FeatureImportance,
    Error, PredictionService, PropertyRecord, StructuredLogger, TrainingPath,
};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// Number of attribution entries reported by `GET /model`
const MODEL_SUMMARY_TOP_FEATURES: usize = 10;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub health_registry: HealthRegistry,
    pub service: Arc<PredictionService>,
    pub model_path: PathBuf,
    pub logger: StructuredLogger,
}

impl AppState {
    pub fn new(
        health_registry: HealthRegistry,
        service: Arc<PredictionService>,
        model_path: PathBuf,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            health_registry,
            service,
            model_path,
            logger,
        }
    }
}

#[derive(Debug, Serialize)]
struct PredictionResponse {
    prediction: f64,
}

#[derive(Debug, Serialize)]
struct ModelSummary {
    kind: &'static str,
    path: TrainingPath,
    n_features: usize,
    feature_names: Vec<String>,
    validation: ValidationSummary,
    top_features: Vec<FeatureImportance>,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

fn no_model() -> Response {
    error_response(StatusCode::SERVICE_UNAVAILABLE, "no model has been published")
}

/// Map an estimator error to a response; caller mistakes are 400, the rest 500
fn estimator_error(e: &Error) -> Response {
    if e.is_client_error() {
        error_response(StatusCode::BAD_REQUEST, e.to_string())
    } else {
        error!(error = %e, "Prediction failed");
        error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }
}

async fn predict(
    State(state): State<Arc<AppState>>,
    Json(record): Json<PropertyRecord>,
) -> Response {
    match state.service.predict(&record) {
        None => no_model(),
        Some(Ok(prediction)) => Json(PredictionResponse { prediction }).into_response(),
        Some(Err(e)) => estimator_error(&e),
    }
}

async fn explain(
    State(state): State<Arc<AppState>>,
    Json(record): Json<PropertyRecord>,
) -> Response {
    let Some(estimator) = state.service.current() else {
        return no_model();
    };
    match estimator.explain(&record) {
        Ok(explanation) => Json(explanation).into_response(),
        Err(e) => estimator_error(&e),
    }
}

/// Engineered features of one record
async fn features(
    State(state): State<Arc<AppState>>,
    Json(record): Json<PropertyRecord>,
) -> Response {
    let Some(estimator) = state.service.current() else {
        return no_model();
    };
    match estimator.features(&record) {
        Ok(features) => {
            let feature_count = features.len();
            let features: serde_json::Map<String, serde_json::Value> = features
                .into_iter()
                .map(|(name, value)| (name, json!(value)))
                .collect();
            Json(json!({ "features": features, "feature_count": feature_count })).into_response()
        }
        Err(e) => estimator_error(&e),
    }
}

async fn model_summary(State(state): State<Arc<AppState>>) -> Response {
    let Some(estimator) = state.service.current() else {
        return no_model();
    };
    let model = estimator.model();
    let top_features = estimator
        .attribution()
        .map(|table| table.top(MODEL_SUMMARY_TOP_FEATURES).to_vec())
        .unwrap_or_default();

    Json(ModelSummary {
        kind: model.regressor.kind(),
        path: model.path.clone(),
        n_features: model.feature_names.len(),
        feature_names: model.feature_names.clone(),
        validation: model.validation.clone(),
        top_features,
    })
    .into_response()
}

/// Reload the bundle from the configured path and publish it
async fn reload(State(state): State<Arc<AppState>>) -> Response {
    let path = state.model_path.clone();
    let service = state.service.clone();
    let result = match tokio::task::spawn_blocking(move || service.reload(&path)).await {
        Ok(result) => result,
        Err(e) => {
            error!(error = %e, "Reload task failed");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "reload task failed");
        }
    };

    let path_display = state.model_path.display().to_string();
    match result {
        Ok(()) => {
            let kind = state
                .service
                .current()
                .map_or("unknown", |estimator| estimator.model().regressor.kind());
            state.health_registry.record_publish(kind).await;
            state.logger.log_model_reload(&path_display, true, kind);
            Json(json!({ "reloaded": true })).into_response()
        }
        Err(e) => {
            let detail = e.to_string();
            state.logger.log_model_reload(&path_display, false, &detail);
            // a previously published model keeps serving
            state.health_registry.record_reload_failure(&detail).await;
            error_response(StatusCode::INTERNAL_SERVER_ERROR, detail)
        }
    }
}

/// Health check response - returns 200 if healthy or degraded, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still serving
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 once a model is published
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/explain", post(explain))
        .route("/features", post(features))
        .route("/model", get(model_summary))
        .route("/reload", post(reload))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
