//! Integration tests for the price estimator API endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use estimator_lib::{
    health::{components, HealthRegistry},
    persistence,
    trainer::GbmParams,
    FeatureEngine, ModelTrainer, ParamGrid, PredictionService, PropertyRecord, StructuredLogger,
    TrainerConfig,
};
use price_server::api::{create_router, AppState};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

fn training_batch() -> (Vec<PropertyRecord>, Vec<f64>) {
    let descriptions = [
        "spacious flat near metro",
        "luxury villa with pool",
        "compact studio needs repairs",
        "modern apartment with park view",
        "quiet home near school",
    ];
    let records = (0..20)
        .map(|i| {
            PropertyRecord::default()
                .with_area(600.0 + 75.0 * i as f64)
                .with_rooms((i % 3 + 1) as f64, (i % 2 + 1) as f64)
                .with_year_built(1990.0 + i as f64)
                .with_location(12.95 + 0.002 * i as f64, 77.58)
                .with_description(descriptions[i % descriptions.len()])
        })
        .collect();
    let prices = (0..20).map(|i| 50_000.0 + 6_000.0 * i as f64).collect();
    (records, prices)
}

fn write_bundle(path: &Path) {
    let (records, prices) = training_batch();
    let mut engine = FeatureEngine::default();
    let frame = engine.build(&records, true).unwrap();
    let trainer = ModelTrainer::new(TrainerConfig {
        grid: ParamGrid::single(GbmParams {
            num_leaves: 4,
            n_estimators: 20,
            learning_rate: 0.1,
            max_depth: 3,
            min_child_samples: 2,
            subsample: 1.0,
            colsample_bytree: 1.0,
        }),
        ..TrainerConfig::default()
    });
    let report = trainer.train(&frame, &prices).unwrap();
    persistence::save_report(
        &report,
        engine.config(),
        engine.vectorizer().map(Arc::as_ref),
        path,
    )
    .unwrap();
}

fn query() -> serde_json::Value {
    serde_json::json!({
        "area": 1200.0,
        "bedrooms": 2.0,
        "bathrooms": 2.0,
        "year_built": 2012.0,
        "lat": 12.97,
        "lon": 77.59,
        "description": "modern flat near park"
    })
}

struct TestApp {
    router: Router,
    state: Arc<AppState>,
    _dir: TempDir,
}

async fn setup_test_app(with_model: bool) -> TestApp {
    let dir = TempDir::new().unwrap();
    let model_path = dir.path().join("model.json");

    let health_registry = HealthRegistry::new();
    health_registry.register(components::MODEL).await;
    health_registry.register(components::MODEL_STORE).await;

    let service = Arc::new(PredictionService::new("test"));
    if with_model {
        write_bundle(&model_path);
        service.reload(&model_path).unwrap();
        health_registry.record_publish("gradient_boosting").await;
    }

    let state = Arc::new(AppState::new(
        health_registry,
        service,
        model_path,
        StructuredLogger::new("test"),
    ));
    TestApp {
        router: create_router(state.clone()),
        state,
        _dir: dir,
    }
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap_or_default())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_predict_returns_price() {
    let app = setup_test_app(true).await;

    let (status, body) = send(app.router, post_json("/predict", &query())).await;

    assert_eq!(status, StatusCode::OK);
    let price = body["prediction"].as_f64().unwrap();
    assert!(price.is_finite() && price > 0.0);
}

#[tokio::test]
async fn test_predict_without_model_returns_503() {
    let app = setup_test_app(false).await;

    let (status, body) = send(app.router, post_json("/predict", &query())).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_predict_schema_mismatch_returns_400() {
    let app = setup_test_app(true).await;
    let record = serde_json::json!({ "area": 1200.0, "bedrooms": 2.0 });

    let (status, body) = send(app.router, post_json("/predict", &record)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("schema mismatch"));
}

#[tokio::test]
async fn test_explain_is_additive() {
    let app = setup_test_app(true).await;

    let (status, body) = send(app.router.clone(), post_json("/explain", &query())).await;
    assert_eq!(status, StatusCode::OK);

    let bias = body["bias"].as_f64().unwrap();
    let contributions = body["contributions"].as_array().unwrap();
    let total: f64 = bias
        + contributions
            .iter()
            .map(|c| c[1].as_f64().unwrap())
            .sum::<f64>();
    assert!((total - body["prediction"].as_f64().unwrap()).abs() < 1e-6);

    let (_, predicted) = send(app.router, post_json("/predict", &query())).await;
    let price = predicted["prediction"].as_f64().unwrap();
    assert!((price - body["prediction"].as_f64().unwrap()).abs() < 1e-6);
}

#[tokio::test]
async fn test_features_returns_engineered_map() {
    let app = setup_test_app(true).await;

    let (status, body) = send(app.router, post_json("/features", &query())).await;

    assert_eq!(status, StatusCode::OK);
    let features = body["features"].as_object().unwrap();
    assert_eq!(body["feature_count"].as_u64().unwrap() as usize, features.len());
    assert_eq!(features["area"], 1200.0);
    assert!(features.contains_key("property_age"));
    assert!(features.contains_key("dist_to_cbd_km"));
    assert!(features.keys().any(|k| k.starts_with("tfidf_")));
}

#[tokio::test]
async fn test_features_without_model_returns_503() {
    let app = setup_test_app(false).await;

    let (status, _) = send(app.router, post_json("/features", &query())).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_model_summary() {
    let app = setup_test_app(true).await;

    let (status, body) = send(app.router, get("/model")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], "gradient_boosting");
    assert_eq!(body["path"]["path"], "primary");
    let names = body["feature_names"].as_array().unwrap();
    assert_eq!(body["n_features"].as_u64().unwrap() as usize, names.len());
    assert!(names.iter().any(|n| n == "property_age"));
    assert!(body["top_features"].as_array().unwrap().len() <= 10);
}

#[tokio::test]
async fn test_model_summary_without_model_returns_503() {
    let app = setup_test_app(false).await;

    let (status, _) = send(app.router, get("/model")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_reload_publishes_model() {
    let app = setup_test_app(false).await;
    write_bundle(&app.state.model_path);

    let (status, body) = send(app.router.clone(), post_empty("/reload")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reloaded"], true);
    assert!(app.state.service.is_ready());

    let (status, readiness) = send(app.router, get("/readyz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(readiness["model_kind"], "gradient_boosting");
}

#[tokio::test]
async fn test_failed_reload_without_model_is_unhealthy() {
    let app = setup_test_app(false).await;

    let (status, _) = send(app.router.clone(), post_empty("/reload")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (status, health) = send(app.router, get("/healthz")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(health["components"]["model"]["status"], "unhealthy");
}

#[tokio::test]
async fn test_failed_reload_keeps_serving_previous_model() {
    let app = setup_test_app(true).await;
    std::fs::write(&app.state.model_path, b"{ not a bundle").unwrap();

    let (status, _) = send(app.router.clone(), post_empty("/reload")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    // Degraded still returns 200
    let (status, health) = send(app.router.clone(), get("/healthz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "degraded");
    assert_eq!(health["components"]["model_store"]["status"], "degraded");

    let (status, _) = send(app.router, post_json("/predict", &query())).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_readyz_returns_503_without_model() {
    let app = setup_test_app(false).await;

    let (status, readiness) = send(app.router, get("/readyz")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(readiness["ready"], false);
}

#[tokio::test]
async fn test_healthz_includes_component_details() {
    let app = setup_test_app(true).await;

    let (status, health) = send(app.router, get("/healthz")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");
    assert!(health["components"]["model"].is_object());
    assert!(health["components"]["model_store"].is_object());
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    let app = setup_test_app(true).await;
    let (status, _) = send(app.router.clone(), post_json("/predict", &query())).await;
    assert_eq!(status, StatusCode::OK);

    let response = app.router.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let metrics_text = String::from_utf8(body.to_vec()).unwrap();

    assert!(metrics_text.contains("price_estimator_prediction_latency_seconds_bucket"));
    assert!(metrics_text.contains("price_estimator_predictions_total"));
    assert!(metrics_text.contains("price_estimator_model_info"));
}
