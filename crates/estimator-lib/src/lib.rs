//! Property price estimation library
//!
//! This crate provides the core functionality for:
//! - Feature engineering with an explicitly owned text vectorizer
//! - Gradient-boosted model training with a random forest fallback
//! - Feature attribution
//! - Checksummed model bundle persistence
//! - Prediction serving, health checks and observability

pub mod data;
pub mod error;
pub mod features;
pub mod health;
pub mod models;
pub mod observability;
pub mod persistence;
pub mod service;
pub mod trainer;

pub use error::{Error, Result};
pub use features::{FeatureConfig, FeatureEngine, FeatureFrame, FeatureSchema};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{EstimatorMetrics, StructuredLogger};
pub use persistence::{BundleMetadata, ModelArtifact, ModelBundle};
pub use service::{Estimator, Explanation, PredictionService};
pub use trainer::{
    AttributionTable, ModelTrainer, ParamGrid, TrainReport, TrainerConfig, TrainingPath,
};
