//! Health check infrastructure for the price estimator
//!
//! Tracks the health of the published model and the bundle it is reloaded
//! from. The server is ready only once a model has been published.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Health status of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    /// Component is functioning normally
    Healthy,
    /// Operational but serving stale or partial state
    Degraded,
    /// Component cannot serve
    Unhealthy,
}

impl ComponentStatus {
    /// Returns true if predictions can still be served
    pub fn is_operational(&self) -> bool {
        *self != ComponentStatus::Unhealthy
    }
}

/// Health of one component at its last status change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_check_timestamp: i64,
}

impl ComponentHealth {
    fn with_status(status: ComponentStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            last_check_timestamp: Utc::now().timestamp(),
        }
    }

    /// Healthy with no message
    pub fn healthy() -> Self {
        Self::with_status(ComponentStatus::Healthy, None)
    }

    /// Degraded with the cause
    pub fn degraded(message: impl Into<String>) -> Self {
        Self::with_status(ComponentStatus::Degraded, Some(message.into()))
    }

    /// Unhealthy with the cause
    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self::with_status(ComponentStatus::Unhealthy, Some(message.into()))
    }
}

/// Overall health response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: HashMap<String, ComponentHealth>,
}

impl HealthResponse {
    /// Worst status among the components; healthy when there are none
    pub fn compute_status(components: &HashMap<String, ComponentHealth>) -> ComponentStatus {
        components
            .values()
            .map(|h| h.status)
            .max()
            .unwrap_or(ComponentStatus::Healthy)
    }
}

/// Readiness response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Kind of the model currently serving, once one is published
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

/// Component names for health tracking
pub mod components {
    /// The published estimator
    pub const MODEL: &str = "model";
    /// The bundle file the model is reloaded from
    pub const MODEL_STORE: &str = "model_store";
}

/// The model most recently published to the prediction service
#[derive(Debug, Clone)]
struct Publication {
    kind: String,
    at: DateTime<Utc>,
}

/// Health registry for the model and its store
#[derive(Debug, Clone)]
pub struct HealthRegistry {
    components: Arc<RwLock<HashMap<String, ComponentHealth>>>,
    publication: Arc<RwLock<Option<Publication>>>,
}

impl Default for HealthRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthRegistry {
    /// Empty registry; not ready until [`HealthRegistry::record_publish`]
    pub fn new() -> Self {
        Self {
            components: Arc::new(RwLock::new(HashMap::new())),
            publication: Arc::new(RwLock::new(None)),
        }
    }

    /// Register a component with initial healthy status
    pub async fn register(&self, name: &str) {
        self.update(name, ComponentHealth::healthy()).await;
    }

    /// Replace a component's health
    pub async fn update(&self, name: &str, health: ComponentHealth) {
        self.components
            .write()
            .await
            .insert(name.to_string(), health);
    }

    /// Mark component as healthy
    pub async fn set_healthy(&self, name: &str) {
        self.update(name, ComponentHealth::healthy()).await;
    }

    /// Mark component as degraded
    pub async fn set_degraded(&self, name: &str, message: impl Into<String>) {
        self.update(name, ComponentHealth::degraded(message)).await;
    }

    /// Mark component as unhealthy
    pub async fn set_unhealthy(&self, name: &str, message: impl Into<String>) {
        self.update(name, ComponentHealth::unhealthy(message)).await;
    }

    /// Record that a model of `kind` is now serving
    ///
    /// Both the model and its store become healthy and the registry turns
    /// ready.
    pub async fn record_publish(&self, kind: &str) {
        self.set_healthy(components::MODEL).await;
        self.set_healthy(components::MODEL_STORE).await;
        *self.publication.write().await = Some(Publication {
            kind: kind.to_string(),
            at: Utc::now(),
        });
    }

    /// Record a failed load of the bundle and return the resulting status
    ///
    /// With a model already serving only the store degrades. Without one the
    /// model itself is unhealthy.
    pub async fn record_reload_failure(&self, detail: &str) -> ComponentStatus {
        if self.publication.read().await.is_some() {
            self.set_degraded(components::MODEL_STORE, format!("Last reload failed: {detail}"))
                .await;
            ComponentStatus::Degraded
        } else {
            self.set_unhealthy(components::MODEL, format!("No model loaded: {detail}"))
                .await;
            ComponentStatus::Unhealthy
        }
    }

    /// Get health response
    pub async fn health(&self) -> HealthResponse {
        let components = self.components.read().await.clone();
        let status = HealthResponse::compute_status(&components);
        HealthResponse { status, components }
    }

    /// Get readiness response
    pub async fn readiness(&self) -> ReadinessResponse {
        let publication = self.publication.read().await.clone();
        let status = self.health().await.status;

        let reason = match (&publication, status) {
            (None, _) => Some("No model has been published yet".to_string()),
            (Some(_), ComponentStatus::Unhealthy) => {
                Some("Critical component unhealthy".to_string())
            }
            (Some(_), _) => None,
        };
        ReadinessResponse {
            ready: reason.is_none(),
            reason,
            model_kind: publication.as_ref().map(|p| p.kind.clone()),
            published_at: publication.map(|p| p.at),
        }
    }
}
