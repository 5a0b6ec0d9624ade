//! Feature engineering pipeline
//!
//! Turns a batch of [`PropertyRecord`]s into a fixed-schema numeric
//! [`FeatureFrame`]. Basic and geospatial derivations are stateless; text
//! vectorization needs a [`VectorizerState`] that is fitted once and then
//! reused by every later transform.
//!
//! The state is owned by the [`FeatureEngine`] that fitted it (or that was
//! restored from a model bundle). `fit_transform` takes `&mut self` and is the
//! only writer; `transform` takes `&self` and can run concurrently.

mod basic;
mod frame;
mod geo;
mod schema;
mod sentiment;
mod text;
mod vectorizer;


pub use basic::{
    LARGE_PROPERTY_MIN_AREA, NEW_PROPERTY_MAX_AGE, OLD_PROPERTY_MIN_AGE, SMALL_PROPERTY_MAX_AREA,
};
pub use frame::FeatureFrame;
pub use geo::{haversine_km, CENTRAL_MAX_KM, EARTH_RADIUS_KM, SUBURBAN_MIN_KM};
pub use schema::{tfidf_column, FeatureSchema, InputPresence, TFIDF_PREFIX};
pub use sentiment::SentimentAnalyzer;
pub use text::{
    keyword_hits, TextStats, CONDITION_KEYWORDS, LOCATION_KEYWORDS, LUXURY_KEYWORDS,
    NEGATIVE_SENTIMENT, POSITIVE_SENTIMENT,
};
pub use vectorizer::{tokenize, TfidfVectorizer, VectorizerState, DEFAULT_MAX_FEATURES};

use crate::error::{Error, Result};
use crate::models::PropertyRecord;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Year used to compute property age
pub const DEFAULT_REFERENCE_YEAR: f64 = 2025.0;

/// City-centre reference coordinate (Bengaluru)
pub const DEFAULT_REFERENCE_POINT: (f64, f64) = (12.9716, 77.5946);

/// Constants the derivations depend on
///
/// Persisted with the model so inference uses the values training used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    #[serde(default = "default_reference_year")]
    pub reference_year: f64,
    #[serde(default = "default_reference_lat")]
    pub reference_lat: f64,
    #[serde(default = "default_reference_lon")]
    pub reference_lon: f64,
    #[serde(default = "default_max_text_features")]
    pub max_text_features: usize,
}

fn default_reference_year() -> f64 {
    DEFAULT_REFERENCE_YEAR
}

fn default_reference_lat() -> f64 {
    DEFAULT_REFERENCE_POINT.0
}

fn default_reference_lon() -> f64 {
    DEFAULT_REFERENCE_POINT.1
}

fn default_max_text_features() -> usize {
    DEFAULT_MAX_FEATURES
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            reference_year: default_reference_year(),
            reference_lat: default_reference_lat(),
            reference_lon: default_reference_lon(),
            max_text_features: default_max_text_features(),
        }
    }
}

/// Feature engineering with an owned, explicitly threaded vectorizer state
#[derive(Debug, Clone, Default)]
pub struct FeatureEngine {
    config: FeatureConfig,
    sentiment: SentimentAnalyzer,
    vectorizer: Option<Arc<VectorizerState>>,
}

impl FeatureEngine {
    pub fn new(config: FeatureConfig) -> Self {
        Self {
            config,
            sentiment: SentimentAnalyzer::new(),
            vectorizer: None,
        }
    }

    /// Attach a previously fitted vectorizer
    pub fn with_vectorizer(mut self, state: Arc<VectorizerState>) -> Self {
        self.vectorizer = Some(state);
        self
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    pub fn vectorizer(&self) -> Option<&Arc<VectorizerState>> {
        self.vectorizer.as_ref()
    }

    /// Build a frame, fitting the text vectorizer first when `fit_text_model` is set
    pub fn build(&mut self, batch: &[PropertyRecord], fit_text_model: bool) -> Result<FeatureFrame> {
        if fit_text_model {
            self.fit_transform(batch)
        } else {
            self.transform(batch)
        }
    }

    /// Fit a new vectorizer on the batch's descriptions and build its frame
    ///
    /// The new state replaces the old one only after the frame was built. A
    /// batch without descriptions clears the state.
    pub fn fit_transform(&mut self, batch: &[PropertyRecord]) -> Result<FeatureFrame> {
        let presence = InputPresence::of(batch);
        let state = if presence.description {
            let docs = descriptions(batch);
            let state = TfidfVectorizer::new(self.config.max_text_features).fit(&docs);
            if state.width() == 0 {
                warn!(documents = docs.len(), "Fitted text vectorizer has an empty vocabulary");
            } else {
                info!(
                    documents = docs.len(),
                    vocabulary = state.width(),
                    "Fitted text vectorizer"
                );
            }
            Some(Arc::new(state))
        } else {
            None
        };

        let frame = self.derive(batch, &presence, state.as_deref())?;
        self.vectorizer = state;
        Ok(frame)
    }

    /// Build a frame with the stored vectorizer, never modifying it
    pub fn transform(&self, batch: &[PropertyRecord]) -> Result<FeatureFrame> {
        let presence = InputPresence::of(batch);
        if presence.description && self.vectorizer.is_none() {
            return Err(Error::NotFitted);
        }
        self.derive(batch, &presence, self.vectorizer.as_deref())
    }

    fn derive(
        &self,
        batch: &[PropertyRecord],
        presence: &InputPresence,
        text_state: Option<&VectorizerState>,
    ) -> Result<FeatureFrame> {
        let mut frame = FeatureFrame::new(batch.len());

        basic::add_raw_columns(&mut frame, batch, presence, &self.config);
        basic::add_basic_features(&mut frame, batch, presence, &self.config);
        if presence.has_location() {
            geo::add_geo_features(&mut frame, batch, &self.config);
        }

        let mut tfidf_width = 0;
        if presence.description {
            let docs = descriptions(batch);
            text::add_text_features(&mut frame, &docs, &self.sentiment);
            if let Some(state) = text_state {
                tfidf_width = state.width();
                let matrix = state.transform(&docs);
                for col in 0..tfidf_width {
                    frame.push_column(tfidf_column(col), matrix.iter().map(|row| row[col]).collect());
                }
            }
        }

        let declared = FeatureSchema::declare(presence, tfidf_width);
        if frame.columns() != declared.names() {
            return Err(Error::schema_mismatch(declared.names(), frame.columns()));
        }

        frame.fill_non_finite();
        debug!(rows = frame.n_rows(), columns = frame.n_cols(), "Built feature frame");
        Ok(frame)
    }
}

fn descriptions(batch: &[PropertyRecord]) -> Vec<&str> {
    batch
        .iter()
        .map(|r| r.description.as_deref().unwrap_or(""))
        .collect()
}
