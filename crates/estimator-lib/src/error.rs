//! Error taxonomy for the estimator core
//!
//! Caller-visible failures live in [`Error`]. Search and attribution
//! failures are recovered inside the trainer and never surface here.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal, caller-visible errors
#[derive(Debug, Error)]
pub enum Error {
    /// Training data is unusable (missing target, too few samples, shape mismatch)
    #[error("data error: {0}")]
    Data(String),

    /// Text features were requested in transform mode with no fitted vectorizer
    #[error("text vectorizer has not been fitted; fit on a training batch or load a model bundle first")]
    NotFitted,

    /// Inference-time columns disagree with the schema the model was trained on
    #[error("feature schema mismatch: missing {missing:?}, unexpected {extra:?}")]
    SchemaMismatch {
        missing: Vec<String>,
        extra: Vec<String>,
    },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("bundle checksum mismatch: expected {expected}, computed {computed}")]
    ChecksumMismatch { expected: String, computed: String },

    #[error("unsupported bundle format version {found} (expected {expected})")]
    UnsupportedFormat { found: u32, expected: u32 },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Build a schema mismatch from the expected and produced column lists
    pub fn schema_mismatch(expected: &[String], produced: &[String]) -> Self {
        let missing = expected
            .iter()
            .filter(|name| !produced.contains(name))
            .cloned()
            .collect();
        let extra = produced
            .iter()
            .filter(|name| !expected.contains(name))
            .cloned()
            .collect();
        Error::SchemaMismatch { missing, extra }
    }

    /// True for errors caused by the request rather than the service state
    ///
    /// `NotFitted` counts as a request error when serving: the record carries
    /// a description but the model was trained without text features.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::SchemaMismatch { .. } | Error::Data(_) | Error::NotFitted
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_mismatch_lists_both_sides() {
        let expected = vec!["area".to_string(), "sentiment".to_string()];
        let produced = vec!["area".to_string(), "lat".to_string()];
        match Error::schema_mismatch(&expected, &produced) {
            Error::SchemaMismatch { missing, extra } => {
                assert_eq!(missing, vec!["sentiment".to_string()]);
                assert_eq!(extra, vec!["lat".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_schema_mismatch_same_set_reordered() {
        let expected = vec!["a".to_string(), "b".to_string()];
        let produced = vec!["b".to_string(), "a".to_string()];
        match Error::schema_mismatch(&expected, &produced) {
            Error::SchemaMismatch { missing, extra } => {
                assert!(missing.is_empty());
                assert!(extra.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
