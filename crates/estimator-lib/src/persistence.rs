//! Model bundle persistence
//!
//! A bundle is one JSON document: an envelope carrying the format version,
//! creation time and a SHA-256 checksum, wrapping the model, the fitted
//! vectorizer and the attribution table. Writes go to a temp file that is
//! synced and then renamed over the target, so readers never observe a
//! partial bundle.

use crate::error::{Error, Result};
use crate::features::{FeatureConfig, VectorizerState};
use crate::trainer::{AttributionTable, Regressor, TrainReport, TrainedModel, TrainingPath};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Current on-disk format
pub const FORMAT_VERSION: u32 = 1;

/// Held-out evaluation recorded at training time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub rmse: f64,
    /// Absent when the validation split was too small for R²
    pub r2: Option<f64>,
    pub n_train: usize,
    pub n_validation: usize,
}

/// A trained model together with the schema it expects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub regressor: TrainedModel,
    pub path: TrainingPath,
    /// Training columns, in order
    pub feature_names: Vec<String>,
    pub feature_config: FeatureConfig,
    pub validation: ValidationSummary,
}

impl ModelArtifact {
    pub fn from_report(report: &TrainReport, feature_config: &FeatureConfig) -> Self {
        Self {
            regressor: report.model.clone(),
            path: report.path.clone(),
            feature_names: report.feature_names.clone(),
            feature_config: feature_config.clone(),
            validation: ValidationSummary {
                rmse: report.rmse,
                r2: report.r2.is_finite().then_some(report.r2),
                n_train: report.n_train,
                n_validation: report.n_validation,
            },
        }
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        self.regressor.predict_row(row)
    }
}

/// Everything needed to serve predictions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBundle {
    pub model: ModelArtifact,
    pub vectorizer: Option<VectorizerState>,
    pub attribution: Option<AttributionTable>,
}

/// Borrowed mirror of [`ModelBundle`]; serializes to identical bytes
#[derive(Serialize)]
struct BundleRef<'a> {
    model: &'a ModelArtifact,
    vectorizer: Option<&'a VectorizerState>,
    attribution: Option<&'a AttributionTable>,
}

/// Envelope fields other than the bundle itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleMetadata {
    pub format_version: u32,
    pub created_at: DateTime<Utc>,
    pub checksum: String,
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    format_version: u32,
    created_at: DateTime<Utc>,
    checksum: &'a str,
    bundle: BundleRef<'a>,
}

#[derive(Deserialize)]
struct Envelope {
    format_version: u32,
    created_at: DateTime<Utc>,
    checksum: String,
    bundle: ModelBundle,
}

#[derive(Deserialize)]
struct EnvelopeHeader {
    format_version: u32,
}

fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Write a bundle atomically to `path`
pub fn save(
    model: &ModelArtifact,
    vectorizer: Option<&VectorizerState>,
    attribution: Option<&AttributionTable>,
    path: &Path,
) -> Result<BundleMetadata> {
    let bundle = BundleRef {
        model,
        vectorizer,
        attribution,
    };
    let metadata = BundleMetadata {
        format_version: FORMAT_VERSION,
        created_at: Utc::now(),
        checksum: compute_checksum(&serde_json::to_vec(&bundle)?),
    };
    let bytes = serde_json::to_vec(&EnvelopeRef {
        format_version: metadata.format_version,
        created_at: metadata.created_at,
        checksum: &metadata.checksum,
        bundle,
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    // Write to temp file first
    let temp_path = path.with_extension("tmp");
    let mut file = File::create(&temp_path).map_err(|e| Error::io(&temp_path, e))?;
    file.write_all(&bytes).map_err(|e| Error::io(&temp_path, e))?;
    file.sync_all().map_err(|e| Error::io(&temp_path, e))?;
    fs::rename(&temp_path, path).map_err(|e| Error::io(path, e))?;

    info!(
        path = %path.display(),
        checksum = %metadata.checksum,
        size_bytes = bytes.len(),
        "Model bundle saved"
    );
    Ok(metadata)
}

/// Save the outputs of a training run
pub fn save_report(
    report: &TrainReport,
    feature_config: &FeatureConfig,
    vectorizer: Option<&VectorizerState>,
    path: &Path,
) -> Result<BundleMetadata> {
    let artifact = ModelArtifact::from_report(report, feature_config);
    save(&artifact, vectorizer, report.attribution.as_ref(), path)
}

/// Read and verify a bundle, returning its envelope metadata too
pub fn load_with_metadata(path: &Path) -> Result<(BundleMetadata, ModelBundle)> {
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;

    let header: EnvelopeHeader = serde_json::from_slice(&bytes)?;
    if header.format_version != FORMAT_VERSION {
        return Err(Error::UnsupportedFormat {
            found: header.format_version,
            expected: FORMAT_VERSION,
        });
    }

    let envelope: Envelope = serde_json::from_slice(&bytes)?;
    let computed = compute_checksum(&serde_json::to_vec(&envelope.bundle)?);
    if computed != envelope.checksum {
        return Err(Error::ChecksumMismatch {
            expected: envelope.checksum,
            computed,
        });
    }

    debug!(path = %path.display(), checksum = %computed, "Model bundle checksum validated");
    let metadata = BundleMetadata {
        format_version: envelope.format_version,
        created_at: envelope.created_at,
        checksum: computed,
    };
    Ok((metadata, envelope.bundle))
}

pub fn load(path: &Path) -> Result<ModelBundle> {
    load_with_metadata(path).map(|(_, bundle)| bundle)
}
