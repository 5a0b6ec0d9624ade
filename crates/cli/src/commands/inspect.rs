//! Show what a saved bundle contains

use anyhow::{Context, Result};
use colored::Colorize;
use estimator_lib::persistence::{self, BundleMetadata, ValidationSummary};
use estimator_lib::trainer::FeatureImportance;
use estimator_lib::TrainingPath;
use serde::Serialize;
use std::path::Path;

use crate::output::{
    color_path, format_metric, format_price, print_heading, print_importances, print_json,
    print_warning, OutputFormat,
};

#[derive(Debug, Serialize)]
struct BundleSummary {
    metadata: BundleMetadata,
    kind: &'static str,
    path: TrainingPath,
    feature_names: Vec<String>,
    vocabulary_size: Option<usize>,
    validation: ValidationSummary,
    top_features: Vec<FeatureImportance>,
}

pub fn run(model: &Path, top: usize, format: OutputFormat) -> Result<()> {
    let (metadata, bundle) = persistence::load_with_metadata(model)
        .with_context(|| format!("Failed to load model from {}", model.display()))?;

    let summary = BundleSummary {
        metadata,
        kind: bundle.model.regressor.kind(),
        path: bundle.model.path.clone(),
        feature_names: bundle.model.feature_names.clone(),
        vocabulary_size: bundle.vectorizer.as_ref().map(|v| v.vocabulary().len()),
        validation: bundle.model.validation.clone(),
        top_features: bundle
            .attribution
            .as_ref()
            .map(|a| a.top(top).to_vec())
            .unwrap_or_default(),
    };

    match format {
        OutputFormat::Json => print_json(&summary)?,
        OutputFormat::Table => print_summary(&summary),
    }
    Ok(())
}

fn print_summary(summary: &BundleSummary) {
    let age = chrono::Utc::now() - summary.metadata.created_at;

    print_heading("Model Bundle");
    println!("Format version:         {}", summary.metadata.format_version);
    println!(
        "Created:                {} ({} days ago)",
        summary.metadata.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
        age.num_days()
    );
    println!("Checksum:               {}", summary.metadata.checksum.dimmed());
    println!();

    println!("{}", "Model".bold());
    println!("{}", "-".repeat(50));
    println!("Kind:                   {}", summary.kind.cyan());
    println!("Path:                   {}", color_path(&summary.path));
    println!("Features:               {}", summary.feature_names.len());
    match summary.vocabulary_size {
        Some(n) => println!("Text vocabulary:        {} terms", n),
        None => println!("Text vocabulary:        {}", "none".dimmed()),
    }
    println!(
        "Validation:             rmse {}, r² {} ({} train / {} held out)",
        format_price(summary.validation.rmse),
        format_metric(summary.validation.r2),
        summary.validation.n_train,
        summary.validation.n_validation
    );
    println!();

    if summary.top_features.is_empty() {
        print_warning("Bundle has no feature attribution");
    } else {
        println!("{}", "Top Features".bold());
        println!("{}", "-".repeat(50));
        print_importances(&summary.top_features);
    }
}
