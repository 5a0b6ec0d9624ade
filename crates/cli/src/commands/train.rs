//! Train a model from a CSV file and save the bundle

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use estimator_lib::data::load_training_data;
use estimator_lib::trainer::FeatureImportance;
use estimator_lib::{
    persistence, FeatureEngine, ModelTrainer, ParamGrid, StructuredLogger, TrainerConfig,
    TrainingPath,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::output::{
    color_path, format_metric, format_price, print_heading, print_importances, print_json,
    print_success, print_warning, OutputFormat,
};

/// Hyperparameter grid searched on the primary path
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum GridChoice {
    /// Two values per axis
    Default,
    /// Three values per axis; much slower
    Exhaustive,
}

impl GridChoice {
    fn grid(self) -> ParamGrid {
        match self {
            GridChoice::Default => ParamGrid::default(),
            GridChoice::Exhaustive => ParamGrid::exhaustive(),
        }
    }
}

#[derive(Debug, Serialize)]
struct TrainSummary {
    model_output: PathBuf,
    checksum: String,
    kind: &'static str,
    path: TrainingPath,
    n_features: usize,
    n_train: usize,
    n_validation: usize,
    rmse: f64,
    r2: Option<f64>,
    top_features: Vec<FeatureImportance>,
}

pub fn run(
    data: &Path,
    model_output: &Path,
    grid: GridChoice,
    seed: Option<u64>,
    format: OutputFormat,
) -> Result<()> {
    let (records, prices) = load_training_data(data)
        .with_context(|| format!("Failed to load training data from {}", data.display()))?;

    let mut engine = FeatureEngine::default();
    let frame = engine
        .build(&records, true)
        .context("Feature engineering failed")?;

    let mut config = TrainerConfig {
        grid: grid.grid(),
        ..TrainerConfig::default()
    };
    if let Some(seed) = seed {
        config.seed = seed;
        config.forest.seed = seed;
    }
    let report = ModelTrainer::new(config)
        .train(&frame, &prices)
        .context("Training failed")?;

    let metadata = persistence::save_report(
        &report,
        engine.config(),
        engine.vectorizer().map(Arc::as_ref),
        model_output,
    )
    .with_context(|| format!("Failed to save model to {}", model_output.display()))?;

    StructuredLogger::new("pricer").log_training_complete(
        report.model.kind(),
        report.path.is_fallback(),
        report.rmse,
        report.r2,
    );

    let summary = TrainSummary {
        model_output: model_output.to_path_buf(),
        checksum: metadata.checksum,
        kind: report.model.kind(),
        path: report.path.clone(),
        n_features: report.feature_names.len(),
        n_train: report.n_train,
        n_validation: report.n_validation,
        rmse: report.rmse,
        r2: report.r2.is_finite().then_some(report.r2),
        top_features: report
            .attribution
            .as_ref()
            .map(|a| a.top(10).to_vec())
            .unwrap_or_default(),
    };

    match format {
        OutputFormat::Json => print_json(&summary)?,
        OutputFormat::Table => print_summary(&summary),
    }

    Ok(())
}

fn print_summary(summary: &TrainSummary) {
    print_heading("Training Summary");
    println!("Model:                  {}", summary.kind.cyan());
    println!("Path:                   {}", color_path(&summary.path));
    println!("Features:               {}", summary.n_features);
    println!(
        "Rows (train/val):       {}/{}",
        summary.n_train, summary.n_validation
    );
    println!("Validation RMSE:        {}", format_price(summary.rmse));
    println!("Validation R²:          {}", format_metric(summary.r2));
    println!();

    if summary.top_features.is_empty() {
        print_warning("Feature attribution unavailable");
    } else {
        println!("{}", "Top Features".bold());
        println!("{}", "-".repeat(50));
        print_importances(&summary.top_features);
    }
    println!();

    if summary.path.is_fallback() {
        print_warning("Trained on the fallback path; see the reason above");
    }
    print_success(&format!(
        "Model saved to {} (sha256 {})",
        summary.model_output.display(),
        &summary.checksum[..12.min(summary.checksum.len())]
    ));
}
