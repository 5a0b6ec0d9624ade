//! Price a record locally from a saved bundle

use anyhow::{Context, Result};
use colored::Colorize;
use estimator_lib::Estimator;
use serde_json::json;
use std::path::Path;
use tabled::Tabled;

use super::parse_record;
use crate::output::{format_price, print_heading, print_json, print_rows, OutputFormat};

/// Row for the contribution breakdown
#[derive(Tabled)]
struct ContributionRow {
    #[tabled(rename = "Feature")]
    feature: String,
    #[tabled(rename = "Contribution")]
    contribution: String,
}

pub fn run(model: &Path, input: &str, explain: bool, format: OutputFormat) -> Result<()> {
    let record = parse_record(input)?;
    let estimator = Estimator::load(model)
        .with_context(|| format!("Failed to load model from {}", model.display()))?;

    if !explain {
        let prediction = estimator.predict(&record).context("Prediction failed")?;
        match format {
            OutputFormat::Json => print_json(&json!({ "prediction": prediction }))?,
            OutputFormat::Table => {
                println!("Estimated price: {}", format_price(prediction).green().bold())
            }
        }
        return Ok(());
    }

    let explanation = estimator.explain(&record).context("Prediction failed")?;
    match format {
        OutputFormat::Json => print_json(&explanation)?,
        OutputFormat::Table => {
            print_heading("Price Breakdown");
            println!(
                "Estimated price:        {}",
                format_price(explanation.prediction).green().bold()
            );
            println!("Baseline:               {}", format_price(explanation.bias));
            println!();

            let rows: Vec<ContributionRow> = explanation
                .contributions
                .iter()
                // zero rows come from unused features
                .filter(|(_, c)| *c != 0.0)
                .map(|(feature, c)| ContributionRow {
                    feature: feature.clone(),
                    contribution: if *c >= 0.0 {
                        format!("+{}", format_price(*c)).green().to_string()
                    } else {
                        format_price(*c).red().to_string()
                    },
                })
                .collect();
            print_rows(rows);
        }
    }

    Ok(())
}
