//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use estimator_lib::trainer::FeatureImportance;
use estimator_lib::TrainingPath;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Row for feature attribution tables
#[derive(Tabled)]
struct ImportanceRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Feature")]
    feature: String,
    #[tabled(rename = "Mean |contribution|")]
    importance: String,
}

/// Pretty-print any serializable value as JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a rounded table from a list of rows
pub fn print_rows<T: Tabled>(rows: Vec<T>) {
    if rows.is_empty() {
        println!("{}", "No items found".yellow());
        return;
    }
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print a ranked attribution table
pub fn print_importances(entries: &[FeatureImportance]) {
    let rows: Vec<ImportanceRow> = entries
        .iter()
        .enumerate()
        .map(|(i, e)| ImportanceRow {
            rank: i + 1,
            feature: e.feature.clone(),
            importance: format_price(e.importance),
        })
        .collect();
    print_rows(rows);
}

/// Print a section heading
pub fn print_heading(title: &str) {
    println!("{}", title.bold());
    println!("{}", "=".repeat(50));
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Format a price with thousands separators and two decimals
pub fn format_price(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let formatted = format!("{:.2}", value.abs());
    let (whole, frac) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{frac}")
}

/// Format an optional metric, "n/a" when absent or non-finite
pub fn format_metric(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.4}", v),
        _ => "n/a".to_string(),
    }
}

/// Describe a training path, colored by outcome
pub fn color_path(path: &TrainingPath) -> String {
    match path {
        TrainingPath::Primary { params, cv_rmse } => format!(
            "{} ({}, cv rmse {})",
            "primary".green(),
            params,
            format_price(*cv_rmse)
        ),
        TrainingPath::Fallback { reason } => {
            format!("{} ({})", "fallback".yellow(), reason)
        }
    }
}
