//! Property price estimator CLI
//!
//! Trains models from CSV data, prices records locally from a saved bundle,
//! inspects bundles, and queries a running estimator server.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{inspect, predict, query, train};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Property price estimator CLI
#[derive(Parser)]
#[command(name = "pricer")]
#[command(author, version, about = "CLI for the property price estimator", long_about = None)]
pub struct Cli {
    /// Server URL for `query` (can also be set via PRICER_API_URL env var)
    #[arg(long, env = "PRICER_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table", global = true)]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train a model from a CSV file and save the bundle
    Train {
        /// Training CSV with a `price` column
        #[arg(long)]
        data: PathBuf,

        /// Where to write the model bundle
        #[arg(long)]
        model_output: PathBuf,

        /// Hyperparameter grid to search
        #[arg(long, value_enum, default_value = "default")]
        grid: train::GridChoice,

        /// Seed for the validation split, boosting and forest sampling
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Price one record with a saved bundle
    Predict {
        /// Model bundle (defaults to model_path from the config file)
        #[arg(long)]
        model: Option<PathBuf>,

        /// Property record as JSON, or @file to read it from a file
        #[arg(long)]
        input_json: String,

        /// Break the price down into per-feature contributions
        #[arg(long)]
        explain: bool,
    },

    /// Show the contents of a saved bundle
    Inspect {
        /// Model bundle (defaults to model_path from the config file)
        #[arg(long)]
        model: Option<PathBuf>,

        /// Number of attributed features to list
        #[arg(long, default_value_t = 10)]
        top: usize,
    },

    /// Price one record with a running server
    Query {
        /// Property record as JSON, or @file to read it from a file
        #[arg(long)]
        input_json: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let user_config = config::Config::load()?;
    debug!(?user_config, "Loaded user config");

    match cli.command {
        Commands::Train {
            data,
            model_output,
            grid,
            seed,
        } => {
            // training is CPU-bound
            tokio::task::spawn_blocking(move || {
                train::run(&data, &model_output, grid, seed, cli.format)
            })
            .await??;
        }
        Commands::Predict {
            model,
            input_json,
            explain,
        } => {
            let model = user_config.model_path(model)?;
            predict::run(&model, &input_json, explain, cli.format)?;
        }
        Commands::Inspect { model, top } => {
            let model = user_config.model_path(model)?;
            inspect::run(&model, top, cli.format)?;
        }
        Commands::Query { input_json } => {
            let api_url = cli
                .api_url
                .or(user_config.api_url)
                .unwrap_or_else(|| DEFAULT_API_URL.to_string());
            let client = client::ApiClient::new(&api_url)?;
            query::run(&client, &input_json, cli.format).await?;
        }
    }

    Ok(())
}
