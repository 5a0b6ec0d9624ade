//! Price a record with a running server

use anyhow::Result;
use colored::Colorize;

use super::parse_record;
use crate::client::ApiClient;
use crate::output::{format_price, print_json, OutputFormat};

pub async fn run(client: &ApiClient, input: &str, format: OutputFormat) -> Result<()> {
    let record = parse_record(input)?;
    let response = client.predict(&record).await?;

    match format {
        OutputFormat::Json => print_json(&response)?,
        OutputFormat::Table => println!(
            "Estimated price: {}",
            format_price(response.prediction).green().bold()
        ),
    }
    Ok(())
}
