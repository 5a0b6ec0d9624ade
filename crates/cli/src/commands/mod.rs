//! CLI subcommand implementations

pub mod inspect;
pub mod predict;
pub mod query;
pub mod train;

use anyhow::{Context, Result};
use estimator_lib::PropertyRecord;

/// Parse a record from inline JSON, or from a file when prefixed with `@`
pub(crate) fn parse_record(input: &str) -> Result<PropertyRecord> {
    let json = match input.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file {}", path))?,
        None => input.to_string(),
    };
    serde_json::from_str(&json).context("Input is not a valid property record")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_inline_record() {
        let record = parse_record(r#"{"area": 1200, "bedrooms": 2, "description": "flat"}"#).unwrap();
        assert_eq!(record.area, Some(1200.0));
        assert_eq!(record.bedrooms, Some(2.0));
        assert!(record.lat.is_none());
        assert_eq!(record.description.as_deref(), Some("flat"));
    }

    #[test]
    fn test_parse_record_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"area": 900, "year_built": 2001}}"#).unwrap();
        let arg = format!("@{}", file.path().display());

        let record = parse_record(&arg).unwrap();
        assert_eq!(record.year_built, Some(2001.0));
    }

    #[test]
    fn test_parse_rejects_bad_json() {
        assert!(parse_record("{area: 1}").is_err());
        assert!(parse_record(r#"{"area": "big"}"#).is_err());
    }
}
