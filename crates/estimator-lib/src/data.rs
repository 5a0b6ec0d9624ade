//! Training data loading
//!
//! Reads a headed CSV into property records and their prices. The `price`
//! column is required; unknown columns are ignored. Empty numeric cells in a
//! present column read as 0 and empty descriptions as "".

use crate::error::{Error, Result};
use crate::models::{PropertyRecord, RawColumn};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Name of the target column
pub const TARGET_COLUMN: &str = "price";

const DESCRIPTION_COLUMN: &str = "description";

enum Field {
    Raw(RawColumn),
    Description,
    Target,
    Ignored,
}

fn parse_number(cell: &str, row: usize, column: &str) -> Result<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(0.0);
    }
    cell.parse::<f64>().map_err(|_| {
        Error::Data(format!(
            "row {row}: column {column:?} has non-numeric value {cell:?}"
        ))
    })
}

/// Parse CSV records and targets from any reader
pub fn read_training_data<R: Read>(reader: R) -> Result<(Vec<PropertyRecord>, Vec<f64>)> {
    let mut csv = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(reader);

    let headers = csv.headers()?.clone();
    let fields: Vec<Field> = headers
        .iter()
        .map(|name| match name {
            TARGET_COLUMN => Field::Target,
            DESCRIPTION_COLUMN => Field::Description,
            other => RawColumn::from_name(other).map_or_else(
                || {
                    debug!(column = other, "Ignoring unknown column");
                    Field::Ignored
                },
                Field::Raw,
            ),
        })
        .collect();
    if !fields.iter().any(|f| matches!(f, Field::Target)) {
        return Err(Error::Data(format!(
            "CSV must contain a {TARGET_COLUMN:?} column"
        )));
    }

    let mut records = Vec::new();
    let mut targets = Vec::new();
    for (i, row) in csv.records().enumerate() {
        let row = row?;
        // header is line 1
        let line = i + 2;
        let mut record = PropertyRecord::default();
        let mut price = None;
        for ((field, name), cell) in fields.iter().zip(headers.iter()).zip(row.iter()) {
            match field {
                Field::Raw(column) => column.set(&mut record, parse_number(cell, line, name)?),
                Field::Description => record.description = Some(cell.to_string()),
                Field::Target => {
                    if cell.trim().is_empty() {
                        return Err(Error::Data(format!("row {line}: missing price")));
                    }
                    price = Some(parse_number(cell, line, name)?);
                }
                Field::Ignored => {}
            }
        }
        let price = price.ok_or_else(|| Error::Data(format!("row {line}: missing price")))?;
        records.push(record);
        targets.push(price);
    }

    Ok((records, targets))
}

/// Load training records and prices from a CSV file
pub fn load_training_data(path: &Path) -> Result<(Vec<PropertyRecord>, Vec<f64>)> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let (records, targets) = read_training_data(file)?;
    info!(path = %path.display(), rows = records.len(), "Loaded training data");
    Ok((records, targets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_reads_known_columns() {
        let csv = "area,bedrooms,bathrooms,year_built,lat,lon,description,price\n\
                   1000,2,1,2010,12.97,77.59,Cosy flat,100000\n\
                   1500,3,2,2015,12.98,77.60,\"Villa, with pool\",150000\n";
        let (records, y) = read_training_data(csv.as_bytes()).unwrap();
        assert_eq!(y, vec![100000.0, 150000.0]);
        assert_eq!(records[0].area, Some(1000.0));
        assert_eq!(records[1].lon, Some(77.60));
        assert_eq!(records[1].description.as_deref(), Some("Villa, with pool"));
    }

    #[test]
    fn test_missing_price_column() {
        let csv = "area,bedrooms\n1000,2\n";
        assert!(matches!(read_training_data(csv.as_bytes()), Err(Error::Data(_))));
    }

    #[test]
    fn test_empty_cells_and_unknown_columns() {
        let csv = "area,garage,description,price\n,yes,,90000\n800,no,Small,80000\n";
        let (records, y) = read_training_data(csv.as_bytes()).unwrap();
        assert_eq!(records[0].area, Some(0.0));
        assert_eq!(records[0].description.as_deref(), Some(""));
        assert!(records[0].bedrooms.is_none());
        assert_eq!(y.len(), 2);
    }

    #[test]
    fn test_bad_values_are_data_errors() {
        let non_numeric = "area,price\nbig,100\n";
        assert!(matches!(
            read_training_data(non_numeric.as_bytes()),
            Err(Error::Data(_))
        ));
        let no_price = "area,price\n100,\n";
        assert!(matches!(
            read_training_data(no_price.as_bytes()),
            Err(Error::Data(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "area,price").unwrap();
        writeln!(file, "1200,120000").unwrap();
        let (records, y) = load_training_data(file.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(y, vec![120000.0]);

        assert!(matches!(
            load_training_data(Path::new("/nonexistent/train.csv")),
            Err(Error::Io { .. })
        ));
    }
}
