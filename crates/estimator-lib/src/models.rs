//! Core data models for the price estimator

use serde::{Deserialize, Serialize};

/// Raw property attributes as received from a caller or a training row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_built: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PropertyRecord {
    pub fn with_area(mut self, area: f64) -> Self {
        self.area = Some(area);
        self
    }

    pub fn with_rooms(mut self, bedrooms: f64, bathrooms: f64) -> Self {
        self.bedrooms = Some(bedrooms);
        self.bathrooms = Some(bathrooms);
        self
    }

    pub fn with_year_built(mut self, year: f64) -> Self {
        self.year_built = Some(year);
        self
    }

    pub fn with_location(mut self, lat: f64, lon: f64) -> Self {
        self.lat = Some(lat);
        self.lon = Some(lon);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Raw numeric input columns, in canonical frame order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawColumn {
    Area,
    Bedrooms,
    Bathrooms,
    YearBuilt,
    Lat,
    Lon,
}

impl RawColumn {
    pub const ALL: [RawColumn; 6] = [
        RawColumn::Area,
        RawColumn::Bedrooms,
        RawColumn::Bathrooms,
        RawColumn::YearBuilt,
        RawColumn::Lat,
        RawColumn::Lon,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RawColumn::Area => "area",
            RawColumn::Bedrooms => "bedrooms",
            RawColumn::Bathrooms => "bathrooms",
            RawColumn::YearBuilt => "year_built",
            RawColumn::Lat => "lat",
            RawColumn::Lon => "lon",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    pub fn get(self, record: &PropertyRecord) -> Option<f64> {
        match self {
            RawColumn::Area => record.area,
            RawColumn::Bedrooms => record.bedrooms,
            RawColumn::Bathrooms => record.bathrooms,
            RawColumn::YearBuilt => record.year_built,
            RawColumn::Lat => record.lat,
            RawColumn::Lon => record.lon,
        }
    }

    pub fn set(self, record: &mut PropertyRecord, value: f64) {
        let slot = match self {
            RawColumn::Area => &mut record.area,
            RawColumn::Bedrooms => &mut record.bedrooms,
            RawColumn::Bathrooms => &mut record.bathrooms,
            RawColumn::YearBuilt => &mut record.year_built,
            RawColumn::Lat => &mut record.lat,
            RawColumn::Lon => &mut record.lon,
        };
        *slot = Some(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_from_json_ignores_unknown_fields() {
        let json = r#"{"area":1200,"bedrooms":2,"lat":12.97,"lon":77.59,"garage":true}"#;
        let record: PropertyRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.area, Some(1200.0));
        assert_eq!(record.bedrooms, Some(2.0));
        assert!(record.bathrooms.is_none());
        assert!(record.description.is_none());
    }

    #[test]
    fn test_raw_column_round_trip() {
        let mut record = PropertyRecord::default();
        for (i, column) in RawColumn::ALL.into_iter().enumerate() {
            column.set(&mut record, i as f64);
            assert_eq!(column.get(&record), Some(i as f64));
            assert_eq!(RawColumn::from_name(column.name()), Some(column));
        }
    }
}
