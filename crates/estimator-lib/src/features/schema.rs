//! Declared feature schema
//!
//! The column list of a frame is a pure function of which input groups are
//! present and how wide the fitted vocabulary is. The engine checks its
//! output against this declaration instead of trusting whatever it produced.

use crate::models::{PropertyRecord, RawColumn};

pub const AGE_COLUMNS: [&str; 3] = ["property_age", "is_new_property", "is_old_property"];

pub const AREA_COLUMNS: [&str; 4] = [
    "area_sqrt",
    "area_log",
    "is_large_property",
    "is_small_property",
];

pub const AREA_BEDROOM_COLUMNS: [&str; 2] = ["area_per_bedroom", "bedroom_density"];

pub const ROOM_COLUMNS: [&str; 2] = ["bathroom_bedroom_ratio", "total_rooms"];

pub const BEDROOM_COLUMNS: [&str; 3] = ["is_studio", "is_family_home", "is_luxury"];

pub const GEO_COLUMNS: [&str; 6] = [
    "dist_to_cbd_km",
    "is_central",
    "is_suburban",
    "lat_normalized",
    "lon_normalized",
    "dist_to_cbd_squared",
];

pub const TEXT_COLUMNS: [&str; 10] = [
    "desc_len",
    "desc_words",
    "avg_word_length",
    "sentiment",
    "sentiment_positive",
    "sentiment_negative",
    "has_luxury_keywords",
    "has_location_keywords",
    "has_condition_keywords",
    "text_complexity",
];

pub const TFIDF_PREFIX: &str = "tfidf_";

pub fn tfidf_column(index: usize) -> String {
    format!("{TFIDF_PREFIX}{index}")
}

/// Which optional input groups a batch carries
///
/// A column counts as present when at least one record in the batch has it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputPresence {
    raw: [bool; 6],
    pub description: bool,
}

impl InputPresence {
    pub fn of(batch: &[PropertyRecord]) -> Self {
        let mut presence = Self::default();
        for record in batch {
            for (i, column) in RawColumn::ALL.into_iter().enumerate() {
                presence.raw[i] |= column.get(record).is_some();
            }
            presence.description |= record.description.is_some();
        }
        presence
    }

    pub fn has(&self, column: RawColumn) -> bool {
        let idx = RawColumn::ALL
            .iter()
            .position(|c| *c == column)
            .unwrap_or_default();
        self.raw[idx]
    }

    pub fn raw_columns(&self) -> impl Iterator<Item = RawColumn> + '_ {
        RawColumn::ALL.into_iter().filter(|c| self.has(*c))
    }

    pub fn has_location(&self) -> bool {
        self.has(RawColumn::Lat) && self.has(RawColumn::Lon)
    }
}

/// Ordered list of feature names a frame must carry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl FeatureSchema {
    /// Declare the schema for a batch with the given presence and vocabulary width
    pub fn declare(presence: &InputPresence, tfidf_width: usize) -> Self {
        let mut names: Vec<String> = presence
            .raw_columns()
            .map(|c| c.name().to_string())
            .collect();

        let mut extend = |cols: &[&str]| names.extend(cols.iter().map(|s| s.to_string()));

        let area = presence.has(RawColumn::Area);
        let bedrooms = presence.has(RawColumn::Bedrooms);

        if presence.has(RawColumn::YearBuilt) {
            extend(&AGE_COLUMNS);
        }
        if area {
            extend(&AREA_COLUMNS);
        }
        if area && bedrooms {
            extend(&AREA_BEDROOM_COLUMNS);
        }
        if bedrooms && presence.has(RawColumn::Bathrooms) {
            extend(&ROOM_COLUMNS);
        }
        if bedrooms {
            extend(&BEDROOM_COLUMNS);
        }
        if presence.has_location() {
            extend(&GEO_COLUMNS);
        }
        if presence.description {
            extend(&TEXT_COLUMNS);
            names.extend((0..tfidf_width).map(tfidf_column));
        }

        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
