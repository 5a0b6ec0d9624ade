//! Stateless derivations from structured attributes
//!
//! Every group is optional: a group is emitted only when all of its input
//! columns are present in the batch.

use super::frame::FeatureFrame;
use super::schema::{
    InputPresence, AGE_COLUMNS, AREA_BEDROOM_COLUMNS, AREA_COLUMNS, BEDROOM_COLUMNS, ROOM_COLUMNS,
};
use super::FeatureConfig;
use crate::models::{PropertyRecord, RawColumn};

/// Age at or below which a property counts as new
pub const NEW_PROPERTY_MAX_AGE: f64 = 5.0;

/// Age at or above which a property counts as old
pub const OLD_PROPERTY_MIN_AGE: f64 = 20.0;

pub const LARGE_PROPERTY_MIN_AREA: f64 = 1500.0;

pub const SMALL_PROPERTY_MAX_AREA: f64 = 800.0;

/// Values of a present raw column, missing cells read as `fill`
pub(crate) fn raw_values(batch: &[PropertyRecord], column: RawColumn, fill: f64) -> Vec<f64> {
    batch
        .iter()
        .map(|r| column.get(r).unwrap_or(fill))
        .collect()
}

/// Zero bedrooms divide as one
fn bedroom_divisor(bedrooms: f64) -> f64 {
    if bedrooms == 0.0 {
        1.0
    } else {
        bedrooms
    }
}

pub(crate) fn add_raw_columns(
    frame: &mut FeatureFrame,
    batch: &[PropertyRecord],
    presence: &InputPresence,
    config: &FeatureConfig,
) {
    for column in presence.raw_columns() {
        let fill = match column {
            RawColumn::YearBuilt => config.reference_year,
            _ => 0.0,
        };
        frame.push_column(column.name(), raw_values(batch, column, fill));
    }
}

pub(crate) fn add_basic_features(
    frame: &mut FeatureFrame,
    batch: &[PropertyRecord],
    presence: &InputPresence,
    config: &FeatureConfig,
) {
    let has_area = presence.has(RawColumn::Area);
    let has_bedrooms = presence.has(RawColumn::Bedrooms);
    let area = raw_values(batch, RawColumn::Area, 0.0);
    let bedrooms = raw_values(batch, RawColumn::Bedrooms, 0.0);

    if presence.has(RawColumn::YearBuilt) {
        let age: Vec<f64> = raw_values(batch, RawColumn::YearBuilt, config.reference_year)
            .into_iter()
            .map(|year| config.reference_year - year)
            .collect();
        let is_new: Vec<bool> = age.iter().map(|&a| a <= NEW_PROPERTY_MAX_AGE).collect();
        let is_old: Vec<bool> = age.iter().map(|&a| a >= OLD_PROPERTY_MIN_AGE).collect();
        let [age_col, new_col, old_col] = AGE_COLUMNS;
        frame.push_column(age_col, age);
        frame.push_flag(new_col, is_new.into_iter());
        frame.push_flag(old_col, is_old.into_iter());
    }

    if has_area {
        let [sqrt_col, log_col, large_col, small_col] = AREA_COLUMNS;
        frame.push_column(sqrt_col, area.iter().map(|a| a.sqrt()).collect());
        frame.push_column(log_col, area.iter().map(|a| a.ln_1p()).collect());
        frame.push_flag(large_col, area.iter().map(|&a| a >= LARGE_PROPERTY_MIN_AREA));
        frame.push_flag(small_col, area.iter().map(|&a| a <= SMALL_PROPERTY_MAX_AREA));
    }

    if has_area && has_bedrooms {
        let [per_bedroom_col, density_col] = AREA_BEDROOM_COLUMNS;
        frame.push_column(
            per_bedroom_col,
            area.iter()
                .zip(&bedrooms)
                .map(|(a, b)| a / bedroom_divisor(*b))
                .collect(),
        );
        frame.push_column(
            density_col,
            area.iter()
                .zip(&bedrooms)
                .map(|(&a, &b)| if a == 0.0 { 0.0 } else { b / a * 1000.0 })
                .collect(),
        );
    }

    if has_bedrooms && presence.has(RawColumn::Bathrooms) {
        let bathrooms = raw_values(batch, RawColumn::Bathrooms, 0.0);
        let [ratio_col, total_col] = ROOM_COLUMNS;
        frame.push_column(
            ratio_col,
            bathrooms
                .iter()
                .zip(&bedrooms)
                .map(|(ba, be)| ba / bedroom_divisor(*be))
                .collect(),
        );
        frame.push_column(
            total_col,
            bathrooms.iter().zip(&bedrooms).map(|(ba, be)| ba + be).collect(),
        );
    }

    if has_bedrooms {
        let [studio_col, family_col, luxury_col] = BEDROOM_COLUMNS;
        frame.push_flag(studio_col, bedrooms.iter().map(|&b| b == 1.0));
        frame.push_flag(family_col, bedrooms.iter().map(|&b| b >= 3.0));
        frame.push_flag(luxury_col, bedrooms.iter().map(|&b| b >= 4.0));
    }
}
