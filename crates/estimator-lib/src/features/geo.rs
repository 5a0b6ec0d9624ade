//! Geospatial derivations
//!
//! Distance imputation and the coordinate min-max scaling both use
//! statistics of the batch being built, not of the training batch. A
//! single-record batch therefore always normalises to 0.

use super::basic::raw_values;
use super::frame::FeatureFrame;
use super::schema::GEO_COLUMNS;
use super::FeatureConfig;
use crate::models::{PropertyRecord, RawColumn};

/// Mean Earth radius (IUGG) in kilometres
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Distance at or below which a property counts as central
pub const CENTRAL_MAX_KM: f64 = 5.0;

/// Distance above which a property counts as suburban
pub const SUBURBAN_MIN_KM: f64 = 10.0;

/// Great-circle distance in kilometres, `None` for invalid coordinates
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> Option<f64> {
    let valid = |(lat, lon): (f64, f64)| {
        lat.is_finite() && lon.is_finite() && lat.abs() <= 90.0 && lon.abs() <= 180.0
    };
    if !valid(from) || !valid(to) {
        return None;
    }

    let (lat1, lon1) = (from.0.to_radians(), from.1.to_radians());
    let (lat2, lon2) = (to.0.to_radians(), to.1.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().min(1.0).asin();
    Some(EARTH_RADIUS_KM * c)
}

/// Min-max scale against the batch's own range; a flat range maps to 0
fn min_max_normalize(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    values
        .iter()
        .map(|v| {
            if range > 0.0 && range.is_finite() {
                (v - min) / range
            } else {
                0.0
            }
        })
        .collect()
}

pub(crate) fn add_geo_features(frame: &mut FeatureFrame, batch: &[PropertyRecord], config: &FeatureConfig) {
    let lat = raw_values(batch, RawColumn::Lat, 0.0);
    let lon = raw_values(batch, RawColumn::Lon, 0.0);

    let reference = (config.reference_lat, config.reference_lon);
    let computed: Vec<Option<f64>> = lat
        .iter()
        .zip(&lon)
        .map(|(&la, &lo)| haversine_km((la, lo), reference))
        .collect();

    let ok: Vec<f64> = computed.iter().flatten().copied().collect();
    let fill = if ok.is_empty() {
        f64::NAN
    } else {
        ok.iter().sum::<f64>() / ok.len() as f64
    };
    let failures = computed.len() - ok.len();
    if failures > 0 {
        tracing::debug!(failures, fill_km = fill, "Imputed distance with batch mean");
    }
    let dist: Vec<f64> = computed.into_iter().map(|d| d.unwrap_or(fill)).collect();

    let [dist_col, central_col, suburban_col, lat_col, lon_col, squared_col] = GEO_COLUMNS;
    frame.push_column(dist_col, dist.clone());
    frame.push_flag(central_col, dist.iter().map(|&d| d <= CENTRAL_MAX_KM));
    frame.push_flag(suburban_col, dist.iter().map(|&d| d > SUBURBAN_MIN_KM));
    frame.push_column(lat_col, min_max_normalize(&lat));
    frame.push_column(lon_col, min_max_normalize(&lon));
    frame.push_column(squared_col, dist.iter().map(|d| d * d).collect());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(batch: &[PropertyRecord]) -> FeatureFrame {
        let mut frame = FeatureFrame::new(batch.len());
        add_geo_features(&mut frame, batch, &FeatureConfig::default());
        frame
    }

    #[test]
    fn test_haversine_known_distance() {
        // Bengaluru MG Road to Whitefield is roughly 15 km
        let d = haversine_km((12.9756, 77.6066), (12.9698, 77.7500)).unwrap();
        assert!((15.0..16.0).contains(&d), "distance was {d}");
        assert_eq!(haversine_km((1.0, 2.0), (1.0, 2.0)), Some(0.0));
    }

    #[test]
    fn test_haversine_rejects_invalid() {
        assert!(haversine_km((91.0, 0.0), (0.0, 0.0)).is_none());
        assert!(haversine_km((f64::NAN, 0.0), (0.0, 0.0)).is_none());
    }

    #[test]
    fn test_invalid_row_gets_batch_mean() {
        let batch = vec![
            PropertyRecord::default().with_location(12.9716, 77.5946),
            PropertyRecord::default().with_location(13.0716, 77.5946),
            PropertyRecord::default().with_location(200.0, 77.5946),
        ];
        let frame = build(&batch);
        let dist = frame.column("dist_to_cbd_km").unwrap();
        assert_eq!(dist[0], 0.0);
        assert!((dist[2] - dist[1] / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_proximity_flags() {
        let batch = vec![
            PropertyRecord::default().with_location(12.9716, 77.5946),
            PropertyRecord::default().with_location(13.3, 77.5946),
        ];
        let frame = build(&batch);
        assert_eq!(frame.column("is_central"), Some(&[1.0, 0.0][..]));
        assert_eq!(frame.column("is_suburban"), Some(&[0.0, 1.0][..]));
        let d = frame.get(1, "dist_to_cbd_km").unwrap();
        assert_eq!(frame.get(1, "dist_to_cbd_squared"), Some(d * d));
    }

    #[test]
    fn test_normalization_is_batch_relative() {
        let batch = vec![
            PropertyRecord::default().with_location(12.0, 77.0),
            PropertyRecord::default().with_location(13.0, 78.0),
            PropertyRecord::default().with_location(12.5, 77.25),
        ];
        let frame = build(&batch);
        assert_eq!(frame.column("lat_normalized"), Some(&[0.0, 1.0, 0.5][..]));
        assert_eq!(frame.column("lon_normalized"), Some(&[0.0, 1.0, 0.25][..]));

        let single = build(&batch[2..]);
        assert_eq!(single.get(0, "lat_normalized"), Some(0.0));
    }
}
