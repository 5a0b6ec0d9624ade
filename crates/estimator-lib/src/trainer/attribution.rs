//! Global feature attribution from per-row path contributions

use super::{AttributionError, Regressor};
use serde::{Deserialize, Serialize};

/// Default number of validation rows explained
pub const DEFAULT_ATTRIBUTION_SAMPLE: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    /// Mean absolute contribution in target units
    pub importance: f64,
}

/// Features ranked by mean absolute contribution, largest first
///
/// Features with equal importance keep their schema order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionTable {
    entries: Vec<FeatureImportance>,
    sample_size: usize,
}

impl AttributionTable {
    pub fn entries(&self) -> &[FeatureImportance] {
        &self.entries
    }

    pub fn top(&self, n: usize) -> &[FeatureImportance] {
        &self.entries[..n.min(self.entries.len())]
    }

    pub fn get(&self, feature: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.feature == feature)
            .map(|e| e.importance)
    }

    /// Rows the table was averaged over
    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Average |contribution| per feature over the first `limit` rows
pub(crate) fn explain(
    model: &dyn Regressor,
    rows: &[Vec<f64>],
    feature_names: &[String],
    limit: usize,
) -> Result<AttributionTable, AttributionError> {
    let sample = &rows[..limit.min(rows.len())];
    if sample.is_empty() {
        return Err(AttributionError::EmptySample);
    }
    if model.n_features() != feature_names.len() {
        return Err(AttributionError::WidthMismatch {
            expected: feature_names.len(),
            found: model.n_features(),
        });
    }

    let mut totals = vec![0.0; feature_names.len()];
    for row in sample {
        let contributions = model.contributions(row);
        for (total, phi) in totals.iter_mut().zip(&contributions.values) {
            *total += phi.abs();
        }
    }

    let mut entries = Vec::with_capacity(totals.len());
    for (name, total) in feature_names.iter().zip(totals) {
        let importance = total / sample.len() as f64;
        if !importance.is_finite() {
            return Err(AttributionError::NonFinite(name.clone()));
        }
        entries.push(FeatureImportance {
            feature: name.clone(),
            importance,
        });
    }
    entries.sort_by(|a, b| b.importance.total_cmp(&a.importance));

    Ok(AttributionTable {
        entries,
        sample_size: sample.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trainer::Contributions;

    /// prediction = 1 + 2*x0 - 3*x1, credited linearly
    struct Linear;

    impl Regressor for Linear {
        fn predict_row(&self, row: &[f64]) -> f64 {
            1.0 + 2.0 * row[0] - 3.0 * row[1]
        }

        fn contributions(&self, row: &[f64]) -> Contributions {
            Contributions {
                bias: 1.0,
                values: vec![2.0 * row[0], -3.0 * row[1], 0.0],
            }
        }

        fn n_features(&self) -> usize {
            3
        }
    }

    fn names() -> Vec<String> {
        vec!["area".into(), "lat".into(), "sentiment".into()]
    }

    #[test]
    fn test_ranked_by_mean_absolute_contribution() {
        let rows = vec![vec![1.0, 1.0, 0.0], vec![-1.0, 0.0, 0.0]];
        let table = explain(&Linear, &rows, &names(), 100).unwrap();
        let order: Vec<&str> = table.entries().iter().map(|e| e.feature.as_str()).collect();
        assert_eq!(order, vec!["area", "lat", "sentiment"]);
        assert_eq!(table.get("area"), Some(2.0));
        assert_eq!(table.get("lat"), Some(1.5));
        assert_eq!(table.sample_size(), 2);
    }

    #[test]
    fn test_ties_keep_schema_order() {
        let rows = vec![vec![0.0, 0.0, 0.0]];
        let table = explain(&Linear, &rows, &names(), 100).unwrap();
        let order: Vec<&str> = table.entries().iter().map(|e| e.feature.as_str()).collect();
        assert_eq!(order, vec!["area", "lat", "sentiment"]);
    }

    #[test]
    fn test_only_first_rows_used() {
        let rows = vec![vec![1.0, 0.0, 0.0], vec![100.0, 0.0, 0.0]];
        let table = explain(&Linear, &rows, &names(), 1).unwrap();
        assert_eq!(table.get("area"), Some(2.0));
        assert_eq!(table.top(1).len(), 1);
        assert_eq!(table.top(10).len(), 3);
    }

    #[test]
    fn test_failures() {
        assert!(matches!(
            explain(&Linear, &[], &names(), 100),
            Err(AttributionError::EmptySample)
        ));
        assert!(matches!(
            explain(&Linear, &[vec![0.0; 3]], &names()[..2], 100),
            Err(AttributionError::WidthMismatch { expected: 2, found: 3 })
        ));
    }
}
