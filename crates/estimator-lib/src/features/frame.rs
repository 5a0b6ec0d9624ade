//! Column-major numeric feature frame

use serde::{Deserialize, Serialize};

/// Named numeric columns of equal length
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureFrame {
    columns: Vec<String>,
    values: Vec<Vec<f64>>,
    n_rows: usize,
}

impl FeatureFrame {
    pub fn new(n_rows: usize) -> Self {
        Self {
            columns: Vec::new(),
            values: Vec::new(),
            n_rows,
        }
    }

    /// Build a frame from row-major data
    pub fn from_rows(columns: Vec<String>, rows: &[Vec<f64>]) -> Self {
        let mut values = vec![Vec::with_capacity(rows.len()); columns.len()];
        for row in rows {
            for (col, value) in values.iter_mut().zip(row) {
                col.push(*value);
            }
        }
        Self {
            columns,
            values,
            n_rows: rows.len(),
        }
    }

    pub(crate) fn push_column(&mut self, name: impl Into<String>, values: Vec<f64>) {
        debug_assert_eq!(values.len(), self.n_rows);
        self.columns.push(name.into());
        self.values.push(values);
    }

    pub(crate) fn push_flag(&mut self, name: impl Into<String>, flags: impl Iterator<Item = bool>) {
        self.push_column(name, flags.map(|f| if f { 1.0 } else { 0.0 }).collect());
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|idx| self.values[idx].as_slice())
    }

    pub fn column_at(&self, idx: usize) -> &[f64] {
        &self.values[idx]
    }

    pub fn get(&self, row: usize, name: &str) -> Option<f64> {
        self.column(name).and_then(|c| c.get(row).copied())
    }

    /// Copy out one row in column order
    pub fn row(&self, row: usize) -> Vec<f64> {
        self.values.iter().map(|c| c[row]).collect()
    }

    /// Replace NaN and infinities with zero
    pub(crate) fn fill_non_finite(&mut self) {
        for value in self.values.iter_mut().flatten() {
            if !value.is_finite() {
                *value = 0.0;
            }
        }
    }

    /// Select a subset of rows, preserving column order
    pub fn take_rows(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            values: self
                .values
                .iter()
                .map(|c| indices.iter().map(|&i| c[i]).collect())
                .collect(),
            n_rows: indices.len(),
        }
    }
}
