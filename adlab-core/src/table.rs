//! Result tables: per-run rows and the per-dataset tables derived from them.
//!
//! `ResultRow` is the unit produced by collection. Score and rank tables are
//! keyed by algorithm name because the algorithm set is open-ended.

use std::hash::Hash;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Metrics for a single run: one (dataset, algorithm, iteration, settings).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub dataset: String,
    pub algorithm: String,
    pub iteration: String,
    /// Opaque hyperparameter-configuration identifier.
    pub settings: String,
    pub train_auroc: Option<f64>,
    pub test_auroc: Option<f64>,
    pub top_5p: Option<f64>,
    pub fit_time: f64,
    pub predict_time: f64,
}

/// Group rows by a key in a single pass. Groups keep first-appearance order,
/// rows keep input order within a group.
pub fn group_by<'a, K, I, F>(rows: I, key: F) -> IndexMap<K, Vec<&'a ResultRow>>
where
    K: Hash + Eq,
    I: IntoIterator<Item = &'a ResultRow>,
    F: Fn(&ResultRow) -> K,
{
    let mut groups: IndexMap<K, Vec<&'a ResultRow>> = IndexMap::new();
    for row in rows {
        groups.entry(key(row)).or_default().push(row);
    }
    groups
}

/// Distinct dataset names in first-appearance order.
pub fn datasets(rows: &[ResultRow]) -> Vec<String> {
    group_by(rows, |r| r.dataset.clone()).into_keys().collect()
}

/// Distinct algorithm names in first-appearance order.
pub fn algorithms(rows: &[ResultRow]) -> Vec<String> {
    group_by(rows, |r| r.algorithm.clone()).into_keys().collect()
}

/// One score per algorithm for a single dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreTable {
    pub dataset: String,
    pub scores: IndexMap<String, Option<f64>>,
}

impl ScoreTable {
    pub fn new(dataset: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            scores: IndexMap::new(),
        }
    }

    /// Score for an algorithm; `None` if it is missing or was never scored.
    pub fn get(&self, algorithm: &str) -> Option<f64> {
        self.scores.get(algorithm).copied().flatten()
    }
}

/// A labelled row of possibly-missing values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledRow {
    pub label: String,
    pub values: Vec<Option<f64>>,
}

/// Dataset × algorithm matrix of scores.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreMatrix {
    pub columns: Vec<String>,
    pub rows: Vec<LabeledRow>,
}

impl ScoreMatrix {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a score table as a row, reading cells in column order.
    /// Algorithms absent from the table become missing cells.
    pub fn push_table(&mut self, table: &ScoreTable) {
        let values = self.columns.iter().map(|c| table.get(c)).collect();
        self.rows.push(LabeledRow {
            label: table.dataset.clone(),
            values,
        });
    }

    pub fn from_tables(columns: Vec<String>, tables: &[ScoreTable]) -> Self {
        let mut matrix = Self::new(columns);
        for table in tables {
            matrix.push_table(table);
        }
        matrix
    }

    /// Cell value; `None` when missing or out of range.
    pub fn get(&self, row: usize, column: usize) -> Option<f64> {
        self.rows
            .get(row)
            .and_then(|r| r.values.get(column).copied())
            .flatten()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
