//! Model-selection policies: reduce per-run rows to one score per algorithm.
//!
//! Every policy consumes the rows of a single dataset plus an explicit list of
//! algorithm names and produces a [`ScoreTable`]. Results depend on those
//! inputs only.
//!
//! Failure handling is split in two:
//! - an algorithm with no rows becomes a missing cell for that algorithm only;
//! - rows from another dataset abort the whole call.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::field::{SelectionField, TimeField};
use crate::reduce;
use crate::table::{group_by, ResultRow, ScoreMatrix, ScoreTable};

/// Errors raised while reducing rows for an algorithm.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SelectionError {
    #[error("no rows for algorithm '{algorithm}'")]
    NoRows { algorithm: String },

    #[error("row from dataset '{found}' passed while scoring dataset '{expected}'")]
    ForeignDataset { expected: String, found: String },
}

impl SelectionError {
    /// Failures that only cost the affected algorithm its score.
    pub fn is_missing_data(&self) -> bool {
        matches!(self, Self::NoRows { .. })
    }
}

/// A strategy that turns the rows of one algorithm into a single score.
pub trait SelectionPolicy {
    /// Short name used in logs and output file names.
    fn name(&self) -> &'static str;

    /// Score one algorithm from its (non-empty) rows.
    fn score_algorithm(
        &self,
        algorithm: &str,
        rows: &[&ResultRow],
    ) -> Result<Option<f64>, SelectionError>;

    /// Score every algorithm in `algorithms` over the rows of `dataset`.
    fn select(
        &self,
        dataset: &str,
        rows: &[ResultRow],
        algorithms: &[String],
    ) -> Result<ScoreTable, SelectionError> {
        if let Some(foreign) = rows.iter().find(|r| r.dataset != dataset) {
            return Err(SelectionError::ForeignDataset {
                expected: dataset.to_string(),
                found: foreign.dataset.clone(),
            });
        }

        let mut table = ScoreTable::new(dataset);
        for algorithm in algorithms {
            let algo_rows: Vec<&ResultRow> =
                rows.iter().filter(|r| &r.algorithm == algorithm).collect();

            let outcome = if algo_rows.is_empty() {
                Err(SelectionError::NoRows {
                    algorithm: algorithm.clone(),
                })
            } else {
                self.score_algorithm(algorithm, &algo_rows)
            };

            let score = match outcome {
                Ok(score) => score,
                Err(e) if e.is_missing_data() => {
                    debug!(policy = self.name(), dataset, error = %e, "scoring as missing");
                    None
                }
                Err(e) => return Err(e),
            };
            table.scores.insert(algorithm.clone(), score);
        }
        Ok(table)
    }
}

// ─── Policies ────────────────────────────────────────────────────────

/// Best test AUROC within each iteration, averaged over iterations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaxOverIterations;

impl SelectionPolicy for MaxOverIterations {
    fn name(&self) -> &'static str {
        "max_over_iterations"
    }

    fn score_algorithm(
        &self,
        _algorithm: &str,
        rows: &[&ResultRow],
    ) -> Result<Option<f64>, SelectionError> {
        let groups = group_by(rows.iter().copied(), |r| r.iteration.clone());
        let maxima: Vec<f64> = groups
            .values()
            .filter_map(|group| reduce::max_present(group.iter().map(|r| r.test_auroc)))
            .collect();
        Ok(reduce::mean(&maxima))
    }
}

/// Pick the settings with the best mean training metric, then report that
/// settings' mean test AUROC across iterations.
///
/// Settings groups whose mean is missing are never selected. On equal means
/// the group that appeared first wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectByTrainMetric {
    pub field: SelectionField,
}

impl SelectByTrainMetric {
    pub fn new(field: SelectionField) -> Self {
        Self { field }
    }

    /// Winning settings identifier and its mean selection metric.
    pub fn best_settings(&self, rows: &[&ResultRow]) -> Option<(String, f64)> {
        let groups = group_by(rows.iter().copied(), |r| r.settings.clone());

        let mut candidates: Vec<(String, f64)> = groups
            .into_iter()
            .filter_map(|(settings, group)| {
                reduce::mean_present(group.iter().map(|r| self.field.extract(r)))
                    .map(|m| (settings, m))
            })
            .collect();

        // sort_by is stable: equal means keep first-appearance order.
        candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        candidates.into_iter().next()
    }
}

impl SelectionPolicy for SelectByTrainMetric {
    fn name(&self) -> &'static str {
        match self.field {
            SelectionField::TrainAuroc => "select_by_train_auroc",
            SelectionField::Top5p => "select_by_top_5p",
        }
    }

    fn score_algorithm(
        &self,
        _algorithm: &str,
        rows: &[&ResultRow],
    ) -> Result<Option<f64>, SelectionError> {
        // The winner comes from `rows`, so at least one row matches it.
        let Some((settings, _)) = self.best_settings(rows) else {
            return Ok(None);
        };

        Ok(reduce::mean_present(
            rows.iter()
                .filter(|r| r.settings == settings)
                .map(|r| r.test_auroc),
        ))
    }
}

/// Mean of a timing field over every row of the algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeanTime {
    pub field: TimeField,
}

impl MeanTime {
    pub fn new(field: TimeField) -> Self {
        Self { field }
    }
}

impl SelectionPolicy for MeanTime {
    fn name(&self) -> &'static str {
        match self.field {
            TimeField::FitTime => "mean_fit_time",
            TimeField::PredictTime => "mean_predict_time",
        }
    }

    fn score_algorithm(
        &self,
        _algorithm: &str,
        rows: &[&ResultRow],
    ) -> Result<Option<f64>, SelectionError> {
        let times: Vec<f64> = rows.iter().map(|r| self.field.extract(r)).collect();
        Ok(reduce::mean(&times))
    }
}

// ─── Serializable policy selector ────────────────────────────────────

/// Serializable name of a policy, as written in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyKind {
    MaxOverIterations,
    SelectByTrainMetric {
        #[serde(default)]
        field: SelectionField,
    },
    MeanTime {
        #[serde(default)]
        field: TimeField,
    },
}

impl Default for PolicyKind {
    fn default() -> Self {
        Self::SelectByTrainMetric {
            field: SelectionField::TrainAuroc,
        }
    }
}

impl PolicyKind {
    pub fn build(&self) -> Box<dyn SelectionPolicy> {
        match *self {
            Self::MaxOverIterations => Box::new(MaxOverIterations),
            Self::SelectByTrainMetric { field } => Box::new(SelectByTrainMetric::new(field)),
            Self::MeanTime { field } => Box::new(MeanTime::new(field)),
        }
    }

    /// Whether a larger score is better under this policy.
    ///
    /// AUROC-based policies rank high scores first; timings rank low first.
    pub fn is_higher_better(&self) -> bool {
        !matches!(self, Self::MeanTime { .. })
    }
}

/// Apply `policy` to each dataset and assemble a dataset × algorithm matrix.
///
/// `rows` may span many datasets; each dataset only sees its own rows.
pub fn score_datasets(
    rows: &[ResultRow],
    datasets: &[String],
    algorithms: &[String],
    policy: &dyn SelectionPolicy,
) -> Result<ScoreMatrix, SelectionError> {
    let mut matrix = ScoreMatrix::new(algorithms.to_vec());
    for dataset in datasets {
        let dataset_rows: Vec<ResultRow> = rows
            .iter()
            .filter(|r| &r.dataset == dataset)
            .cloned()
            .collect();
        let table = policy.select(dataset, &dataset_rows, algorithms)?;
        matrix.push_table(&table);
    }
    Ok(matrix)
}

// ─── Tests ───────────────────────────────────────────────────────────
