//! Tie-aware ranking of algorithm scores.
//!
//! Each row of a score matrix is ranked independently: 1 is the best value,
//! tied values share the average of the positions they occupy, and missing
//! values get no rank and take no position. A summary row with each column's
//! mean rank is appended.

use serde::{Deserialize, Serialize};

use crate::reduce;
use crate::table::{LabeledRow, ScoreMatrix};

/// Label of the appended mean-rank row.
pub const SUMMARY_LABEL: &str = "mean rank";

/// Row-wise ranks of a score matrix plus the mean-rank summary row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankTable {
    pub columns: Vec<String>,
    pub rows: Vec<LabeledRow>,
    pub summary: LabeledRow,
}

impl RankTable {
    /// Data rows followed by the summary row.
    pub fn all_rows(&self) -> impl Iterator<Item = &LabeledRow> {
        self.rows.iter().chain(std::iter::once(&self.summary))
    }

    /// Mean rank of an algorithm across all data rows.
    pub fn mean_rank(&self, algorithm: &str) -> Option<f64> {
        let idx = self.columns.iter().position(|c| c == algorithm)?;
        self.summary.values.get(idx).copied().flatten()
    }
}

/// Rank one row of values.
///
/// NaN is treated as missing. With `higher_is_better` the largest value gets
/// rank 1, otherwise the smallest does.
pub fn rank_values(values: &[Option<f64>], higher_is_better: bool) -> Vec<Option<f64>> {
    let mut indexed: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.filter(|x| !x.is_nan()).map(|x| (i, x)))
        .collect();

    indexed.sort_by(|a, b| {
        let ord = a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal);
        if higher_is_better {
            ord.reverse()
        } else {
            ord
        }
    });

    let mut ranks = vec![None; values.len()];
    let mut i = 0;
    while i < indexed.len() {
        let mut j = i;
        while j < indexed.len() && indexed[j].1 == indexed[i].1 {
            j += 1;
        }
        // Positions i..j (0-based) are ranks i+1..=j; share their average.
        let avg_rank = (i + 1 + j) as f64 / 2.0;
        for &(idx, _) in &indexed[i..j] {
            ranks[idx] = Some(avg_rank);
        }
        i = j;
    }
    ranks
}

/// Rank every row of `matrix` and append the per-column mean rank.
///
/// The input matrix is left untouched.
pub fn rank_rows(matrix: &ScoreMatrix, higher_is_better: bool) -> RankTable {
    let width = matrix.columns.len();

    let rows: Vec<LabeledRow> = matrix
        .rows
        .iter()
        .map(|row| {
            let mut values = row.values.clone();
            values.resize(width, None);
            LabeledRow {
                label: row.label.clone(),
                values: rank_values(&values, higher_is_better),
            }
        })
        .collect();

    let summary_values = (0..width)
        .map(|c| reduce::mean_present(rows.iter().map(|r| r.values[c])))
        .collect();

    RankTable {
        columns: matrix.columns.clone(),
        rows,
        summary: LabeledRow {
            label: SUMMARY_LABEL.to_string(),
            values: summary_values,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: Vec<(&str, Vec<Option<f64>>)>) -> ScoreMatrix {
        ScoreMatrix {
            columns: vec!["a".into(), "b".into(), "c".into()],
            rows: rows
                .into_iter()
                .map(|(label, values)| LabeledRow {
                    label: label.into(),
                    values,
                })
                .collect(),
        }
    }

    #[test]
    fn two_way_tie_at_top() {
        let ranks = rank_values(&[Some(10.0), Some(10.0), Some(5.0)], true);
        assert_eq!(ranks, vec![Some(1.5), Some(1.5), Some(3.0)]);
    }

    #[test]
    fn missing_takes_no_slot() {
        let ranks = rank_values(&[None, Some(5.0), Some(5.0)], true);
        assert_eq!(ranks, vec![None, Some(1.5), Some(1.5)]);
    }

    #[test]
    fn three_way_tie_in_middle() {
        let ranks = rank_values(
            &[Some(0.9), Some(0.5), Some(0.5), Some(0.5), Some(0.1)],
            true,
        );
        assert_eq!(
            ranks,
            vec![Some(1.0), Some(3.0), Some(3.0), Some(3.0), Some(5.0)]
        );
    }

    #[test]
    fn lower_is_better_reverses_order() {
        let ranks = rank_values(&[Some(3.0), Some(1.0), Some(2.0)], false);
        assert_eq!(ranks, vec![Some(3.0), Some(1.0), Some(2.0)]);
    }

    #[test]
    fn nan_is_treated_as_missing() {
        let ranks = rank_values(&[Some(f64::NAN), Some(0.2)], true);
        assert_eq!(ranks, vec![None, Some(1.0)]);
    }

    #[test]
    fn summary_is_column_mean_of_present_ranks() {
        let m = matrix(vec![
            ("d1", vec![Some(10.0), Some(10.0), Some(5.0)]),
            ("d2", vec![None, Some(5.0), Some(5.0)]),
            ("d3", vec![Some(0.1), Some(0.3), Some(0.2)]),
        ]);
        let table = rank_rows(&m, true);

        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.summary.label, SUMMARY_LABEL);
        // a: (1.5 + 3) / 2; b: (1.5 + 1.5 + 1) / 3; c: (3 + 1.5 + 2) / 3
        assert_eq!(table.mean_rank("a"), Some(2.25));
        assert!((table.mean_rank("b").unwrap() - 4.0 / 3.0).abs() < 1e-12);
        assert!((table.mean_rank("c").unwrap() - 6.5 / 3.0).abs() < 1e-12);
        assert_eq!(table.all_rows().count(), 4);
    }

    #[test]
    fn all_missing_column_has_missing_mean() {
        let m = matrix(vec![("d1", vec![None, Some(1.0), Some(2.0)])]);
        let table = rank_rows(&m, true);
        assert_eq!(table.mean_rank("a"), None);
    }

    #[test]
    fn short_rows_are_padded_with_missing() {
        let m = matrix(vec![("d1", vec![Some(1.0)])]);
        let table = rank_rows(&m, true);
        assert_eq!(table.rows[0].values, vec![Some(1.0), None, None]);
    }

    #[test]
    fn input_is_not_mutated() {
        let m = matrix(vec![("d1", vec![Some(0.4), Some(0.6), None])]);
        let before = m.clone();
        let _ = rank_rows(&m, true);
        assert_eq!(m, before);
    }
}
