//! Tabular I/O: CSV for result, score and rank tables.
//!
//! Missing cells are written as the literal `missing`. On read, the metric
//! columns coerce `missing` back to a missing value; every other numeric cell
//! is parsed and rounded to 6 decimals.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use thiserror::Error;

use adlab_core::rank::RankTable;
use adlab_core::table::{LabeledRow, ResultRow, ScoreMatrix};

/// Cell text for a missing value.
pub const MISSING: &str = "missing";

/// Column order of the results table.
pub const RESULT_COLUMNS: [&str; 9] = [
    "dataset",
    "algorithm",
    "iteration",
    "settings",
    "train_auroc",
    "test_auroc",
    "top_5p",
    "fit_time",
    "predict_time",
];

/// Errors from table reading and writing.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing column '{0}'")]
    MissingColumn(String),

    #[error("row {row}, column '{column}': cannot parse '{value}' as a number")]
    ParseCell {
        row: usize,
        column: String,
        value: String,
    },

    #[error("table has no label column")]
    NoLabelColumn,
}

// ─── Cell coercion ──────────────────────────────────────────────────

/// Round to 6 decimals.
pub fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

/// Parse a cell that may hold the missing marker.
pub fn parse_optional(raw: &str) -> Result<Option<f64>, std::num::ParseFloatError> {
    let raw = raw.trim();
    if raw == MISSING {
        return Ok(None);
    }
    raw.parse::<f64>().map(|v| Some(round6(v)))
}

/// Format a possibly-missing cell.
pub fn format_optional(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => MISSING.to_string(),
    }
}

// ─── Results table ──────────────────────────────────────────────────

/// Write the results table as CSV.
pub fn write_results<W: Write>(rows: &[ResultRow], writer: W) -> Result<(), TableError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(RESULT_COLUMNS)?;
    for r in rows {
        wtr.write_record([
            r.dataset.clone(),
            r.algorithm.clone(),
            r.iteration.clone(),
            r.settings.clone(),
            format_optional(r.train_auroc),
            format_optional(r.test_auroc),
            format_optional(r.top_5p),
            r.fit_time.to_string(),
            r.predict_time.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Read a results table written by [`write_results`] (column order free).
pub fn read_results<R: Read>(reader: R) -> Result<Vec<ResultRow>, TableError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();
    let idx = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))
    };
    let cols = [
        idx("dataset")?,
        idx("algorithm")?,
        idx("iteration")?,
        idx("settings")?,
        idx("train_auroc")?,
        idx("test_auroc")?,
        idx("top_5p")?,
        idx("fit_time")?,
        idx("predict_time")?,
    ];

    let mut rows = Vec::new();
    for (n, record) in rdr.records().enumerate() {
        let record = record?;
        let text = |c: usize| record.get(cols[c]).unwrap_or("").to_string();
        let optional = |c: usize| {
            let raw = record.get(cols[c]).unwrap_or("");
            parse_optional(raw).map_err(|_| TableError::ParseCell {
                row: n + 1,
                column: RESULT_COLUMNS[c].to_string(),
                value: raw.to_string(),
            })
        };
        let required = |c: usize| {
            optional(c)?.ok_or_else(|| TableError::ParseCell {
                row: n + 1,
                column: RESULT_COLUMNS[c].to_string(),
                value: MISSING.to_string(),
            })
        };

        rows.push(ResultRow {
            dataset: text(0),
            algorithm: text(1),
            iteration: text(2),
            settings: text(3),
            train_auroc: optional(4)?,
            test_auroc: optional(5)?,
            top_5p: optional(6)?,
            fit_time: required(7)?,
            predict_time: required(8)?,
        });
    }
    Ok(rows)
}

// ─── Score matrix / rank table ──────────────────────────────────────

fn write_labeled<'a, W, I>(
    label_header: &str,
    columns: &[String],
    rows: I,
    writer: W,
) -> Result<(), TableError>
where
    W: Write,
    I: IntoIterator<Item = &'a LabeledRow>,
{
    let mut wtr = csv::Writer::from_writer(writer);
    let mut header = vec![label_header.to_string()];
    header.extend(columns.iter().cloned());
    wtr.write_record(&header)?;

    for row in rows {
        let mut record = vec![row.label.clone()];
        record.extend((0..columns.len()).map(|c| format_optional(row.values.get(c).copied().flatten())));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write a dataset × algorithm score matrix.
pub fn write_score_matrix<W: Write>(matrix: &ScoreMatrix, writer: W) -> Result<(), TableError> {
    write_labeled("dataset", &matrix.columns, &matrix.rows, writer)
}

/// Write a rank table, summary row last.
pub fn write_rank_table<W: Write>(table: &RankTable, writer: W) -> Result<(), TableError> {
    write_labeled("dataset", &table.columns, table.all_rows(), writer)
}

/// Read a score matrix: first column is the row label, the rest are scores.
pub fn read_score_matrix<R: Read>(reader: R) -> Result<ScoreMatrix, TableError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();
    if headers.is_empty() {
        return Err(TableError::NoLabelColumn);
    }
    let columns: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

    let mut rows = Vec::new();
    for (n, record) in rdr.records().enumerate() {
        let record = record?;
        let label = record.get(0).unwrap_or("").to_string();
        let values = columns
            .iter()
            .enumerate()
            .map(|(c, column)| {
                let raw = record.get(c + 1).unwrap_or(MISSING);
                parse_optional(raw).map_err(|_| TableError::ParseCell {
                    row: n + 1,
                    column: column.clone(),
                    value: raw.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(LabeledRow { label, values });
    }
    Ok(ScoreMatrix { columns, rows })
}

// ─── File helpers ───────────────────────────────────────────────────

pub fn save_results(rows: &[ResultRow], path: &Path) -> Result<(), TableError> {
    write_results(rows, File::create(path)?)
}

pub fn load_results(path: &Path) -> Result<Vec<ResultRow>, TableError> {
    read_results(File::open(path)?)
}

pub fn save_score_matrix(matrix: &ScoreMatrix, path: &Path) -> Result<(), TableError> {
    write_score_matrix(matrix, File::create(path)?)
}

pub fn load_score_matrix(path: &Path) -> Result<ScoreMatrix, TableError> {
    read_score_matrix(File::open(path)?)
}

pub fn save_rank_table(table: &RankTable, path: &Path) -> Result<(), TableError> {
    write_rank_table(table, File::create(path)?)
}
