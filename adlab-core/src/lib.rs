//! AD-Lab Core: scoring kernel for anomaly-detection experiments.
//!
//! This crate holds the pure part of the pipeline:
//! - Detection metrics (AUROC, top-quantile precision) from raw scores
//! - Missing-safe reductions (mean / max / argmax)
//! - Tie-aware ranking with a mean-rank summary row
//! - Result tables and single-pass group-by
//! - Model-selection policies that reduce runs to one score per algorithm
//!
//! Nothing here performs I/O; collection lives in `adlab-runner`.

pub mod field;
pub mod metrics;
pub mod rank;
pub mod reduce;
pub mod selection;
pub mod table;

pub use field::{SelectionField, TimeField};
pub use metrics::{auroc, roc_curve, top_precision, RocCurve, RocPoint, ScoreLabelPair, TOP_QUANTILE};
pub use rank::{rank_rows, rank_values, RankTable, SUMMARY_LABEL};
pub use selection::{
    score_datasets, MaxOverIterations, MeanTime, PolicyKind, SelectByTrainMetric, SelectionError,
    SelectionPolicy,
};
pub use table::{LabeledRow, ResultRow, ScoreMatrix, ScoreTable};
