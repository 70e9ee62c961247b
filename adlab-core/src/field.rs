//! Column selectors: which field of a `ResultRow` a policy reads.

use serde::{Deserialize, Serialize};

use crate::table::ResultRow;

/// Metric field used to pick the winning hyperparameter settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionField {
    #[default]
    TrainAuroc,
    #[serde(rename = "top_5p")]
    Top5p,
}

impl SelectionField {
    pub fn extract(&self, row: &ResultRow) -> Option<f64> {
        match self {
            Self::TrainAuroc => row.train_auroc,
            Self::Top5p => row.top_5p,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            Self::TrainAuroc => "train_auroc",
            Self::Top5p => "top_5p",
        }
    }
}

/// Timing field averaged by the mean-time policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeField {
    #[default]
    FitTime,
    PredictTime,
}

impl TimeField {
    pub fn extract(&self, row: &ResultRow) -> f64 {
        match self {
            Self::FitTime => row.fit_time,
            Self::PredictTime => row.predict_time,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            Self::FitTime => "fit_time",
            Self::PredictTime => "predict_time",
        }
    }
}
