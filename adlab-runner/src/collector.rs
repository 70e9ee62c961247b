//! Results collection: walk an experiment tree and score every run.
//!
//! Layout: `root/<dataset>/<algorithm>/<iteration>/<run artifact>`. The
//! iteration directory name is the iteration identifier and the artifact's
//! file stem is the settings identifier.
//!
//! Any artifact or listing failure aborts the enclosing call; there is no
//! partial-row recovery.

use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};

use adlab_core::metrics::{auroc, top_precision, TOP_QUANTILE};
use adlab_core::table::ResultRow;

use crate::artifact::{
    keys, ArtifactError, ArtifactStore, DirectoryLister, EntryKind, FsLister, JsonArtifactStore,
};

/// Errors from collection.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error("{path}: {split} has {scores} scores but {labels} labels")]
    LengthMismatch {
        path: String,
        split: &'static str,
        scores: usize,
        labels: usize,
    },

    #[error("{path}: {key} contains non-binary label {value}")]
    NonBinaryLabels {
        path: String,
        key: &'static str,
        value: f64,
    },
}

/// Where a run sits in the experiment tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunCoordinates {
    pub dataset: String,
    pub algorithm: String,
    pub iteration: String,
    pub settings: String,
}

/// Walks an experiment tree through the injected store and lister.
#[derive(Debug, Default)]
pub struct Collector<S, L> {
    store: S,
    lister: L,
}

impl Collector<JsonArtifactStore, FsLister> {
    /// Collector over JSON artifacts on the local file system.
    pub fn filesystem() -> Self {
        Self::new(JsonArtifactStore::new(), FsLister)
    }
}

impl<S: ArtifactStore, L: DirectoryLister> Collector<S, L> {
    pub fn new(store: S, lister: L) -> Self {
        Self { store, lister }
    }

    /// Load one run artifact and compute its metrics.
    pub fn collect_run(&self, path: &Path, at: &RunCoordinates) -> Result<ResultRow, CollectError> {
        let train_scores = self.load_array(path, keys::TRAINING_ANOMALY_SCORE)?;
        let train_labels = self.load_labels(path, keys::TRAINING_LABELS)?;
        let test_scores = self.load_array(path, keys::TESTING_ANOMALY_SCORE)?;
        let test_labels = self.load_labels(path, keys::TESTING_LABELS)?;
        let fit_time = self
            .store
            .load(path, keys::FIT_TIME)?
            .into_scalar(path, keys::FIT_TIME)?;
        let predict_time = self
            .store
            .load(path, keys::PREDICT_TIME)?
            .into_scalar(path, keys::PREDICT_TIME)?;

        check_lengths(path, "training", &train_scores, &train_labels)?;
        check_lengths(path, "testing", &test_scores, &test_labels)?;

        let row = ResultRow {
            dataset: at.dataset.clone(),
            algorithm: at.algorithm.clone(),
            iteration: at.iteration.clone(),
            settings: at.settings.clone(),
            train_auroc: auroc(&train_scores, &train_labels),
            test_auroc: auroc(&test_scores, &test_labels),
            top_5p: top_precision(&train_scores, &train_labels, TOP_QUANTILE),
            fit_time,
            predict_time,
        };
        debug!(
            path = %path.display(),
            train_auroc = ?row.train_auroc,
            test_auroc = ?row.test_auroc,
            "collected run"
        );
        Ok(row)
    }

    /// Collect the requested algorithms of one dataset.
    ///
    /// Only algorithm directories present on disk *and* requested are walked;
    /// requested algorithms with no directory produce no rows.
    pub fn collect_algorithms(
        &self,
        root: &Path,
        dataset: &str,
        algorithms: &[String],
    ) -> Result<Vec<ResultRow>, CollectError> {
        let dataset_dir = root.join(dataset);
        let found = self.lister.list(&dataset_dir, EntryKind::Directory)?;

        for requested in algorithms {
            if !found.contains(requested) {
                debug!(dataset, algorithm = %requested, "no results directory");
            }
        }

        let selected: Vec<String> = found
            .into_iter()
            .filter(|name| algorithms.contains(name))
            .collect();
        self.collect_selected(&dataset_dir, dataset, &selected)
    }

    /// Collect every algorithm of one dataset.
    pub fn collect_dataset(&self, root: &Path, dataset: &str) -> Result<Vec<ResultRow>, CollectError> {
        let dataset_dir = root.join(dataset);
        let found = self.lister.list(&dataset_dir, EntryKind::Directory)?;
        self.collect_selected(&dataset_dir, dataset, &found)
    }

    /// Collect every dataset under `root`.
    pub fn collect_all(&self, root: &Path) -> Result<Vec<ResultRow>, CollectError> {
        let mut rows = Vec::new();
        for dataset in self.list_datasets(root)? {
            rows.extend(self.collect_dataset(root, &dataset)?);
        }
        Ok(rows)
    }

    /// Dataset directory names under `root`.
    pub fn list_datasets(&self, root: &Path) -> Result<Vec<String>, CollectError> {
        Ok(self.lister.list(root, EntryKind::Directory)?)
    }

    fn collect_selected(
        &self,
        dataset_dir: &Path,
        dataset: &str,
        algorithms: &[String],
    ) -> Result<Vec<ResultRow>, CollectError> {
        let mut rows = Vec::new();
        for algorithm in algorithms {
            let algo_dir = dataset_dir.join(algorithm);
            for iteration in self.lister.list(&algo_dir, EntryKind::Directory)? {
                let iter_dir = algo_dir.join(&iteration);
                for run in self.lister.list(&iter_dir, EntryKind::File)? {
                    let at = RunCoordinates {
                        dataset: dataset.to_string(),
                        algorithm: algorithm.clone(),
                        iteration: iteration.clone(),
                        settings: settings_id(&run),
                    };
                    rows.push(self.collect_run(&iter_dir.join(&run), &at)?);
                }
            }
        }
        info!(dataset, algorithms = algorithms.len(), runs = rows.len(), "collected dataset");
        Ok(rows)
    }

    fn load_array(&self, path: &Path, key: &'static str) -> Result<Vec<f64>, CollectError> {
        Ok(self.store.load(path, key)?.into_array(path, key)?)
    }

    fn load_labels(&self, path: &Path, key: &'static str) -> Result<Vec<f64>, CollectError> {
        let labels = self.load_array(path, key)?;
        if let Some(&value) = labels.iter().find(|&&l| l != 0.0 && l != 1.0) {
            return Err(CollectError::NonBinaryLabels {
                path: path.display().to_string(),
                key,
                value,
            });
        }
        Ok(labels)
    }
}

/// Settings identifier of a run artifact: its file name without extension.
pub fn settings_id(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
        .to_string()
}

fn check_lengths(
    path: &Path,
    split: &'static str,
    scores: &[f64],
    labels: &[f64],
) -> Result<(), CollectError> {
    if scores.len() != labels.len() {
        return Err(CollectError::LengthMismatch {
            path: path.display().to_string(),
            split,
            scores: scores.len(),
            labels: labels.len(),
        });
    }
    Ok(())
}
