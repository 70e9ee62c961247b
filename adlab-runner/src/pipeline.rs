//! End-to-end aggregation: collect, select, rank, save.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use adlab_core::rank::{rank_rows, RankTable};
use adlab_core::selection::score_datasets;
use adlab_core::table::{ResultRow, ScoreMatrix};

use crate::artifact::{ArtifactStore, DirectoryLister};
use crate::collector::Collector;
use crate::config::{AggregationConfig, RunId};
use crate::export;

pub const RESULTS_FILE: &str = "results.csv";
pub const SCORES_FILE: &str = "scores.csv";
pub const RANKS_FILE: &str = "ranks.csv";
pub const MANIFEST_FILE: &str = "manifest.json";

/// All tables produced by one aggregation.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub results: Vec<ResultRow>,
    pub scores: ScoreMatrix,
    pub ranks: RankTable,
}

/// Summary written next to the tables so a report can be traced back to
/// the config that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    pub config: AggregationConfig,
    pub datasets: Vec<String>,
    pub result_rows: usize,
}

/// Run the whole aggregation described by `config`.
pub fn run_pipeline<S, L>(collector: &Collector<S, L>, config: &AggregationConfig) -> Result<PipelineOutput>
where
    S: ArtifactStore,
    L: DirectoryLister,
{
    config.validate()?;

    let datasets = if config.datasets.is_empty() {
        collector
            .list_datasets(&config.root)
            .with_context(|| format!("failed to list datasets in {}", config.root.display()))?
    } else {
        config.datasets.clone()
    };

    let mut results = Vec::new();
    for dataset in &datasets {
        let rows = collector
            .collect_algorithms(&config.root, dataset, &config.algorithms)
            .with_context(|| format!("failed to collect dataset '{dataset}'"))?;
        results.extend(rows);
    }
    info!(
        datasets = datasets.len(),
        rows = results.len(),
        "collection finished"
    );

    let policy = config.policy.build();
    let scores = score_datasets(&results, &datasets, &config.algorithms, policy.as_ref())?;
    let ranks = rank_rows(&scores, config.ranks_higher_first());
    info!(policy = policy.name(), "scoring finished");

    Ok(PipelineOutput {
        results,
        scores,
        ranks,
    })
}

/// Write every table plus `manifest.json` into `run_dir`, creating it.
pub fn save_outputs(
    output: &PipelineOutput,
    config: &AggregationConfig,
    run_dir: &Path,
) -> Result<PathBuf> {
    std::fs::create_dir_all(run_dir)
        .with_context(|| format!("failed to create output dir: {}", run_dir.display()))?;

    export::save_results(&output.results, &run_dir.join(RESULTS_FILE))?;
    export::save_score_matrix(&output.scores, &run_dir.join(SCORES_FILE))?;
    export::save_rank_table(&output.ranks, &run_dir.join(RANKS_FILE))?;

    let manifest = RunManifest {
        run_id: config.run_id()?,
        config: config.clone(),
        datasets: output.scores.rows.iter().map(|r| r.label.clone()).collect(),
        result_rows: output.results.len(),
    };
    let json = serde_json::to_string_pretty(&manifest)?;
    std::fs::write(run_dir.join(MANIFEST_FILE), json)?;

    info!(dir = %run_dir.display(), "outputs saved");
    Ok(run_dir.to_path_buf())
}

/// Read a manifest written by [`save_outputs`].
pub fn load_manifest(run_dir: &Path) -> Result<RunManifest> {
    let path = run_dir.join(MANIFEST_FILE);
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(serde_json::from_str(&json)?)
}
