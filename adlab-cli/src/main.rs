//! AD-Lab CLI: collect, score and rank anomaly-detection experiments.
//!
//! Commands:
//! - `collect`: walk an experiment tree and write the per-run results table
//! - `score`: reduce a results table to one score per dataset and algorithm
//! - `rank`: rank a score matrix row-wise and append the mean-rank row
//! - `run`: all of the above from a TOML config file

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use adlab_core::field::{SelectionField, TimeField};
use adlab_core::rank::{rank_rows, RankTable};
use adlab_core::selection::{score_datasets, PolicyKind};
use adlab_core::table;
use adlab_runner::export;
use adlab_runner::{run_pipeline, save_outputs, AggregationConfig, Collector};

#[derive(Parser)]
#[command(
    name = "adlab",
    about = "AD-Lab CLI: anomaly-detection experiment scoring"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect per-run metrics from an experiment tree into a results CSV.
    Collect {
        /// Root of the `dataset/algorithm/iteration/run` tree.
        #[arg(long)]
        root: PathBuf,

        /// Only collect this dataset.
        #[arg(long)]
        dataset: Option<String>,

        /// Only collect these algorithms (comma separated).
        #[arg(long, value_delimiter = ',')]
        algorithms: Vec<String>,

        /// Output CSV path.
        #[arg(long, default_value = "results.csv")]
        out: PathBuf,
    },
    /// Reduce a results CSV to a dataset × algorithm score matrix.
    Score {
        /// Results CSV written by `collect`.
        #[arg(long)]
        results: PathBuf,

        /// Selection policy.
        #[arg(long, value_enum, default_value_t = PolicyArg::SelectTrainAuroc)]
        policy: PolicyArg,

        /// Algorithm columns, in order. Defaults to every algorithm in the table.
        #[arg(long, value_delimiter = ',')]
        algorithms: Vec<String>,

        /// Dataset rows, in order. Defaults to every dataset in the table.
        #[arg(long, value_delimiter = ',')]
        datasets: Vec<String>,

        /// Output CSV path.
        #[arg(long, default_value = "scores.csv")]
        out: PathBuf,
    },
    /// Rank a score matrix row-wise and append the mean-rank row.
    Rank {
        /// Score matrix CSV written by `score`.
        #[arg(long)]
        scores: PathBuf,

        /// Rank smaller values first (e.g. for timing matrices).
        #[arg(long, default_value_t = false)]
        lower_is_better: bool,

        /// Output CSV path.
        #[arg(long, default_value = "ranks.csv")]
        out: PathBuf,
    },
    /// Collect, score and rank as described by a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Override the config's output directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyArg {
    /// Best test AUROC within each iteration, averaged over iterations.
    MaxOverIterations,
    /// Settings with the best mean train AUROC, then mean test AUROC.
    SelectTrainAuroc,
    /// Settings with the best mean top-5% precision, then mean test AUROC.
    SelectTop5p,
    /// Mean fit time.
    MeanFitTime,
    /// Mean predict time.
    MeanPredictTime,
}

impl PolicyArg {
    fn to_policy(self) -> PolicyKind {
        match self {
            PolicyArg::MaxOverIterations => PolicyKind::MaxOverIterations,
            PolicyArg::SelectTrainAuroc => PolicyKind::SelectByTrainMetric {
                field: SelectionField::TrainAuroc,
            },
            PolicyArg::SelectTop5p => PolicyKind::SelectByTrainMetric {
                field: SelectionField::Top5p,
            },
            PolicyArg::MeanFitTime => PolicyKind::MeanTime {
                field: TimeField::FitTime,
            },
            PolicyArg::MeanPredictTime => PolicyKind::MeanTime {
                field: TimeField::PredictTime,
            },
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Collect {
            root,
            dataset,
            algorithms,
            out,
        } => run_collect(&root, dataset.as_deref(), &algorithms, &out),
        Commands::Score {
            results,
            policy,
            algorithms,
            datasets,
            out,
        } => run_score(&results, policy.to_policy(), algorithms, datasets, &out),
        Commands::Rank {
            scores,
            lower_is_better,
            out,
        } => run_rank(&scores, !lower_is_better, &out),
        Commands::Run { config, output_dir } => run_config(&config, output_dir),
    }
}

fn run_collect(root: &Path, dataset: Option<&str>, algorithms: &[String], out: &Path) -> Result<()> {
    if !root.is_dir() {
        bail!("experiment root {} is not a directory", root.display());
    }
    let collector = Collector::filesystem();

    let datasets = match dataset {
        Some(name) => vec![name.to_string()],
        None => collector.list_datasets(root)?,
    };

    let mut rows = Vec::new();
    for dataset in &datasets {
        let collected = if algorithms.is_empty() {
            collector.collect_dataset(root, dataset)
        } else {
            collector.collect_algorithms(root, dataset, algorithms)
        };
        rows.extend(collected.with_context(|| format!("failed to collect dataset '{dataset}'"))?);
    }

    export::save_results(&rows, out)
        .with_context(|| format!("failed to write {}", out.display()))?;
    println!("Collected {} runs from {} datasets into {}", rows.len(), datasets.len(), out.display());
    Ok(())
}

fn run_score(
    results: &Path,
    policy: PolicyKind,
    algorithms: Vec<String>,
    datasets: Vec<String>,
    out: &Path,
) -> Result<()> {
    let rows = export::load_results(results)
        .with_context(|| format!("failed to read {}", results.display()))?;

    let algorithms = if algorithms.is_empty() {
        table::algorithms(&rows)
    } else {
        algorithms
    };
    let datasets = if datasets.is_empty() {
        table::datasets(&rows)
    } else {
        datasets
    };
    if algorithms.is_empty() {
        bail!("no algorithms to score in {}", results.display());
    }

    let policy = policy.build();
    let scores = score_datasets(&rows, &datasets, &algorithms, policy.as_ref())?;
    info!(policy = policy.name(), datasets = scores.len(), "scored");

    export::save_score_matrix(&scores, out)
        .with_context(|| format!("failed to write {}", out.display()))?;
    println!("Scores written to: {}", out.display());
    Ok(())
}

fn run_rank(scores: &Path, higher_is_better: bool, out: &Path) -> Result<()> {
    let matrix = export::load_score_matrix(scores)
        .with_context(|| format!("failed to read {}", scores.display()))?;
    let ranks = rank_rows(&matrix, higher_is_better);

    export::save_rank_table(&ranks, out)
        .with_context(|| format!("failed to write {}", out.display()))?;
    print_mean_ranks(&ranks);
    println!("Ranks written to: {}", out.display());
    Ok(())
}

fn run_config(path: &Path, output_dir: Option<PathBuf>) -> Result<()> {
    let config = AggregationConfig::from_file(path)?;
    let run_id = config.run_id()?;
    info!(path = %path.display(), run_id = %&run_id[..12], "loaded config");

    let output = run_pipeline(&Collector::filesystem(), &config)?;

    let base = output_dir.unwrap_or_else(|| config.output_dir.clone());
    let dirname = format!(
        "{}_{}",
        &run_id[..12],
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = save_outputs(&output, &config, &base.join(dirname))?;

    print_mean_ranks(&output.ranks);
    println!("Outputs saved to: {}", run_dir.display());
    Ok(())
}

fn print_mean_ranks(ranks: &RankTable) {
    println!();
    println!("=== Mean Rank ({} datasets) ===", ranks.rows.len());
    for (algorithm, value) in ranks.columns.iter().zip(&ranks.summary.values) {
        match value {
            Some(v) => println!("  {algorithm:<24} {v:.3}"),
            None => println!("  {algorithm:<24} {}", export::MISSING),
        }
    }
    println!();
}
