//! AD-Lab Runner: everything around the scoring kernel that touches disk.
//!
//! - `artifact`: per-run key/value artifacts and the store/lister seams
//! - `collector`: walk `dataset/algorithm/iteration/run` and build result rows
//! - `export`: CSV for result, score and rank tables
//! - `config`: TOML aggregation config with a content-hash run id
//! - `pipeline`: collect → select → rank → save

pub mod artifact;
pub mod collector;
pub mod config;
pub mod export;
pub mod pipeline;

pub use artifact::{
    ArtifactError, ArtifactStore, ArtifactValue, DirectoryLister, EntryKind, FsLister,
    JsonArtifactStore, RunArtifact,
};
pub use collector::{CollectError, Collector, RunCoordinates};
pub use config::{AggregationConfig, ConfigError, RunId};
pub use export::TableError;
pub use pipeline::{run_pipeline, save_outputs, PipelineOutput, RunManifest};
