//! Run artifacts: the key/value blobs written once per experiment run.
//!
//! Collection reads artifacts through two seams:
//! - [`ArtifactStore`] loads one key of one run artifact;
//! - [`DirectoryLister`] enumerates the directory tree.
//!
//! The bundled implementations read JSON artifacts from the local file system.
//! Every failure is an error; nothing is defaulted.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{trace, warn};

/// Keys every run artifact must carry.
pub mod keys {
    pub const TRAINING_ANOMALY_SCORE: &str = "training_anomaly_score";
    pub const TRAINING_LABELS: &str = "training_labels";
    pub const TESTING_ANOMALY_SCORE: &str = "testing_anomaly_score";
    pub const TESTING_LABELS: &str = "testing_labels";
    pub const FIT_TIME: &str = "fit_time";
    pub const PREDICT_TIME: &str = "predict_time";

    pub const ALL: [&str; 6] = [
        TRAINING_ANOMALY_SCORE,
        TRAINING_LABELS,
        TESTING_ANOMALY_SCORE,
        TESTING_LABELS,
        FIT_TIME,
        PREDICT_TIME,
    ];
}

/// Errors from the artifact layer.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} is not a key/value artifact", path.display())]
    NotAnObject { path: PathBuf },

    #[error("{}: missing key '{key}'", path.display())]
    MissingKey { path: PathBuf, key: String },

    #[error("{}: key '{key}' is not {expected}", path.display())]
    WrongShape {
        path: PathBuf,
        key: String,
        expected: &'static str,
    },
}

/// A loaded value: numeric array or scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactValue {
    Array(Vec<f64>),
    Scalar(f64),
}

impl ArtifactValue {
    pub fn into_array(self, path: &Path, key: &str) -> Result<Vec<f64>, ArtifactError> {
        match self {
            Self::Array(values) => Ok(values),
            Self::Scalar(_) => Err(ArtifactError::WrongShape {
                path: path.to_path_buf(),
                key: key.to_string(),
                expected: "an array",
            }),
        }
    }

    pub fn into_scalar(self, path: &Path, key: &str) -> Result<f64, ArtifactError> {
        match self {
            Self::Scalar(value) => Ok(value),
            Self::Array(_) => Err(ArtifactError::WrongShape {
                path: path.to_path_buf(),
                key: key.to_string(),
                expected: "a scalar",
            }),
        }
    }
}

/// Loads one key of a run artifact. Absent keys must be an error.
pub trait ArtifactStore {
    fn load(&self, path: &Path, key: &str) -> Result<ArtifactValue, ArtifactError>;
}

/// Which entries a directory listing should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
}

/// Enumerates entry names under a directory.
pub trait DirectoryLister {
    fn list(&self, path: &Path, kind: EntryKind) -> Result<Vec<String>, ArtifactError>;
}

impl<T: ArtifactStore + ?Sized> ArtifactStore for &T {
    fn load(&self, path: &Path, key: &str) -> Result<ArtifactValue, ArtifactError> {
        (**self).load(path, key)
    }
}

impl<T: DirectoryLister + ?Sized> DirectoryLister for &T {
    fn list(&self, path: &Path, kind: EntryKind) -> Result<Vec<String>, ArtifactError> {
        (**self).list(path, kind)
    }
}

// ─── JSON store ──────────────────────────────────────────────────────

/// Full contents of a run artifact, as written by experiment drivers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunArtifact {
    pub training_anomaly_score: Vec<f64>,
    pub training_labels: Vec<f64>,
    pub testing_anomaly_score: Vec<f64>,
    pub testing_labels: Vec<f64>,
    pub fit_time: f64,
    pub predict_time: f64,
}

impl RunArtifact {
    /// Write as a JSON artifact. NaN scores are stored as `null`.
    pub fn save_json(&self, path: &Path) -> Result<(), ArtifactError> {
        let json = serde_json::to_vec(self).map_err(|source| ArtifactError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ArtifactError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, json).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Reads run artifacts stored as JSON objects.
///
/// Numbers decode as scalars, arrays of numbers as arrays; `null` array
/// entries decode as NaN. The last parsed artifact is kept so loading its six
/// keys reads the file once.
#[derive(Debug, Default)]
pub struct JsonArtifactStore {
    last: RefCell<Option<(PathBuf, Map<String, Value>)>>,
}

impl JsonArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_object(path: &Path) -> Result<Map<String, Value>, ArtifactError> {
        let bytes = fs::read(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match serde_json::from_slice(&bytes) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(ArtifactError::NotAnObject {
                path: path.to_path_buf(),
            }),
            Err(source) => Err(ArtifactError::Json {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

impl ArtifactStore for JsonArtifactStore {
    fn load(&self, path: &Path, key: &str) -> Result<ArtifactValue, ArtifactError> {
        let mut last = self.last.borrow_mut();
        let cached = matches!(last.as_ref(), Some((p, _)) if p == path);
        if !cached {
            trace!(path = %path.display(), "reading artifact");
            *last = Some((path.to_path_buf(), Self::read_object(path)?));
        }

        let value = last
            .as_ref()
            .and_then(|(_, map)| map.get(key))
            .ok_or_else(|| ArtifactError::MissingKey {
                path: path.to_path_buf(),
                key: key.to_string(),
            })?;
        decode_value(path, key, value)
    }
}

fn decode_value(path: &Path, key: &str, value: &Value) -> Result<ArtifactValue, ArtifactError> {
    let wrong_shape = || ArtifactError::WrongShape {
        path: path.to_path_buf(),
        key: key.to_string(),
        expected: "a number or an array of numbers",
    };

    match value {
        Value::Number(n) => n.as_f64().map(ArtifactValue::Scalar).ok_or_else(wrong_shape),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Number(n) => n.as_f64().ok_or_else(wrong_shape),
                Value::Null => Ok(f64::NAN),
                _ => Err(wrong_shape()),
            })
            .collect::<Result<Vec<f64>, _>>()
            .map(ArtifactValue::Array),
        _ => Err(wrong_shape()),
    }
}

// ─── File-system lister ──────────────────────────────────────────────

/// Lists directory entries with `std::fs::read_dir`.
///
/// Symlinks are classified by their target. Hidden entries (leading `.`) and
/// names that are not valid UTF-8 are skipped. Names come back sorted so collection order is deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLister;

impl DirectoryLister for FsLister {
    fn list(&self, path: &Path, kind: EntryKind) -> Result<Vec<String>, ArtifactError> {
        let io_err = |source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut names = Vec::new();
        for entry in fs::read_dir(path).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            // metadata follows symlinks; a dangling link fails loudly
            let is_dir = fs::metadata(entry.path())
                .map_err(|source| ArtifactError::Io {
                    path: entry.path(),
                    source,
                })?
                .is_dir();
            if is_dir != (kind == EntryKind::Directory) {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                warn!(path = %path.display(), "skipping non UTF-8 entry");
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            names.push(name);
        }
        names.sort();
        Ok(names)
    }
}
