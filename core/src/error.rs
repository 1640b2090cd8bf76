use std::path::PathBuf;
use thiserror::Error;

/// Fatal failures while loading the item table. A process that hits one of
/// these must not start serving queries.
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("data source not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed csv in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("malformed json in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path} is missing required column `{column}`")]
    MissingColumn { path: PathBuf, column: String },
    #[error("no usable records (every row lacked a key or a non-empty descriptor)")]
    EmptyCorpus,
    #[error("unsupported data source {0} (expected .csv, .json, .jsonl or a directory)")]
    Unsupported(PathBuf),
}

/// A display field could not be decoded. Callers recover by showing the raw value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed display field at byte {offset}: {reason}")]
pub struct MalformedRecordError {
    pub offset: usize,
    pub reason: &'static str,
}
