use thiserror::Error;

use crate::stream::Key;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("Arrow failure: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Column length mismatch: {keys} keys vs {timestamps} timestamps")]
    LengthMismatch { keys: usize, timestamps: usize },

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Unsupported type for column {column}: {data_type}")]
    UnsupportedColumnType { column: String, data_type: String },

    #[error("Key range [{min_key}, {max_key}] does not cover stream keys [{stream_min}, {stream_max}]")]
    InvalidKeyRange {
        min_key: Key,
        max_key: Key,
        stream_min: Key,
        stream_max: Key,
    },

    #[error("Stream is not time-ordered: timestamp at row {position} is earlier than row {}", .position.saturating_sub(1))]
    UnorderedStream { position: usize },

    #[error("Capacity exceeded for {what}: requested {requested}, limit {limit}")]
    Capacity {
        what: &'static str,
        requested: u128,
        limit: u128,
    },

    #[error("Chunk size must be at least 1")]
    InvalidChunkSize,

    #[error("Backend {backend} diverges at a_idx {a_idx}: expected {expected:?}, got {actual:?}")]
    Divergence {
        backend: String,
        a_idx: usize,
        expected: Option<u64>,
        actual: Option<u64>,
    },

    #[error("Malformed result at row {row}: a_idx {a_idx} {reason}")]
    MalformedResult {
        row: usize,
        a_idx: u64,
        reason: &'static str,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, MatchError>;

#[derive(Debug, Clone)]
pub struct Violation {
    pub severity: Severity,
    pub rule: String,
    pub message: String,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN",
            Severity::Info => "INFO",
        };
        write!(f, "[{prefix}] {}: {}", self.rule, self.message)
    }
}
