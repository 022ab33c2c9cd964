use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by logspark.
#[derive(Error, Debug)]
pub enum SparkError {
    /// An input line could not be decoded as JSON.
    #[error("Failed to decode record on line {line}: {source}")]
    Decode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// An input line was valid JSON but not an object.
    #[error("Record on line {line} is not a JSON object")]
    NotAnObject { line: usize },

    /// An access-log line did not match the configured log format.
    #[error("Line {line} does not match the log format")]
    LineMismatch { line: usize },

    /// The named `log_format` is not declared in the nginx config.
    #[error("log_format {name:?} not found in {path}")]
    FormatNotFound { name: String, path: PathBuf },

    /// A log format string could not be turned into a line parser.
    #[error("Invalid log format: {0}")]
    InvalidFormat(String),

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SparkError {
    /// `true` for errors caused by a single malformed input unit, which a
    /// skipping ingestion policy may step over.
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            SparkError::Decode { .. } | SparkError::NotAnObject { .. } | SparkError::LineMismatch { .. }
        )
    }
}

/// Convenience alias used throughout the logspark crates.
pub type Result<T> = std::result::Result<T, SparkError>;
