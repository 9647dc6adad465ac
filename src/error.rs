use thiserror::Error;

/// Convenience result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Error type returned across ingestion, registry, output and driver code.
///
/// Per-file errors are caught by [`crate::pipeline::Pipeline`]; only run-level failures
/// (configuration, lookup loading, source listing) reach the caller.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "excel")]
    /// Excel ingestion error (feature-gated behind `excel`).
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// CSV read or write error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Run summary could not be encoded.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The input does not carry the expected columns.
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// A value could not be parsed into the required [`crate::types::DataType`].
    #[error("failed to parse value at row {row} column '{column}': {message} (raw='{raw}')")]
    ParseError {
        row: usize,
        column: String,
        raw: String,
        message: String,
    },

    /// Invalid or unreadable configuration.
    #[error("config error: {0}")]
    Config(String),

    /// One or more output artifacts could not be written.
    #[error("failed to write {} artifact(s): {}", failures.len(), failures.join("; "))]
    Output { failures: Vec<String> },

    /// The processed-file registry could not be read or appended.
    #[error("registry error at {path}: {source}")]
    Registry {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
