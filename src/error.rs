//! Error types for the load benchmark driver.

use thiserror::Error;

/// Main error type for the benchmark driver.
#[derive(Error, Debug)]
pub enum Error {
    /// A phase flag was given without one of the flags it depends on.
    #[error("Missing arg: {missing} is required with the {required_by} command.")]
    MissingArg {
        missing: &'static str,
        required_by: &'static str,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Schema file error: {0}")]
    SchemaFile(String),

    /// A blob or combination path that does not follow the bucket layout.
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// An external tool (`bq`, `gcloud`, a pipeline script) exited unsuccessfully.
    #[error("{program} exited with {status}: {stderr}")]
    Tool {
        program: String,
        status: String,
        stderr: String,
    },

    /// A table is too large to be exported to a single file.
    #[error("Table too large for a single-file export: {0}")]
    TooLarge(String),

    /// A BigQuery job finished with an error.
    #[error("Job {job_id} failed: {message}")]
    JobFailed { job_id: String, message: String },

    /// A tool answered with output we could not interpret.
    #[error("Unexpected response from {0}")]
    Response(String),
}

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;
