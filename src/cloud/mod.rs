//! Access to BigQuery, Cloud Storage and the batch pipelines.
//!
//! The traits here are the seams the collaborators are written against. The
//! production implementations shell out to the `bq` and `gcloud storage`
//! command-line tools and to the data generator scripts.

pub mod bq;
pub mod gcs;
pub mod process;

use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::layout::BYTES_IN_MB;
use crate::params::Compression;
use crate::schema::{summarize_column_types, BqSchemaField};

pub use bq::BqCli;
pub use gcs::GcsCli;
pub use process::ProcessRunner;

/// Fully qualified BigQuery table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    /// Project of the table; the tool's default project when `None`.
    pub project: Option<String>,
    pub dataset: String,
    pub table: String,
}

impl TableRef {
    pub fn new(project: Option<&str>, dataset: &str, table: &str) -> Self {
        Self {
            project: project.map(str::to_string),
            dataset: dataset.to_string(),
            table: table.to_string(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.project {
            Some(project) => write!(f, "{}:{}.{}", project, self.dataset, self.table),
            None => write!(f, "{}.{}", self.dataset, self.table),
        }
    }
}

/// Metadata of an existing table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableInfo {
    pub schema: Vec<BqSchemaField>,
    pub num_rows: u64,
    pub num_bytes: u64,
}

impl TableInfo {
    pub fn num_columns(&self) -> usize {
        self.schema.len()
    }

    /// Column type mix of the table, e.g. `100_STRING`.
    pub fn column_types(&self) -> String {
        summarize_column_types(&self.schema)
    }

    /// Size in whole MB.
    pub fn size_mb(&self) -> u64 {
        self.num_bytes / BYTES_IN_MB
    }
}

/// Settings of an extract job.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    pub destination_format: &'static str,
    pub compression: Compression,
    pub print_header: bool,
}

/// Settings of a load job.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    pub source_format: &'static str,
    pub skip_leading_rows: u32,
}

/// State and statistics of a finished BigQuery job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobInfo {
    pub job_id: String,
    pub user_email: Option<String>,
    pub location: Option<String>,
    pub created: DateTime<Utc>,
    pub started: DateTime<Utc>,
    pub ended: DateTime<Utc>,
    pub input_files: Option<u64>,
    pub source_format: Option<String>,
}

impl JobInfo {
    /// Wall-clock duration of the job in seconds.
    pub fn duration_secs(&self) -> f64 {
        (self.ended - self.started).num_milliseconds() as f64 / 1000.0
    }
}

/// BigQuery operations used by the benchmark.
pub trait Warehouse: Send + Sync {
    /// Table ids in a dataset.
    fn list_tables(&self, project: Option<&str>, dataset: &str) -> Result<Vec<String>>;

    fn get_table(&self, table: &TableRef) -> Result<TableInfo>;

    /// Create a table; without a schema BigQuery takes it from the loaded files.
    fn create_table(&self, table: &TableRef, schema: Option<&[BqSchemaField]>) -> Result<()>;

    fn delete_table(&self, table: &TableRef) -> Result<()>;

    /// Export a table to `destination_uri`.
    ///
    /// Returns [`crate::Error::TooLarge`] when the table does not fit in a
    /// single file and the URI has no wildcard.
    fn extract_table(
        &self,
        table: &TableRef,
        destination_uri: &str,
        options: &ExtractOptions,
    ) -> Result<()>;

    /// Run a load job to completion.
    ///
    /// Returns [`crate::Error::JobFailed`] when the job ends with an error.
    fn load_table(
        &self,
        table: &TableRef,
        source_uri: &str,
        options: &LoadOptions,
    ) -> Result<JobInfo>;

    /// Run a standard SQL query and return its rows as JSON objects.
    fn query(&self, sql: &str) -> Result<Vec<serde_json::Value>>;

    fn insert_rows(&self, table: &TableRef, rows: &[serde_json::Value]) -> Result<()>;
}

/// Cloud Storage operations used by the benchmark. Names are blob names
/// inside `bucket`, without the `gs://` prefix.
pub trait ObjectStore: Send + Sync {
    fn exists(&self, bucket: &str, name: &str) -> Result<bool>;

    /// Size of a blob in bytes.
    fn size(&self, bucket: &str, name: &str) -> Result<u64>;

    fn copy(&self, bucket: &str, source: &str, destination: &str) -> Result<()>;

    /// Blob names starting with `prefix`.
    fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>>;

    /// Concatenate `sources` into `destination`.
    fn compose(&self, bucket: &str, sources: &[String], destination: &str) -> Result<()>;

    fn delete(&self, bucket: &str, names: &[String]) -> Result<()>;
}

/// Launches external pipeline scripts.
pub trait ScriptRunner: Send + Sync {
    fn run(&self, program: &str, args: &[String]) -> Result<()>;
}

/// `gs://` URI of a blob.
pub fn object_uri(bucket: &str, name: &str) -> String {
    format!("gs://{}/{}", bucket, name)
}
