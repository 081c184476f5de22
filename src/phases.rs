//! Capability interfaces of the five benchmark phases.
//!
//! The dispatcher only sees these traits. [`Collaborators`] builds one
//! implementation per phase from the identifiers the phase needs, which lets
//! tests substitute doubles for the cloud-backed implementations.

use std::path::PathBuf;

use crate::error::Result;
use crate::params::FileParameters;

/// Creates a table from a JSON schema file.
pub trait TableCreator {
    fn create_table(&self) -> Result<()>;
}

/// Writes the benchmark table schemas.
pub trait SchemaGenerator {
    /// Returns the paths of the written schema files.
    fn create_schemas(&self) -> Result<Vec<PathBuf>>;
}

/// Creates the staging tables and their resized copies.
pub trait StagingTableGenerator {
    fn create_staging_tables(
        &self,
        dataflow_staging_location: &str,
        dataflow_temp_location: &str,
    ) -> Result<()>;

    fn create_resized_tables(&self) -> Result<()>;
}

/// Generates the load files in the bucket.
pub trait FileGenerator {
    /// Finish a combination that was interrupted after `restart_file` was written.
    fn restart_incomplete_combination(&self, restart_file: &str) -> Result<()>;

    fn create_files(&self) -> Result<()>;
}

/// Loads the files into benchmark tables and records the results.
pub trait LoadTablesProcessor {
    fn create_benchmark_tables(&self) -> Result<()>;
}

/// Identifiers of the results table.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsTableSpec {
    pub table_id: String,
    pub dataset_id: String,
    pub schema_path: PathBuf,
}

/// Inputs of schema generation.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaSpec {
    pub schemas_dir: PathBuf,
    pub file_params: FileParameters,
}

/// Inputs of staging table generation.
#[derive(Debug, Clone, PartialEq)]
pub struct StagingSpec {
    pub project: String,
    pub staging_dataset_id: String,
    pub resized_dataset_id: String,
    pub schema_dir: PathBuf,
    pub file_params: FileParameters,
    pub num_rows: u64,
}

/// Inputs of load file generation.
#[derive(Debug, Clone, PartialEq)]
pub struct FileGenSpec {
    pub project_id: String,
    pub resized_dataset_id: String,
    pub bucket_name: String,
    pub file_params: FileParameters,
    pub dataflow_staging_location: String,
    pub dataflow_temp_location: String,
}

/// Inputs of benchmark table creation.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadSpec {
    pub benchmark_name: String,
    pub bq_project: String,
    /// Project of the bucket; the default project when not given.
    pub gcs_project: Option<String>,
    pub staging_project: String,
    pub staging_dataset_id: String,
    pub dataset_id: String,
    pub bucket_name: String,
    pub results_table_name: String,
    pub results_dataset_id: String,
    /// Load combinations again even when the results table already has them.
    pub duplicate_benchmark_tables: bool,
    pub file_params: FileParameters,
    pub bq_logs_dataset: String,
}

/// Builds the collaborator of each phase.
pub trait Collaborators {
    fn table_creator(&self, spec: ResultsTableSpec) -> Result<Box<dyn TableCreator>>;

    fn schema_generator(&self, spec: SchemaSpec) -> Result<Box<dyn SchemaGenerator>>;

    fn staging_table_generator(
        &self,
        spec: StagingSpec,
    ) -> Result<Box<dyn StagingTableGenerator>>;

    fn file_generator(&self, spec: FileGenSpec) -> Result<Box<dyn FileGenerator>>;

    fn load_tables_processor(&self, spec: LoadSpec) -> Result<Box<dyn LoadTablesProcessor>>;
}
