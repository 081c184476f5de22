//! Invocation configuration and validation of flag combinations.
//!
//! Every option is optional on the command line. Which ones are required
//! depends on the phases requested; [`DEPENDENCIES`] lists, for each phase
//! flag, the flags that must accompany it.

use std::path::PathBuf;

use crate::error::{Error, Result};

pub const DEFAULT_SCHEMAS_DIR: &str = "json_schemas/benchmark_table_schemas";
pub const DEFAULT_RESULTS_SCHEMA_PATH: &str = "json_schemas/results_table_schema.json";

/// All options of one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkConfig {
    pub create_results_table: bool,
    pub create_benchmark_schemas: bool,
    pub benchmark_table_schemas_directory: PathBuf,
    pub create_staging_tables: bool,
    pub create_files: bool,
    pub restart_file: Option<String>,
    pub create_benchmark_tables: bool,
    pub duplicate_benchmark_tables: bool,
    pub bq_project_id: Option<String>,
    pub benchmark_dataset_id: Option<String>,
    pub staging_project_id: Option<String>,
    pub staging_dataset_id: Option<String>,
    pub resized_staging_dataset_id: Option<String>,
    pub results_table_name: Option<String>,
    pub results_dataset_id: Option<String>,
    pub results_table_schema_path: PathBuf,
    pub gcs_project_id: Option<String>,
    pub bucket_name: Option<String>,
    pub dataflow_temp_location: Option<String>,
    pub dataflow_staging_location: Option<String>,
    pub bq_logs_dataset: Option<String>,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            create_results_table: false,
            create_benchmark_schemas: false,
            benchmark_table_schemas_directory: PathBuf::from(DEFAULT_SCHEMAS_DIR),
            create_staging_tables: false,
            create_files: false,
            restart_file: None,
            create_benchmark_tables: false,
            duplicate_benchmark_tables: false,
            bq_project_id: None,
            benchmark_dataset_id: None,
            staging_project_id: None,
            staging_dataset_id: None,
            resized_staging_dataset_id: None,
            results_table_name: None,
            results_dataset_id: None,
            results_table_schema_path: PathBuf::from(DEFAULT_RESULTS_SCHEMA_PATH),
            gcs_project_id: None,
            bucket_name: None,
            dataflow_temp_location: None,
            dataflow_staging_location: None,
            bq_logs_dataset: None,
        }
    }
}

/// Command-line flags that take part in validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    CreateResultsTable,
    CreateStagingTables,
    CreateFiles,
    RestartFile,
    CreateBenchmarkTables,
    BqProjectId,
    BenchmarkDatasetId,
    StagingProjectId,
    StagingDatasetId,
    ResizedStagingDatasetId,
    ResultsTableName,
    ResultsDatasetId,
    GcsProjectId,
    BucketName,
    DataflowTempLocation,
    DataflowStagingLocation,
    BqLogsDataset,
}

impl Flag {
    /// The flag as typed on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Flag::CreateResultsTable => "--create_results_table",
            Flag::CreateStagingTables => "--create_staging_tables",
            Flag::CreateFiles => "--create_files",
            Flag::RestartFile => "--restart_file",
            Flag::CreateBenchmarkTables => "--create_benchmark_tables",
            Flag::BqProjectId => "--bq_project_id",
            Flag::BenchmarkDatasetId => "--benchmark_dataset_id",
            Flag::StagingProjectId => "--staging_project_id",
            Flag::StagingDatasetId => "--staging_dataset_id",
            Flag::ResizedStagingDatasetId => "--resized_staging_dataset_id",
            Flag::ResultsTableName => "--results_table_name",
            Flag::ResultsDatasetId => "--results_dataset_id",
            Flag::GcsProjectId => "--gcs_project_id",
            Flag::BucketName => "--bucket_name",
            Flag::DataflowTempLocation => "--dataflow_temp_location",
            Flag::DataflowStagingLocation => "--dataflow_staging_location",
            Flag::BqLogsDataset => "--bq_logs_dataset",
        }
    }

    /// Whether the flag was given. Empty strings count as missing.
    pub fn is_set(self, config: &BenchmarkConfig) -> bool {
        match self {
            Flag::CreateResultsTable => config.create_results_table,
            Flag::CreateStagingTables => config.create_staging_tables,
            Flag::CreateFiles => config.create_files,
            Flag::CreateBenchmarkTables => config.create_benchmark_tables,
            _ => self.value(config).is_some(),
        }
    }

    /// Value of a string-valued flag, if given and non-empty.
    pub fn value(self, config: &BenchmarkConfig) -> Option<&str> {
        let value = match self {
            Flag::RestartFile => &config.restart_file,
            Flag::BqProjectId => &config.bq_project_id,
            Flag::BenchmarkDatasetId => &config.benchmark_dataset_id,
            Flag::StagingProjectId => &config.staging_project_id,
            Flag::StagingDatasetId => &config.staging_dataset_id,
            Flag::ResizedStagingDatasetId => &config.resized_staging_dataset_id,
            Flag::ResultsTableName => &config.results_table_name,
            Flag::ResultsDatasetId => &config.results_dataset_id,
            Flag::GcsProjectId => &config.gcs_project_id,
            Flag::BucketName => &config.bucket_name,
            Flag::DataflowTempLocation => &config.dataflow_temp_location,
            Flag::DataflowStagingLocation => &config.dataflow_staging_location,
            Flag::BqLogsDataset => &config.bq_logs_dataset,
            Flag::CreateResultsTable
            | Flag::CreateStagingTables
            | Flag::CreateFiles
            | Flag::CreateBenchmarkTables => return None,
        };
        value.as_deref().filter(|s| !s.is_empty())
    }
}

/// Phase flags and the flags each of them requires, in checking order.
pub const DEPENDENCIES: &[(Flag, &[Flag])] = &[
    (
        Flag::CreateResultsTable,
        &[Flag::ResultsTableName, Flag::ResultsDatasetId],
    ),
    (
        Flag::CreateStagingTables,
        &[
            Flag::BqProjectId,
            Flag::StagingDatasetId,
            Flag::ResizedStagingDatasetId,
            Flag::DataflowStagingLocation,
            Flag::DataflowTempLocation,
        ],
    ),
    (
        Flag::CreateFiles,
        &[
            Flag::GcsProjectId,
            Flag::ResizedStagingDatasetId,
            Flag::BucketName,
            Flag::DataflowStagingLocation,
            Flag::DataflowTempLocation,
        ],
    ),
    (Flag::RestartFile, &[Flag::CreateFiles]),
    (
        Flag::CreateBenchmarkTables,
        &[
            Flag::BqProjectId,
            Flag::StagingProjectId,
            Flag::StagingDatasetId,
            Flag::BenchmarkDatasetId,
            Flag::BucketName,
            Flag::ResultsTableName,
            Flag::ResultsDatasetId,
            Flag::BqLogsDataset,
        ],
    ),
];

impl BenchmarkConfig {
    /// Check every phase flag against [`DEPENDENCIES`]; the first missing
    /// companion is reported.
    pub fn validate(&self) -> Result<()> {
        for &(trigger, companions) in DEPENDENCIES {
            if !trigger.is_set(self) {
                continue;
            }
            if let Some(missing) = companions.iter().find(|flag| !flag.is_set(self)) {
                return Err(Error::MissingArg {
                    missing: missing.name(),
                    required_by: trigger.name(),
                });
            }
        }
        Ok(())
    }

    /// Value of a flag that `required_by` depends on.
    ///
    /// After [`validate`](Self::validate) succeeds this only fails when the
    /// flag is missing from [`DEPENDENCIES`].
    pub fn require(&self, flag: Flag, required_by: Flag) -> Result<String> {
        flag.value(self)
            .map(str::to_string)
            .ok_or(Error::MissingArg {
                missing: flag.name(),
                required_by: required_by.name(),
            })
    }
}
