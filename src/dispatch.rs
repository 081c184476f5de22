//! Runs the requested phases in their fixed order.

use tracing::info;

use crate::config::{BenchmarkConfig, Flag};
use crate::error::Result;
use crate::params::FileParameters;
use crate::phases::{
    Collaborators, FileGenSpec, LoadSpec, ResultsTableSpec, SchemaSpec, StagingSpec,
};

/// Label recorded in every results row.
pub const BENCHMARK_NAME: &str = "FILE LOADER";

/// Rows generated into each staging table.
pub const STAGING_TABLE_ROWS: u64 = 500;

/// Run every enabled phase of `config`.
///
/// `config` must have passed [`BenchmarkConfig::validate`]. The first
/// collaborator error stops the run.
pub fn run_phases(
    config: &BenchmarkConfig,
    file_params: &FileParameters,
    collaborators: &dyn Collaborators,
) -> Result<()> {
    if config.create_results_table {
        let by = Flag::CreateResultsTable;
        let spec = ResultsTableSpec {
            table_id: config.require(Flag::ResultsTableName, by)?,
            dataset_id: config.require(Flag::ResultsDatasetId, by)?,
            schema_path: config.results_table_schema_path.clone(),
        };
        info!(
            "Creating results table {} in dataset {}",
            spec.table_id, spec.dataset_id
        );
        collaborators.table_creator(spec)?.create_table()?;
        info!("Done creating results table");
    }

    if config.create_benchmark_schemas {
        let spec = SchemaSpec {
            schemas_dir: config.benchmark_table_schemas_directory.clone(),
            file_params: file_params.clone(),
        };
        let written = collaborators.schema_generator(spec)?.create_schemas()?;
        info!(
            "Wrote {} benchmark table schemas to {}",
            written.len(),
            config.benchmark_table_schemas_directory.display()
        );
    }

    if config.create_staging_tables {
        let by = Flag::CreateStagingTables;
        let spec = StagingSpec {
            project: config.require(Flag::BqProjectId, by)?,
            staging_dataset_id: config.require(Flag::StagingDatasetId, by)?,
            resized_dataset_id: config.require(Flag::ResizedStagingDatasetId, by)?,
            schema_dir: config.benchmark_table_schemas_directory.clone(),
            file_params: file_params.clone(),
            num_rows: STAGING_TABLE_ROWS,
        };
        let staging_location = config.require(Flag::DataflowStagingLocation, by)?;
        let temp_location = config.require(Flag::DataflowTempLocation, by)?;

        let generator = collaborators.staging_table_generator(spec)?;
        generator.create_staging_tables(&staging_location, &temp_location)?;
        generator.create_resized_tables()?;
    }

    if config.create_files {
        let by = Flag::CreateFiles;
        let spec = FileGenSpec {
            project_id: config.require(Flag::GcsProjectId, by)?,
            resized_dataset_id: config.require(Flag::ResizedStagingDatasetId, by)?,
            bucket_name: config.require(Flag::BucketName, by)?,
            file_params: file_params.clone(),
            dataflow_staging_location: config.require(Flag::DataflowStagingLocation, by)?,
            dataflow_temp_location: config.require(Flag::DataflowTempLocation, by)?,
        };

        let generator = collaborators.file_generator(spec)?;
        if let Some(restart_file) = Flag::RestartFile.value(config) {
            generator.restart_incomplete_combination(restart_file)?;
        }
        generator.create_files()?;
    }

    if config.create_benchmark_tables {
        let by = Flag::CreateBenchmarkTables;
        let spec = LoadSpec {
            benchmark_name: BENCHMARK_NAME.to_string(),
            bq_project: config.require(Flag::BqProjectId, by)?,
            gcs_project: Flag::GcsProjectId.value(config).map(str::to_string),
            staging_project: config.require(Flag::StagingProjectId, by)?,
            staging_dataset_id: config.require(Flag::StagingDatasetId, by)?,
            dataset_id: config.require(Flag::BenchmarkDatasetId, by)?,
            bucket_name: config.require(Flag::BucketName, by)?,
            results_table_name: config.require(Flag::ResultsTableName, by)?,
            results_dataset_id: config.require(Flag::ResultsDatasetId, by)?,
            duplicate_benchmark_tables: config.duplicate_benchmark_tables,
            file_params: file_params.clone(),
            bq_logs_dataset: config.require(Flag::BqLogsDataset, by)?,
        };
        collaborators
            .load_tables_processor(spec)?
            .create_benchmark_tables()?;
    }

    Ok(())
}
