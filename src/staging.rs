//! Staging tables: generated sample data and its resized copies.
//!
//! Staging tables are produced by the Dataflow data generator pipeline, one
//! per (column types, column count) pair. Each staging table is then resized
//! to every target size with the table resizer script.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{error, info};

use crate::cloud::{ScriptRunner, Warehouse};
use crate::error::Result;
use crate::layout::resized_table_name;
use crate::phases::{StagingSpec, StagingTableGenerator};

const GENERATOR_PIPELINE: &str = "data-generator-pipeline";
const RESIZER_SCRIPTS: &str = "bigquery-scripts";
const WORKER_MACHINE_TYPE: &str = "n1-highcpu-32";

/// One resize job.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeStep {
    pub source_dataset: String,
    pub source_table: String,
    pub destination_table: String,
    pub target_gb: f64,
}

/// Runs the data generator tooling for the staging datasets.
pub struct StagingTables {
    warehouse: Arc<dyn Warehouse>,
    runner: Arc<dyn ScriptRunner>,
    spec: StagingSpec,
    data_generator_dir: PathBuf,
    python: String,
}

impl StagingTables {
    pub fn new(
        warehouse: Arc<dyn Warehouse>,
        runner: Arc<dyn ScriptRunner>,
        spec: StagingSpec,
        data_generator_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            warehouse,
            runner,
            spec,
            data_generator_dir: data_generator_dir.into(),
            python: "python".to_string(),
        }
    }

    /// Interpreter used for the generator scripts.
    pub fn with_python(mut self, python: impl Into<String>) -> Self {
        self.python = python.into();
        self
    }

    fn tool_dir(&self, sub_dir: &str) -> PathBuf {
        self.data_generator_dir.join(sub_dir)
    }

    /// Arguments of the generator pipeline for one staging table.
    pub fn pipeline_args(
        &self,
        schema_name: &str,
        dataflow_staging_location: &str,
        dataflow_temp_location: &str,
    ) -> Vec<String> {
        let pipeline_dir = self.tool_dir(GENERATOR_PIPELINE);
        let project = &self.spec.project;
        vec![
            display(&pipeline_dir.join("data_generator_pipeline.py")),
            format!(
                "--schema_file={}",
                display(&self.spec.schema_dir.join(format!("{}.json", schema_name)))
            ),
            format!("--num_records={}", self.spec.num_rows),
            format!(
                "--output_bq_table={}:{}.{}",
                project, self.spec.staging_dataset_id, schema_name
            ),
            format!("--project={}", project),
            format!("--setup_file={}", display(&pipeline_dir.join("setup.py"))),
            format!("--staging_location={}", dataflow_staging_location),
            format!("--temp_location={}", dataflow_temp_location),
            "--save_main_session".to_string(),
            format!("--worker_machine_type={}", WORKER_MACHINE_TYPE),
            "--runner=DataflowRunner".to_string(),
        ]
    }

    /// Arguments of the resizer script for one step.
    pub fn resize_args(&self, step: &ResizeStep) -> Vec<String> {
        vec![
            display(&self.tool_dir(RESIZER_SCRIPTS).join("bq_table_resizer.py")),
            "--project".to_string(),
            self.spec.project.clone(),
            "--source_dataset".to_string(),
            step.source_dataset.clone(),
            "--source_table".to_string(),
            step.source_table.clone(),
            "--destination_dataset".to_string(),
            self.spec.resized_dataset_id.clone(),
            "--destination_table".to_string(),
            step.destination_table.clone(),
            "--target_gb".to_string(),
            format!("{:.6}", step.target_gb),
        ]
    }

    /// Resize steps for `tables`, smallest size first.
    ///
    /// The smallest size is cut from the staging table; every larger size
    /// grows the previous resized table.
    pub fn resize_plan(&self, tables: &[String]) -> Vec<ResizeStep> {
        let mut sizes = self.spec.file_params.target_data_sizes.clone();
        sizes.sort_by(|a, b| a.total_cmp(b));

        let mut steps = Vec::with_capacity(tables.len() * sizes.len());
        for table in tables {
            for (i, &size) in sizes.iter().enumerate() {
                let (source_dataset, source_table) = if i > 0 && size > sizes[i - 1] {
                    (
                        self.spec.resized_dataset_id.clone(),
                        resized_table_name(table, sizes[i - 1]),
                    )
                } else {
                    (self.spec.staging_dataset_id.clone(), table.clone())
                };
                steps.push(ResizeStep {
                    source_dataset,
                    source_table,
                    destination_table: resized_table_name(table, size),
                    target_gb: size,
                });
            }
        }
        steps
    }

    /// Schema names (`{column_types}_{num_columns}`) of every staging table.
    pub fn schema_names(&self) -> Vec<String> {
        let params = &self.spec.file_params;
        params
            .column_types
            .iter()
            .flat_map(|column_types| {
                params
                    .num_columns
                    .iter()
                    .map(move |n| format!("{}_{}", column_types, n))
            })
            .collect()
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

impl StagingTableGenerator for StagingTables {
    fn create_staging_tables(
        &self,
        dataflow_staging_location: &str,
        dataflow_temp_location: &str,
    ) -> Result<()> {
        let results: Vec<Result<()>> = self
            .schema_names()
            .par_iter()
            .map(|schema_name| {
                info!("Creating staging table for schema: {}", schema_name);
                let args =
                    self.pipeline_args(schema_name, dataflow_staging_location, dataflow_temp_location);
                self.runner.run(&self.python, &args).inspect_err(|e| {
                    error!("Staging table {} failed: {}", schema_name, e);
                })
            })
            .collect();

        results.into_iter().collect()
    }

    fn create_resized_tables(&self) -> Result<()> {
        let tables = self
            .warehouse
            .list_tables(Some(&self.spec.project), &self.spec.staging_dataset_id)?;

        for step in self.resize_plan(&tables) {
            self.runner.run(&self.python, &self.resize_args(&step))?;
            info!("Created resized table from {}", step.source_table);
            info!("Resized table complete: {}", step.destination_table);
        }
        Ok(())
    }
}
