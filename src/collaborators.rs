//! Collaborators backed by the cloud command-line tools.

use std::path::PathBuf;
use std::sync::Arc;

use crate::cloud::{BqCli, GcsCli, ProcessRunner};
use crate::error::Result;
use crate::files::LoadFileGenerator;
use crate::load::LoadTables;
use crate::phases::{
    Collaborators, FileGenSpec, FileGenerator, LoadSpec, LoadTablesProcessor, ResultsTableSpec,
    SchemaGenerator, SchemaSpec, StagingSpec, StagingTableGenerator, TableCreator,
};
use crate::results_table::SchemaFileTable;
use crate::schema::SchemaCreator;
use crate::staging::StagingTables;

/// Builds each phase on top of `bq`, `gcloud storage` and the data generator
/// scripts.
#[derive(Debug, Clone)]
pub struct CloudCollaborators {
    /// Project of the results table, when given.
    pub default_project: Option<String>,
    /// BigQuery location of jobs.
    pub location: String,
    /// Checkout of the Dataflow data generator tooling.
    pub data_generator_dir: PathBuf,
    /// Dataflow pipeline exporting large avro and parquet files.
    pub export_pipeline: PathBuf,
    pub show_progress: bool,
}

impl CloudCollaborators {
    fn bq(&self, project: Option<&str>) -> Arc<BqCli> {
        Arc::new(BqCli::new(project, &self.location))
    }
}

impl Collaborators for CloudCollaborators {
    fn table_creator(&self, spec: ResultsTableSpec) -> Result<Box<dyn TableCreator>> {
        let project = self.default_project.as_deref();
        Ok(Box::new(SchemaFileTable::new(self.bq(project), project, spec)))
    }

    fn schema_generator(&self, spec: SchemaSpec) -> Result<Box<dyn SchemaGenerator>> {
        Ok(Box::new(SchemaCreator::new(spec.schemas_dir, spec.file_params)))
    }

    fn staging_table_generator(
        &self,
        spec: StagingSpec,
    ) -> Result<Box<dyn StagingTableGenerator>> {
        let warehouse = self.bq(Some(&spec.project));
        Ok(Box::new(StagingTables::new(
            warehouse,
            Arc::new(ProcessRunner),
            spec,
            self.data_generator_dir.clone(),
        )))
    }

    fn file_generator(&self, spec: FileGenSpec) -> Result<Box<dyn FileGenerator>> {
        let warehouse = self.bq(Some(&spec.project_id));
        let store = Arc::new(GcsCli::new(Some(&spec.project_id)));
        Ok(Box::new(
            LoadFileGenerator::new(warehouse, store, Arc::new(ProcessRunner), spec)
                .with_export_pipeline("python", self.export_pipeline.clone())
                .with_progress(self.show_progress),
        ))
    }

    fn load_tables_processor(&self, spec: LoadSpec) -> Result<Box<dyn LoadTablesProcessor>> {
        let warehouse = self.bq(Some(&spec.bq_project));
        let store = Arc::new(GcsCli::new(spec.gcs_project.as_deref()));
        Ok(Box::new(LoadTables::new(warehouse, store, spec)))
    }
}
