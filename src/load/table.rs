//! Loading one file combination into a new benchmark table.

use chrono::Utc;
use tracing::{error, info};

use crate::cloud::{object_uri, LoadOptions, ObjectStore, TableRef, Warehouse};
use crate::error::{Error, Result};
use crate::layout::CombinationPath;
use crate::load::results::{parse_slot_usage, slot_usage_query, LoadMeasurement, ResultRow};
use crate::params::FileType;
use crate::phases::LoadSpec;
use crate::schema::BqSchemaField;

/// A benchmark table for the files under one combination directory.
pub struct BenchmarkLoadTable<'a> {
    warehouse: &'a dyn Warehouse,
    store: &'a dyn ObjectStore,
    spec: &'a LoadSpec,
    path: CombinationPath,
    source_uri: String,
}

impl<'a> BenchmarkLoadTable<'a> {
    /// `path` is a combination directory inside the bucket, without the
    /// trailing slash.
    pub fn new(
        warehouse: &'a dyn Warehouse,
        store: &'a dyn ObjectStore,
        spec: &'a LoadSpec,
        path: &str,
    ) -> Result<Self> {
        Ok(Self {
            warehouse,
            store,
            spec,
            path: path.parse()?,
            source_uri: object_uri(&spec.bucket_name, &format!("{}/*", path)),
        })
    }

    pub fn source_uri(&self) -> &str {
        &self.source_uri
    }

    pub fn combination(&self) -> &CombinationPath {
        &self.path
    }

    /// Schema of the benchmark table. Avro and parquet files carry their own.
    fn schema(&self) -> Result<Option<Vec<BqSchemaField>>> {
        if self.path.file_type.is_self_describing() {
            return Ok(None);
        }
        let staging = TableRef::new(
            Some(&self.spec.staging_project),
            &self.spec.staging_dataset_id,
            &self.path.staging_table_name(),
        );
        Ok(Some(self.warehouse.get_table(&staging)?.schema))
    }

    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            source_format: self.path.file_type.source_format(),
            skip_leading_rows: if self.path.file_type == FileType::Csv { 1 } else { 0 },
        }
    }

    /// Create the table, load the files and measure the load.
    ///
    /// Returns `None` when the load job failed; the table is deleted then.
    pub fn load(&self) -> Result<Option<ResultRow>> {
        let schema = self.schema()?;
        let table = TableRef::new(
            Some(&self.spec.bq_project),
            &self.spec.dataset_id,
            &Utc::now().timestamp_millis().to_string(),
        );
        self.warehouse.create_table(&table, schema.as_deref())?;

        let job = match self
            .warehouse
            .load_table(&table, &self.source_uri, &self.load_options())
        {
            Ok(job) => job,
            Err(Error::JobFailed { job_id, message }) => {
                error!("Load job {} failed: {}", job_id, message);
                info!("Deleting table {}", table);
                self.warehouse.delete_table(&table)?;
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        info!(
            "Load job {} finished in {:.3}s",
            job.job_id,
            job.duration_secs()
        );

        let num_rows = self.warehouse.get_table(&table)?.num_rows;
        let slots = parse_slot_usage(&self.warehouse.query(&slot_usage_query(
            &self.spec.bq_project,
            &self.spec.bq_logs_dataset,
            &job.job_id,
            &job.created,
        ))?);
        let file_size_bytes = self
            .store
            .size(&self.spec.bucket_name, &self.path.file_name(1))?;

        ResultRow::from_measurement(&LoadMeasurement {
            benchmark_name: &self.spec.benchmark_name,
            job: &job,
            slots,
            path: &self.path,
            source_uri: &self.source_uri,
            table: &table,
            num_rows,
            file_size_bytes,
        })
        .map(Some)
    }
}
