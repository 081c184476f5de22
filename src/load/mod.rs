//! Benchmark table creation.
//!
//! Every combination found in the bucket is loaded into a fresh table and
//! the measurements are appended to the results table. Combinations that
//! already have a results row are skipped unless duplicates are requested.

pub mod results;
pub mod table;

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::info;

use crate::bucket::existing_paths;
use crate::cloud::{ObjectStore, TableRef, Warehouse};
use crate::error::Result;
use crate::phases::{LoadSpec, LoadTablesProcessor};

pub use results::{ResultRow, SlotUsage};
pub use table::BenchmarkLoadTable;

/// Combination directory of a `sourceURI` in `bucket`, or `None` for URIs in
/// other buckets.
pub fn benchmarked_path(source_uri: &str, bucket: &str) -> Option<String> {
    let prefix = format!("gs://{}/", bucket);
    let path = source_uri.strip_prefix(&prefix)?;
    let path = path.split("/*").next().unwrap_or(path);
    Some(path.trim_end_matches('/').to_string())
}

/// Loads every combination in the bucket into benchmark tables.
pub struct LoadTables {
    warehouse: Arc<dyn Warehouse>,
    store: Arc<dyn ObjectStore>,
    spec: LoadSpec,
}

impl LoadTables {
    pub fn new(warehouse: Arc<dyn Warehouse>, store: Arc<dyn ObjectStore>, spec: LoadSpec) -> Self {
        Self {
            warehouse,
            store,
            spec,
        }
    }

    fn results_table(&self) -> TableRef {
        TableRef::new(
            Some(&self.spec.bq_project),
            &self.spec.results_dataset_id,
            &self.spec.results_table_name,
        )
    }

    /// Combinations the results table already has rows for.
    pub fn benchmarked_paths(&self) -> Result<BTreeSet<String>> {
        let sql = format!(
            "SELECT loadProperties.sourceURI FROM `{}.{}.{}`",
            self.spec.bq_project, self.spec.results_dataset_id, self.spec.results_table_name
        );
        let rows = self.warehouse.query(&sql)?;
        Ok(rows
            .iter()
            .filter_map(|row| row.get("sourceURI")?.as_str())
            .filter_map(|uri| benchmarked_path(uri, &self.spec.bucket_name))
            .collect())
    }
}

impl LoadTablesProcessor for LoadTables {
    fn create_benchmark_tables(&self) -> Result<()> {
        let benchmarked = self.benchmarked_paths()?;
        let existing = existing_paths(
            self.store.as_ref(),
            &self.spec.bucket_name,
            &self.spec.file_params,
        )?;
        let results_table = self.results_table();

        for path in &existing {
            let already_benchmarked = benchmarked.contains(path);
            if already_benchmarked && !self.spec.duplicate_benchmark_tables {
                continue;
            }
            let verb = if already_benchmarked {
                "Duplicating"
            } else {
                "Processing"
            };
            info!("{} benchmark table for {}", verb, path);

            let table = BenchmarkLoadTable::new(
                self.warehouse.as_ref(),
                self.store.as_ref(),
                &self.spec,
                path,
            )?;
            if let Some(row) = table.load()? {
                self.warehouse
                    .insert_rows(&results_table, &[row.to_json()?])?;
                info!(
                    "{} benchmark results for job {} inserted into {}",
                    self.spec.benchmark_name, row.job.id, results_table
                );
            }
        }
        Ok(())
    }
}
