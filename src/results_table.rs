//! Creation of the table that stores benchmark results.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::cloud::{TableRef, Warehouse};
use crate::error::Result;
use crate::phases::{ResultsTableSpec, TableCreator};
use crate::schema::read_schema_file;

/// Creates a table from a JSON schema file.
pub struct SchemaFileTable {
    warehouse: Arc<dyn Warehouse>,
    table: TableRef,
    schema_path: PathBuf,
}

impl SchemaFileTable {
    pub fn new(warehouse: Arc<dyn Warehouse>, project: Option<&str>, spec: ResultsTableSpec) -> Self {
        Self {
            warehouse,
            table: TableRef::new(project, &spec.dataset_id, &spec.table_id),
            schema_path: spec.schema_path,
        }
    }

    pub fn table(&self) -> &TableRef {
        &self.table
    }
}

impl TableCreator for SchemaFileTable {
    fn create_table(&self) -> Result<()> {
        let schema = read_schema_file(&self.schema_path)?;
        if self
            .warehouse
            .list_tables(self.table.project.as_deref(), &self.table.dataset)?
            .contains(&self.table.table)
        {
            warn!("Table {} already exists, keeping it", self.table);
            return Ok(());
        }
        info!(
            "Creating table {} from schema in {}",
            self.table,
            self.schema_path.display()
        );
        self.warehouse.create_table(&self.table, Some(schema.as_slice()))
    }
}
