//! Generation of the benchmark table schemas.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::error::Result;
use crate::params::FileParameters;
use crate::phases::SchemaGenerator;
use crate::schema::types::{write_schema_json, BqMode, BqSchemaField, ColumnMix};

/// Writes one JSON schema per (column type mix, column count) pair.
#[derive(Debug, Clone)]
pub struct SchemaCreator {
    schemas_dir: PathBuf,
    file_params: FileParameters,
}

impl SchemaCreator {
    pub fn new(schemas_dir: impl Into<PathBuf>, file_params: FileParameters) -> Self {
        Self {
            schemas_dir: schemas_dir.into(),
            file_params,
        }
    }

    pub fn schemas_dir(&self) -> &Path {
        &self.schemas_dir
    }

    /// Build the fields for `num_columns` columns split according to `mix`.
    ///
    /// Each type gets `num_columns * percent / 100` columns (truncated), named
    /// after the lowercased type and numbered from 1: `string1`, `string2`, ...
    pub fn fields_for(mix: &ColumnMix, num_columns: u32) -> Vec<BqSchemaField> {
        let mut fields = Vec::new();
        for (percent, field_type) in &mix.parts {
            let type_count = (num_columns as f64 * (percent / 100.0)) as u32;
            let prefix = field_type.to_lowercase();
            fields.extend((1..=type_count).map(|i| {
                BqSchemaField::new(format!("{}{}", prefix, i), field_type.clone(), BqMode::Required)
            }));
        }
        fields
    }

    /// Path of the schema file for a mix and column count.
    pub fn schema_path(&self, column_types: &str, num_columns: u32) -> PathBuf {
        self.schemas_dir
            .join(format!("{}_{}.json", column_types, num_columns))
    }
}

impl SchemaGenerator for SchemaCreator {
    fn create_schemas(&self) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();

        for column_types in &self.file_params.column_types {
            let mix = ColumnMix::parse(column_types)?;
            if mix.total_percent() != 100.0 {
                error!(
                    "Invalid column type: {}. Percents must equal 100.",
                    column_types
                );
            }

            for &num_columns in &self.file_params.num_columns {
                let fields = Self::fields_for(&mix, num_columns);
                fs::create_dir_all(&self.schemas_dir)?;

                let path = self.schema_path(column_types, num_columns);
                let mut writer = BufWriter::new(File::create(&path)?);
                write_schema_json(&fields, &mut writer)?;
                info!("Adding schema in {}", path.display());
                written.push(path);
            }
        }

        Ok(written)
    }
}
