//! BigQuery schemas: the field model, schema files and the benchmark schema creator.

pub mod creator;
pub mod types;

pub use creator::SchemaCreator;
pub use types::{
    parse_schema, read_schema_file, summarize_column_types, write_schema_json, BqMode,
    BqSchemaField, ColumnMix,
};
