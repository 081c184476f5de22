//! BigQuery file load benchmark
//!
//! Measures how long BigQuery takes to load files of different types,
//! compressions, sizes and column layouts. A run is made of five optional
//! phases, always executed in this order:
//!
//! 1. create the results table,
//! 2. write the benchmark table schemas,
//! 3. generate staging tables and resize them,
//! 4. export the resized tables to load files in Cloud Storage,
//! 5. load every file combination into a benchmark table and record the results.
//!
//! # Example
//!
//! ```rust
//! use bq_load_bench::{BenchmarkConfig, Error};
//!
//! let config = BenchmarkConfig {
//!     create_results_table: true,
//!     results_table_name: Some("results".to_string()),
//!     ..BenchmarkConfig::default()
//! };
//!
//! match config.validate() {
//!     Err(Error::MissingArg { missing, required_by }) => {
//!         assert_eq!(missing, "--results_dataset_id");
//!         assert_eq!(required_by, "--create_results_table");
//!     }
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```

pub mod bucket;
pub mod cloud;
pub mod collaborators;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod files;
pub mod layout;
pub mod load;
pub mod logging;
pub mod params;
pub mod phases;
pub mod results_table;
pub mod schema;
pub mod staging;

// Re-export commonly used types
pub use collaborators::CloudCollaborators;
pub use config::{BenchmarkConfig, Flag, DEPENDENCIES};
pub use dispatch::{run_phases, BENCHMARK_NAME, STAGING_TABLE_ROWS};
pub use error::{Error, Result};
pub use layout::{resized_table_name, CombinationPath, RestartPoint};
pub use logging::{init_logging, LogConfig};
pub use params::{Compression, FileParameters, FileType, FILE_PARAMETERS};
pub use phases::{
    Collaborators, FileGenSpec, FileGenerator, LoadSpec, LoadTablesProcessor, ResultsTableSpec,
    SchemaGenerator, SchemaSpec, StagingSpec, StagingTableGenerator, TableCreator,
};
pub use schema::{BqMode, BqSchemaField, SchemaCreator};
