// Command-line definition, shared with build.rs for completions and the man
// page. It is pulled in with `include!`, so it must not contain `use` items.

/// BigQuery file load benchmark
#[derive(Parser, Debug, Clone)]
#[command(
    name = "bq-load-bench",
    about = "Benchmark BigQuery load jobs across file types, compressions, sizes and column layouts",
    version,
    author
)]
pub struct Cli {
    /// Create the table that stores benchmark results
    #[arg(long = "create_results_table", alias = "create-results-table")]
    pub create_results_table: bool,

    /// Write the JSON schemas of the benchmark tables
    #[arg(long = "create_benchmark_schemas", alias = "create-benchmark-schemas")]
    pub create_benchmark_schemas: bool,

    /// Directory holding the benchmark table schemas
    #[arg(
        long = "benchmark_table_schemas_directory",
        alias = "benchmark-table-schemas-directory",
        value_name = "DIR",
        default_value = "json_schemas/benchmark_table_schemas"
    )]
    pub benchmark_table_schemas_directory: PathBuf,

    /// Generate the staging tables and their resized copies
    #[arg(long = "create_staging_tables", alias = "create-staging-tables")]
    pub create_staging_tables: bool,

    /// Export the resized staging tables to load files
    #[arg(long = "create_files", alias = "create-files")]
    pub create_files: bool,

    /// Last file written by an interrupted --create_files run, e.g.
    /// fileType=csv/compression=none/numColumns=10/columnTypes=100_STRING/numFiles=10000/tableSize=2147MB/file3876.csv
    #[arg(long = "restart_file", alias = "restart-file", value_name = "PATH")]
    pub restart_file: Option<String>,

    /// Load every file combination into a benchmark table
    #[arg(long = "create_benchmark_tables", alias = "create-benchmark-tables")]
    pub create_benchmark_tables: bool,

    /// Load combinations that already have results again
    #[arg(long = "duplicate_benchmark_tables", alias = "duplicate-benchmark-tables")]
    pub duplicate_benchmark_tables: bool,

    /// Project of the staging, benchmark and results tables
    #[arg(long = "bq_project_id", alias = "bq-project-id")]
    pub bq_project_id: Option<String>,

    /// Dataset for the benchmark tables
    #[arg(long = "benchmark_dataset_id", alias = "benchmark-dataset-id")]
    pub benchmark_dataset_id: Option<String>,

    /// Project of the staging tables read by --create_benchmark_tables
    #[arg(long = "staging_project_id", alias = "staging-project-id")]
    pub staging_project_id: Option<String>,

    /// Dataset for the staging tables
    #[arg(long = "staging_dataset_id", alias = "staging-dataset-id")]
    pub staging_dataset_id: Option<String>,

    /// Dataset for the resized staging tables
    #[arg(long = "resized_staging_dataset_id", alias = "resized-staging-dataset-id")]
    pub resized_staging_dataset_id: Option<String>,

    /// Name of the results table
    #[arg(long = "results_table_name", alias = "results-table-name")]
    pub results_table_name: Option<String>,

    /// Dataset of the results table
    #[arg(long = "results_dataset_id", alias = "results-dataset-id")]
    pub results_dataset_id: Option<String>,

    /// JSON schema of the results table
    #[arg(
        long = "results_table_schema_path",
        alias = "results-table-schema-path",
        value_name = "FILE",
        default_value = "json_schemas/results_table_schema.json"
    )]
    pub results_table_schema_path: PathBuf,

    /// Project of the bucket holding the load files
    #[arg(long = "gcs_project_id", alias = "gcs-project-id")]
    pub gcs_project_id: Option<String>,

    /// Bucket holding the load files
    #[arg(long = "bucket_name", alias = "bucket-name")]
    pub bucket_name: Option<String>,

    /// Dataflow temp location (gs:// URI)
    #[arg(long = "dataflow_temp_location", alias = "dataflow-temp-location")]
    pub dataflow_temp_location: Option<String>,

    /// Dataflow staging location (gs:// URI)
    #[arg(long = "dataflow_staging_location", alias = "dataflow-staging-location")]
    pub dataflow_staging_location: Option<String>,

    /// Dataset holding the BigQuery audit log export
    #[arg(long = "bq_logs_dataset", alias = "bq-logs-dataset")]
    pub bq_logs_dataset: Option<String>,

    /// Log filter, e.g. 'debug' or 'bq_load_bench=trace'. RUST_LOG takes precedence
    #[arg(long = "log_level", alias = "log-level", default_value = "info")]
    pub log_level: String,

    /// Number of threads for parallel work (default: auto-detect CPUs)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Checkout of the Dataflow data generator scripts
    #[arg(
        long = "data_generator_dir",
        alias = "data-generator-dir",
        value_name = "DIR",
        default_value = "dataflow-data-generator"
    )]
    pub data_generator_dir: PathBuf,

    /// Dataflow pipeline that writes avro and parquet files too large for an extract job
    #[arg(
        long = "export_pipeline",
        alias = "export-pipeline",
        value_name = "FILE",
        default_value = "pipelines/export_table_pipeline.py"
    )]
    pub export_pipeline: PathBuf,

    /// BigQuery location for jobs
    #[arg(long = "bq_location", alias = "bq-location", default_value = "US")]
    pub bq_location: String,
}
