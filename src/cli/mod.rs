//! CLI module for the load benchmark.
//!
//! Parses the flags, checks the flag combinations and runs the phases.

use std::path::PathBuf;
use std::process;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tracing::{error, info};

use bq_load_bench::{
    init_logging, run_phases, BenchmarkConfig, CloudCollaborators, LogConfig, FILE_PARAMETERS,
};

include!("definition.rs");

impl Cli {
    /// The invocation configuration carried by the flags.
    pub fn to_config(&self) -> BenchmarkConfig {
        BenchmarkConfig {
            create_results_table: self.create_results_table,
            create_benchmark_schemas: self.create_benchmark_schemas,
            benchmark_table_schemas_directory: self.benchmark_table_schemas_directory.clone(),
            create_staging_tables: self.create_staging_tables,
            create_files: self.create_files,
            restart_file: self.restart_file.clone(),
            create_benchmark_tables: self.create_benchmark_tables,
            duplicate_benchmark_tables: self.duplicate_benchmark_tables,
            bq_project_id: self.bq_project_id.clone(),
            benchmark_dataset_id: self.benchmark_dataset_id.clone(),
            staging_project_id: self.staging_project_id.clone(),
            staging_dataset_id: self.staging_dataset_id.clone(),
            resized_staging_dataset_id: self.resized_staging_dataset_id.clone(),
            results_table_name: self.results_table_name.clone(),
            results_dataset_id: self.results_dataset_id.clone(),
            results_table_schema_path: self.results_table_schema_path.clone(),
            gcs_project_id: self.gcs_project_id.clone(),
            bucket_name: self.bucket_name.clone(),
            dataflow_temp_location: self.dataflow_temp_location.clone(),
            dataflow_staging_location: self.dataflow_staging_location.clone(),
            bq_logs_dataset: self.bq_logs_dataset.clone(),
        }
    }
}

/// Run the CLI application
pub fn run() {
    let cli = Cli::parse();
    let config = cli.to_config();

    // Flag combination errors are usage errors: exit 2 with the usage line
    if let Err(e) = config.validate() {
        Cli::command()
            .error(ErrorKind::MissingRequiredArgument, e.to_string())
            .exit();
    }

    init_logging(&LogConfig::new(cli.log_level.clone()));
    info!(
        "bq-load-bench {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH")
    );

    let num_threads = cli.threads.unwrap_or_else(num_cpus::get);
    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
    {
        error!("Could not size the thread pool: {}", e);
    }

    let collaborators = CloudCollaborators {
        default_project: cli.bq_project_id.clone().filter(|p| !p.is_empty()),
        location: cli.bq_location.clone(),
        data_generator_dir: cli.data_generator_dir.clone(),
        export_pipeline: cli.export_pipeline.clone(),
        show_progress: true,
    };

    if let Err(e) = run_phases(&config, &FILE_PARAMETERS, &collaborators) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
