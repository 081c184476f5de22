//! Generation of the load files in the bucket.
//!
//! Single-file combinations are exported from the resized staging tables with
//! extract jobs. Avro and parquet tables too large for a single extract are
//! written by the Dataflow export pipeline instead. Multi-file combinations
//! are made by copying the matching single file, which is much faster than
//! exporting the table again.

use std::path::PathBuf;
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{debug, error, info};

use crate::cloud::{object_uri, ExtractOptions, ObjectStore, ScriptRunner, TableRef, Warehouse};
use crate::error::{Error, Result};
use crate::layout::{CombinationPath, RestartPoint};
use crate::params::{Compression, FileType};
use crate::phases::{FileGenSpec, FileGenerator};

/// Most objects a single compose request accepts.
pub const MAX_COMPOSABLE_BLOBS: usize = 32;

/// Default location of the Dataflow export pipeline.
pub const DEFAULT_EXPORT_PIPELINE: &str = "pipelines/export_table_pipeline.py";

const WORKER_MACHINE_TYPE: &str = "n1-highcpu-32";

/// Creates every file combination from the resized staging tables.
pub struct LoadFileGenerator {
    warehouse: Arc<dyn Warehouse>,
    store: Arc<dyn ObjectStore>,
    runner: Arc<dyn ScriptRunner>,
    spec: FileGenSpec,
    export_pipeline: PathBuf,
    python: String,
    show_progress: bool,
}

impl LoadFileGenerator {
    pub fn new(
        warehouse: Arc<dyn Warehouse>,
        store: Arc<dyn ObjectStore>,
        runner: Arc<dyn ScriptRunner>,
        spec: FileGenSpec,
    ) -> Self {
        Self {
            warehouse,
            store,
            runner,
            spec,
            export_pipeline: PathBuf::from(DEFAULT_EXPORT_PIPELINE),
            python: "python".to_string(),
            show_progress: true,
        }
    }

    /// Script and interpreter of the Dataflow export pipeline.
    pub fn with_export_pipeline(
        mut self,
        python: impl Into<String>,
        script: impl Into<PathBuf>,
    ) -> Self {
        self.python = python.into();
        self.export_pipeline = script.into();
        self
    }

    /// Show a progress bar while copying.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn bucket(&self) -> &str {
        &self.spec.bucket_name
    }

    /// Single-file combination of every file type and compression for one
    /// resized table, followed by its multi-file combinations.
    fn combinations(&self, base: &CombinationPath) -> Vec<CombinationPath> {
        let params = &self.spec.file_params;
        let mut num_files = params.num_files.clone();
        num_files.sort_unstable();

        let mut combinations = Vec::new();
        for &file_type in &params.file_types {
            for &n in &num_files {
                for &compression in params.compressions_for(file_type) {
                    combinations.push(CombinationPath {
                        file_type,
                        compression,
                        num_files: n,
                        ..base.clone()
                    });
                }
            }
        }
        combinations
    }

    fn create_table_files(&self, table_id: &str) -> Result<()> {
        let table = TableRef::new(
            Some(&self.spec.project_id),
            &self.spec.resized_dataset_id,
            table_id,
        );
        let info = self.warehouse.get_table(&table)?;
        let base = CombinationPath {
            file_type: FileType::Csv,
            compression: Compression::None,
            num_columns: info.num_columns() as u32,
            column_types: info.column_types(),
            num_files: 1,
            table_size: format!("{}MB", info.size_mb()),
        };

        for path in self.combinations(&base) {
            if path.num_files == 1 {
                self.extract_file(&table, &path)?;
            } else {
                self.copy_combination(&path)?;
            }
        }
        Ok(())
    }

    fn extract_file(&self, table: &TableRef, path: &CombinationPath) -> Result<()> {
        let name = path.file_name(1);
        if self.store.exists(self.bucket(), &name)? {
            info!("File {} already exists, skipping", name);
            return Ok(());
        }

        let options = ExtractOptions {
            destination_format: path.file_type.extract_format(),
            compression: path.compression,
            print_header: false,
        };
        match self
            .warehouse
            .extract_table(table, &object_uri(self.bucket(), &name), &options)
        {
            Ok(()) => {
                info!("Created file {}", name);
                Ok(())
            }
            Err(Error::TooLarge(_)) if matches!(path.file_type, FileType::Csv | FileType::Json) => {
                info!("Table {} is too large for one file, exporting in shards", table);
                self.extract_sharded(table, &name, &options)
            }
            Err(Error::TooLarge(reason)) => {
                info!(
                    "Table {} is too large for one {} file ({}), exporting with Dataflow",
                    table, path.file_type, reason
                );
                self.export_with_dataflow(table, path)
            }
            Err(e) => Err(e),
        }
    }

    /// Arguments of the Dataflow export pipeline writing file 1 of `path`.
    pub fn export_pipeline_args(&self, table: &TableRef, path: &CombinationPath) -> Vec<String> {
        let output_prefix = object_uri(self.bucket(), &format!("{}file1", path.dir()));
        vec![
            self.export_pipeline.display().to_string(),
            format!("--input_table={}", table),
            format!("--output_prefix={}", output_prefix),
            format!("--file_format={}", path.file_type),
            format!("--codec={}", export_codec(path.file_type, path.compression)),
            format!("--file_name_suffix=.{}", path.extension()),
            format!("--project={}", self.spec.project_id),
            format!("--staging_location={}", self.spec.dataflow_staging_location),
            format!("--temp_location={}", self.spec.dataflow_temp_location),
            "--save_main_session".to_string(),
            format!("--worker_machine_type={}", WORKER_MACHINE_TYPE),
            "--runner=DataflowRunner".to_string(),
        ]
    }

    /// A failed pipeline leaves the combination without files; the other
    /// combinations still run.
    fn export_with_dataflow(&self, table: &TableRef, path: &CombinationPath) -> Result<()> {
        let name = path.file_name(1);
        match self
            .runner
            .run(&self.python, &self.export_pipeline_args(table, path))
        {
            Ok(()) => {
                info!("Created file {}", name);
                Ok(())
            }
            Err(e) => {
                error!("Dataflow export of {} failed: {}", name, e);
                Ok(())
            }
        }
    }

    fn extract_sharded(&self, table: &TableRef, name: &str, options: &ExtractOptions) -> Result<()> {
        let prefix = format!("{}/", name);
        let stale = self.store.list(self.bucket(), &prefix)?;
        if !stale.is_empty() {
            info!("Deleting {} shards left under {}", stale.len(), prefix);
            self.store.delete(self.bucket(), &stale)?;
        }

        let shard_uri = object_uri(self.bucket(), &format!("{}*", prefix));
        self.warehouse.extract_table(table, &shard_uri, options)?;

        let mut shards = self.store.list(self.bucket(), &prefix)?;
        if shards.is_empty() {
            return Err(Error::Response(format!("extract to {} wrote no shards", shard_uri)));
        }
        shards.sort();
        self.compose_all(shards, name)?;
        info!("Created file {}", name);
        Ok(())
    }

    /// Compose `sources` into `destination`, in rounds of at most
    /// [`MAX_COMPOSABLE_BLOBS`] objects, then delete the sources and every
    /// intermediate object.
    pub fn compose_all(&self, sources: Vec<String>, destination: &str) -> Result<()> {
        let bucket = self.bucket();
        let mut leftovers = sources.clone();
        let mut current = sources;
        let mut round = 0;

        while current.len() > MAX_COMPOSABLE_BLOBS {
            let composed: Vec<Result<String>> = current
                .par_chunks(MAX_COMPOSABLE_BLOBS)
                .enumerate()
                .map(|(i, group)| {
                    let target = format!("{}-composed-{}-{}", destination, round, i);
                    self.store.compose(bucket, group, &target)?;
                    Ok(target)
                })
                .collect();
            current = composed.into_iter().collect::<Result<Vec<_>>>()?;
            debug!("Compose round {} left {} objects", round, current.len());
            leftovers.extend(current.iter().cloned());
            round += 1;
        }

        self.store.compose(bucket, &current, destination)?;
        self.store.delete(bucket, &leftovers)
    }

    fn copy_combination(&self, path: &CombinationPath) -> Result<()> {
        if self.store.exists(self.bucket(), &path.file_name(1))? {
            info!("Files for {} already exist, skipping", path);
            return Ok(());
        }
        let source = path.with_num_files(1).file_name(1);
        if !self.store.exists(self.bucket(), &source)? {
            error!("Skipping {}: source file {} was not created", path, source);
            return Ok(());
        }
        self.copy_blobs(&source, &path.dir(), path.extension(), 1, path.num_files)
    }

    /// Copy `source` to `file{start}` through `file{num_files}` under `dir`.
    pub fn copy_blobs(
        &self,
        source: &str,
        dir: &str,
        extension: &str,
        start: u32,
        num_files: u32,
    ) -> Result<()> {
        if start > num_files {
            return Ok(());
        }
        let progress = self.progress_bar(u64::from(num_files - start + 1), dir);

        (start..=num_files).into_par_iter().try_for_each(|n| {
            let destination = format!("{}file{}.{}", dir, n, extension);
            self.store.copy(self.bucket(), source, &destination)?;
            progress.inc(1);
            Ok::<_, Error>(())
        })?;

        progress.finish_and_clear();
        info!("Copied {} to {} files in {}", source, num_files - start + 1, dir);
        Ok(())
    }

    fn progress_bar(&self, len: u64, dir: &str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} copies | {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█░░"),
        );
        pb.set_message(dir.to_string());
        pb
    }
}

/// Codec name the export pipeline expects.
fn export_codec(file_type: FileType, compression: Compression) -> &'static str {
    match (file_type, compression) {
        (FileType::Avro, Compression::None) => "null",
        (_, compression) => compression.as_str(),
    }
}

impl FileGenerator for LoadFileGenerator {
    fn restart_incomplete_combination(&self, restart_file: &str) -> Result<()> {
        let restart: RestartPoint = restart_file.parse()?;
        let start = restart
            .last_file_num
            .checked_add(1)
            .ok_or_else(|| Error::InvalidPath {
                path: restart_file.to_string(),
                reason: "file number has no successor".to_string(),
            })?;
        info!(
            "Resuming {} after file {} of {}",
            restart.destination_path, restart.last_file_num, restart.num_files
        );
        self.copy_blobs(
            &restart.source_blob,
            &restart.destination_path,
            &restart.extension,
            start,
            restart.num_files,
        )
    }

    fn create_files(&self) -> Result<()> {
        let tables = self
            .warehouse
            .list_tables(Some(&self.spec.project_id), &self.spec.resized_dataset_id)?;
        if tables.is_empty() {
            info!(
                "Dataset {} has no tables; create the resized staging tables first",
                self.spec.resized_dataset_id
            );
            return Ok(());
        }

        for table_id in &tables {
            self.create_table_files(table_id)?;
        }
        Ok(())
    }
}
