//! In-memory stand-ins for BigQuery, Cloud Storage and the pipeline scripts.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use indexmap::IndexMap;
use serde_json::Value;

use bq_load_bench::cloud::{
    ExtractOptions, JobInfo, LoadOptions, ObjectStore, ScriptRunner, TableInfo, TableRef,
    Warehouse,
};
use bq_load_bench::{BqMode, BqSchemaField, Compression, Error, FileParameters, FileType, Result};

/// A small parameter table: csv only, one column layout, one size.
pub fn small_params() -> FileParameters {
    let mut compressions = IndexMap::new();
    compressions.insert(FileType::Csv, vec![Compression::None, Compression::Gzip]);
    FileParameters {
        file_types: vec![FileType::Csv],
        compressions,
        num_columns: vec![10],
        num_files: vec![3, 1],
        target_data_sizes: vec![0.1, 0.01],
        staging_data_sizes: vec!["10MB".to_string()],
        column_types: vec!["100_STRING".to_string()],
    }
}

/// Ten STRING columns, 10 MB.
pub fn string_table() -> TableInfo {
    TableInfo {
        schema: (1..=10)
            .map(|i| BqSchemaField::new(format!("string{}", i), "STRING", BqMode::Required))
            .collect(),
        num_rows: 500,
        num_bytes: 10_400_000,
    }
}

fn key(table: &TableRef) -> String {
    format!("{}.{}", table.dataset, table.table)
}

fn split_uri(uri: &str) -> (String, String) {
    let rest = uri.trim_start_matches("gs://");
    match rest.split_once('/') {
        Some((bucket, name)) => (bucket.to_string(), name.to_string()),
        None => (rest.to_string(), String::new()),
    }
}

#[derive(Default)]
pub struct FakeStore {
    pub objects: Mutex<BTreeMap<(String, String), u64>>,
    pub copies: Mutex<Vec<(String, String)>>,
    pub composes: Mutex<Vec<(Vec<String>, String)>>,
    pub deleted: Mutex<Vec<String>>,
}

impl FakeStore {
    pub fn put(&self, bucket: &str, name: &str, size: u64) {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), name.to_string()), size);
    }

    pub fn names(&self, bucket: &str) -> BTreeSet<String> {
        self.objects
            .lock()
            .unwrap()
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, n)| n.clone())
            .collect()
    }

    fn not_found(name: &str) -> Error {
        Error::Response(format!("gcloud: {} not found", name))
    }
}

impl ObjectStore for FakeStore {
    fn exists(&self, bucket: &str, name: &str) -> Result<bool> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .contains_key(&(bucket.to_string(), name.to_string())))
    }

    fn size(&self, bucket: &str, name: &str) -> Result<u64> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), name.to_string()))
            .copied()
            .ok_or_else(|| Self::not_found(name))
    }

    fn copy(&self, bucket: &str, source: &str, destination: &str) -> Result<()> {
        let size = self.size(bucket, source)?;
        self.put(bucket, destination, size);
        self.copies
            .lock()
            .unwrap()
            .push((source.to_string(), destination.to_string()));
        Ok(())
    }

    fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .names(bucket)
            .into_iter()
            .filter(|n| n.starts_with(prefix))
            .collect())
    }

    fn compose(&self, bucket: &str, sources: &[String], destination: &str) -> Result<()> {
        assert!(sources.len() <= 32, "compose of {} objects", sources.len());
        let mut total = 0;
        for source in sources {
            total += self.size(bucket, source)?;
        }
        self.put(bucket, destination, total);
        self.composes
            .lock()
            .unwrap()
            .push((sources.to_vec(), destination.to_string()));
        Ok(())
    }

    fn delete(&self, bucket: &str, names: &[String]) -> Result<()> {
        let mut objects = self.objects.lock().unwrap();
        for name in names {
            objects.remove(&(bucket.to_string(), name.clone()));
        }
        self.deleted.lock().unwrap().extend(names.iter().cloned());
        Ok(())
    }
}

/// BigQuery double. Extract jobs write into `store`.
pub struct FakeWarehouse {
    pub store: Arc<FakeStore>,
    /// Tables keyed by `dataset.table`.
    pub tables: Mutex<BTreeMap<String, TableInfo>>,
    /// Tables whose single-file export fails as too large.
    pub too_large: Mutex<BTreeSet<String>>,
    /// Shards written by a wildcard export.
    pub shard_count: AtomicU64,
    pub fail_loads: AtomicBool,
    /// Rows returned for queries containing the key.
    pub query_rows: Mutex<Vec<(String, Vec<Value>)>>,
    pub created: Mutex<Vec<(TableRef, Option<Vec<BqSchemaField>>)>>,
    pub extracts: Mutex<Vec<(String, String, ExtractOptions)>>,
    pub loads: Mutex<Vec<(TableRef, String, LoadOptions)>>,
    pub deleted: Mutex<Vec<TableRef>>,
    pub queries: Mutex<Vec<String>>,
    pub inserted: Mutex<Vec<(TableRef, Value)>>,
}

impl FakeWarehouse {
    pub fn new(store: Arc<FakeStore>) -> Self {
        Self {
            store,
            tables: Mutex::new(BTreeMap::new()),
            too_large: Mutex::new(BTreeSet::new()),
            shard_count: AtomicU64::new(3),
            fail_loads: AtomicBool::new(false),
            query_rows: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
            extracts: Mutex::new(Vec::new()),
            loads: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
            inserted: Mutex::new(Vec::new()),
        }
    }

    pub fn add_table(&self, dataset: &str, table: &str, info: TableInfo) {
        self.tables
            .lock()
            .unwrap()
            .insert(format!("{}.{}", dataset, table), info);
    }

    pub fn answer(&self, sql_contains: &str, rows: Vec<Value>) {
        self.query_rows
            .lock()
            .unwrap()
            .push((sql_contains.to_string(), rows));
    }

    pub fn job() -> JobInfo {
        JobInfo {
            job_id: "job_1".to_string(),
            user_email: Some("bench@example.com".to_string()),
            location: Some("US".to_string()),
            created: Utc.with_ymd_and_hms(2019, 3, 4, 10, 0, 0).unwrap(),
            started: Utc.with_ymd_and_hms(2019, 3, 4, 10, 0, 1).unwrap(),
            ended: Utc.with_ymd_and_hms(2019, 3, 4, 10, 0, 11).unwrap(),
            input_files: Some(1),
            source_format: Some("CSV".to_string()),
        }
    }
}

impl Warehouse for FakeWarehouse {
    fn list_tables(&self, _project: Option<&str>, dataset: &str) -> Result<Vec<String>> {
        let prefix = format!("{}.", dataset);
        Ok(self
            .tables
            .lock()
            .unwrap()
            .keys()
            .filter_map(|k| k.strip_prefix(&prefix).map(str::to_string))
            .collect())
    }

    fn get_table(&self, table: &TableRef) -> Result<TableInfo> {
        self.tables
            .lock()
            .unwrap()
            .get(&key(table))
            .cloned()
            .ok_or_else(|| Error::Response(format!("bq show: {} not found", table)))
    }

    fn create_table(&self, table: &TableRef, schema: Option<&[BqSchemaField]>) -> Result<()> {
        let info = TableInfo {
            schema: schema.map(<[BqSchemaField]>::to_vec).unwrap_or_default(),
            ..TableInfo::default()
        };
        self.tables.lock().unwrap().insert(key(table), info);
        self.created
            .lock()
            .unwrap()
            .push((table.clone(), schema.map(<[BqSchemaField]>::to_vec)));
        Ok(())
    }

    fn delete_table(&self, table: &TableRef) -> Result<()> {
        self.tables.lock().unwrap().remove(&key(table));
        self.deleted.lock().unwrap().push(table.clone());
        Ok(())
    }

    fn extract_table(
        &self,
        table: &TableRef,
        destination_uri: &str,
        options: &ExtractOptions,
    ) -> Result<()> {
        self.extracts.lock().unwrap().push((
            key(table),
            destination_uri.to_string(),
            options.clone(),
        ));
        let (bucket, name) = split_uri(destination_uri);
        if let Some(prefix) = name.strip_suffix('*') {
            for i in 0..self.shard_count.load(Ordering::SeqCst) {
                self.store.put(&bucket, &format!("{}{:012}", prefix, i), 1_000);
            }
            return Ok(());
        }
        if self.too_large.lock().unwrap().contains(&key(table)) {
            return Err(Error::TooLarge(format!(
                "Table {} is too large to be exported to a single file",
                table
            )));
        }
        self.store.put(&bucket, &name, 2_000_000);
        Ok(())
    }

    fn load_table(
        &self,
        table: &TableRef,
        source_uri: &str,
        options: &LoadOptions,
    ) -> Result<JobInfo> {
        self.loads
            .lock()
            .unwrap()
            .push((table.clone(), source_uri.to_string(), options.clone()));
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(Error::JobFailed {
                job_id: "job_1".to_string(),
                message: "Error while reading data".to_string(),
            });
        }
        if let Some(info) = self.tables.lock().unwrap().get_mut(&key(table)) {
            info.num_rows = 500;
        }
        Ok(Self::job())
    }

    fn query(&self, sql: &str) -> Result<Vec<Value>> {
        self.queries.lock().unwrap().push(sql.to_string());
        Ok(self
            .query_rows
            .lock()
            .unwrap()
            .iter()
            .find(|(needle, _)| sql.contains(needle.as_str()))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default())
    }

    fn insert_rows(&self, table: &TableRef, rows: &[Value]) -> Result<()> {
        let mut inserted = self.inserted.lock().unwrap();
        for row in rows {
            inserted.push((table.clone(), row.clone()));
        }
        Ok(())
    }
}

/// Records every script launch.
#[derive(Default)]
pub struct FakeRunner {
    pub runs: Mutex<Vec<(String, Vec<String>)>>,
    /// Launches whose arguments contain this text fail.
    pub fail_on: Mutex<Option<String>>,
    /// Store that export pipelines write their file into.
    pub writes_to: Option<Arc<FakeStore>>,
}

impl FakeRunner {
    pub fn writing_to(store: Arc<FakeStore>) -> Self {
        Self {
            writes_to: Some(store),
            ..Self::default()
        }
    }

    pub fn runs(&self) -> Vec<(String, Vec<String>)> {
        self.runs.lock().unwrap().clone()
    }

    pub fn fail_when(&self, needle: &str) {
        *self.fail_on.lock().unwrap() = Some(needle.to_string());
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter().find_map(|a| a.strip_prefix(flag))
}

impl ScriptRunner for FakeRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<()> {
        self.runs
            .lock()
            .unwrap()
            .push((program.to_string(), args.to_vec()));
        if let Some(needle) = self.fail_on.lock().unwrap().as_deref() {
            if args.iter().any(|a| a.contains(needle)) {
                return Err(Error::Tool {
                    program: program.to_string(),
                    status: "exit status: 1".to_string(),
                    stderr: "pipeline failed".to_string(),
                });
            }
        }
        if let Some(store) = &self.writes_to {
            if let (Some(prefix), Some(suffix)) = (
                flag_value(args, "--output_prefix="),
                flag_value(args, "--file_name_suffix="),
            ) {
                let (bucket, name) = split_uri(&format!("{}{}", prefix, suffix));
                store.put(&bucket, &name, 3_000_000);
            }
        }
        Ok(())
    }
}
