//! [`Warehouse`] implementation on top of the `bq` command-line tool.

use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::cloud::process::run_tool;
use crate::cloud::{ExtractOptions, JobInfo, LoadOptions, TableInfo, TableRef, Warehouse};
use crate::error::{Error, Result};
use crate::schema::{parse_schema, write_schema_json, BqSchemaField};

/// Message BigQuery returns when an export needs a wildcard URI.
const TOO_LARGE_MARKER: &str = "too large to be exported to a single file";

static JOB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Talks to BigQuery through `bq`.
#[derive(Debug, Clone)]
pub struct BqCli {
    program: String,
    project: Option<String>,
    location: String,
}

impl BqCli {
    pub fn new(project: Option<&str>, location: &str) -> Self {
        Self {
            program: "bq".to_string(),
            project: project.map(str::to_string),
            location: location.to_string(),
        }
    }

    /// Use a different executable, e.g. a wrapper script.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn global_args(&self) -> Vec<String> {
        let mut args = vec![
            "--headless".to_string(),
            "--format=json".to_string(),
            format!("--location={}", self.location),
        ];
        if let Some(project) = &self.project {
            args.push(format!("--project_id={}", project));
        }
        args
    }

    fn run<I, S>(&self, command_args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = self.global_args();
        args.extend(command_args.into_iter().map(Into::into));
        run_tool(&self.program, &args)
    }

    fn show_job(&self, job_id: &str) -> Result<Value> {
        let out = self.run(["show", "-j", job_id])?;
        Ok(serde_json::from_str(&out)?)
    }
}

fn next_job_id() -> String {
    format!(
        "bq_load_bench_{}_{}",
        Utc::now().timestamp_millis(),
        JOB_COUNTER.fetch_add(1, Ordering::Relaxed)
    )
}

/// Read an integer that the REST API may encode as a string.
fn json_u64(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn json_millis(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let millis = json_u64(value)?;
    DateTime::from_timestamp_millis(i64::try_from(millis).ok()?)
}

/// Parse the table ids out of `bq ls` output.
pub fn parse_table_list(json: &Value) -> Result<Vec<String>> {
    let items = json
        .as_array()
        .ok_or_else(|| Error::Response("bq ls: expected an array".to_string()))?;
    items
        .iter()
        .map(|item| {
            item.pointer("/tableReference/tableId")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| Error::Response("bq ls: table without tableId".to_string()))
        })
        .collect()
}

/// Parse the output of `bq show` for a table.
pub fn parse_table_info(json: &Value) -> Result<TableInfo> {
    let schema = match json.get("schema") {
        Some(schema) => parse_schema(schema)?,
        None => Vec::new(),
    };
    Ok(TableInfo {
        schema,
        num_rows: json_u64(json.get("numRows")).unwrap_or(0),
        num_bytes: json_u64(json.get("numBytes")).unwrap_or(0),
    })
}

/// Error message of a finished job, if it failed.
pub fn job_error(json: &Value) -> Option<String> {
    json.pointer("/status/errorResult/message")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Parse the output of `bq show -j`.
pub fn parse_job(json: &Value) -> Result<JobInfo> {
    let missing = |what: &str| Error::Response(format!("bq show -j: missing {}", what));
    let statistics = json.get("statistics").ok_or_else(|| missing("statistics"))?;

    let job_id = json
        .pointer("/jobReference/jobId")
        .and_then(Value::as_str)
        .ok_or_else(|| missing("jobReference.jobId"))?
        .to_string();
    let created = json_millis(statistics.get("creationTime")).ok_or_else(|| missing("creationTime"))?;
    let started = json_millis(statistics.get("startTime")).unwrap_or(created);
    let ended = json_millis(statistics.get("endTime")).unwrap_or(started);

    Ok(JobInfo {
        job_id,
        user_email: json
            .get("user_email")
            .and_then(Value::as_str)
            .map(str::to_string),
        location: json
            .pointer("/jobReference/location")
            .and_then(Value::as_str)
            .map(str::to_string),
        created,
        started,
        ended,
        input_files: json_u64(statistics.pointer("/load/inputFiles")),
        source_format: json
            .pointer("/configuration/load/sourceFormat")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

impl Warehouse for BqCli {
    fn list_tables(&self, project: Option<&str>, dataset: &str) -> Result<Vec<String>> {
        let dataset = match project {
            Some(project) => format!("{}:{}", project, dataset),
            None => dataset.to_string(),
        };
        let out = self.run(["ls".to_string(), "--max_results=100000".to_string(), dataset])?;
        if out.trim().is_empty() {
            return Ok(Vec::new());
        }
        parse_table_list(&serde_json::from_str(&out)?)
    }

    fn get_table(&self, table: &TableRef) -> Result<TableInfo> {
        let out = self.run(["show".to_string(), table.to_string()])?;
        parse_table_info(&serde_json::from_str(&out)?)
    }

    fn create_table(&self, table: &TableRef, schema: Option<&[BqSchemaField]>) -> Result<()> {
        let mut args = vec!["mk".to_string(), "--table".to_string(), table.to_string()];
        // keep the schema file alive until bq has read it
        let _schema_file = match schema {
            Some(fields) => {
                let mut file = NamedTempFile::new()?;
                write_schema_json(fields, &mut file)?;
                file.flush()?;
                args.push(file.path().display().to_string());
                Some(file)
            }
            None => None,
        };
        self.run(args)?;
        info!("Created new table: {}", table.table);
        Ok(())
    }

    fn delete_table(&self, table: &TableRef) -> Result<()> {
        self.run(["rm".to_string(), "-f".to_string(), "-t".to_string(), table.to_string()])?;
        Ok(())
    }

    fn extract_table(
        &self,
        table: &TableRef,
        destination_uri: &str,
        options: &ExtractOptions,
    ) -> Result<()> {
        let args = vec![
            "extract".to_string(),
            format!("--destination_format={}", options.destination_format),
            format!("--compression={}", options.compression.bq_format()),
            format!("--print_header={}", options.print_header),
            table.to_string(),
            destination_uri.to_string(),
        ];
        match self.run(args) {
            Err(Error::Tool { stderr, .. }) if stderr.contains(TOO_LARGE_MARKER) => {
                Err(Error::TooLarge(stderr))
            }
            other => other.map(|_| ()),
        }
    }

    fn load_table(
        &self,
        table: &TableRef,
        source_uri: &str,
        options: &LoadOptions,
    ) -> Result<JobInfo> {
        let job_id = next_job_id();
        let mut args = vec![
            "load".to_string(),
            format!("--job_id={}", job_id),
            format!("--source_format={}", options.source_format),
        ];
        if options.skip_leading_rows > 0 {
            args.push(format!("--skip_leading_rows={}", options.skip_leading_rows));
        }
        args.push(table.to_string());
        args.push(source_uri.to_string());

        info!("Started load job {} for table {}.", job_id, table.table);
        if let Err(e) = self.run(args) {
            return Err(match e {
                Error::Tool { stderr, .. } => Error::JobFailed {
                    job_id,
                    message: stderr,
                },
                other => other,
            });
        }

        let job = self.show_job(&job_id)?;
        if let Some(message) = job_error(&job) {
            return Err(Error::JobFailed { job_id, message });
        }
        parse_job(&job)
    }

    fn query(&self, sql: &str) -> Result<Vec<Value>> {
        let out = self.run([
            "query".to_string(),
            "--nouse_legacy_sql".to_string(),
            "--max_rows=1000000".to_string(),
            sql.to_string(),
        ])?;
        if out.trim().is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_str(&out)? {
            Value::Array(rows) => Ok(rows),
            _ => Err(Error::Response("bq query: expected an array of rows".to_string())),
        }
    }

    fn insert_rows(&self, table: &TableRef, rows: &[Value]) -> Result<()> {
        let mut file = NamedTempFile::new()?;
        for row in rows {
            serde_json::to_writer(&mut file, row)?;
            writeln!(file)?;
        }
        file.flush()?;
        debug!("Inserting {} rows into {}", rows.len(), table);
        self.run([
            "insert".to_string(),
            table.to_string(),
            file.path().display().to_string(),
        ])?;
        Ok(())
    }
}
