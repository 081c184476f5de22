//! Rows of the results table.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::cloud::{JobInfo, TableRef};
use crate::error::{Error, Result};
use crate::layout::{CombinationPath, BYTES_IN_MB};

/// Job type recorded for load benchmarks.
pub const LOAD_JOB_TYPE: &str = "LOAD";

/// One benchmark result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRow {
    pub benchmark_time: String,
    pub benchmark_name: String,
    pub job: JobResult,
    pub load_properties: LoadProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    pub id: String,
    #[serde(rename = "type")]
    pub job_type: String,
    pub user: Option<String>,
    pub location: Option<String>,
    pub start_time: String,
    pub end_time: String,
    /// Seconds.
    pub duration: f64,
    pub total_slot_ms: Option<u64>,
    pub avg_slots: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadProperties {
    pub num_rows: u64,
    pub num_files: Option<u64>,
    pub source_format: Option<String>,
    pub file_type: String,
    pub compression_type: String,
    pub num_columns: u32,
    pub column_types: String,
    /// Size of the first file in MB.
    pub file_size: f64,
    /// Size of the source staging table in MB.
    pub staging_data_size: u64,
    pub destination_table: String,
    #[serde(rename = "sourceURI")]
    pub source_uri: String,
}

/// Slot usage of a job from the audit logs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SlotUsage {
    pub total_slot_ms: Option<u64>,
    pub avg_slots: Option<f64>,
}

fn timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Everything measured for one loaded combination.
#[derive(Debug, Clone)]
pub struct LoadMeasurement<'a> {
    pub benchmark_name: &'a str,
    pub job: &'a JobInfo,
    pub slots: SlotUsage,
    pub path: &'a CombinationPath,
    pub source_uri: &'a str,
    pub table: &'a TableRef,
    pub num_rows: u64,
    pub file_size_bytes: u64,
}

impl ResultRow {
    pub fn from_measurement(m: &LoadMeasurement<'_>) -> Result<Self> {
        let staging_data_size =
            m.path
                .table_size_value()
                .parse()
                .map_err(|_| Error::InvalidPath {
                    path: m.path.to_string(),
                    reason: "tableSize has no numeric part".to_string(),
                })?;

        Ok(Self {
            benchmark_time: timestamp(&m.job.created),
            benchmark_name: m.benchmark_name.to_string(),
            job: JobResult {
                id: m.job.job_id.clone(),
                job_type: LOAD_JOB_TYPE.to_string(),
                user: m.job.user_email.clone(),
                location: m.job.location.clone(),
                start_time: timestamp(&m.job.started),
                end_time: timestamp(&m.job.ended),
                duration: m.job.duration_secs(),
                total_slot_ms: m.slots.total_slot_ms,
                avg_slots: m.slots.avg_slots,
            },
            load_properties: LoadProperties {
                num_rows: m.num_rows,
                num_files: m.job.input_files,
                source_format: m.job.source_format.clone(),
                file_type: m.path.file_type.to_string(),
                compression_type: m.path.compression.bq_format().to_string(),
                num_columns: m.path.num_columns,
                column_types: m.path.column_types.clone(),
                file_size: m.file_size_bytes as f64 / BYTES_IN_MB as f64,
                staging_data_size,
                destination_table: format!(
                    "{}.{}.{}",
                    m.table.project.as_deref().unwrap_or_default(),
                    m.table.dataset,
                    m.table.table
                ),
                source_uri: m.source_uri.to_string(),
            },
        })
    }

    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Query for the slot usage of `job_id` in the audit log table of the day
/// the job was created.
pub fn slot_usage_query(
    project: &str,
    logs_dataset: &str,
    job_id: &str,
    created: &DateTime<Utc>,
) -> String {
    format!(
        "SELECT \
         protopayload_auditlog.servicedata_v1_bigquery.jobCompletedEvent.job.jobStatistics.totalSlotMs AS totalSlotMs, \
         SAFE_DIVIDE(\
         protopayload_auditlog.servicedata_v1_bigquery.jobCompletedEvent.job.jobStatistics.totalSlotMs, \
         TIMESTAMP_DIFF(\
         protopayload_auditlog.servicedata_v1_bigquery.jobCompletedEvent.job.jobStatistics.endTime, \
         protopayload_auditlog.servicedata_v1_bigquery.jobCompletedEvent.job.jobStatistics.startTime, \
         MILLISECOND)) AS avgSlots \
         FROM `{}.{}.cloudaudit_googleapis_com_data_access_{}` \
         WHERE protopayload_auditlog.servicedata_v1_bigquery.jobCompletedEvent.job.jobName.jobId = '{}'",
        project,
        logs_dataset,
        created.format("%Y%m%d"),
        job_id
    )
}

fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Slot usage from the rows of [`slot_usage_query`]; the last row wins.
pub fn parse_slot_usage(rows: &[Value]) -> SlotUsage {
    rows.last()
        .map(|row| SlotUsage {
            total_slot_ms: number(row.get("totalSlotMs")).map(|ms| ms as u64),
            avg_slots: number(row.get("avgSlots")),
        })
        .unwrap_or_default()
}
