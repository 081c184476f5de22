//! File parameters and file constants.
//!
//! `FILE_PARAMETERS` enumerates every combination the benchmark covers. Edit it
//! to benchmark a different set of files.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::error::{Error, Result};

/// Type of file loaded into a benchmark table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FileType {
    Avro,
    Json,
    Csv,
    Parquet,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Avro => "avro",
            FileType::Json => "json",
            FileType::Csv => "csv",
            FileType::Parquet => "parquet",
        }
    }

    /// BigQuery source format used by load jobs.
    pub fn source_format(&self) -> &'static str {
        match self {
            FileType::Avro => "AVRO",
            FileType::Json => "NEWLINE_DELIMITED_JSON",
            FileType::Csv => "CSV",
            FileType::Parquet => "PARQUET",
        }
    }

    /// BigQuery destination format used by extract jobs.
    pub fn extract_format(&self) -> &'static str {
        self.source_format()
    }

    /// Whether the file carries its own schema, so the benchmark table can be
    /// created without one.
    pub fn is_self_describing(&self) -> bool {
        matches!(self, FileType::Avro | FileType::Parquet)
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FileType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "avro" => Ok(FileType::Avro),
            "json" => Ok(FileType::Json),
            "csv" => Ok(FileType::Csv),
            "parquet" => Ok(FileType::Parquet),
            other => Err(Error::InvalidPath {
                path: other.to_string(),
                reason: "unknown file type".to_string(),
            }),
        }
    }
}

/// Compression applied to a load file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Compression {
    None,
    Gzip,
    Snappy,
}

impl Compression {
    pub fn as_str(&self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::Gzip => "gzip",
            Compression::Snappy => "snappy",
        }
    }

    /// BigQuery compression name for extract jobs and results rows.
    pub fn bq_format(&self) -> &'static str {
        match self {
            Compression::None => "NONE",
            Compression::Gzip => "GZIP",
            Compression::Snappy => "SNAPPY",
        }
    }

    /// File extension for a file of `file_type` with this compression.
    pub fn extension(&self, file_type: FileType) -> &'static str {
        match self {
            Compression::None => file_type.as_str(),
            Compression::Gzip => "gz",
            Compression::Snappy => "snappy",
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Compression {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(Compression::None),
            "gzip" => Ok(Compression::Gzip),
            "snappy" => Ok(Compression::Snappy),
            other => Err(Error::InvalidPath {
                path: other.to_string(),
                reason: "unknown compression".to_string(),
            }),
        }
    }
}

/// The parameters combined to produce every benchmarked file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileParameters {
    pub file_types: Vec<FileType>,
    /// Compressions to generate for each file type.
    pub compressions: IndexMap<FileType, Vec<Compression>>,
    pub num_columns: Vec<u32>,
    pub num_files: Vec<u32>,
    /// Sizes in GB that staging tables are resized to.
    pub target_data_sizes: Vec<f64>,
    /// `tableSize` labels of resized staging tables, as they appear in bucket paths.
    pub staging_data_sizes: Vec<String>,
    /// Column type mixes such as `50_STRING_50_NUMERIC`.
    pub column_types: Vec<String>,
}

impl FileParameters {
    /// Compressions configured for `file_type` (empty if none).
    pub fn compressions_for(&self, file_type: FileType) -> &[Compression] {
        self.compressions
            .get(&file_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

pub static FILE_PARAMETERS: Lazy<FileParameters> = Lazy::new(|| {
    let mut compressions = IndexMap::new();
    compressions.insert(FileType::Avro, vec![Compression::None, Compression::Snappy]);
    compressions.insert(FileType::Csv, vec![Compression::None, Compression::Gzip]);
    compressions.insert(FileType::Json, vec![Compression::None, Compression::Gzip]);
    compressions.insert(FileType::Parquet, vec![Compression::None]);

    FileParameters {
        file_types: vec![
            FileType::Avro,
            FileType::Json,
            FileType::Csv,
            FileType::Parquet,
        ],
        compressions,
        num_columns: vec![10, 100, 1000],
        num_files: vec![1, 100, 1000, 10000],
        target_data_sizes: vec![0.01, 0.1, 1.0, 2.0],
        staging_data_sizes: ["10MB", "107MB", "1073MB", "2147MB"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        column_types: ["100_STRING", "50_STRING_50_NUMERIC", "10_STRING_90_NUMERIC"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    }
});
