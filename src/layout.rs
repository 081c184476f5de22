//! Naming of staging tables and of load files in the bucket.
//!
//! Every file combination lives under a directory such as
//! `fileType=csv/compression=gzip/numColumns=10/columnTypes=100_STRING/numFiles=100/tableSize=10MB/`
//! and its files are named `file1.gz`, `file2.gz`, and so on.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};
use crate::params::{Compression, FileType};

const MB_IN_GB: f64 = 1_000.0;
const KB_IN_GB: f64 = 1_000_000.0;
const BYTES_IN_GB: f64 = 1_000_000_000.0;

/// Bytes per MB when labelling table and file sizes.
pub const BYTES_IN_MB: u64 = 1_000_000;

static COMBINATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"fileType=(\w+)/compression=(\w+)/numColumns=(\d+)/columnTypes=(\w+)/numFiles=(\d+)/tableSize=(\w+)",
    )
    .expect("combination pattern is valid")
});

/// One file combination in the bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CombinationPath {
    pub file_type: FileType,
    pub compression: Compression,
    pub num_columns: u32,
    pub column_types: String,
    pub num_files: u32,
    /// Size label of the source table, e.g. `10MB`.
    pub table_size: String,
}

impl CombinationPath {
    /// Directory of the combination, with a trailing slash.
    pub fn dir(&self) -> String {
        format!("{}/", self)
    }

    pub fn extension(&self) -> &'static str {
        self.compression.extension(self.file_type)
    }

    /// Blob name of the `n`th file of the combination.
    pub fn file_name(&self, n: u32) -> String {
        format!("{}file{}.{}", self.dir(), n, self.extension())
    }

    /// The same combination with a different file count.
    pub fn with_num_files(&self, num_files: u32) -> Self {
        Self {
            num_files,
            ..self.clone()
        }
    }

    /// Name of the staging table the combination's files were generated from.
    pub fn staging_table_name(&self) -> String {
        format!("{}_{}", self.column_types, self.num_columns)
    }

    /// Numeric part of the table size label (`2147MB` gives `2147`).
    pub fn table_size_value(&self) -> &str {
        let end = self
            .table_size
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(self.table_size.len());
        &self.table_size[..end]
    }
}

impl fmt::Display for CombinationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fileType={}/compression={}/numColumns={}/columnTypes={}/numFiles={}/tableSize={}",
            self.file_type,
            self.compression,
            self.num_columns,
            self.column_types,
            self.num_files,
            self.table_size
        )
    }
}

impl FromStr for CombinationPath {
    type Err = Error;

    /// Finds a combination anywhere in `s`, so full `gs://` URIs and blob
    /// names both parse.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidPath {
            path: s.to_string(),
            reason: reason.to_string(),
        };
        let caps = COMBINATION_RE
            .captures(s)
            .ok_or_else(|| invalid("not a file combination path"))?;

        Ok(Self {
            file_type: caps[1].parse()?,
            compression: caps[2].parse()?,
            num_columns: caps[3]
                .parse()
                .map_err(|_| invalid("numColumns is not a number"))?,
            column_types: caps[4].to_string(),
            num_files: caps[5]
                .parse()
                .map_err(|_| invalid("numFiles is not a number"))?,
            table_size: caps[6].to_string(),
        })
    }
}

/// Where to resume an interrupted combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartPoint {
    /// Blob that was created last, used as the copy source.
    pub source_blob: String,
    /// Directory of the combination, with a trailing slash.
    pub destination_path: String,
    /// Number of the last file created.
    pub last_file_num: u32,
    pub extension: String,
    pub num_files: u32,
}

impl FromStr for RestartPoint {
    type Err = Error;

    /// Parses a blob name such as
    /// `fileType=csv/compression=none/numColumns=10/columnTypes=100_STRING/numFiles=10000/tableSize=2147MB/file3876.csv`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidPath {
            path: s.to_string(),
            reason: reason.to_string(),
        };

        let (dir, file_name) = s
            .rsplit_once('/')
            .ok_or_else(|| invalid("expected a directory and a file name"))?;
        let (stem, extension) = file_name
            .strip_prefix("file")
            .and_then(|rest| rest.split_once('.'))
            .ok_or_else(|| invalid("file name must look like file<N>.<ext>"))?;
        let last_file_num = stem
            .parse()
            .map_err(|_| invalid("file number is not a number"))?;
        let num_files = s
            .split("numFiles=")
            .nth(1)
            .and_then(|rest| rest.split('/').next())
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| invalid("missing numFiles"))?;

        Ok(Self {
            source_blob: s.to_string(),
            destination_path: format!("{}/", dir),
            last_file_num,
            extension: extension.to_string(),
            num_files,
        })
    }
}

fn truncate(value: f64) -> u64 {
    // absorb float noise such as 0.29 * 1000 = 289.99999999999994
    (value + 1e-9).trunc() as u64
}

/// Name of the resized copy of `table_id` with a target size of `size_gb`.
///
/// Table names cannot contain `.`, so the size is expressed in the largest
/// unit that keeps it at least 1: `100_STRING_10` at 0.01 GB becomes
/// `100_STRING_10_10MB`.
pub fn resized_table_name(table_id: &str, size_gb: f64) -> String {
    let (label_size, label_unit) = if size_gb >= 1.0 {
        (truncate(size_gb), "GB")
    } else if size_gb >= 0.001 {
        (truncate(size_gb * MB_IN_GB), "MB")
    } else if size_gb >= 0.000001 {
        (truncate(size_gb * KB_IN_GB), "KB")
    } else {
        (truncate(size_gb * BYTES_IN_GB), "B")
    };
    format!("{}_{}{}", table_id, label_size, label_unit)
}
