//! Discovery of the file combinations already present in the bucket.

use std::collections::BTreeSet;

use rayon::prelude::*;

use crate::cloud::ObjectStore;
use crate::error::Result;
use crate::layout::CombinationPath;
use crate::params::FileParameters;

/// Every combination `params` can produce, in parameter order.
pub fn candidate_paths(params: &FileParameters) -> Vec<CombinationPath> {
    let mut paths = Vec::new();
    for &file_type in &params.file_types {
        for &num_columns in &params.num_columns {
            for column_types in &params.column_types {
                for &num_files in &params.num_files {
                    for table_size in &params.staging_data_sizes {
                        for &compression in params.compressions_for(file_type) {
                            paths.push(CombinationPath {
                                file_type,
                                compression,
                                num_columns,
                                column_types: column_types.clone(),
                                num_files,
                                table_size: table_size.clone(),
                            });
                        }
                    }
                }
            }
        }
    }
    paths
}

/// Combination directories (without trailing slash) whose first file exists.
///
/// Probes run on the rayon pool.
pub fn existing_paths(
    store: &dyn ObjectStore,
    bucket: &str,
    params: &FileParameters,
) -> Result<BTreeSet<String>> {
    let found: Vec<Result<Option<String>>> = candidate_paths(params)
        .into_par_iter()
        .map(|path| {
            let exists = store.exists(bucket, &path.file_name(1))?;
            Ok(exists.then(|| path.to_string()))
        })
        .collect();

    found
        .into_iter()
        .filter_map(Result::transpose)
        .collect()
}
