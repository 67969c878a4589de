//! Column statistics for captured dump files
//!
//! Reads one numeric column out of a CSV file and reduces it to mean,
//! population standard deviation, max and min.

pub mod column;
pub mod summary;

pub use column::{read_column, read_column_file};
pub use summary::ColumnSummary;

use crate::error::{Error, Result};
use std::path::Path;

/// Summarize column `index` of the CSV file at `path`
///
/// Fails with [`Error::EmptyInput`] when the file has no records.
pub fn summarize_file(path: &Path, index: usize, delimiter: u8) -> Result<ColumnSummary> {
    let values = read_column_file(path, index, delimiter)?;
    log::debug!("Read {} values from column {} of {}", values.len(), index, path.display());

    ColumnSummary::compute(&values).ok_or_else(|| Error::EmptyInput {
        path: path.to_path_buf(),
    })
}
