//! CSV column extraction
//!
//! Records are read without a header row and may have differing field
//! counts. Blank lines are skipped by the CSV reader.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Read column `index` of every record as `f64`
///
/// The first record that lacks the column or holds a non-number aborts the
/// read. `nan` and `inf` count as non-numbers.
pub fn read_column<R: Read>(reader: R, index: usize, delimiter: u8) -> Result<Vec<f64>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(reader);

    let mut values = Vec::new();
    for (i, record) in csv_reader.records().enumerate() {
        let record = record?;
        let row = i + 1;

        let field = record.get(index).ok_or_else(|| Error::Parse {
            row,
            message: format!(
                "column {} out of range (record has {} fields)",
                index,
                record.len()
            ),
        })?;

        let value = field.trim().parse::<f64>().map_err(|e| Error::Parse {
            row,
            message: format!("{:?} is not a number: {}", field, e),
        })?;
        if !value.is_finite() {
            return Err(Error::Parse {
                row,
                message: format!("{:?} is not a finite number", field),
            });
        }
        values.push(value);
    }

    Ok(values)
}

/// Read column `index` from the file at `path`
pub fn read_column_file(path: &Path, index: usize, delimiter: u8) -> Result<Vec<f64>> {
    let file = File::open(path).map_err(|source| Error::InputAccess {
        path: path.to_path_buf(),
        source,
    })?;
    read_column(file, index, delimiter)
}
