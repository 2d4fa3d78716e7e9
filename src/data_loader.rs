//! Parquet data loading functionality.
//!
//! Reads `(gid, value)` rows from a columnar file. Only the two configured
//! columns are decoded; the identifier column is cast to UTF-8 and the value
//! column to `f64`, so integer, float and dictionary encodings all load.

use arrow::compute::cast;
use arrow_array::{Array, Float64Array, StringArray};
use arrow_schema::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ProjectionMask;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{GridscaleError, Result};

/// One input row. A missing value is kept so callers can count it.
#[derive(Debug, Clone, PartialEq)]
pub struct CellRow {
    pub gid: String,
    pub value: Option<f64>,
}

impl CellRow {
    pub fn new(gid: impl Into<String>, value: Option<f64>) -> Self {
        Self {
            gid: gid.into(),
            value,
        }
    }
}

/// Read every row of a parquet file
pub fn read_parquet(path: &Path, gid_column: &str, value_column: &str) -> Result<Vec<CellRow>> {
    if !path.exists() {
        return Err(GridscaleError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("File not found: {}", path.display()),
        )));
    }

    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    info!("Opened parquet file: {}", path.display());
    debug!(
        "File has {} row groups and {} rows",
        builder.metadata().num_row_groups(),
        builder.metadata().file_metadata().num_rows()
    );

    let schema = builder.schema().clone();
    let mut roots = Vec::with_capacity(2);
    for name in [gid_column, value_column] {
        let index = schema
            .index_of(name)
            .map_err(|_| GridscaleError::Load {
                message: format!(
                    "Missing required column '{}' in {} (found: {})",
                    name,
                    path.display(),
                    schema
                        .fields()
                        .iter()
                        .map(|f| f.name().as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            })?;
        roots.push(index);
    }

    let mask = ProjectionMask::roots(builder.parquet_schema(), roots);
    let reader = builder.with_projection(mask).build()?;

    let mut rows = Vec::new();
    let mut null_gids = 0usize;

    for batch in reader {
        let batch = batch?;
        let gids = column_as::<StringArray>(&batch, gid_column, &DataType::Utf8)?;
        let values = column_as::<Float64Array>(&batch, value_column, &DataType::Float64)?;

        for i in 0..batch.num_rows() {
            if gids.is_null(i) {
                null_gids += 1;
                continue;
            }
            let value = if values.is_null(i) || values.value(i).is_nan() {
                None
            } else {
                Some(values.value(i))
            };
            rows.push(CellRow::new(gids.value(i), value));
        }
    }

    if null_gids > 0 {
        warn!("Dropped {} rows with a null '{}'", null_gids, gid_column);
    }

    Ok(rows)
}

/// Cast a named column of a batch and downcast it to a concrete array
fn column_as<T: Array + Clone + 'static>(
    batch: &arrow::record_batch::RecordBatch,
    name: &str,
    to: &DataType,
) -> Result<T> {
    let column = batch
        .column_by_name(name)
        .ok_or_else(|| GridscaleError::Load {
            message: format!("Column '{}' missing from record batch", name),
        })?;

    let casted = cast(column.as_ref(), to).map_err(|e| GridscaleError::Load {
        message: format!("Column '{}' cannot be read as {}: {}", name, to, e),
    })?;

    casted
        .as_any()
        .downcast_ref::<T>()
        .cloned()
        .ok_or_else(|| GridscaleError::Load {
            message: format!("Column '{}' did not cast to {}", name, to),
        })
}
