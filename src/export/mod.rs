//! Output table export
//!
//! Converts output rows to Arrow record batches through `serde_arrow` and
//! writes them as Parquet. The schema is traced from the row type, with
//! unit enums (hemisphere, axis) written as strings.

use std::fs::File;
use std::path::Path;
use std::time::Instant;

use arrow::datatypes::FieldRef;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde::{Deserialize, Serialize};
use serde_arrow::schema::{SchemaLike, TracingOptions};

use crate::error::{QuantError, Result};
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// Arrow fields of a row type
pub fn fields_for<T>() -> Result<Vec<FieldRef>>
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    Vec::<FieldRef>::from_type::<T>(TracingOptions::default().enums_without_data_as_strings(true))
        .map_err(|e| QuantError::Export(format!("Failed to trace schema: {e}")))
}

/// Convert rows to a record batch
pub fn to_record_batch<T>(rows: &[T]) -> Result<RecordBatch>
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    let fields = fields_for::<T>()?;
    serde_arrow::to_record_batch(&fields, &rows)
        .map_err(|e| QuantError::Export(format!("Serialization error: {e}")))
}

/// Convert a record batch back to rows
pub fn from_record_batch<T>(batch: &RecordBatch) -> Result<Vec<T>>
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    serde_arrow::from_record_batch(batch)
        .map_err(|e| QuantError::Export(format!("Failed to deserialize: {e}")))
}

/// Write a record batch to a Parquet file
pub fn write_parquet(path: &Path, batch: &RecordBatch) -> Result<()> {
    let start = Instant::now();
    log_operation_start("Writing parquet file", path);

    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;

    log_operation_complete("wrote", path, batch.num_rows(), Some(start.elapsed()));
    Ok(())
}

/// Convert rows and write them to a Parquet file
pub fn write_rows<T>(path: &Path, rows: &[T]) -> Result<()>
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    write_parquet(path, &to_record_batch(rows)?)
}
