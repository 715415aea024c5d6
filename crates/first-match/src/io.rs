//! Arrow IPC file input and output.
//!
//! Streams are read from `.arrow` files whose key and timestamp columns
//! are named by [`ColumnNames`]. Narrower integer columns are widened to
//! [`Key`] / [`Timestamp`]; anything else is rejected.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, Int32Array, Int64Array, RecordBatch};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Int32Type, Int64Type, Schema, SchemaRef};
use arrow::ipc::reader::FileReader;
use arrow::ipc::writer::FileWriter;
use serde::{Deserialize, Serialize};

use crate::backend::frame::result_pairs;
use crate::error::{MatchError, Result};
use crate::stream::{EventStream, Key, Timestamp};
use crate::table::MatchTable;

/// Names of the key and timestamp columns in an input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub key: String,
    pub timestamp: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            key: "key".to_string(),
            timestamp: "timestamp".to_string(),
        }
    }
}

impl ColumnNames {
    pub fn new(key: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            timestamp: timestamp.into(),
        }
    }

    /// Schema used when writing a stream with these names.
    pub fn schema(&self) -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new(&self.key, DataType::Int32, false),
            Field::new(&self.timestamp, DataType::Int64, false),
        ]))
    }
}

/// Open an IPC file for batch-by-batch reading.
pub fn open_ipc(path: &Path) -> Result<FileReader<BufReader<File>>> {
    let file = File::open(path)?;
    Ok(FileReader::try_new(BufReader::new(file), None)?)
}

/// Read a whole stream from an IPC file.
///
/// # Errors
///
/// I/O and Arrow failures, a missing column, or a column type that
/// cannot be widened.
pub fn read_stream_ipc(path: &Path, names: &ColumnNames) -> Result<EventStream> {
    let mut keys = Vec::new();
    let mut timestamps = Vec::new();
    for batch in open_ipc(path)? {
        let batch = batch?;
        keys.extend(key_column(&batch, &names.key)?);
        timestamps.extend(timestamp_column(&batch, &names.timestamp)?);
    }
    tracing::debug!(path = %path.display(), rows = keys.len(), "read stream");
    EventStream::new(keys, timestamps)
}

/// Convert one record batch to a stream.
pub fn batch_to_stream(batch: &RecordBatch, names: &ColumnNames) -> Result<EventStream> {
    EventStream::new(
        key_column(batch, &names.key)?,
        timestamp_column(batch, &names.timestamp)?,
    )
}

/// Keys widened to [`Key`]. Accepts 8/16/32-bit signed and 8/16-bit
/// unsigned integers.
pub fn key_column(batch: &RecordBatch, name: &str) -> Result<Vec<Key>> {
    let col = named(batch, name)?;
    if !matches!(
        col.data_type(),
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::UInt8 | DataType::UInt16
    ) {
        return Err(unsupported(name, col.data_type()));
    }
    let widened = cast(col.as_ref(), &DataType::Int32)?;
    reject_nulls(name, widened.as_ref())?;
    Ok(widened.as_primitive::<Int32Type>().values().to_vec())
}

/// Timestamps widened to [`Timestamp`]. Accepts 32/64-bit signed
/// integers and Arrow timestamp columns (raw unit values).
pub fn timestamp_column(batch: &RecordBatch, name: &str) -> Result<Vec<Timestamp>> {
    let col = named(batch, name)?;
    if !matches!(
        col.data_type(),
        DataType::Int32 | DataType::Int64 | DataType::Timestamp(_, _)
    ) {
        return Err(unsupported(name, col.data_type()));
    }
    let widened = cast(col.as_ref(), &DataType::Int64)?;
    reject_nulls(name, widened.as_ref())?;
    Ok(widened.as_primitive::<Int64Type>().values().to_vec())
}

fn named<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
    batch
        .column_by_name(name)
        .ok_or_else(|| MatchError::MissingColumn(name.to_string()))
}

fn unsupported(name: &str, data_type: &DataType) -> MatchError {
    MatchError::UnsupportedColumnType {
        column: name.to_string(),
        data_type: data_type.to_string(),
    }
}

fn reject_nulls(name: &str, col: &dyn Array) -> Result<()> {
    if col.null_count() > 0 {
        return Err(MatchError::UnsupportedColumnType {
            column: name.to_string(),
            data_type: format!("{} with {} nulls", col.data_type(), col.null_count()),
        });
    }
    Ok(())
}

/// Write a stream as an IPC file, `batch_rows` rows per record batch.
pub fn write_stream_ipc(
    path: &Path,
    stream: &EventStream,
    names: &ColumnNames,
    batch_rows: usize,
) -> Result<()> {
    if batch_rows == 0 {
        return Err(MatchError::InvalidChunkSize);
    }
    let schema = names.schema();
    let mut writer = FileWriter::try_new(File::create(path)?, schema.as_ref())?;
    let mut start = 0;
    while start < stream.len() {
        let end = (start + batch_rows).min(stream.len());
        let batch = RecordBatch::try_new(
            Arc::clone(&schema),
            vec![
                Arc::new(Int32Array::from(stream.keys()[start..end].to_vec())),
                Arc::new(Int64Array::from(stream.timestamps()[start..end].to_vec())),
            ],
        )?;
        writer.write(&batch)?;
        start = end;
    }
    writer.finish()?;
    tracing::debug!(path = %path.display(), rows = stream.len(), "wrote stream");
    Ok(())
}

/// Write matched `(a_idx, b_idx)` pairs as an IPC file.
pub fn write_match_table_ipc(path: &Path, table: &MatchTable) -> Result<()> {
    let batch = table.to_record_batch()?;
    let mut writer = FileWriter::try_new(File::create(path)?, batch.schema().as_ref())?;
    writer.write(&batch)?;
    writer.finish()?;
    tracing::info!(path = %path.display(), matched = batch.num_rows(), "wrote match table");
    Ok(())
}

/// Read `(a_idx, b_idx)` pairs back from an IPC file.
pub fn read_match_pairs_ipc(path: &Path) -> Result<Vec<(u64, u64)>> {
    let mut pairs = Vec::new();
    for batch in open_ipc(path)? {
        pairs.extend(result_pairs(&batch?)?);
    }
    Ok(pairs)
}
