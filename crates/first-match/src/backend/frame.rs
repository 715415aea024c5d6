//! Arrow frames for streams and match results.
//!
//! A stream frame is `(<index>: UInt64, key: Int32, timestamp: Int64)`,
//! where `<index>` is `a_idx` or `b_idx` and holds the original row
//! position, like a `with_row_index` column.

use std::sync::Arc;

use arrow::array::{Array, AsArray, Int32Array, Int64Array, PrimitiveArray, RecordBatch, UInt64Array};
use arrow::datatypes::{ArrowPrimitiveType, DataType, Field, Schema, SchemaRef, UInt64Type};

use crate::error::{MatchError, Result};
use crate::stream::EventStream;
use crate::table::MatchTable;

pub const A_IDX: &str = "a_idx";
pub const B_IDX: &str = "b_idx";
pub const KEY: &str = "key";
pub const TIMESTAMP: &str = "timestamp";
pub const TIMESTAMP_RIGHT: &str = "timestamp_right";

/// Schema of a stream frame whose row-index column is `index_column`.
pub fn stream_schema(index_column: &str) -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(index_column, DataType::UInt64, false),
        Field::new(KEY, DataType::Int32, false),
        Field::new(TIMESTAMP, DataType::Int64, false),
    ]))
}

/// Schema of `A JOIN B ON key`.
pub fn joined_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(A_IDX, DataType::UInt64, false),
        Field::new(KEY, DataType::Int32, false),
        Field::new(TIMESTAMP, DataType::Int64, false),
        Field::new(B_IDX, DataType::UInt64, false),
        Field::new(TIMESTAMP_RIGHT, DataType::Int64, false),
    ]))
}

/// Frame of `stream` with original positions offset by `first_row`.
pub fn stream_frame(stream: &EventStream, index_column: &str, first_row: u64) -> Result<RecordBatch> {
    let idx: UInt64Array = (first_row..first_row + stream.len() as u64).collect();
    let batch = RecordBatch::try_new(
        stream_schema(index_column),
        vec![
            Arc::new(idx),
            Arc::new(Int32Array::from(stream.keys().to_vec())),
            Arc::new(Int64Array::from(stream.timestamps().to_vec())),
        ],
    )?;
    Ok(batch)
}

/// Typed view of a named column.
pub fn column<'a, T: ArrowPrimitiveType>(
    batch: &'a RecordBatch,
    name: &str,
) -> Result<&'a PrimitiveArray<T>> {
    let col = batch
        .column_by_name(name)
        .ok_or_else(|| MatchError::MissingColumn(name.to_string()))?;
    col.as_primitive_opt::<T>()
        .ok_or_else(|| MatchError::UnsupportedColumnType {
            column: name.to_string(),
            data_type: col.data_type().to_string(),
        })
}

/// `(a_idx, b_idx)` rows of a result batch, in batch order.
pub fn result_pairs(batch: &RecordBatch) -> Result<Vec<(u64, u64)>> {
    let a = column::<UInt64Type>(batch, A_IDX)?;
    let b = column::<UInt64Type>(batch, B_IDX)?;
    if a.null_count() > 0 || b.null_count() > 0 {
        return Err(MatchError::UnsupportedColumnType {
            column: format!("{A_IDX}/{B_IDX}"),
            data_type: "nullable".to_string(),
        });
    }
    Ok(a.values().iter().copied().zip(b.values().iter().copied()).collect())
}

/// Dense table over `a_len` rows from a result batch.
///
/// # Errors
///
/// [`MatchError::MalformedResult`] unless `a_idx` is strictly ascending
/// and below `a_len`.
pub fn result_table(a_len: usize, batch: &RecordBatch) -> Result<MatchTable> {
    let pairs = result_pairs(batch)?;
    let mut previous: Option<u64> = None;
    for (row, &(a_idx, _)) in pairs.iter().enumerate() {
        let reason = match previous {
            Some(p) if p == a_idx => Some("is duplicated"),
            Some(p) if p > a_idx => Some("is out of order"),
            _ if a_idx >= a_len as u64 => Some("is outside stream A"),
            _ => None,
        };
        if let Some(reason) = reason {
            return Err(MatchError::MalformedResult { row, a_idx, reason });
        }
        previous = Some(a_idx);
    }
    Ok(MatchTable::from_pairs(a_len, pairs))
}

/// Result batch from pairs already ordered by `a_idx`.
pub fn pairs_batch(pairs: &[(u64, u64)]) -> Result<RecordBatch> {
    let a: UInt64Array = pairs.iter().map(|p| p.0).collect();
    let b: UInt64Array = pairs.iter().map(|p| p.1).collect();
    Ok(RecordBatch::try_new(MatchTable::schema(), vec![Arc::new(a), Arc::new(b)])?)
}
