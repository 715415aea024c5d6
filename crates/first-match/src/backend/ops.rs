//! Relational operators over Arrow frames.
//!
//! Each operator consumes and produces [`RecordBatch`]es. The eager
//! backend chains them directly; the lazy plan executor calls them per
//! node; the streaming backend runs the fused probe per chunk pair.

use std::collections::HashMap;
use std::sync::Arc;

use arrow::array::{ArrayRef, RecordBatch, UInt32Array};
use arrow::compute::kernels::cmp::lt;
use arrow::compute::{filter_record_batch, sort_to_indices, take, take_record_batch};
use arrow::datatypes::{Int32Type, Int64Type, UInt64Type};

use super::frame::{
    column, joined_schema, pairs_batch, A_IDX, B_IDX, KEY, TIMESTAMP, TIMESTAMP_RIGHT,
};
use crate::error::{MatchError, Result};
use crate::stream::{Key, Timestamp};

/// Inner equality join of an A frame and a B frame on `key`.
///
/// Output rows follow A's row order, then B's row order within a key,
/// with columns `a_idx, key, timestamp, b_idx, timestamp_right`.
pub fn join_on_key(left: &RecordBatch, right: &RecordBatch) -> Result<RecordBatch> {
    let left_keys = column::<Int32Type>(left, KEY)?;
    let right_keys = column::<Int32Type>(right, KEY)?;

    let mut build: HashMap<Key, Vec<u32>> = HashMap::new();
    for (row, &key) in right_keys.values().iter().enumerate() {
        build.entry(key).or_default().push(row_u32(row)?);
    }

    let mut left_rows = Vec::new();
    let mut right_rows = Vec::new();
    for (row, key) in left_keys.values().iter().enumerate() {
        if let Some(matches) = build.get(key) {
            let row = row_u32(row)?;
            for &r in matches {
                left_rows.push(row);
                right_rows.push(r);
            }
        }
    }
    let left_rows = UInt32Array::from(left_rows);
    let right_rows = UInt32Array::from(right_rows);

    let columns: Vec<ArrayRef> = vec![
        take(column_ref(left, A_IDX)?.as_ref(), &left_rows, None)?,
        take(column_ref(left, KEY)?.as_ref(), &left_rows, None)?,
        take(column_ref(left, TIMESTAMP)?.as_ref(), &left_rows, None)?,
        take(column_ref(right, B_IDX)?.as_ref(), &right_rows, None)?,
        take(column_ref(right, TIMESTAMP)?.as_ref(), &right_rows, None)?,
    ];
    tracing::debug!(left = left.num_rows(), right = right.num_rows(), joined = left_rows.len(), "join");
    Ok(RecordBatch::try_new(joined_schema(), columns)?)
}

/// Keep joined rows with `timestamp_right < timestamp`.
pub fn filter_before(joined: &RecordBatch) -> Result<RecordBatch> {
    let right = column::<Int64Type>(joined, TIMESTAMP_RIGHT)?;
    let left = column::<Int64Type>(joined, TIMESTAMP)?;
    let mask = lt(right, left)?;
    Ok(filter_record_batch(joined, &mask)?)
}

/// Group by `a_idx`, keeping the minimum `b_idx` of each group.
///
/// Groups are emitted in order of first appearance.
pub fn group_first(filtered: &RecordBatch) -> Result<RecordBatch> {
    let a = column::<UInt64Type>(filtered, A_IDX)?;
    let b = column::<UInt64Type>(filtered, B_IDX)?;
    let mut groups: Vec<(u64, u64)> = Vec::new();
    let mut slot_of: HashMap<u64, usize> = HashMap::new();
    for (&a_idx, &b_idx) in a.values().iter().zip(b.values()) {
        match slot_of.get(&a_idx) {
            Some(&slot) => {
                let best = &mut groups[slot].1;
                *best = (*best).min(b_idx);
            }
            None => {
                slot_of.insert(a_idx, groups.len());
                groups.push((a_idx, b_idx));
            }
        }
    }
    pairs_batch(&groups)
}

/// Sort a batch ascending by the named `UInt64` column.
pub fn sort_by(batch: &RecordBatch, by: &str) -> Result<RecordBatch> {
    let indices = sort_to_indices(column_ref(batch, by)?.as_ref(), None, None)?;
    Ok(take_record_batch(batch, &indices)?)
}

/// Fused join, filter and first-survivor grouping.
///
/// B is hashed by key in row order; each A row walks its key's rows and
/// stops at the first one with a strictly smaller timestamp. Output is in
/// A's row order, so it is already sorted when A's index column is.
pub fn probe_first_before(left: &RecordBatch, right: &RecordBatch) -> Result<RecordBatch> {
    let build = KeyedRows::from_frame(right)?;
    let a_idx = column::<UInt64Type>(left, A_IDX)?;
    let keys = column::<Int32Type>(left, KEY)?;
    let times = column::<Int64Type>(left, TIMESTAMP)?;

    let mut pairs = Vec::new();
    for ((&a, &key), &time) in a_idx.values().iter().zip(keys.values()).zip(times.values()) {
        if let Some(b) = build.first_before(key, time) {
            pairs.push((a, b));
        }
    }
    pairs_batch(&pairs)
}

/// B rows hashed by key, each bucket in arrival order.
#[derive(Debug, Default)]
pub struct KeyedRows {
    rows: HashMap<Key, Vec<(Timestamp, u64)>>,
}

impl KeyedRows {
    pub fn from_frame(frame: &RecordBatch) -> Result<Self> {
        let b_idx = column::<UInt64Type>(frame, B_IDX)?;
        let keys = column::<Int32Type>(frame, KEY)?;
        let times = column::<Int64Type>(frame, TIMESTAMP)?;
        let mut rows: HashMap<Key, Vec<(Timestamp, u64)>> = HashMap::new();
        for ((&b, &key), &time) in b_idx.values().iter().zip(keys.values()).zip(times.values()) {
            rows.entry(key).or_default().push((time, b));
        }
        Ok(Self { rows })
    }

    /// First row of `key` in arrival order with timestamp `< time`.
    pub fn first_before(&self, key: Key, time: Timestamp) -> Option<u64> {
        self.rows
            .get(&key)?
            .iter()
            .find(|&&(t, _)| t < time)
            .map(|&(_, b)| b)
    }

    pub fn bucket(&self, key: Key) -> &[(Timestamp, u64)] {
        self.rows.get(&key).map_or(&[], Vec::as_slice)
    }

    pub fn keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.rows.keys().copied()
    }
}

fn column_ref(batch: &RecordBatch, name: &str) -> Result<ArrayRef> {
    batch
        .column_by_name(name)
        .map(Arc::clone)
        .ok_or_else(|| MatchError::MissingColumn(name.to_string()))
}

fn row_u32(row: usize) -> Result<u32> {
    u32::try_from(row).map_err(|_| MatchError::Capacity {
        what: "rows per frame",
        requested: row as u128,
        limit: u128::from(u32::MAX),
    })
}
