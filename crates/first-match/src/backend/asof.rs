//! Backward as-of backend.
//!
//! Joins every A row to the nearest preceding B row of the same key
//! (largest timestamp `<=` A's, ties resolved to the later arrival), then
//! applies the strict `<` filter and first-survivor grouping. This answers
//! "most recent" rather than "earliest", so it is registered as
//! unverified: the equivalence harness reports where it diverges.

use std::collections::HashMap;

use arrow::datatypes::{Int32Type, Int64Type, UInt64Type};

use super::frame::{column, pairs_batch, result_table, stream_frame, A_IDX, B_IDX, KEY, TIMESTAMP};
use super::ops::{group_first, sort_by};
use super::JoinBackend;
use crate::error::Result;
use crate::stream::{EventStream, Key, Timestamp};
use crate::table::MatchTable;

#[derive(Debug, Default, Clone, Copy)]
pub struct AsofBackend;

impl JoinBackend for AsofBackend {
    fn name(&self) -> &'static str {
        "asof"
    }

    fn verified(&self) -> bool {
        false
    }

    fn execute(&self, a: &EventStream, b: &EventStream) -> Result<MatchTable> {
        let a_frame = stream_frame(a, A_IDX, 0)?;
        let b_frame = stream_frame(b, B_IDX, 0)?;

        // Per-key B rows ordered by timestamp, arrival order within ties.
        let mut by_key: HashMap<Key, Vec<(Timestamp, u64)>> = HashMap::new();
        let b_idx = column::<UInt64Type>(&b_frame, B_IDX)?;
        let b_keys = column::<Int32Type>(&b_frame, KEY)?;
        let b_times = column::<Int64Type>(&b_frame, TIMESTAMP)?;
        for ((&idx, &key), &time) in b_idx.values().iter().zip(b_keys.values()).zip(b_times.values()) {
            by_key.entry(key).or_default().push((time, idx));
        }
        for rows in by_key.values_mut() {
            rows.sort_by_key(|&(time, _)| time);
        }

        let a_idx = column::<UInt64Type>(&a_frame, A_IDX)?;
        let a_keys = column::<Int32Type>(&a_frame, KEY)?;
        let a_times = column::<Int64Type>(&a_frame, TIMESTAMP)?;
        let mut joined = Vec::new();
        for ((&idx, key), &time) in a_idx.values().iter().zip(a_keys.values()).zip(a_times.values()) {
            let Some(rows) = by_key.get(key) else { continue };
            let end = rows.partition_point(|&(t, _)| t <= time);
            let Some(&(nearest_time, nearest_idx)) = end.checked_sub(1).and_then(|i| rows.get(i)) else {
                continue;
            };
            if nearest_time < time {
                joined.push((idx, nearest_idx));
            }
        }

        let firsts = group_first(&pairs_batch(&joined)?)?;
        let sorted = sort_by(&firsts, A_IDX)?;
        tracing::debug!(matched = sorted.num_rows(), "asof backend");
        result_table(a.len(), &sorted)
    }
}
