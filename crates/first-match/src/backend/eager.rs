//! Eager relational backend.
//!
//! Materializes the full key join as one Arrow batch, then filters,
//! groups and sorts it with Arrow compute kernels.

use super::frame::{result_table, stream_frame, A_IDX, B_IDX};
use super::ops::{filter_before, group_first, join_on_key, sort_by};
use super::JoinBackend;
use crate::error::Result;
use crate::stream::EventStream;
use crate::table::MatchTable;

#[derive(Debug, Default, Clone, Copy)]
pub struct EagerBackend;

impl JoinBackend for EagerBackend {
    fn name(&self) -> &'static str {
        "eager"
    }

    fn execute(&self, a: &EventStream, b: &EventStream) -> Result<MatchTable> {
        let a_frame = stream_frame(a, A_IDX, 0)?;
        let b_frame = stream_frame(b, B_IDX, 0)?;
        let joined = join_on_key(&a_frame, &b_frame)?;
        let survivors = filter_before(&joined)?;
        let firsts = group_first(&survivors)?;
        let sorted = sort_by(&firsts, A_IDX)?;
        tracing::debug!(
            joined = joined.num_rows(),
            survivors = survivors.num_rows(),
            matched = sorted.num_rows(),
            "eager backend"
        );
        result_table(a.len(), &sorted)
    }
}
