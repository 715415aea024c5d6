//! Match table: one slot per A-event, holding a B original index or
//! [`UNMATCHED`].

use std::sync::Arc;

use arrow::array::{RecordBatch, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};

use crate::error::Result;

/// Sentinel for an A-event with no qualifying B-event.
pub const UNMATCHED: i64 = -1;

/// Dense match table indexed by A's original index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchTable {
    slots: Vec<i64>,
}

impl MatchTable {
    /// A table of `len` unmatched slots.
    pub fn unmatched(len: usize) -> Self {
        Self {
            slots: vec![UNMATCHED; len],
        }
    }

    /// Wrap a kernel output buffer. Negative entries mean unmatched.
    pub fn from_slots(slots: Vec<i64>) -> Self {
        Self { slots }
    }

    /// Build a dense table of `len` slots from matched pairs.
    ///
    /// Pairs with `a_idx >= len` are ignored. If an `a_idx` repeats, the
    /// last pair wins.
    pub fn from_pairs(len: usize, pairs: impl IntoIterator<Item = (u64, u64)>) -> Self {
        let mut slots = vec![UNMATCHED; len];
        for (a_idx, b_idx) in pairs {
            if let Some(slot) = usize::try_from(a_idx).ok().and_then(|a| slots.get_mut(a)) {
                *slot = b_idx as i64;
            }
        }
        Self { slots }
    }

    /// Number of A-events the table covers.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[i64] {
        &self.slots
    }

    /// Matched B index for `a_idx`, or `None`.
    pub fn get(&self, a_idx: usize) -> Option<u64> {
        self.slots
            .get(a_idx)
            .copied()
            .filter(|&b| b >= 0)
            .map(|b| b as u64)
    }

    /// Matched `(a_idx, b_idx)` pairs in ascending `a_idx`.
    pub fn pairs(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|&(_, &b)| b >= 0)
            .map(|(a, &b)| (a as u64, b as u64))
    }

    pub fn matched_count(&self) -> usize {
        self.slots.iter().filter(|&&b| b >= 0).count()
    }

    /// Output schema: `(a_idx: UInt64, b_idx: UInt64)`.
    pub fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("a_idx", DataType::UInt64, false),
            Field::new("b_idx", DataType::UInt64, false),
        ]))
    }

    /// Matched pairs as a two-column batch ordered by `a_idx`.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let (a, b): (Vec<u64>, Vec<u64>) = self.pairs().unzip();
        let batch = RecordBatch::try_new(
            Self::schema(),
            vec![
                Arc::new(UInt64Array::from(a)),
                Arc::new(UInt64Array::from(b)),
            ],
        )?;
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, AsArray};
    use arrow::datatypes::UInt64Type;

    #[test]
    fn unmatched_table_has_no_pairs() {
        let t = MatchTable::unmatched(4);
        assert_eq!(t.len(), 4);
        assert_eq!(t.matched_count(), 0);
        assert_eq!(t.pairs().count(), 0);
        assert_eq!(t.get(0), None);
    }

    #[test]
    fn from_pairs_scatters_into_dense_slots() {
        let t = MatchTable::from_pairs(5, [(3, 7), (0, 2)]);
        assert_eq!(t.slots(), &[2, -1, -1, 7, -1]);
        assert_eq!(t.pairs().collect::<Vec<_>>(), vec![(0, 2), (3, 7)]);
    }

    #[test]
    fn from_pairs_ignores_out_of_domain_rows() {
        let t = MatchTable::from_pairs(2, [(9, 1)]);
        assert_eq!(t.matched_count(), 0);
    }

    #[test]
    fn get_out_of_range_is_none() {
        let t = MatchTable::from_slots(vec![0]);
        assert_eq!(t.get(0), Some(0));
        assert_eq!(t.get(1), None);
    }

    #[test]
    fn record_batch_contains_only_matches_in_order() {
        let t = MatchTable::from_slots(vec![-1, 4, -1, 0]);
        let batch = t.to_record_batch().unwrap();
        assert_eq!(batch.num_rows(), 2);
        let a = batch.column(0).as_primitive::<UInt64Type>();
        let b = batch.column(1).as_primitive::<UInt64Type>();
        assert_eq!(a.values().to_vec(), vec![1, 3]);
        assert_eq!(b.values().to_vec(), vec![4, 0]);
        assert_eq!(a.null_count(), 0);
    }

    #[test]
    fn empty_table_yields_empty_batch() {
        let batch = MatchTable::unmatched(0).to_record_batch().unwrap();
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.schema(), MatchTable::schema());
    }
}
