//! Shared helpers for correlation integration tests.

#![allow(dead_code)]

use first_match::kernels::bucket_index::BucketIndex;
use first_match::kernels::first_match::{first_match_parallel, first_match_scalar};
use first_match::stream::{EventStream, Key, Timestamp};
use first_match::table::{MatchTable, UNMATCHED};
use proptest::prelude::*;

/// Stream with arbitrary arrival order.
pub fn arb_stream(max_len: usize, keys: Key, max_time: Timestamp) -> impl Strategy<Value = EventStream> {
    prop::collection::vec((0..keys, 0..max_time), 0..=max_len)
        .prop_map(|rows| EventStream::from_rows(&rows))
}

/// Stream whose timestamps never decrease.
pub fn arb_sorted_stream(max_len: usize, keys: Key, max_step: Timestamp) -> impl Strategy<Value = EventStream> {
    prop::collection::vec((0..keys, 0..=max_step), 0..=max_len).prop_map(|rows| {
        let mut time = 0;
        let rows: Vec<(Key, Timestamp)> = rows
            .into_iter()
            .map(|(key, step)| {
                time += step;
                (key, time)
            })
            .collect();
        EventStream::from_rows(&rows)
    })
}

/// Head-only kernel over a freshly built index.
pub fn head_only(a: &EventStream, b: &EventStream, parallel: bool) -> MatchTable {
    let index = BucketIndex::build(b).unwrap();
    let mut out = vec![UNMATCHED; a.len()];
    if parallel {
        first_match_parallel(a.keys(), a.timestamps(), &index, &mut out);
    } else {
        first_match_scalar(a.keys(), a.timestamps(), &index, &mut out);
    }
    MatchTable::from_slots(out)
}

/// Run a hand-written per-bucket probe through the bucket index. The probe
/// sees one bucket's timestamps and original indices in arrival order.
pub fn run_variant(a: &EventStream, b: &EventStream, probe: fn(&[Timestamp], &[u32], Timestamp) -> i64) -> MatchTable {
    let index = BucketIndex::build(b).unwrap();
    let slots = a
        .keys()
        .iter()
        .zip(a.timestamps())
        .map(|(&key, &time)| match index.lookup(key) {
            None => UNMATCHED,
            Some(bucket) => probe(
                &index.sorted_timestamps()[bucket.start..bucket.start + bucket.count],
                &index.sorted_original_indices()[bucket.start..bucket.start + bucket.count],
                time,
            ),
        })
        .collect();
    MatchTable::from_slots(slots)
}

/// The three reference scenarios: `(A, B, expected pairs)`.
pub fn scenarios() -> Vec<(EventStream, EventStream, Vec<(u64, u64)>)> {
    vec![
        (
            EventStream::from_rows(&[(5, 100)]),
            EventStream::from_rows(&[(5, 50), (5, 90)]),
            vec![(0, 0)],
        ),
        (
            EventStream::from_rows(&[(5, 40)]),
            EventStream::from_rows(&[(5, 50)]),
            vec![],
        ),
        (
            EventStream::from_rows(&[(1, 10), (2, 10)]),
            EventStream::from_rows(&[(1, 5), (2, 20)]),
            vec![(0, 0)],
        ),
    ]
}
