//! First-match kernel.
//!
//! `output[i] = sorted_original_indices[start]` if the bucket for
//! `a_keys[i]` is non-empty and its head timestamp is strictly less than
//! `a_times[i]`, otherwise [`UNMATCHED`].
//!
//! Variants:
//! - `fn first_match_scalar(...)` -- sequential head-only kernel
//! - `fn first_match_parallel(...)` -- rayon head-only kernel
//! - `fn first_match_scan_scalar(...)` / `first_match_scan_parallel(...)` --
//!   fallback for B that is not time-ordered
//! - `fn first_match_linear_scan(...)` -- in-bucket linear scan
//! - `fn first_match_ptx() -> &'static str` -- PTX assembly source string

use rayon::prelude::*;

use super::bucket_index::BucketIndex;
use crate::stream::{Key, Timestamp};
use crate::table::UNMATCHED;

/// Minimum A-events per rayon task.
const PARALLEL_MIN_LEN: usize = 4096;

// ────────────────────────────────────────────────────────────────────────────
// Per-event probes
// ────────────────────────────────────────────────────────────────────────────

/// Head-only probe. Exact when every bucket head is its bucket's minimum.
#[inline]
pub fn head_probe(index: &BucketIndex, key: Key, time: Timestamp) -> i64 {
    let Some(bucket) = index.lookup(key) else {
        return UNMATCHED;
    };
    if index.sorted_timestamps()[bucket.start] < time {
        i64::from(index.sorted_original_indices()[bucket.start])
    } else {
        UNMATCHED
    }
}

/// Earliest arrival in the bucket with timestamp `< time`, via binary search
/// over the bucket's running minimum (non-increasing, so the predicate
/// `min >= time` holds on a prefix).
#[inline]
pub fn prefix_min_probe(index: &BucketIndex, prefix_min: &[Timestamp], key: Key, time: Timestamp) -> i64 {
    let Some(bucket) = index.lookup(key) else {
        return UNMATCHED;
    };
    let mins = &prefix_min[bucket.start..bucket.start + bucket.count];
    let j = mins.partition_point(|&m| m >= time);
    if j < mins.len() {
        i64::from(index.sorted_original_indices()[bucket.start + j])
    } else {
        UNMATCHED
    }
}

/// Earliest arrival in the bucket with timestamp `< time`, by linear scan.
#[inline]
pub fn linear_probe(index: &BucketIndex, key: Key, time: Timestamp) -> i64 {
    let Some(bucket) = index.lookup(key) else {
        return UNMATCHED;
    };
    let range = bucket.start..bucket.start + bucket.count;
    index.sorted_timestamps()[range.clone()]
        .iter()
        .position(|&t| t < time)
        .map_or(UNMATCHED, |j| {
            i64::from(index.sorted_original_indices()[range.start + j])
        })
}

fn check_dims(a_keys: &[Key], a_times: &[Timestamp], output: &[i64]) {
    assert_eq!(a_keys.len(), a_times.len(), "A key/timestamp length mismatch");
    assert_eq!(output.len(), a_keys.len(), "output length mismatch");
}

// ────────────────────────────────────────────────────────────────────────────
// Head-only kernel
// ────────────────────────────────────────────────────────────────────────────

/// Head-only first match (scalar reference).
///
/// # Panics
///
/// Panics if `a_keys`, `a_times` and `output` differ in length.
pub fn first_match_scalar(
    a_keys: &[Key],
    a_times: &[Timestamp],
    index: &BucketIndex,
    output: &mut [i64],
) {
    check_dims(a_keys, a_times, output);
    for ((out, &key), &time) in output.iter_mut().zip(a_keys).zip(a_times) {
        *out = head_probe(index, key, time);
    }
}

/// Head-only first match, data-parallel over A.
///
/// Each output slot is written by exactly one task; the index is shared
/// read-only.
///
/// # Panics
///
/// Same as [`first_match_scalar`].
pub fn first_match_parallel(
    a_keys: &[Key],
    a_times: &[Timestamp],
    index: &BucketIndex,
    output: &mut [i64],
) {
    check_dims(a_keys, a_times, output);
    output
        .par_iter_mut()
        .zip(a_keys.par_iter().zip(a_times.par_iter()))
        .with_min_len(PARALLEL_MIN_LEN)
        .for_each(|(out, (&key, &time))| *out = head_probe(index, key, time));
}

// ────────────────────────────────────────────────────────────────────────────
// Scan fallback (B not time-ordered)
// ────────────────────────────────────────────────────────────────────────────

/// First match without the time-order precondition (scalar).
///
/// Uses the prefix-minimum binary search when the index carries prefix
/// minima, and an in-bucket linear scan otherwise.
///
/// # Panics
///
/// Same as [`first_match_scalar`].
pub fn first_match_scan_scalar(
    a_keys: &[Key],
    a_times: &[Timestamp],
    index: &BucketIndex,
    output: &mut [i64],
) {
    check_dims(a_keys, a_times, output);
    match index.prefix_minima() {
        Some(mins) => {
            for ((out, &key), &time) in output.iter_mut().zip(a_keys).zip(a_times) {
                *out = prefix_min_probe(index, mins, key, time);
            }
        }
        None => first_match_linear_scan(a_keys, a_times, index, output),
    }
}

/// Parallel [`first_match_scan_scalar`].
///
/// # Panics
///
/// Same as [`first_match_scalar`].
pub fn first_match_scan_parallel(
    a_keys: &[Key],
    a_times: &[Timestamp],
    index: &BucketIndex,
    output: &mut [i64],
) {
    check_dims(a_keys, a_times, output);
    let mins = index.prefix_minima();
    output
        .par_iter_mut()
        .zip(a_keys.par_iter().zip(a_times.par_iter()))
        .with_min_len(PARALLEL_MIN_LEN)
        .for_each(|(out, (&key, &time))| {
            *out = match mins {
                Some(mins) => prefix_min_probe(index, mins, key, time),
                None => linear_probe(index, key, time),
            };
        });
}

/// In-bucket linear scan (scalar). O(bucket size) per A-event.
///
/// # Panics
///
/// Same as [`first_match_scalar`].
pub fn first_match_linear_scan(
    a_keys: &[Key],
    a_times: &[Timestamp],
    index: &BucketIndex,
    output: &mut [i64],
) {
    check_dims(a_keys, a_times, output);
    for ((out, &key), &time) in output.iter_mut().zip(a_keys).zip(a_times) {
        *out = linear_probe(index, key, time);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// PTX implementation
// ────────────────────────────────────────────────────────────────────────────

/// PTX assembly for the head-only first-match kernel.
///
/// One thread per A-event. Keys outside `[MIN_KEY, MIN_KEY + RANGE_SIZE)`
/// store -1 without touching the lookup table.
pub fn first_match_ptx() -> &'static str {
    r#".version 8.5
.target sm_90
.address_size 64

// First-match kernel: 1 thread per A-event.
.visible .entry first_match_kernel(
    .param .u64 A_KEYS,
    .param .u64 A_TIMES,
    .param .u64 SORTED_B_TIMES,
    .param .u64 SORTED_B_IDX,
    .param .u64 BUCKET_START,
    .param .u64 BUCKET_COUNT,
    .param .u64 OUT,
    .param .u32 SIZE_A,
    .param .s32 MIN_KEY,
    .param .u32 RANGE_SIZE
)
{
    .reg .u32 %tid, %ntid, %ctaid, %idx, %size_a, %range, %slot;
    .reg .u32 %start, %count, %b_idx;
    .reg .s32 %key, %min_key;
    .reg .s64 %a_time, %b_time, %result;
    .reg .u64 %base, %addr, %off64;
    .reg .pred %p_oob, %p_lo, %p_hi, %p_empty, %p_before;

    mov.u32 %tid, %tid.x;
    mov.u32 %ntid, %ntid.x;
    mov.u32 %ctaid, %ctaid.x;
    mad.lo.u32 %idx, %ctaid, %ntid, %tid;
    ld.param.u32 %size_a, [SIZE_A];
    setp.ge.u32 %p_oob, %idx, %size_a;
    @%p_oob bra EXIT;

    mov.s64 %result, -1;

    // key = A_KEYS[idx]
    ld.param.u64 %base, [A_KEYS];
    mul.wide.u32 %off64, %idx, 4;
    add.u64 %addr, %base, %off64;
    ld.global.s32 %key, [%addr];

    // a_time = A_TIMES[idx]
    ld.param.u64 %base, [A_TIMES];
    mul.wide.u32 %off64, %idx, 8;
    add.u64 %addr, %base, %off64;
    ld.global.s64 %a_time, [%addr];

    // slot = key - MIN_KEY, bounds-checked on both sides
    ld.param.s32 %min_key, [MIN_KEY];
    ld.param.u32 %range, [RANGE_SIZE];
    setp.lt.s32 %p_lo, %key, %min_key;
    @%p_lo bra STORE;
    sub.u32 %slot, %key, %min_key;
    setp.ge.u32 %p_hi, %slot, %range;
    @%p_hi bra STORE;

    // count = BUCKET_COUNT[slot]
    ld.param.u64 %base, [BUCKET_COUNT];
    mul.wide.u32 %off64, %slot, 4;
    add.u64 %addr, %base, %off64;
    ld.global.u32 %count, [%addr];
    setp.eq.u32 %p_empty, %count, 0;
    @%p_empty bra STORE;

    // start = BUCKET_START[slot]
    ld.param.u64 %base, [BUCKET_START];
    add.u64 %addr, %base, %off64;
    ld.global.u32 %start, [%addr];

    // head time must be strictly earlier
    ld.param.u64 %base, [SORTED_B_TIMES];
    mul.wide.u32 %off64, %start, 8;
    add.u64 %addr, %base, %off64;
    ld.global.s64 %b_time, [%addr];
    setp.lt.s64 %p_before, %b_time, %a_time;
    @!%p_before bra STORE;

    // result = SORTED_B_IDX[start]
    ld.param.u64 %base, [SORTED_B_IDX];
    mul.wide.u32 %off64, %start, 4;
    add.u64 %addr, %base, %off64;
    ld.global.u32 %b_idx, [%addr];
    cvt.u64.u32 %result, %b_idx;

STORE:
    ld.param.u64 %base, [OUT];
    mul.wide.u32 %off64, %idx, 8;
    add.u64 %addr, %base, %off64;
    st.global.s64 [%addr], %result;

EXIT:
    ret;
}
"#
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
