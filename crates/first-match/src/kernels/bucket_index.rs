//! Bucket index over stream B.
//!
//! Sorts B stably by key, run-length encodes the sorted keys, and scatters
//! each run's `(start, count)` into dense arrays addressed by
//! `key - min_key`. Lookup is one subtraction and one bounds check.
//!
//! Stages never write into the previous stage's buffer:
//! permutation → gathered columns → runs → dense table.
//!
//! The stable sort keeps arrival order inside a bucket, so the bucket head
//! is always the earliest-arriving B-event for its key. When B is
//! non-decreasing in time the head is also the bucket's minimum timestamp,
//! which is what the head-only match kernel relies on.

use rayon::prelude::*;

use crate::error::{MatchError, Result};
use crate::stream::{EventStream, Key, Timestamp};

/// Default ceiling on dense lookup-table entries (two `u32` arrays, 1 GiB).
pub const DEFAULT_MAX_LOOKUP_ENTRIES: usize = 1 << 27;

/// Contiguous range of the key-sorted arrays holding one key's events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    pub start: usize,
    pub count: usize,
}

/// One run of equal keys in the sorted key column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRun {
    pub key: Key,
    pub start: u32,
    pub count: u32,
}

/// Allocation limits checked before building the dense table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexLimits {
    pub max_lookup_entries: usize,
}

impl Default for IndexLimits {
    fn default() -> Self {
        Self {
            max_lookup_entries: DEFAULT_MAX_LOOKUP_ENTRIES,
        }
    }
}

/// Build options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexOptions {
    /// Use rayon for the sort, gather, and run-length stages.
    pub parallel: bool,
    /// Table key range; `None` means B's own key range.
    pub key_range: Option<(Key, Key)>,
    /// Also compute per-bucket prefix minima for the scan fallback.
    pub prefix_minima: bool,
    pub limits: IndexLimits,
}

/// Immutable bucket index for one stream B.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketIndex {
    min_key: Key,
    sorted_timestamps: Vec<Timestamp>,
    sorted_original_indices: Vec<u32>,
    bucket_start: Vec<u32>,
    bucket_count: Vec<u32>,
    prefix_min: Option<Vec<Timestamp>>,
}

impl BucketIndex {
    /// Sequential build over B's own key range.
    pub fn build(b: &EventStream) -> Result<Self> {
        Self::build_with(b, &IndexOptions::default())
    }

    /// Parallel build over B's own key range. Produces the same arrays as
    /// [`BucketIndex::build`].
    pub fn build_parallel(b: &EventStream) -> Result<Self> {
        Self::build_with(
            b,
            &IndexOptions {
                parallel: true,
                ..IndexOptions::default()
            },
        )
    }

    /// Build with the table widened to `[min_key, max_key]`.
    ///
    /// # Errors
    ///
    /// [`MatchError::InvalidKeyRange`] if the range does not cover B's keys.
    pub fn build_with_range(b: &EventStream, min_key: Key, max_key: Key) -> Result<Self> {
        Self::build_with(
            b,
            &IndexOptions {
                key_range: Some((min_key, max_key)),
                ..IndexOptions::default()
            },
        )
    }

    /// Build with explicit options.
    ///
    /// # Errors
    ///
    /// - [`MatchError::InvalidKeyRange`] if `key_range` is inverted or
    ///   misses one of B's keys.
    /// - [`MatchError::Capacity`] if B has more rows than a `u32` offset can
    ///   address, or the dense table would exceed `limits`.
    pub fn build_with(b: &EventStream, options: &IndexOptions) -> Result<Self> {
        if b.len() > u32::MAX as usize {
            return Err(MatchError::Capacity {
                what: "bucket index rows",
                requested: b.len() as u128,
                limit: u128::from(u32::MAX),
            });
        }

        let (min_key, max_key) = resolve_key_range(b, options.key_range)?;
        let range_size = range_size(min_key, max_key);
        if range_size > options.limits.max_lookup_entries as u128 {
            return Err(MatchError::Capacity {
                what: "lookup table entries",
                requested: range_size,
                limit: options.limits.max_lookup_entries as u128,
            });
        }

        let permutation = if options.parallel {
            stable_key_permutation_parallel(b.keys())
        } else {
            stable_key_permutation(b.keys())
        };

        let sorted_keys = gather(b.keys(), &permutation, options.parallel);
        let sorted_timestamps = gather(b.timestamps(), &permutation, options.parallel);
        let sorted_original_indices = permutation;

        let runs = if options.parallel {
            run_length_encode_parallel(&sorted_keys)
        } else {
            run_length_encode(&sorted_keys)
        };

        let (bucket_start, bucket_count) = scatter_runs(&runs, min_key, range_size as usize);

        let mut index = Self {
            min_key,
            sorted_timestamps,
            sorted_original_indices,
            bucket_start,
            bucket_count,
            prefix_min: None,
        };
        if options.prefix_minima {
            index.prefix_min = Some(index.compute_prefix_minima());
        }

        tracing::debug!(
            rows = b.len(),
            buckets = runs.len(),
            min_key,
            max_key,
            parallel = options.parallel,
            "built bucket index"
        );
        Ok(index)
    }

    /// Return this index with per-bucket prefix minima attached.
    pub fn with_prefix_minima(mut self) -> Self {
        if self.prefix_min.is_none() {
            self.prefix_min = Some(self.compute_prefix_minima());
        }
        self
    }

    /// Bucket for `key`, or `None` if the key is absent or outside the table.
    #[inline]
    pub fn lookup(&self, key: Key) -> Option<Bucket> {
        let offset = i64::from(key) - i64::from(self.min_key);
        let slot = usize::try_from(offset).ok()?;
        let count = *self.bucket_count.get(slot)?;
        if count == 0 {
            return None;
        }
        Some(Bucket {
            start: self.bucket_start[slot] as usize,
            count: count as usize,
        })
    }

    pub fn min_key(&self) -> Key {
        self.min_key
    }

    /// Number of dense table slots.
    pub fn range_size(&self) -> usize {
        self.bucket_count.len()
    }

    /// Number of indexed B-events.
    pub fn len(&self) -> usize {
        self.sorted_timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted_timestamps.is_empty()
    }

    pub fn sorted_timestamps(&self) -> &[Timestamp] {
        &self.sorted_timestamps
    }

    pub fn sorted_original_indices(&self) -> &[u32] {
        &self.sorted_original_indices
    }

    pub fn bucket_starts(&self) -> &[u32] {
        &self.bucket_start
    }

    pub fn bucket_counts(&self) -> &[u32] {
        &self.bucket_count
    }

    /// Running minimum of timestamps within each bucket, aligned with
    /// [`BucketIndex::sorted_timestamps`].
    pub fn prefix_minima(&self) -> Option<&[Timestamp]> {
        self.prefix_min.as_deref()
    }

    /// First key whose bucket head is not the bucket's minimum timestamp.
    ///
    /// `None` means the head-only kernel is exact for this index, whether
    /// or not B as a whole is time-ordered.
    pub fn first_head_violation(&self) -> Option<Key> {
        self.buckets().find_map(|(key, bucket)| {
            let ts = &self.sorted_timestamps[bucket.start..bucket.start + bucket.count];
            let head = ts[0];
            ts[1..].iter().any(|&t| t < head).then_some(key)
        })
    }

    /// Non-empty buckets in key order.
    pub fn buckets(&self) -> impl Iterator<Item = (Key, Bucket)> + '_ {
        self.bucket_count
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count > 0)
            .map(|(slot, &count)| {
                let key = (i64::from(self.min_key) + slot as i64) as Key;
                (
                    key,
                    Bucket {
                        start: self.bucket_start[slot] as usize,
                        count: count as usize,
                    },
                )
            })
    }

    fn compute_prefix_minima(&self) -> Vec<Timestamp> {
        let mut out = vec![0; self.sorted_timestamps.len()];
        for (_, bucket) in self.buckets() {
            let range = bucket.start..bucket.start + bucket.count;
            let mut running = Timestamp::MAX;
            for (dst, &ts) in out[range.clone()]
                .iter_mut()
                .zip(&self.sorted_timestamps[range])
            {
                running = running.min(ts);
                *dst = running;
            }
        }
        out
    }
}

fn resolve_key_range(b: &EventStream, requested: Option<(Key, Key)>) -> Result<(Key, Key)> {
    let stream_range = b.key_range();
    match (requested, stream_range) {
        (Some((min_key, max_key)), _) if min_key > max_key => Err(MatchError::InvalidKeyRange {
            min_key,
            max_key,
            stream_min: stream_range.map_or(min_key, |r| r.0),
            stream_max: stream_range.map_or(max_key, |r| r.1),
        }),
        (Some((min_key, max_key)), Some((stream_min, stream_max)))
            if stream_min < min_key || stream_max > max_key =>
        {
            Err(MatchError::InvalidKeyRange {
                min_key,
                max_key,
                stream_min,
                stream_max,
            })
        }
        (Some(range), _) | (None, Some(range)) => Ok(range),
        // Empty B with no requested range: a one-slot table that is always empty.
        (None, None) => Ok((0, 0)),
    }
}

fn range_size(min_key: Key, max_key: Key) -> u128 {
    (i64::from(max_key) - i64::from(min_key) + 1) as u128
}

/// Indices of `keys` in stable key order (ties keep arrival order).
pub fn stable_key_permutation(keys: &[Key]) -> Vec<u32> {
    let mut perm: Vec<u32> = (0..keys.len() as u32).collect();
    perm.sort_by_key(|&i| keys[i as usize]);
    perm
}

/// Parallel [`stable_key_permutation`]; rayon's `par_sort_by_key` is stable.
pub fn stable_key_permutation_parallel(keys: &[Key]) -> Vec<u32> {
    let mut perm: Vec<u32> = (0..keys.len() as u32).into_par_iter().collect();
    perm.par_sort_by_key(|&i| keys[i as usize]);
    perm
}

fn gather<T: Copy + Send + Sync>(column: &[T], permutation: &[u32], parallel: bool) -> Vec<T> {
    if parallel {
        permutation.par_iter().map(|&i| column[i as usize]).collect()
    } else {
        permutation.iter().map(|&i| column[i as usize]).collect()
    }
}

/// Runs of equal keys in a sorted key column.
pub fn run_length_encode(sorted_keys: &[Key]) -> Vec<KeyRun> {
    let mut runs: Vec<KeyRun> = Vec::new();
    for (i, &key) in sorted_keys.iter().enumerate() {
        match runs.last_mut() {
            Some(run) if run.key == key => run.count += 1,
            _ => runs.push(KeyRun {
                key,
                start: i as u32,
                count: 1,
            }),
        }
    }
    runs
}

/// Parallel [`run_length_encode`]: find run boundaries in parallel, then
/// derive counts from consecutive boundaries.
pub fn run_length_encode_parallel(sorted_keys: &[Key]) -> Vec<KeyRun> {
    let boundaries: Vec<usize> = (0..sorted_keys.len())
        .into_par_iter()
        .filter(|&i| i == 0 || sorted_keys[i] != sorted_keys[i - 1])
        .collect();

    boundaries
        .par_iter()
        .enumerate()
        .map(|(r, &start)| {
            let end = boundaries.get(r + 1).copied().unwrap_or(sorted_keys.len());
            KeyRun {
                key: sorted_keys[start],
                start: start as u32,
                count: (end - start) as u32,
            }
        })
        .collect()
}

fn scatter_runs(runs: &[KeyRun], min_key: Key, range_size: usize) -> (Vec<u32>, Vec<u32>) {
    let mut starts = vec![0_u32; range_size];
    let mut counts = vec![0_u32; range_size];
    for run in runs {
        let slot = (i64::from(run.key) - i64::from(min_key)) as usize;
        starts[slot] = run.start;
        counts[slot] = run.count;
    }
    (starts, counts)
}
