//! Columnar event streams.
//!
//! An [`EventStream`] is two parallel columns, `keys` and `timestamps`.
//! The original index of an event is its row position; nothing in this
//! crate reorders a stream in place, so that position is stable for the
//! lifetime of the value.

use std::ops::Range;

use crate::error::{MatchError, Result};

/// Discrete correlation key.
pub type Key = i32;

/// Event time, in whatever unit the producer chose.
pub type Timestamp = i64;

/// One event, materialized from a stream row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub key: Key,
    pub timestamp: Timestamp,
    pub original_index: usize,
}

/// Immutable columnar event stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventStream {
    keys: Vec<Key>,
    timestamps: Vec<Timestamp>,
}

impl EventStream {
    /// Build a stream from its two columns.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::LengthMismatch`] if the columns differ in length.
    pub fn new(keys: Vec<Key>, timestamps: Vec<Timestamp>) -> Result<Self> {
        if keys.len() != timestamps.len() {
            return Err(MatchError::LengthMismatch {
                keys: keys.len(),
                timestamps: timestamps.len(),
            });
        }
        Ok(Self { keys, timestamps })
    }

    /// Build a stream from `(key, timestamp)` rows in arrival order.
    pub fn from_rows(rows: &[(Key, Timestamp)]) -> Self {
        let (keys, timestamps) = rows.iter().copied().unzip();
        Self { keys, timestamps }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn timestamps(&self) -> &[Timestamp] {
        &self.timestamps
    }

    /// Event at row `index`, if any.
    pub fn get(&self, index: usize) -> Option<Event> {
        Some(Event {
            key: *self.keys.get(index)?,
            timestamp: *self.timestamps.get(index)?,
            original_index: index,
        })
    }

    /// Iterate events in arrival order.
    pub fn events(&self) -> impl Iterator<Item = Event> + '_ {
        self.keys
            .iter()
            .zip(self.timestamps.iter())
            .enumerate()
            .map(|(original_index, (&key, &timestamp))| Event {
                key,
                timestamp,
                original_index,
            })
    }

    /// Smallest and largest key, or `None` for an empty stream.
    pub fn key_range(&self) -> Option<(Key, Key)> {
        let min = self.keys.iter().copied().min()?;
        let max = self.keys.iter().copied().max()?;
        Some((min, max))
    }

    /// Whether timestamps are non-decreasing in arrival order.
    ///
    /// This is the precondition of the head-only match kernel.
    pub fn is_time_ordered(&self) -> bool {
        self.first_order_violation().is_none()
    }

    /// First row whose timestamp is smaller than its predecessor's.
    pub fn first_order_violation(&self) -> Option<usize> {
        self.timestamps
            .windows(2)
            .position(|w| w[1] < w[0])
            .map(|i| i + 1)
    }

    /// Copy rows `range` into a new stream.
    ///
    /// Row positions restart at zero in the copy; callers that need the
    /// original index add `range.start` back.
    ///
    /// # Panics
    ///
    /// Panics if `range` is out of bounds.
    pub fn slice(&self, range: Range<usize>) -> Self {
        Self {
            keys: self.keys[range.clone()].to_vec(),
            timestamps: self.timestamps[range].to_vec(),
        }
    }
}

/// Union of two optional key ranges.
pub fn union_key_range(a: Option<(Key, Key)>, b: Option<(Key, Key)>) -> Option<(Key, Key)> {
    match (a, b) {
        (Some((a_min, a_max)), Some((b_min, b_max))) => Some((a_min.min(b_min), a_max.max(b_max))),
        (Some(r), None) | (None, Some(r)) => Some(r),
        (None, None) => None,
    }
}
