//! Deterministic synthetic event streams.
//!
//! Streams are produced chunk by chunk: each chunk draws uniform
//! timestamps and keys from a seeded [`StdRng`] and sorts its timestamps.
//! With [`TimeLayout::Sorted`] every chunk draws from its own slice of the
//! time range, so the whole stream is non-decreasing. With
//! [`TimeLayout::ChunkSorted`] every chunk spans the full range, which
//! leaves the stream sorted only within chunks.

use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{MatchError, Result};
use crate::stream::{EventStream, Key, Timestamp};

/// Time ordering of a generated stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeLayout {
    #[default]
    Sorted,
    ChunkSorted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub rows: usize,
    /// Inclusive lower bound of timestamps.
    pub time_start: Timestamp,
    /// Exclusive upper bound of timestamps.
    pub time_end: Timestamp,
    /// Keys are drawn from `[0, key_cardinality)`.
    pub key_cardinality: Key,
    pub chunk_size: usize,
    pub seed: u64,
    pub layout: TimeLayout,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            rows: 1_000_000,
            time_start: 1_000,
            time_end: 500_000,
            key_cardinality: 2_000,
            chunk_size: 500_000,
            seed: 0,
            layout: TimeLayout::Sorted,
        }
    }
}

impl GeneratorConfig {
    pub fn with_rows(rows: usize, seed: u64) -> Self {
        Self {
            rows,
            seed,
            ..Self::default()
        }
    }

    fn check(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(MatchError::InvalidChunkSize);
        }
        if self.time_end <= self.time_start {
            return Err(MatchError::InvalidConfig(format!(
                "empty time range [{}, {})",
                self.time_start, self.time_end
            )));
        }
        if self.key_cardinality <= 0 {
            return Err(MatchError::InvalidConfig(format!(
                "key cardinality must be positive, got {}",
                self.key_cardinality
            )));
        }
        Ok(())
    }
}

/// Yields the stream one chunk at a time.
#[derive(Debug)]
pub struct ChunkGenerator {
    config: GeneratorConfig,
    rng: StdRng,
    produced: usize,
}

impl ChunkGenerator {
    /// # Errors
    ///
    /// [`MatchError::InvalidChunkSize`] or [`MatchError::InvalidConfig`]
    /// for an unusable configuration.
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        config.check()?;
        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            produced: 0,
        })
    }

    fn chunk_time_range(&self, first_row: usize, rows: usize) -> (Timestamp, Timestamp) {
        let GeneratorConfig {
            time_start,
            time_end,
            layout,
            rows: total,
            ..
        } = self.config;
        match layout {
            TimeLayout::ChunkSorted => (time_start, time_end),
            TimeLayout::Sorted => {
                let span = i128::from(time_end - time_start);
                let at = |row: usize| time_start + (span * row as i128 / total.max(1) as i128) as Timestamp;
                let lo = at(first_row);
                let hi = at(first_row + rows).max(lo + 1);
                (lo, hi)
            }
        }
    }
}

impl Iterator for ChunkGenerator {
    type Item = EventStream;

    fn next(&mut self) -> Option<EventStream> {
        let remaining = self.config.rows - self.produced;
        if remaining == 0 {
            return None;
        }
        let rows = remaining.min(self.config.chunk_size);
        let (lo, hi) = self.chunk_time_range(self.produced, rows);
        let mut timestamps: Vec<Timestamp> = (0..rows).map(|_| self.rng.gen_range(lo..hi)).collect();
        timestamps.sort_unstable();
        let keys: Vec<Key> = (0..rows)
            .map(|_| self.rng.gen_range(0..self.config.key_cardinality))
            .collect();
        self.produced += rows;
        EventStream::new(keys, timestamps).ok()
    }
}

/// Generate a whole stream in memory.
///
/// # Errors
///
/// See [`ChunkGenerator::new`].
pub fn generate_stream(config: &GeneratorConfig) -> Result<EventStream> {
    let mut keys = Vec::with_capacity(config.rows);
    let mut timestamps = Vec::with_capacity(config.rows);
    for chunk in ChunkGenerator::new(config.clone())? {
        keys.extend_from_slice(chunk.keys());
        timestamps.extend_from_slice(chunk.timestamps());
    }
    tracing::debug!(rows = keys.len(), seed = config.seed, layout = ?config.layout, "generated stream");
    EventStream::new(keys, timestamps)
}
