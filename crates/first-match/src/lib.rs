//! # first-match
//!
//! Temporal first-match correlation between two event streams.
//!
//! For every event of stream A, find the earliest-arriving event of stream
//! B with the same key and a strictly smaller timestamp. The fast path is
//! a key-bucketed index over B plus a data-parallel kernel that inspects
//! one bucket head per A-event; a brute-force oracle and several
//! relational backends certify it.
//!
//! ## Modules
//!
//! - [`stream`] -- Columnar event streams
//! - [`kernels`] -- Bucket index, match kernels, oracle
//! - [`table`] -- Dense match table and its Arrow export
//! - [`pipeline`] -- Ordering modes and end-to-end correlation
//! - [`backend`] -- Eager, lazy, streaming and as-of relational backends
//! - [`equivalence`] -- Table comparison and backend certification
//! - [`config`] -- Parse and validate YAML job files
//! - [`job`] -- Run a configured job and report
//! - [`io`] -- Arrow IPC input and output
//! - [`generate`] -- Seeded synthetic streams
//! - [`timing`] -- Injectable stage timers

pub mod backend;
pub mod config;
pub mod equivalence;
pub mod error;
pub mod generate;
pub mod io;
pub mod job;
pub mod kernels;
pub mod pipeline;
pub mod stream;
pub mod table;
pub mod timing;
