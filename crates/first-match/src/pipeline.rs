//! End-to-end correlation through the bucket index and match kernel.
//!
//! The head-only kernel is only exact when every bucket head is its
//! bucket's minimum timestamp. [`OrderingMode`] makes the caller say how
//! that precondition is handled; nothing is inferred silently.

use serde::{Deserialize, Serialize};

use crate::error::{MatchError, Result};
use crate::kernels::{dispatch_head_only, dispatch_scan, BucketIndex, IndexLimits, IndexOptions, KernelBackend};
use crate::stream::{EventStream, Key};
use crate::table::{MatchTable, UNMATCHED};
use crate::timing::Stopwatch;

/// How the B time-order precondition is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderingMode {
    /// Assume B is time-ordered. Fastest; wrong answers if it is not.
    Trusted,
    /// Check before running the head-only kernel and fail if it would be
    /// inexact.
    #[default]
    Validated,
    /// Accept any B and search each bucket for the first qualifying event.
    Scan,
}

impl std::fmt::Display for OrderingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trusted => write!(f, "trusted"),
            Self::Validated => write!(f, "validated"),
            Self::Scan => write!(f, "scan"),
        }
    }
}

impl std::str::FromStr for OrderingMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "trusted" => Ok(Self::Trusted),
            "validated" => Ok(Self::Validated),
            "scan" => Ok(Self::Scan),
            other => Err(format!(
                "unknown ordering mode '{other}' (expected trusted, validated or scan)"
            )),
        }
    }
}

/// Kernel-path settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorrelateOptions {
    pub backend: KernelBackend,
    pub ordering: OrderingMode,
    /// Worker threads; 0 uses rayon's global pool.
    pub threads: usize,
    pub limits: IndexLimits,
    /// Widen the index to this key range instead of B's own.
    pub key_range: Option<(Key, Key)>,
}

/// Match every A-event against B.
///
/// Stages recorded on `timer`: `index`, `validate` (validated mode only)
/// and `probe`.
///
/// # Errors
///
/// - [`MatchError::UnorderedStream`] in validated mode when a bucket head
///   is not its bucket's minimum.
/// - [`MatchError::Capacity`] / [`MatchError::InvalidKeyRange`] from the
///   index build.
/// - [`MatchError::ThreadPool`] if a dedicated pool cannot be built.
pub fn correlate<W: Stopwatch + Send>(
    a: &EventStream,
    b: &EventStream,
    options: &CorrelateOptions,
    timer: &mut W,
) -> Result<MatchTable> {
    in_pool(options.threads, || correlate_inner(a, b, options, timer))
}

fn correlate_inner<W: Stopwatch>(
    a: &EventStream,
    b: &EventStream,
    options: &CorrelateOptions,
    timer: &mut W,
) -> Result<MatchTable> {
    let scan = options.ordering == OrderingMode::Scan;
    let index_options = IndexOptions {
        parallel: options.backend == KernelBackend::Parallel,
        key_range: options.key_range,
        prefix_minima: scan,
        limits: options.limits,
    };
    let index = timer.time("index", || BucketIndex::build_with(b, &index_options))?;

    if options.ordering == OrderingMode::Validated {
        timer.time("validate", || check_head_order(b, &index))?;
    }

    let table = timer.time("probe", || probe(a, &index, options.backend, scan));
    tracing::info!(
        a_rows = a.len(),
        b_rows = b.len(),
        matched = table.matched_count(),
        backend = %options.backend,
        ordering = %options.ordering,
        "correlated"
    );
    Ok(table)
}

/// Validated-mode precondition check.
///
/// A globally time-ordered B always passes. Otherwise the head-only kernel
/// is still exact if every bucket's head is its minimum; if not, the
/// first out-of-order row of B is reported.
///
/// # Errors
///
/// [`MatchError::UnorderedStream`] when a bucket head is not its minimum.
pub fn check_head_order(b: &EventStream, index: &BucketIndex) -> Result<()> {
    let Some(position) = b.first_order_violation() else {
        return Ok(());
    };
    match index.first_head_violation() {
        None => {
            tracing::debug!(position, "B is not time-ordered but every bucket head is minimal");
            Ok(())
        }
        Some(key) => {
            tracing::warn!(position, key, "bucket head is not the earliest timestamp");
            Err(MatchError::UnorderedStream { position })
        }
    }
}

/// Run a kernel over a prebuilt index.
///
/// `scan` selects the fallback; the index should then carry prefix minima
/// (the fallback degrades to a linear bucket scan otherwise).
pub fn probe(a: &EventStream, index: &BucketIndex, backend: KernelBackend, scan: bool) -> MatchTable {
    let mut slots = vec![UNMATCHED; a.len()];
    if scan {
        dispatch_scan(backend, a.keys(), a.timestamps(), index, &mut slots);
    } else {
        dispatch_head_only(backend, a.keys(), a.timestamps(), index, &mut slots);
    }
    MatchTable::from_slots(slots)
}

/// Run `f` on a dedicated pool of `threads` workers, or inline for 0.
pub fn in_pool<T: Send>(threads: usize, f: impl FnOnce() -> Result<T> + Send) -> Result<T> {
    if threads == 0 {
        return f();
    }
    let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
    pool.install(f)
}
