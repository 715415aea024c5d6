//! Cross-implementation equivalence checks.
//!
//! Two match tables are equivalent when they match the same A rows to the
//! same B rows. Unmatched rows carry no information, so a table of length
//! 3 with nothing matched equals an empty table. On disagreement the
//! smallest divergent `a_idx` is reported.

use serde::Serialize;

use crate::backend::JoinBackend;
use crate::error::{MatchError, Result};
use crate::stream::EventStream;
use crate::table::MatchTable;

/// First row on which two tables disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    pub a_idx: usize,
    pub expected: Option<u64>,
    pub actual: Option<u64>,
}

impl std::fmt::Display for Mismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "a_idx {}: expected {}, got {}",
            self.a_idx,
            render(self.expected),
            render(self.actual)
        )
    }
}

fn render(slot: Option<u64>) -> String {
    slot.map_or_else(|| "unmatched".to_string(), |b| format!("b_idx {b}"))
}

/// `None` if equivalent, else the smallest divergent row.
pub fn compare_tables(expected: &MatchTable, actual: &MatchTable) -> Option<Mismatch> {
    (0..expected.len().max(actual.len())).find_map(|a_idx| {
        let (e, a) = (expected.get(a_idx), actual.get(a_idx));
        (e != a).then_some(Mismatch {
            a_idx,
            expected: e,
            actual: a,
        })
    })
}

/// Compare two pair lists regardless of their order.
pub fn compare_pairs(expected: &[(u64, u64)], actual: &[(u64, u64)]) -> Option<Mismatch> {
    let len = expected
        .iter()
        .chain(actual)
        .map(|&(a, _)| a as usize + 1)
        .max()
        .unwrap_or(0);
    compare_tables(
        &MatchTable::from_pairs(len, expected.iter().copied()),
        &MatchTable::from_pairs(len, actual.iter().copied()),
    )
}

/// Panic with `label` and the first divergent row unless equivalent.
///
/// # Panics
///
/// Panics if the tables differ.
#[track_caller]
pub fn assert_equivalent(label: &str, expected: &MatchTable, actual: &MatchTable) {
    if let Some(m) = compare_tables(expected, actual) {
        panic!("{label}: tables diverge at {m}");
    }
}

/// Run `backend` and compare it with `expected`.
///
/// # Errors
///
/// [`MatchError::Divergence`] on the first divergent row, or whatever the
/// backend itself returns.
pub fn verify_backend(
    backend: &dyn JoinBackend,
    a: &EventStream,
    b: &EventStream,
    expected: &MatchTable,
) -> Result<MatchTable> {
    let actual = backend.execute(a, b)?;
    match compare_tables(expected, &actual) {
        None => Ok(actual),
        Some(m) => Err(MatchError::Divergence {
            backend: backend.name().to_string(),
            a_idx: m.a_idx,
            expected: m.expected,
            actual: m.actual,
        }),
    }
}

/// Outcome of checking one backend.
#[derive(Debug, Clone, Serialize)]
pub struct BackendCheck {
    pub backend: String,
    pub verified: bool,
    pub matched: usize,
    pub mismatch: Option<Mismatch>,
}

impl BackendCheck {
    pub fn is_equivalent(&self) -> bool {
        self.mismatch.is_none()
    }

    /// A divergence that should fail the run.
    pub fn is_failure(&self) -> bool {
        self.verified && self.mismatch.is_some()
    }
}

impl std::fmt::Display for BackendCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = if self.verified { "" } else { " (unverified)" };
        match &self.mismatch {
            None => write!(f, "{}{tag}: equivalent, {} matched", self.backend, self.matched),
            Some(m) => write!(f, "{}{tag}: DIVERGES at {m}", self.backend),
        }
    }
}

/// Run every backend against `expected` and collect the outcomes.
///
/// Execution errors still abort; divergences are recorded.
pub fn check_backends(
    backends: &[Box<dyn JoinBackend>],
    a: &EventStream,
    b: &EventStream,
    expected: &MatchTable,
) -> Result<Vec<BackendCheck>> {
    backends
        .iter()
        .map(|backend| {
            let actual = backend.execute(a, b)?;
            let mismatch = compare_tables(expected, &actual);
            if let Some(m) = &mismatch {
                if backend.verified() {
                    tracing::warn!(backend = backend.name(), a_idx = m.a_idx, "backend diverges");
                } else {
                    tracing::info!(backend = backend.name(), a_idx = m.a_idx, "unverified backend diverges");
                }
            }
            Ok(BackendCheck {
                backend: backend.name().to_string(),
                verified: backend.verified(),
                matched: actual.matched_count(),
                mismatch,
            })
        })
        .collect()
}
