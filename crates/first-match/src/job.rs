//! Config-driven correlation job.
//!
//! Reads both streams, runs the kernel, optionally certifies it against
//! the oracle, cross-checks the configured backends, and writes the
//! matches. Divergences are collected into the [`JobReport`] rather than
//! aborting, so the caller can print the full report before failing.

use std::path::PathBuf;

use serde::Serialize;

use crate::backend::JoinBackend;
use crate::config::{has_errors, validate_config, JobConfig};
use crate::equivalence::{check_backends, compare_tables, BackendCheck};
use crate::error::{MatchError, Result};
use crate::io::{read_stream_ipc, write_match_table_ipc};
use crate::kernels::oracle::first_match_oracle_checked;
use crate::pipeline::correlate;
use crate::table::MatchTable;
use crate::timing::{StageTimer, StageTiming, Stopwatch};

#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub a_rows: usize,
    pub b_rows: usize,
    pub matched: usize,
    pub kernel: String,
    pub ordering: String,
    /// Kernel checked against the oracle, when requested.
    pub oracle: Option<BackendCheck>,
    pub backends: Vec<BackendCheck>,
    pub stages: Vec<StageTiming>,
    pub output: Option<PathBuf>,
}

impl JobReport {
    /// The first divergence that must fail the job.
    pub fn failure(&self) -> Option<MatchError> {
        self.oracle
            .iter()
            .chain(&self.backends)
            .find(|check| check.is_failure())
            .and_then(|check| {
                let m = check.mismatch?;
                Some(MatchError::Divergence {
                    backend: check.backend.clone(),
                    a_idx: m.a_idx,
                    expected: m.expected,
                    actual: m.actual,
                })
            })
    }
}

/// Run a job. Stage timings are recorded on `timer` and copied into the
/// report.
///
/// # Errors
///
/// [`MatchError::InvalidConfig`] if validation finds errors; otherwise any
/// I/O, Arrow, capacity or ordering error from the stages.
pub fn run_job(config: &JobConfig, timer: &mut StageTimer) -> Result<JobReport> {
    let violations = validate_config(config);
    if has_errors(&violations) {
        let messages: Vec<String> = violations.iter().map(ToString::to_string).collect();
        return Err(MatchError::InvalidConfig(messages.join("; ")));
    }

    let a = timer.time("read_a", || read_stream_ipc(&config.inputs.a, &config.columns))?;
    let b = timer.time("read_b", || read_stream_ipc(&config.inputs.b, &config.columns))?;
    let options = config.correlate_options();
    let table = correlate(&a, &b, &options, timer)?;

    let expected = if config.verify.oracle {
        Some(timer.time("oracle", || {
            first_match_oracle_checked(&a, &b, u128::from(config.verify.max_pairs))
        })?)
    } else {
        None
    };
    let oracle = expected.as_ref().map(|expected| BackendCheck {
        backend: "kernel".to_string(),
        verified: true,
        matched: table.matched_count(),
        mismatch: compare_tables(expected, &table),
    });

    let backends = config
        .backends
        .iter()
        .map(|kind| kind.build(config.streaming.chunk_size))
        .collect::<Result<Vec<Box<dyn JoinBackend>>>>()?;
    // Backends are judged against the oracle when it ran, else the kernel.
    let reference = expected.as_ref().unwrap_or(&table);
    let checks = timer.time("backends", || check_backends(&backends, &a, &b, reference))?;

    if let Some(path) = &config.output {
        timer.time("write", || write_match_table_ipc(path, &table))?;
    }

    let report = JobReport {
        a_rows: a.len(),
        b_rows: b.len(),
        matched: table.matched_count(),
        kernel: options.backend.to_string(),
        ordering: options.ordering.to_string(),
        oracle,
        backends: checks,
        stages: timer.stages().to_vec(),
        output: config.output.clone(),
    };
    tracing::info!(
        matched = report.matched,
        backends = report.backends.len(),
        failed = report.failure().is_some(),
        "job finished"
    );
    Ok(report)
}

/// Kernel table for a job without cross-checks or output.
pub fn correlate_job(config: &JobConfig, timer: &mut StageTimer) -> Result<MatchTable> {
    let a = read_stream_ipc(&config.inputs.a, &config.columns)?;
    let b = read_stream_ipc(&config.inputs.b, &config.columns)?;
    correlate(&a, &b, &config.correlate_options(), timer)
}
