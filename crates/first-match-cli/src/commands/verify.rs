use std::path::Path;

use first_match::backend::{BackendKind, JoinBackend};
use first_match::equivalence::{check_backends, compare_tables, BackendCheck};
use first_match::io::{read_stream_ipc, ColumnNames};
use first_match::kernels::oracle::first_match_oracle_checked;
use first_match::pipeline::{correlate, CorrelateOptions, OrderingMode};
use first_match::timing::NoopTimer;

/// Certify the kernel and every backend against the oracle.
///
/// Unverified backends are reported but never fail the command.
pub fn run(
    a_path: &Path,
    b_path: &Path,
    names: &ColumnNames,
    chunk_size: usize,
    max_pairs: u64,
    ordering: OrderingMode,
) -> Result<(), Box<dyn std::error::Error>> {
    let a = read_stream_ipc(a_path, names)?;
    let b = read_stream_ipc(b_path, names)?;
    let oracle = first_match_oracle_checked(&a, &b, u128::from(max_pairs))?;

    let options = CorrelateOptions {
        ordering,
        ..CorrelateOptions::default()
    };
    let kernel = correlate(&a, &b, &options, &mut NoopTimer)?;
    let mut checks = vec![BackendCheck {
        backend: format!("kernel/{ordering}"),
        verified: true,
        matched: kernel.matched_count(),
        mismatch: compare_tables(&oracle, &kernel),
    }];

    let backends = BackendKind::ALL
        .iter()
        .map(|kind| kind.build(chunk_size))
        .collect::<Result<Vec<Box<dyn JoinBackend>>, _>>()?;
    checks.extend(check_backends(&backends, &a, &b, &oracle)?);

    println!(
        "oracle: {} of {} A-events matched",
        oracle.matched_count(),
        a.len()
    );
    for check in &checks {
        println!("  {check}");
    }

    let failures = checks.iter().filter(|c| c.is_failure()).count();
    if failures == 0 {
        println!("\nAll verified implementations agree with the oracle.");
        Ok(())
    } else {
        Err(format!("{failures} verified implementation(s) diverge from the oracle").into())
    }
}
