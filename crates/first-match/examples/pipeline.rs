//! Generate two streams, correlate them, and certify every backend.
//!
//! Demonstrates: generate -> index -> probe -> oracle -> backend checks.
//!
//! Usage:
//!   cargo run --example pipeline -- 20000

use std::process;

use first_match::backend::{BackendKind, JoinBackend};
use first_match::equivalence::{check_backends, compare_tables};
use first_match::generate::{generate_stream, GeneratorConfig};
use first_match::kernels::oracle::first_match_oracle;
use first_match::pipeline::{correlate, CorrelateOptions};
use first_match::timing::{format_elapsed, StageTimer};

fn main() {
    let rows = std::env::args()
        .nth(1)
        .map_or(Ok(20_000), |s| s.parse::<usize>())
        .unwrap_or_else(|e| {
            eprintln!("Usage: pipeline [rows]: {e}");
            process::exit(1);
        });

    let a = generate_stream(&GeneratorConfig {
        key_cardinality: 200,
        ..GeneratorConfig::with_rows(rows, 1)
    });
    let b = generate_stream(&GeneratorConfig {
        key_cardinality: 200,
        time_start: 0,
        time_end: 400_000,
        ..GeneratorConfig::with_rows(rows, 2)
    });
    let (a, b) = match (a, b) {
        (Ok(a), Ok(b)) => (a, b),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("generate: {e}");
            process::exit(1);
        }
    };

    let mut timer = StageTimer::new();
    let table = correlate(&a, &b, &CorrelateOptions::default(), &mut timer).unwrap_or_else(|e| {
        eprintln!("correlate: {e}");
        process::exit(1);
    });
    println!("{} of {} A-events matched", table.matched_count(), a.len());
    for stage in timer.stages() {
        println!("  {:<10} {}", stage.stage, format_elapsed(stage.elapsed));
    }

    let oracle = first_match_oracle(&a, &b);
    match compare_tables(&oracle, &table) {
        None => println!("kernel: equivalent to oracle"),
        Some(m) => println!("kernel: DIVERGES at {m}"),
    }

    let backends: Vec<Box<dyn JoinBackend>> = BackendKind::ALL
        .iter()
        .filter_map(|kind| kind.build(4_096).ok())
        .collect();
    match check_backends(&backends, &a, &b, &table) {
        Ok(checks) => {
            for check in checks {
                println!("{check}");
            }
        }
        Err(e) => {
            eprintln!("backends: {e}");
            process::exit(1);
        }
    }
}
