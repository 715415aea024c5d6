use std::path::Path;

use first_match::io::{read_stream_ipc, write_match_table_ipc, ColumnNames};
use first_match::kernels::KernelBackend;
use first_match::pipeline::{correlate, CorrelateOptions, OrderingMode};
use first_match::timing::{format_elapsed, StageTimer};

pub fn run(
    a_path: &Path,
    b_path: &Path,
    names: &ColumnNames,
    backend: KernelBackend,
    ordering: OrderingMode,
    threads: usize,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let a = read_stream_ipc(a_path, names)?;
    let b = read_stream_ipc(b_path, names)?;
    let options = CorrelateOptions {
        backend,
        ordering,
        threads,
        ..CorrelateOptions::default()
    };

    let mut timer = StageTimer::new();
    let table = correlate(&a, &b, &options, &mut timer)?;

    println!(
        "{} of {} A-events matched ({} B-events, {backend}, {ordering})",
        table.matched_count(),
        a.len(),
        b.len()
    );
    for stage in timer.stages() {
        println!("  {:<10} {}", stage.stage, format_elapsed(stage.elapsed));
    }

    if let Some(path) = output {
        write_match_table_ipc(path, &table)?;
        println!("Wrote {} pairs to {}", table.matched_count(), path.display());
    }
    Ok(())
}
