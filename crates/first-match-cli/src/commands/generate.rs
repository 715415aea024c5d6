use std::path::PathBuf;

use first_match::generate::{generate_stream, GeneratorConfig, TimeLayout};
use first_match::io::{write_stream_ipc, ColumnNames};

/// B timestamps end earlier than A's so late A rows always have candidates.
const B_TIME_END: i64 = 400_000;

pub struct GenerateArgs {
    pub rows_a: usize,
    pub rows_b: usize,
    pub keys: i32,
    pub seed: u64,
    pub chunk_size: usize,
    pub chunk_sorted: bool,
    pub out_a: PathBuf,
    pub out_b: PathBuf,
    pub names: ColumnNames,
}

pub fn run(args: &GenerateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let layout = if args.chunk_sorted {
        TimeLayout::ChunkSorted
    } else {
        TimeLayout::Sorted
    };
    let a_cfg = GeneratorConfig {
        rows: args.rows_a,
        key_cardinality: args.keys,
        chunk_size: args.chunk_size,
        seed: args.seed,
        layout,
        ..GeneratorConfig::default()
    };
    let b_cfg = GeneratorConfig {
        rows: args.rows_b,
        time_start: 0,
        time_end: B_TIME_END,
        seed: args.seed.wrapping_add(1),
        ..a_cfg.clone()
    };

    let a = generate_stream(&a_cfg)?;
    let b = generate_stream(&b_cfg)?;
    write_stream_ipc(&args.out_a, &a, &args.names, args.chunk_size)?;
    write_stream_ipc(&args.out_b, &b, &args.names, args.chunk_size)?;

    println!("A: {} rows -> {}", a.len(), args.out_a.display());
    println!("B: {} rows -> {}", b.len(), args.out_b.display());
    if !b.is_time_ordered() {
        println!("B is not time-ordered; use --ordering scan to correlate it");
    }
    Ok(())
}
