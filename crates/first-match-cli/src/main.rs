use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};
use first_match::backend::DEFAULT_CHUNK_SIZE;
use first_match::io::ColumnNames;
use first_match::kernels::oracle::DEFAULT_ORACLE_MAX_PAIRS;
use first_match::kernels::KernelBackend;
use first_match::pipeline::OrderingMode;

mod commands;

/// Top-level CLI argument parser for the `fm` command
#[derive(Parser)]
#[command(
    name = "fm",
    about = "first-match: temporal first-match correlation of event streams",
    version
)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Column names used when reading input files
#[derive(Args, Debug, Clone)]
struct ColumnArgs {
    /// Name of the key column
    #[arg(long, default_value = "key")]
    key_column: String,
    /// Name of the timestamp column
    #[arg(long, default_value = "timestamp")]
    time_column: String,
}

impl ColumnArgs {
    fn names(&self) -> ColumnNames {
        ColumnNames::new(&self.key_column, &self.time_column)
    }
}

/// Available subcommands for the `fm` CLI
#[derive(Subcommand)]
enum Commands {
    /// Generate a pair of seeded synthetic streams as Arrow IPC files
    Generate {
        /// Rows in stream A
        #[arg(long)]
        rows_a: usize,
        /// Rows in stream B
        #[arg(long)]
        rows_b: usize,
        /// Number of distinct keys
        #[arg(long, default_value_t = 2000)]
        keys: i32,
        /// RNG seed for A; B uses seed + 1
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Rows per generated chunk and per written record batch
        #[arg(long, default_value_t = 500_000)]
        chunk_size: usize,
        /// Sort timestamps per chunk only, leaving B unordered overall
        #[arg(long)]
        chunk_sorted: bool,
        /// Output path for stream A
        #[arg(long)]
        out_a: PathBuf,
        /// Output path for stream B
        #[arg(long)]
        out_b: PathBuf,
        #[command(flatten)]
        columns: ColumnArgs,
    },
    /// Match every A-event to its first preceding B-event with the kernel
    Correlate {
        /// Arrow IPC file for stream A
        a: PathBuf,
        /// Arrow IPC file for stream B
        b: PathBuf,
        /// Kernel variant: scalar or parallel
        #[arg(long, default_value = "parallel")]
        backend: KernelBackend,
        /// B ordering treatment: trusted, validated or scan
        #[arg(long, default_value = "validated")]
        ordering: OrderingMode,
        /// Worker threads (0 = all cores)
        #[arg(long, default_value_t = 0)]
        threads: usize,
        /// Write matched pairs to this Arrow IPC file
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        columns: ColumnArgs,
    },
    /// Certify the kernel and every backend against the oracle
    Verify {
        /// Arrow IPC file for stream A
        a: PathBuf,
        /// Arrow IPC file for stream B
        b: PathBuf,
        /// Rows per chunk for the streaming backend
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
        /// Refuse to run the oracle when |A| * |B| exceeds this
        #[arg(long, default_value_t = DEFAULT_ORACLE_MAX_PAIRS as u64)]
        max_pairs: u64,
        /// B ordering treatment for the kernel
        #[arg(long, default_value = "validated")]
        ordering: OrderingMode,
        #[command(flatten)]
        columns: ColumnArgs,
    },
    /// Print the lazy backend's query plan
    Explain {
        /// Arrow IPC file for stream A
        a: PathBuf,
        /// Arrow IPC file for stream B
        b: PathBuf,
        /// Show the plan after optimization
        #[arg(long)]
        optimized: bool,
        #[command(flatten)]
        columns: ColumnArgs,
    },
    /// Validate a YAML job file
    Validate {
        /// Path to the job YAML file
        config: PathBuf,
    },
    /// Run a YAML job: correlate, cross-check, write
    Run {
        /// Path to the job YAML file
        config: PathBuf,
        /// Report format: text (default) or json
        #[arg(long, default_value = "text")]
        report: String,
    },
    /// Print the PTX source of the device kernel
    Ptx,
}

/// Install the fmt subscriber; RUST_LOG wins over `--verbose`
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

/// Dispatch a parsed CLI subcommand to its handler
fn run_command(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Generate {
            rows_a,
            rows_b,
            keys,
            seed,
            chunk_size,
            chunk_sorted,
            out_a,
            out_b,
            columns,
        } => commands::generate::run(&commands::generate::GenerateArgs {
            rows_a,
            rows_b,
            keys,
            seed,
            chunk_size,
            chunk_sorted,
            out_a,
            out_b,
            names: columns.names(),
        }),
        Commands::Correlate {
            a,
            b,
            backend,
            ordering,
            threads,
            output,
            columns,
        } => commands::correlate::run(
            &a,
            &b,
            &columns.names(),
            backend,
            ordering,
            threads,
            output.as_deref(),
        ),
        Commands::Verify {
            a,
            b,
            chunk_size,
            max_pairs,
            ordering,
            columns,
        } => commands::verify::run(&a, &b, &columns.names(), chunk_size, max_pairs, ordering),
        Commands::Explain {
            a,
            b,
            optimized,
            columns,
        } => commands::explain::run(&a, &b, &columns.names(), optimized),
        Commands::Validate { config } => commands::validate::run(&config),
        Commands::Run { config, report } => {
            let format: commands::run::ReportFormat = report.parse()?;
            commands::run::run(&config, format)
        }
        Commands::Ptx => commands::ptx::run(),
    }
}

/// Entry point: parse CLI arguments and run the selected subcommand
fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run_command(cli.command) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
