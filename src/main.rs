//! memtrace: merge, validate and replay memory-access traces.
//!
//! Run with no arguments to merge the default trace set under `traces/`
//! into `accesses.tsv`.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use memtrace::cachesim::config::{DEFAULT_B, DEFAULT_C, DEFAULT_K, DEFAULT_S, DEFAULT_V};
use memtrace::logger::setup_logger;
use memtrace::trace::{DEFAULT_OUTPUT_FILE, DEFAULT_TRACES_DIR};
use memtrace::{merge_traces, simulate_trace, validate_accesses, CacheConfig, MergeConfig};

#[derive(Debug, Parser)]
#[command(name = "memtrace")]
#[command(about = "Merge, validate and replay memory-access traces")]
#[command(version)]
struct Cli {
    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Filter and combine trace files into one TSV (the default)
    Merge(MergeArgs),
    /// Check a merged TSV for header, ordering and range errors
    Validate {
        /// Merged file to check
        #[arg(short, long, default_value = DEFAULT_OUTPUT_FILE)]
        input: PathBuf,

        /// Expected trace files, in order (defaults to the standard set)
        #[arg(short, long = "file")]
        files: Vec<String>,
    },
    /// Replay a trace through the cache model and print statistics
    Simulate(SimulateArgs),
}

#[derive(Debug, Args)]
struct MergeArgs {
    /// Directory holding the trace files
    #[arg(long, default_value = DEFAULT_TRACES_DIR)]
    traces_dir: PathBuf,

    /// Merged output path
    #[arg(short, long, default_value = DEFAULT_OUTPUT_FILE)]
    output: PathBuf,

    /// Trace files to merge, in order (defaults to the standard set)
    #[arg(short, long = "file")]
    files: Vec<String>,

    /// Print per-file line and row counts as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct SimulateArgs {
    /// Total cache size is 2^C bytes
    #[arg(short = 'c', long, default_value_t = DEFAULT_C)]
    cache_bits: u32,

    /// Block size is 2^B bytes
    #[arg(short = 'b', long, default_value_t = DEFAULT_B)]
    block_bits: u32,

    /// Each set holds 2^S blocks
    #[arg(short = 's', long, default_value_t = DEFAULT_S)]
    set_bits: u32,

    /// Number of victim cache blocks
    #[arg(long, default_value_t = DEFAULT_V)]
    victim_blocks: usize,

    /// Prefetch distance in blocks
    #[arg(short = 'k', long, default_value_t = DEFAULT_K)]
    prefetch_distance: u32,

    /// Print statistics as JSON
    #[arg(long)]
    json: bool,

    /// Trace to replay (reads stdin when omitted)
    trace: Option<PathBuf>,
}

fn files_or_default(files: Vec<String>) -> Vec<String> {
    if files.is_empty() {
        MergeConfig::default().files
    } else {
        files
    }
}

fn run_merge(args: MergeArgs) -> Result<()> {
    let config = MergeConfig {
        traces_dir: args.traces_dir,
        output: args.output,
        files: files_or_default(args.files),
        ..MergeConfig::default()
    };
    let summary = merge_traces(&config)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}

fn run_validate(input: PathBuf, files: Vec<String>) -> Result<()> {
    let config = MergeConfig {
        files: files_or_default(files),
        ..MergeConfig::default()
    };
    let result = validate_accesses(&input, &config);

    for warning in &result.warnings {
        eprintln!("Warning: {warning}");
    }
    for error in &result.errors {
        eprintln!("Error: {error}");
    }

    if result.has_errors() {
        bail!(
            "{} failed validation with {} error(s)",
            input.display(),
            result.errors.len()
        );
    }
    eprintln!("{} is valid", input.display());
    Ok(())
}

fn run_simulate(args: SimulateArgs) -> Result<()> {
    let config = CacheConfig {
        c: args.cache_bits,
        b: args.block_bits,
        s: args.set_bits,
        v: args.victim_blocks,
        k: args.prefetch_distance,
    };

    let stats = match &args.trace {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open trace file {}", path.display()))?;
            simulate_trace(BufReader::new(file), &config)
                .with_context(|| format!("Failed to simulate {}", path.display()))?
        }
        None => simulate_trace(io::stdin().lock(), &config)?,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("{stats}");
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logger(cli.verbose);

    match cli.command {
        None => merge_traces(&MergeConfig::default()).map(|_| ()),
        Some(Commands::Merge(args)) => run_merge(args),
        Some(Commands::Validate { input, files }) => run_validate(input, files),
        Some(Commands::Simulate(args)) => run_simulate(args),
    }
}
