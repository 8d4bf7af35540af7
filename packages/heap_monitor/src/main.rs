#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))]

//! Binary entry point for the heap monitor.
//!
//! This module is excluded from mutation testing because testing process entry/exit behavior
//! is impractical - it requires spawning subprocesses and checking exit codes.

use std::io;
use std::num::NonZero;
use std::process::ExitCode;
use std::time::Duration;

use alloc_registry::{DEFAULT_MAX_BLOCKS, DEFAULT_SCALE, VisualizationConfig};
use argh::FromArgs;
use heap_monitor::{MonitorConfig, run};
use tracing_subscriber::EnvFilter;

/// Tracks a few labeled allocations, simulates processor load and reports memory usage, process
/// resources and leaks.
#[derive(FromArgs)]
struct Args {
    /// seconds to run the processor load simulation for (default 2)
    #[argh(option, default = "2.0")]
    cpu_seconds: f64,

    /// target processor load in percent (default 75)
    #[argh(option, default = "75.0")]
    cpu_load: f64,

    /// bytes represented by one glyph of the memory map (default 10)
    #[argh(option, default = "DEFAULT_SCALE")]
    scale: NonZero<usize>,

    /// maximum number of glyphs in one memory map bar (default 50)
    #[argh(option, default = "DEFAULT_MAX_BLOCKS")]
    max_blocks: usize,

    /// pause for Enter before starting and before exiting
    #[argh(switch)]
    wait: bool,

    /// log every tracked and released allocation to stderr
    #[argh(switch, short = 'v')]
    verbose: bool,
}

// Binary entry point - mutations would require subprocess testing which is impractical.
#[cfg_attr(test, mutants::skip)]
fn main() -> ExitCode {
    let args: Args = argh::from_env();

    init_logging(args.verbose);

    let Ok(cpu_duration) = Duration::try_from_secs_f64(args.cpu_seconds) else {
        eprintln!("Error: --cpu-seconds must be a non-negative number of seconds");
        return ExitCode::FAILURE;
    };

    let config = MonitorConfig::default()
        .with_cpu_load(cpu_duration, args.cpu_load)
        .with_visualization(
            VisualizationConfig::default()
                .with_scale(args.scale)
                .with_max_blocks(args.max_blocks),
        )
        .with_wait_for_enter(args.wait);

    match run(&config, &mut io::stdin().lock(), &mut io::stdout().lock()) {
        Ok(_leaks) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {error}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so they never interleave with the reports on stdout. `RUST_LOG` takes
/// precedence over the verbosity switch.
fn init_logging(verbose: bool) {
    let default_directive = if verbose { "trace" } else { "warn" };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_missing_or_invalid| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
