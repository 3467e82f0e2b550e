//! Scopetrace demo workload.
//!
//! Runs frames of nested, traced tasks on a rayon pool and writes a Chrome
//! trace of the run.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p scopetrace-demo -- [OPTIONS]
//! ```
//!
//! Open the output in `chrome://tracing` or <https://ui.perfetto.dev>.
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Set log level (e.g., info, debug, trace)

mod workload;

use std::path::PathBuf;

use anyhow::{bail, Context};
use rayon::prelude::*;
use scopetrace::{trace_scope, trace_thread, TracerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Demo configuration.
#[derive(Debug, Clone)]
struct DemoConfig {
    /// Worker threads in the pool.
    threads: usize,
    /// Frames to run.
    frames: u32,
    /// Tasks per frame.
    tasks: usize,
    /// Nesting depth of each task.
    depth: u32,
    /// Trace output path.
    output: PathBuf,
    /// Indent the JSON output.
    pretty: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            threads: 4,
            frames: 3,
            tasks: 32,
            depth: 3,
            output: PathBuf::from("traces.json"),
            pretty: false,
        }
    }
}

fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "-h" || arg == "--help") {
        print_help();
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = parse_args(std::env::args().skip(1))?;
    run(&config)
}

fn run(config: &DemoConfig) -> anyhow::Result<()> {
    scopetrace::init(TracerConfig::new().with_pretty(config.pretty));
    let tracer = scopetrace::global();
    trace_thread!("MainThread");

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .thread_name(|index| format!("worker-{index}"))
        .start_handler(|index| trace_thread!(&format!("worker-{index}")))
        .build()
        .context("Failed to build worker pool")?;

    info!(
        "Tracing {} frames of {} tasks on {} threads",
        config.frames, config.tasks, config.threads
    );
    tracer.start()?;

    for _ in 0..config.frames {
        tracer.begin_frame();
        {
            trace_scope!("frame", "demo");
            let total: f32 = pool.install(|| {
                (0..config.tasks)
                    .into_par_iter()
                    .map(|task| workload::run_task(tracer, task, config.depth))
                    .sum()
            });
            tracing::debug!("Frame checksum {}", total);
        }
        let stats = tracer.end_frame();
        info!(
            "Frame {} took {:.2} ms ({:.1} fps)",
            stats.frame_number,
            stats.frame_time_ms(),
            stats.fps
        );
    }

    tracer.stop()?;
    let count = tracer
        .export_and_save(&config.output)
        .with_context(|| format!("Failed to write {}", config.output.display()))?;
    info!("Wrote {} events to {}", count, config.output.display());
    Ok(())
}

fn parse_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<DemoConfig> {
    let mut config = DemoConfig::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        let mut value = || {
            args.next()
                .with_context(|| format!("Missing value for {arg}"))
        };
        match arg.as_str() {
            "-t" | "--threads" => config.threads = value()?.parse()?,
            "-f" | "--frames" => config.frames = value()?.parse()?,
            "-n" | "--tasks" => config.tasks = value()?.parse()?,
            "-d" | "--depth" => config.depth = value()?.parse()?,
            "-o" | "--output" => config.output = PathBuf::from(value()?),
            "--pretty" => config.pretty = true,
            other => bail!("Unknown argument: {other}"),
        }
    }

    if config.threads == 0 {
        bail!("--threads must be at least 1");
    }
    Ok(config)
}

fn print_help() {
    eprintln!(
        "Scopetrace demo workload

USAGE:
    cargo run -p scopetrace-demo -- [OPTIONS]

OPTIONS:
    -t, --threads <N>       Worker threads (default: 4)
    -f, --frames <N>        Frames to run (default: 3)
    -n, --tasks <N>         Tasks per frame (default: 32)
    -d, --depth <N>         Nesting depth per task (default: 3)
    -o, --output <PATH>     Trace output path (default: traces.json)
    --pretty                Indent the JSON output
    -h, --help              Print this help message

ENVIRONMENT VARIABLES:
    RUST_LOG                Set log level (e.g., info, debug, trace)"
    );
}
