//! Summarize a Chrome trace written by scopetrace.
//!
//! Pairs Begin/End events per thread and prints per-region statistics.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p scopetrace-inspect -- traces.json
//! cargo run -p scopetrace-inspect -- traces.json --top 5
//! ```

mod report;

use std::path::PathBuf;

use anyhow::{bail, Context};
use scopetrace::{FsStorage, JsonCodec, TraceCodec, TraceStorage, TraceSummary};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Default number of regions to print.
const DEFAULT_TOP: usize = 20;

/// Command line options.
#[derive(Debug, Clone, PartialEq, Eq)]
struct InspectArgs {
    path: PathBuf,
    top: usize,
}

fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "-h" || arg == "--help") {
        print_help();
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    let bytes = FsStorage.read(&args.path)?;
    let document = JsonCodec::new()
        .decode(&bytes)
        .with_context(|| format!("{} is not a trace document", args.path.display()))?;
    info!(
        "Loaded {} events from {}",
        document.len(),
        args.path.display()
    );

    let summary = TraceSummary::from_traces(&document.trace_events);
    print!("{}", report::Report::new(&summary, args.top));
    Ok(())
}

fn parse_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<InspectArgs> {
    let mut path = None;
    let mut top = DEFAULT_TOP;
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-n" | "--top" => {
                top = args
                    .next()
                    .context("Missing value for --top")?
                    .parse()?;
            }
            other if other.starts_with('-') => bail!("Unknown argument: {other}"),
            _ => path = Some(PathBuf::from(&arg)),
        }
    }

    let path = path.context("Missing trace file path")?;
    Ok(InspectArgs { path, top })
}

fn print_help() {
    eprintln!(
        "Scopetrace trace inspector

USAGE:
    cargo run -p scopetrace-inspect -- <TRACE> [OPTIONS]

OPTIONS:
    -n, --top <N>           Regions to print (default: 20)
    -h, --help              Print this help message

ENVIRONMENT VARIABLES:
    RUST_LOG                Set log level (e.g., info, debug, trace)"
    );
}
