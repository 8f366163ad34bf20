#![forbid(unsafe_code)]

//! Replay a JSON overlay scenario and print the view after every step.
//!
//! ```sh
//! RUST_LOG=overlay=debug cargo run -p overlay-harness --bin overlay-replay -- scenarios/dedup.json
//! ```

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use overlay_harness::{Scenario, ScenarioError, write_jsonl};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "overlay-replay",
    about = "Replay a dev error overlay scenario as JSON lines",
    version
)]
struct Cli {
    /// Scenario file (JSON).
    scenario: PathBuf,

    /// Print only the final step.
    #[arg(long)]
    last: bool,
}

fn run(cli: &Cli) -> Result<(), ScenarioError> {
    let scenario = Scenario::from_file(&cli.scenario)?;
    let mut records = scenario.replay()?;
    if cli.last {
        let tail = records.len().saturating_sub(1);
        records.drain(..tail);
    }
    write_jsonl(&records, io::stdout().lock())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("overlay-replay: {err}");
            ExitCode::FAILURE
        }
    }
}
