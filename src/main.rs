// Entrypoint for the CLI application.
// - Keeps `main` small: set up logging, parse arguments, hand off to `cli::run`.
// - Abandoned prompts end quietly; every other failure prints one line.

use anyhow::anyhow;
use athene_cli::{cli, ui, Settings};
use clap::Parser;
use std::process;
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let filter = if verbose {
        EnvFilter::new("warn,athene_cli=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to initialise logging: {}", e))
}

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();
    init_logging(args.verbose)?;

    // Host and poll timings can be overridden by `ATHENE_*` variables.
    let settings = Settings::from_env();

    if let Err(err) = cli::run(&args.command, &settings) {
        if err.is_silent() {
            return Ok(());
        }
        ui::print_error(&err);
        process::exit(1);
    }
    Ok(())
}
