use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use load_inspector::{run, RunConfig};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "load-inspector",
    version,
    about = "Render pie charts from load inspector statistics"
)]
struct Cli {
    /// Input stats file name.
    #[arg(short, long, default_value = "inspector.stats.txt")]
    input: PathBuf,
    /// Output file name (`.svg` for vector output, PNG otherwise).
    #[arg(short, long, default_value = "inspector.stats.png")]
    output: PathBuf,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = RunConfig::new(cli.input, cli.output);
    run(&config).with_context(|| {
        format!(
            "failed to summarize {} into {}",
            config.input.display(),
            config.output.display()
        )
    })?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
