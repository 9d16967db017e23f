use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use canyon_upload::config::Inputs;
use canyon_upload::env::ProcessEnv;
use canyon_upload::pipeline;
use canyon_upload::upload::CanyonClient;

/// Merge coverage reports and upload them to a Canyon coverage service.
#[derive(Parser)]
#[command(name = "canyon-upload", version, about)]
struct Cli {
    #[command(flatten)]
    inputs: Inputs,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .without_time()
        .with_writer(std::io::stdout)
        .init();
}

fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();
    let workdir = std::env::current_dir().context("Failed to determine working directory")?;

    let outcome = pipeline::run(&cli.inputs, &ProcessEnv, &workdir, |config| {
        CanyonClient::new(&config.canyon_url, config.canyon_token.clone())
    })
    .publish(&ProcessEnv);

    if outcome.failed {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
