// ABOUTME: Entry point for the cfship CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use cfship::artifact::ArtifactManager;
use cfship::config::{self, Config};
use cfship::error::Result;
use cfship::output::{Output, OutputMode};
use clap::Parser;
use cli::{Cli, Commands};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let output = Output::new(OutputMode::from_flags(cli.quiet, cli.json));
    let mode = output.mode();

    if let Err(e) = run(cli, output).await {
        Output::new(mode).error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: Output) -> Result<()> {
    match cli.command {
        Commands::Init { endpoint, force } => {
            let cwd = env::current_dir()?;
            config::init_config(&cwd, endpoint.as_deref(), force)?;
            output.success(&format!("Created {}", config::CONFIG_FILENAME));
            Ok(())
        }
        Commands::Fingerprint { location } => {
            let manager = local_manager()?;
            commands::fingerprint(&manager, &location, &output).await
        }
        Commands::Diff { location, known } => {
            let manager = local_manager()?;
            commands::diff(&manager, &location, &known, &output).await
        }
        Commands::Package {
            location,
            output: dest,
        } => {
            let manager = local_manager()?;
            commands::package(&manager, &location, &dest, output).await
        }
        Commands::Upload { app, location } => {
            let config = discover()?;
            let manager = ArtifactManager::from_settings(config.skip_ssl_validation)?;
            commands::upload(&config, &manager, &app, &location, output).await
        }
        Commands::RemoteFingerprint { app } => {
            let config = discover()?;
            commands::remote_fingerprint(&config, &app, &output).await
        }
    }
}

fn discover() -> Result<Config> {
    let cwd = env::current_dir()?;
    Config::discover(&cwd)
}

/// Manager for commands that may run without a config file.
fn local_manager() -> Result<ArtifactManager> {
    let cwd = env::current_dir()?;
    let skip_ssl = match Config::discover(&cwd) {
        Ok(config) => config.skip_ssl_validation,
        Err(_) => false,
    };
    Ok(ArtifactManager::from_settings(skip_ssl)?)
}
