//! Lethe - staged deletion of watched or aging media.

use clap::Parser;
use lethe_cli::commands;
use lethe_cli::config::ApiKeys;
use lethe_cli::{AppConfig, Cli, Command, Formatter};
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> lethe_cli::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize tracing (log to stderr)
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let mut config = AppConfig::load(&cli.config)?;
    if cli.dry_run {
        config.janitor.dry_run = true;
    }

    // Determine output format
    let format = cli.format.map(Into::into).unwrap_or(config.output.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.output.color;

    let formatter = Formatter::new(format, color_enabled);

    // API keys are only needed by commands that talk to the backends
    match cli.command.unwrap_or(Command::Run) {
        Command::Run => commands::execute_run(&config, &ApiKeys::from_env()?, &formatter)?,
        Command::Daemon => commands::execute_daemon(&config, &ApiKeys::from_env()?, &formatter)?,
        Command::Staged => commands::execute_staged(&config, &ApiKeys::from_env()?, &formatter)?,
        Command::CheckConfig => commands::execute_check_config(&config, &formatter)?,
    }

    Ok(())
}
