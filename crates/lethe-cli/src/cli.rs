//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};

/// Lethe - staged deletion of watched or aging media.
#[derive(Debug, Parser)]
#[command(name = "lethe")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "LETHE_CONFIG", default_value = "lethe.toml")]
    pub config: String,

    /// Decide and report, but change nothing
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (names only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Run one reconcile and sweep pass (default)
    Run,

    /// Run passes on the configured interval until Ctrl+C
    Daemon,

    /// List the staging collection with expiry dates
    Staged,

    /// Load and validate the configuration
    CheckConfig,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["lethe"]);
        assert!(cli.command.is_none());
        assert!(!cli.dry_run);
        assert!(cli.format.is_none());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "lethe",
            "run",
            "--dry-run",
            "--config",
            "/etc/lethe.toml",
            "-f",
            "json",
        ]);
        assert_eq!(cli.command, Some(Command::Run));
        assert!(cli.dry_run);
        assert_eq!(cli.config, "/etc/lethe.toml");
        assert!(matches!(cli.format, Some(CliFormat::Json)));
    }

    #[test]
    fn test_check_config_command() {
        let cli = Cli::parse_from(["lethe", "check-config"]);
        assert_eq!(cli.command, Some(Command::CheckConfig));
    }

    #[test]
    fn test_unknown_command_rejected() {
        assert!(Cli::try_parse_from(["lethe", "purge-everything"]).is_err());
    }
}
