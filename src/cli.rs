//! CLI definitions for reachguard.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// reachguard CLI.
#[derive(Parser)]
#[command(name = "reachguard")]
#[command(about = "Normalize stacking order and verify every control on a page can be clicked")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "reachguard.toml", global = true, env = "REACHGUARD_CONFIG")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Layer, probe and remediate a page
    Check {
        /// Page URL
        url: String,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Report unreachable controls without duplicating them
        #[arg(long)]
        no_remediate: bool,

        /// Leave the page open after the run
        #[arg(long)]
        keep_open: bool,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Check the configuration file and the layering plan it describes
    Validate,

    /// Print the effective configuration as TOML
    Show,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_check() {
        let cli = Cli::parse_from(["reachguard", "check", "https://example.com", "--json", "--no-remediate"]);
        match cli.command {
            Commands::Check { url, json, no_remediate, keep_open } => {
                assert_eq!(url, "https://example.com");
                assert!(json);
                assert!(no_remediate);
                assert!(!keep_open);
            }
            _ => panic!("expected check"),
        }
        assert_eq!(cli.config, PathBuf::from("reachguard.toml"));
    }

    #[test]
    fn test_parse_config_with_global_path() {
        let cli = Cli::parse_from(["reachguard", "config", "validate", "--config", "/etc/rg.toml"]);
        assert!(matches!(cli.command, Commands::Config { action: ConfigAction::Validate }));
        assert_eq!(cli.config, PathBuf::from("/etc/rg.toml"));
    }

    #[test]
    fn test_check_requires_url() {
        assert!(Cli::try_parse_from(["reachguard", "check"]).is_err());
    }
}
