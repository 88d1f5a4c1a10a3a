//! reachguard - stacking-order normalization and pointer reachability checks.
//!
//! Main entry point for the reachguard CLI.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod cmd_check;
mod cmd_config;

use cli::{Cli, Commands};

/// Get the .reachguard directory path.
fn reachguard_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".reachguard"))
        .unwrap_or_else(|| PathBuf::from(".reachguard"))
}

/// Initialize tracing with console and file output.
///
/// Log files are written to ~/.reachguard/logs/ with daily rotation. Console
/// output goes to stderr so `--json` reports stay clean on stdout.
fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = reachguard_dir().join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("reachguard")
        .filename_suffix("log")
        .max_log_files(14)
        .build(&log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // The guard flushes the file writer on drop; keep it for the whole run.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,reachguard=info,reachguard_core=info,reachguard_cdp=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_ansi(true),
        )
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    init_tracing()?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            url,
            json,
            no_remediate,
            keep_open,
        } => {
            let options = cmd_check::CheckOptions {
                json,
                remediate: !no_remediate,
                keep_open,
            };
            cmd_check::run_check(&cli.config, &url, options).await
        }
        Commands::Config { action } => cmd_config::handle_config_command(action, &cli.config),
    }
}
