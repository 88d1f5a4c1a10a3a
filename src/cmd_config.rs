//! `config` subcommand handlers.

use std::path::Path;
use std::process::ExitCode;

use reachguard_config::{ConfigLoader, ConfigValidator};
use reachguard_core::LayeringPlan;

use crate::cli::ConfigAction;

pub(crate) fn handle_config_command(
    action: ConfigAction,
    path: &Path,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Validate => config_validate(path),
        ConfigAction::Show => config_show(path),
    }
}

/// Check the file's shape, then build the layering plan it describes.
fn config_validate(path: &Path) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let source = if path.exists() {
        path.display().to_string()
    } else {
        "built-in defaults".to_string()
    };
    let config = ConfigLoader::load_or_default(path)?;
    let result = ConfigValidator::validate(&config);

    for warning in &result.warnings {
        println!("warning: {}: {}", warning.path, warning.message);
    }
    for error in &result.errors {
        println!("error: {}: {}", error.path, error.message);
    }
    if !result.is_valid() {
        println!("{}: invalid ({} errors)", source, result.errors.len());
        return Ok(ExitCode::FAILURE);
    }

    match LayeringPlan::from_config(&config.layering) {
        Ok(plan) => {
            println!(
                "{}: valid ({} bands, {} rules, stride {})",
                source,
                plan.bands().len(),
                plan.rule_count(),
                plan.stride()
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            println!("error: {}", e);
            println!("{}: invalid", source);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn config_show(path: &Path) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = ConfigLoader::load_or_default(path)?;
    print!("{}", ConfigLoader::to_toml(&config)?);
    Ok(ExitCode::SUCCESS)
}
