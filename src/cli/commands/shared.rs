//! Shared components for CLI commands
//!
//! Logging setup, layered configuration, input expansion and progress
//! spinners used by every subcommand.

use crate::cli::args::LoadOptionArgs;
use crate::config::Config;
use crate::{Error, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Set up structured logging on stderr
pub fn setup_logging(log_level: &str, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("csv_databank={}", log_level)));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if quiet {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    // A subscriber installed earlier (e.g. by a test harness) stays in place
    if result.is_ok() {
        debug!("Logging initialized at level: {}", log_level);
    }
}

/// Load configuration using layered approach (file -> env -> args)
pub fn load_configuration(config_file: Option<&Path>, overrides: &LoadOptionArgs) -> Result<Config> {
    let default_config_path = match config_file {
        Some(_) => None,
        None => Config::default_config_path().ok(),
    };

    let config_file = config_file.or_else(|| {
        default_config_path
            .as_deref()
            .filter(|path| path.exists())
    });

    match config_file {
        Some(path) => info!("Using config file: {}", path.display()),
        None => info!("No config file found, using defaults and environment variables"),
    }

    let mut config = Config::load_layered(config_file)?;
    config.load = overrides.apply_to(config.load);
    config.validate()?;

    Ok(config)
}

/// Expand input arguments into file paths, keeping argument order
///
/// Arguments containing glob metacharacters are expanded and sorted; a pattern
/// that matches nothing is an error. Plain paths are passed through as given.
pub fn expand_inputs(inputs: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for input in inputs {
        if !is_glob_pattern(input) {
            paths.push(PathBuf::from(input));
            continue;
        }

        let entries = glob::glob(input).map_err(|e| {
            Error::configuration(format!("Invalid glob pattern '{}': {}", input, e))
        })?;

        let mut matched = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| {
                let path = e.path().display().to_string();
                Error::io(format!("Failed to read {}", path), e.into_error())
            })?;
            if path.is_file() {
                matched.push(path);
            }
        }

        if matched.is_empty() {
            return Err(Error::file_not_found(input.clone()));
        }
        matched.sort();
        debug!("Pattern {} matched {} files", input, matched.len());
        paths.extend(matched);
    }

    Ok(paths)
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains(['*', '?', '['])
}

/// Create a spinner for work without a known length
pub fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
