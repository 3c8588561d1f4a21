//! CLI command implementations.

pub mod build;
pub mod check;
pub mod watch;

use std::path::Path;

use bodykit_core::Config;
use bodykit_generator::BuildReport;
use color_eyre::eyre::{Result, WrapErr};

/// Load the configuration, applying `BODYKIT__` environment overrides.
pub fn load_config(config_path: &Path) -> Result<Config> {
    let config = Config::load_with_env(config_path).wrap_err_with(|| {
        format!("Failed to load configuration from {}", config_path.display())
    })?;
    tracing::debug!(?config, "Loaded configuration");
    Ok(config)
}

/// Print failed documents and assets with their errors.
pub fn print_failures(report: &BuildReport) {
    if report.is_success() {
        return;
    }
    println!();
    println!("  Failures:");
    for failure in &report.failures {
        println!("  ✗ {}: {}", failure.path, failure.error);
    }
}
