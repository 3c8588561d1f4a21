//! Check command - render everything without writing

use std::path::Path;

use bodykit_generator::Builder;
use color_eyre::eyre::{Result, WrapErr, bail};

use super::{load_config, print_failures};

/// Run the check command.
///
/// Collects the source tree and renders every document. Failures are always
/// reported; with `strict` they also fail the command.
pub fn run(config_path: &Path, strict: bool) -> Result<()> {
    tracing::info!(?config_path, strict, "Checking site");

    let config = load_config(config_path)?;
    let report = Builder::new(config).check().wrap_err("Check failed")?;

    println!();
    println!("Summary:");
    println!("  Rendered: {}", report.stats.pages);
    println!("  Failed:   {}", report.stats.failed);
    print_failures(&report);

    if strict && !report.is_success() {
        bail!(
            "Check failed with {} document error(s) (strict mode)",
            report.stats.failed
        );
    }

    println!();
    if report.is_success() {
        println!("✓ All documents rendered");
    }
    Ok(())
}
