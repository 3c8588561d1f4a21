//! Build command - render the site into the output directory

use std::{path::Path, time::Instant};

use bodykit_generator::Builder;
use color_eyre::eyre::{Result, WrapErr, bail};

use super::{load_config, print_failures};

/// Run the build command.
///
/// Failed documents and assets are reported and leave their previous output in place;
/// the command still fails so scripts notice.
pub fn run(config_path: &Path, output: Option<&Path>, root_url: Option<&str>) -> Result<()> {
    let start = Instant::now();
    tracing::info!(?config_path, ?output, ?root_url, "Starting build");

    let mut config = load_config(config_path)?;

    if let Some(output) = output {
        config.build.output_dir = output.to_path_buf();
    }
    if let Some(url) = root_url {
        tracing::info!(root_url = url, "Overriding site root URL from CLI");
        config.site.root_url = url.trim_end_matches('/').to_string();
    }

    let output_dir = config.build.output_dir.clone();
    let report = Builder::new(config).build().wrap_err("Build failed")?;
    let duration = start.elapsed();

    println!();
    println!("  Pages:    {}", report.stats.pages);
    println!("  Failed:   {}", report.stats.failed);
    println!("  Assets:   {}", report.stats.assets);
    println!();
    println!("  Duration: {:.2}s", duration.as_secs_f64());
    println!("  Output:   {}", output_dir.display());
    print_failures(&report);
    println!();

    tracing::info!(stats = ?report.stats, ?duration, "Build finished");

    if !report.is_success() {
        bail!("{} document(s) or asset(s) failed", report.stats.failed);
    }
    Ok(())
}
