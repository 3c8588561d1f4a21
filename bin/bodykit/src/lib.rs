//! Bodykit CLI Library
//!
//! Command implementations behind the `bodykit` binary.
//!
//! # Modules
//!
//! - [`cmd`] - Command implementations (build, check, watch)
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use bodykit::cmd;
//!
//! // Build a site with the configured output directory
//! cmd::build::run(Path::new("bodykit.toml"), None, None).unwrap();
//! ```

pub mod cmd;

pub use bodykit_core::Config;
pub use bodykit_generator::{BuildReport, BuildStats, Builder};

/// Initialize tracing with the specified verbosity level.
///
/// # Arguments
///
/// * `verbose` - Verbosity level (0 = WARN, 1 = INFO, 2 = DEBUG, 3+ = TRACE)
///
/// # Example
///
/// ```no_run
/// bodykit::init_tracing(2); // Enable DEBUG level logging
/// ```
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(verbose > 2))
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}
