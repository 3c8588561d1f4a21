//! Bodykit CLI
//!
//! Builds, checks and watches a Bodykit site.
//!
//! This is the binary entry point. The library functionality is in `lib.rs`.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;

/// Command-line interface for Bodykit.
#[derive(Parser)]
#[command(
    name = "bodykit",
    version,
    about = "Static site content pipeline and template engine"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "bodykit.toml")]
    config: PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Build the site
    Build {
        /// Output directory (overrides the configuration)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Override the site root URL (e.g., https://example.com/blog)
        #[arg(long)]
        root_url: Option<String>,
    },
    /// Render every document without writing output
    Check {
        /// Fail when any document fails to render
        #[arg(long)]
        strict: bool,
    },
    /// Rebuild on source changes
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    bodykit::init_tracing(cli.verbose);

    match cli.command {
        Commands::Build { output, root_url } => {
            bodykit::cmd::build::run(&cli.config, output.as_deref(), root_url.as_deref())?;
        }
        Commands::Check { strict } => {
            bodykit::cmd::check::run(&cli.config, strict)?;
        }
        Commands::Watch => {
            bodykit::cmd::watch::run(&cli.config).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn test_cli_build_command_parsing() {
        let args = ["bodykit", "build", "--output", "dist"];
        let cli = Cli::parse_from(args);

        assert_eq!(cli.config, PathBuf::from("bodykit.toml"));
        assert_eq!(cli.verbose, 0);

        match cli.command {
            Commands::Build { output, root_url } => {
                assert_eq!(output, Some(PathBuf::from("dist")));
                assert!(root_url.is_none());
            }
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_cli_build_root_url() {
        let args = ["bodykit", "build", "--root-url", "https://example.com"];
        let cli = Cli::parse_from(args);

        match cli.command {
            Commands::Build { output, root_url } => {
                assert!(output.is_none());
                assert_eq!(root_url.as_deref(), Some("https://example.com"));
            }
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_cli_check_strict() {
        let cli = Cli::parse_from(["bodykit", "check", "--strict"]);
        match cli.command {
            Commands::Check { strict } => assert!(strict),
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn test_cli_global_options() {
        let cli = Cli::parse_from(["bodykit", "-c", "site.toml", "-vv", "watch"]);
        assert_eq!(cli.config, PathBuf::from("site.toml"));
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Watch));
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["bodykit"]).is_err());
    }
}
