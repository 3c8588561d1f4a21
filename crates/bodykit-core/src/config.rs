//! Site configuration management.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Main configuration structure for Bodykit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Site-wide settings.
    #[serde(default)]
    pub site: SiteConfig,

    /// Build settings.
    #[serde(default)]
    pub build: BuildConfig,

    /// Values exposed to templates through the `$global:` scope.
    #[serde(default)]
    pub globals: BTreeMap<String, String>,
}

/// Site-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site title.
    #[serde(default)]
    pub title: String,

    /// Root URL every generated link is resolved against (e.g. "https://example.com").
    #[serde(default)]
    pub root_url: String,

    /// Locale used for long date formatting.
    #[serde(default = "default_locale")]
    pub locale: String,
}

/// Build configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Directory holding source documents, templates and assets.
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,

    /// Output directory for the generated site.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Templates directory, relative to `source_dir`.
    #[serde(default = "default_templates_dir")]
    pub templates_dir: String,

    /// Template used when no template matches a node's type.
    #[serde(default = "default_template")]
    pub default_template: String,

    /// Extensions treated as content documents.
    #[serde(default = "default_content_extensions")]
    pub content_extensions: Vec<String>,

    /// Extensions of assets copied through to the output.
    #[serde(default = "default_copy_extensions")]
    pub copy_extensions: Vec<String>,

    /// Glob patterns matched against entry names.
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Glob patterns matched against paths relative to `source_dir`.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Output pattern for copied assets.
    #[serde(default = "default_filename_pattern")]
    pub filename: String,

    /// Write `name.html` instead of `name/index.html` for content.
    #[serde(default)]
    pub use_filenames: bool,
}

fn default_locale() -> String {
    "en-US".to_string()
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("source")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_templates_dir() -> String {
    "templates".to_string()
}

fn default_template() -> String {
    "default".to_string()
}

fn default_content_extensions() -> Vec<String> {
    vec!["md".to_string(), "markdown".to_string()]
}

fn default_copy_extensions() -> Vec<String> {
    ["ico", "gif", "jpg", "jpeg", "webp", "png", "svg"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_filename_pattern() -> String {
    "[path]/[name].[ext]".to_string()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            root_url: String::new(),
            locale: default_locale(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            output_dir: default_output_dir(),
            templates_dir: default_templates_dir(),
            default_template: default_template(),
            content_extensions: default_content_extensions(),
            copy_extensions: default_copy_extensions(),
            ignore: Vec::new(),
            exclude: Vec::new(),
            filename: default_filename_pattern(),
            use_filenames: false,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            CoreError::config_with_source(
                format!("Failed to parse config file: {}", path.display()),
                e,
            )
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration using the config crate, with `BODYKIT__` environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(config::Environment::with_prefix("BODYKIT").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.build.source_dir.as_os_str().is_empty() {
            return Err(CoreError::config("build.source_dir cannot be empty"));
        }

        if self.build.content_extensions.is_empty() {
            return Err(CoreError::config(
                "build.content_extensions needs at least one extension",
            ));
        }

        if self.site.root_url.ends_with('/') {
            tracing::warn!("site.root_url should not have a trailing slash");
        }

        Ok(())
    }

    /// Get the full URL for a path under the site root.
    pub fn url_for(&self, path: &str) -> String {
        let base = self.site.root_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    /// Absolute-or-relative path of the templates directory.
    pub fn templates_path(&self) -> PathBuf {
        self.build.source_dir.join(&self.build.templates_dir)
    }

    /// Whether `ext` (without dot) is a content extension.
    pub fn is_content_extension(&self, ext: &str) -> bool {
        self.build
            .content_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(ext))
    }

    /// Whether `ext` (without dot) is in the copy allow-list.
    pub fn is_copy_extension(&self, ext: &str) -> bool {
        self.build
            .copy_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(ext))
    }
}
