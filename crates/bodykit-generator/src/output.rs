//! Output path patterns.
//!
//! Patterns are strings with `[path]`, `[name]`, `[ext]`, `[path:N]` (the Nth
//! directory segment, 0-based) and `[path:last]` placeholders.

use std::sync::LazyLock;

use bodykit_core::Config;
use regex::{Captures, Regex};

/// Pattern for content written as a directory index.
pub const INDEX_PATTERN: &str = "[path]/[name]/index.html";

/// Pattern for content written as a flat file.
pub const FLAT_PATTERN: &str = "[path]/[name].html";

static SEGMENT_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[path:(\d+|last)\]").expect("valid path segment regex"));

/// A parsed output path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPattern(String);

impl OutputPattern {
    /// Create a pattern.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self(pattern.into())
    }

    /// Pattern for a content document with the given file stem.
    pub fn for_content(config: &Config, name: &str) -> Self {
        if config.build.use_filenames || name == "index" {
            Self::new(FLAT_PATTERN)
        } else {
            Self::new(INDEX_PATTERN)
        }
    }

    /// Pattern for a copied asset.
    pub fn for_asset(config: &Config) -> Self {
        Self::new(config.build.filename.clone())
    }

    /// Expand the pattern into a slash-separated path relative to the output root.
    pub fn apply(&self, dir: &str, name: &str, ext: &str) -> String {
        let segments: Vec<&str> = dir
            .split('/')
            .filter(|s| !s.is_empty() && *s != "." && *s != "..")
            .collect();
        let path = segments.join("/");

        let expanded = SEGMENT_TOKEN.replace_all(&self.0, |caps: &Captures<'_>| {
            let segment = match &caps[1] {
                "last" => segments.last().copied(),
                n => n.parse::<usize>().ok().and_then(|i| segments.get(i).copied()),
            };
            segment.unwrap_or_default().to_string()
        });

        let expanded = expanded
            .replace("[path]", &path)
            .replace("[name]", name)
            .replace("[ext]", ext);

        expanded
            .split('/')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Public URL for an output path: the path under the site root, with a trailing
/// `index.html` dropped.
pub fn url_for_output(config: &Config, rel_output: &str) -> String {
    let trimmed = match rel_output.strip_suffix("index.html") {
        Some(rest) if rest.is_empty() || rest.ends_with('/') => rest,
        _ => rel_output,
    };
    config.url_for(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_basic_tokens() {
        let pattern = OutputPattern::new("[path]/[name].[ext]");
        assert_eq!(pattern.apply("img/icons", "logo", "png"), "img/icons/logo.png");
        assert_eq!(pattern.apply("", "favicon", "ico"), "favicon.ico");
    }

    #[test]
    fn test_apply_segment_tokens() {
        let pattern = OutputPattern::new("[path:last]/[path:0]-[name].[ext]");
        assert_eq!(pattern.apply("blog/2024/jan", "a", "md"), "jan/blog-a.md");

        let missing = OutputPattern::new("[path:5]/[name]");
        assert_eq!(missing.apply("a", "b", "c"), "b");
    }

    #[test]
    fn test_apply_drops_parent_segments() {
        let pattern = OutputPattern::new("[path]/[name].[ext]");
        assert_eq!(pattern.apply("../a/./b", "x", "y"), "a/b/x.y");
    }

    #[test]
    fn test_content_patterns() {
        let mut config = Config::default();
        assert_eq!(
            OutputPattern::for_content(&config, "hello").apply("posts", "hello", "md"),
            "posts/hello/index.html"
        );
        assert_eq!(
            OutputPattern::for_content(&config, "index").apply("posts", "index", "md"),
            "posts/index.html"
        );
        config.build.use_filenames = true;
        assert_eq!(
            OutputPattern::for_content(&config, "hello").apply("posts", "hello", "md"),
            "posts/hello.html"
        );
    }

    #[test]
    fn test_url_for_output() {
        let mut config = Config::default();
        assert_eq!(url_for_output(&config, "posts/hello/index.html"), "/posts/hello/");
        assert_eq!(url_for_output(&config, "index.html"), "/");
        assert_eq!(url_for_output(&config, "posts/hello.html"), "/posts/hello.html");
        assert_eq!(url_for_output(&config, "notindex.html"), "/notindex.html");

        config.site.root_url = "https://example.com".to_string();
        assert_eq!(
            url_for_output(&config, "img/logo.png"),
            "https://example.com/img/logo.png"
        );
    }
}
