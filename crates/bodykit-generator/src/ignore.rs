//! Ignore rules for the source tree walk and watch events.
//!
//! Glob patterns from the configuration use `glob` syntax: `*` and `?` never
//! cross a `/`, `**` spans directories and `[...]`/`[!...]` are character
//! classes. Patterns always match the whole name or path.

use bodykit_core::Config;
use glob::{MatchOptions, Pattern, PatternError};

/// Whether a file or directory name is hidden from the pipeline by convention.
pub fn is_hidden_name(name: &str) -> bool {
    name.starts_with('.') || name.starts_with('_') || name.starts_with('~') || name.ends_with('~')
}

/// Whether a file is compiler output (`main.min.css`, `app.min.js`).
pub fn is_minified_name(name: &str) -> bool {
    match name.rsplit_once('.') {
        Some((stem, _)) => stem.ends_with(".min"),
        None => false,
    }
}

/// `*` and `?` stop at `/`; only `**` crosses directories.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A compiled set of glob patterns.
#[derive(Debug, Clone, Default)]
pub struct GlobSet {
    patterns: Vec<Pattern>,
}

impl GlobSet {
    /// Compile glob patterns.
    pub fn new<S: AsRef<str>>(globs: &[S]) -> Result<Self, PatternError> {
        let patterns = globs
            .iter()
            .map(|glob| Pattern::new(glob.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Whether any pattern matches `text`.
    pub fn is_match(&self, text: &str) -> bool {
        self.patterns
            .iter()
            .any(|pattern| pattern.matches_with(text, MATCH_OPTIONS))
    }
}

/// Skip rules applied to paths relative to the source root.
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    names: GlobSet,
    paths: GlobSet,
    templates_dir: String,
}

impl IgnoreRules {
    /// Build the rules from the `ignore`/`exclude` globs and the templates directory.
    pub fn from_config(config: &Config) -> Result<Self, PatternError> {
        Ok(Self {
            names: GlobSet::new(&config.build.ignore)?,
            paths: GlobSet::new(&config.build.exclude)?,
            templates_dir: config.build.templates_dir.trim_matches('/').to_string(),
        })
    }

    /// Whether the entry at `rel_path` (slash-separated) is skipped.
    ///
    /// Only the last segment is checked against the name rules; callers walking
    /// a tree prune ignored directories before descending.
    pub fn is_ignored(&self, rel_path: &str) -> bool {
        let rel_path = rel_path.trim_matches('/');
        if rel_path.is_empty() {
            return false;
        }
        let name = rel_path.rsplit('/').next().unwrap_or(rel_path);

        is_hidden_name(name)
            || rel_path == self.templates_dir
            || self.names.is_match(name)
            || self.paths.is_match(rel_path)
    }

    /// Whether any segment of `rel_path` is skipped.
    pub fn is_ignored_path(&self, rel_path: &str) -> bool {
        let rel_path = rel_path.trim_matches('/');
        let mut prefix_end = 0;
        for segment in rel_path.split('/') {
            prefix_end += segment.len();
            if self.is_ignored(&rel_path[..prefix_end]) {
                return true;
            }
            prefix_end += 1;
        }
        false
    }

    /// Whether `rel_path` is inside the templates directory.
    pub fn is_template_path(&self, rel_path: &str) -> bool {
        let rel_path = rel_path.trim_matches('/');
        rel_path
            .strip_prefix(self.templates_dir.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }
}
