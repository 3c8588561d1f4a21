//! Named templates discovered under the templates directory.

use std::{
    collections::HashMap,
    fs,
    path::Path,
    sync::{Arc, OnceLock},
};

use bodykit_core::format::make_slug;
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::{
    error::{RenderError, Result},
    parser::{Node, parse},
};
use crate::{collector::relative_path, tags::TagRegistry};

/// A template source with its lazily parsed tree.
#[derive(Debug)]
pub struct Template {
    /// Lookup name.
    pub name: String,
    /// File the template was loaded from, used in error messages.
    pub file: String,
    source: String,
    parsed: OnceLock<Result<Arc<[Node]>>>,
}

impl Template {
    /// Create a template from source text.
    pub fn new(name: impl Into<String>, file: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            source: source.into(),
            parsed: OnceLock::new(),
        }
    }

    /// Parsed tree; parsed once and shared by every render in the pass.
    pub fn nodes(&self, registry: &TagRegistry) -> Result<Arc<[Node]>> {
        self.parsed
            .get_or_init(|| parse(&self.source, &self.file, registry).map(Arc::from))
            .clone()
    }

    #[cfg(test)]
    fn source(&self) -> &str {
        &self.source
    }
}

/// All templates of one build pass, keyed by slug name.
#[derive(Debug, Default)]
pub struct TemplateStore {
    templates: HashMap<String, Template>,
}

impl TemplateStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `.html` file under `dir`. A missing directory gives an empty store.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut store = Self::new();
        if !dir.is_dir() {
            warn!(dir = %dir.display(), "templates directory not found");
            return Ok(store);
        }

        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(|e| RenderError::FileRead {
                path: e.path().unwrap_or(dir).to_path_buf(),
                message: e.to_string(),
            })?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "html") {
                continue;
            }

            let source = fs::read_to_string(path).map_err(|e| RenderError::FileRead {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            let rel = relative_path(dir, path);
            let name = template_name(&rel);
            debug!(name = %name, path = %path.display(), "loaded template");
            store.insert_template(Template::new(name, path.display().to_string(), source));
        }

        Ok(store)
    }

    /// Add a template from source text, named by the slug of `name`.
    pub fn insert(&mut self, name: &str, source: impl Into<String>) {
        let name = make_slug(name);
        let file = format!("{name}.html");
        self.insert_template(Template::new(name, file, source));
    }

    fn insert_template(&mut self, template: Template) {
        if let Some(previous) = self.templates.get(&template.name) {
            warn!(name = %template.name, replaced = %previous.file, "duplicate template name");
        }
        self.templates.insert(template.name.clone(), template);
    }

    /// Look up a template by name. Names are normalized like file-derived names.
    pub fn get(&self, name: &str) -> Option<&Template> {
        let name = name.trim().trim_end_matches(".html");
        self.templates.get(&make_slug(name))
    }

    /// Page template for a node type, falling back to `default_name`.
    pub fn page_template(&self, node_type: &str, default_name: &str) -> Option<&Template> {
        self.get(node_type).or_else(|| self.get(default_name))
    }

    /// Template names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.templates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Template name for a path relative to the templates directory.
pub fn template_name(rel_path: &str) -> String {
    let without_ext = rel_path.strip_suffix(".html").unwrap_or(rel_path);
    make_slug(without_ext)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_load_discovers_nested_templates() {
        let dir = TempDir::new().expect("create temp dir");
        fs::create_dir_all(dir.path().join("partials")).expect("mkdir");
        fs::write(dir.path().join("default.html"), "{@content /}").expect("write");
        fs::write(dir.path().join("partials/card.html"), "<div></div>").expect("write");
        fs::write(dir.path().join("notes.txt"), "ignored").expect("write");

        let store = TemplateStore::load(dir.path()).expect("load");
        assert_eq!(store.names(), vec!["default", "partials-card"]);
        assert!(store.get("partials/card").is_some());
        assert!(store.get("partials-card.html").is_some());
        assert_eq!(
            store.get("partials/card").map(Template::source),
            Some("<div></div>")
        );
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let store = TemplateStore::load(Path::new("/nonexistent/templates")).expect("load");
        assert!(store.is_empty());
    }

    #[test]
    fn test_page_template_fallback() {
        let mut store = TemplateStore::new();
        store.insert("default", "d");
        store.insert("post", "p");

        assert_eq!(store.page_template("post", "default").map(|t| t.name.as_str()), Some("post"));
        assert_eq!(
            store.page_template("gallery", "default").map(|t| t.name.as_str()),
            Some("default")
        );
        assert!(TemplateStore::new().page_template("post", "default").is_none());
    }

    #[test]
    fn test_parse_is_cached() {
        let registry = TagRegistry::new();
        let template = Template::new("t", "t.html", "a{@content /}b");
        let first = template.nodes(&registry).expect("parse");
        let second = template.nodes(&registry).expect("parse");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_parse_error_is_cached_too() {
        let registry = TagRegistry::new();
        let template = Template::new("t", "t.html", "{@nope /}");
        assert!(matches!(template.nodes(&registry), Err(RenderError::UnknownTag { .. })));
        assert!(matches!(template.nodes(&registry), Err(RenderError::UnknownTag { .. })));
    }
}
