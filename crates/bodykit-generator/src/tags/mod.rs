//! Built-in tag processors.
//!
//! Tag names map to a closed set of [`TagKind`]s; each kind has one stateless
//! processor. Processors return a `String`, possibly empty, and may render
//! recursively through the [`Engine`].

mod asset;
mod content;
mod echo;
mod element;
mod include;
mod link;
mod loops;

use std::collections::HashMap;

use bodykit_core::format::escape_html;

use crate::{
    assets::AssetKind,
    template::{Engine, RenderScope, Result, TagInstance},
};

/// Renders one tag instance.
pub trait TagProcessor: Send + Sync {
    /// Render `tag` for `scope.node`.
    fn render(&self, tag: &TagInstance, scope: RenderScope<'_>, engine: &Engine<'_>)
    -> Result<String>;
}

static CSS_SHORTCUT: asset::ShortcutTag = asset::ShortcutTag(AssetKind::Css);
static JS_SHORTCUT: asset::ShortcutTag = asset::ShortcutTag(AssetKind::Js);

/// Every built-in tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    /// `content`: the node body as a template, then markdown.
    Content,
    /// `loop`: render per query match.
    Loop,
    /// `asset`: stylesheet, script, font or image reference.
    Asset,
    /// `echo`: a single variable.
    Echo,
    /// `tag`: a generic HTML element.
    Element,
    /// `template`: include another template.
    Template,
    /// `link`: an anchor.
    Link,
    /// `css`: stylesheet shortcut.
    Css,
    /// `js`: script shortcut.
    Js,
}

impl TagKind {
    /// All kinds.
    pub const ALL: [TagKind; 9] = [
        Self::Content,
        Self::Loop,
        Self::Asset,
        Self::Echo,
        Self::Element,
        Self::Template,
        Self::Link,
        Self::Css,
        Self::Js,
    ];

    /// Name the kind is registered under.
    pub fn name(self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Loop => "loop",
            Self::Asset => "asset",
            Self::Echo => "echo",
            Self::Element => "tag",
            Self::Template => "template",
            Self::Link => "link",
            Self::Css => "css",
            Self::Js => "js",
        }
    }

    /// The processor for this kind.
    pub fn processor(self) -> &'static dyn TagProcessor {
        match self {
            Self::Content => &content::ContentTag,
            Self::Loop => &loops::LoopTag,
            Self::Asset => &asset::AssetTag,
            Self::Echo => &echo::EchoTag,
            Self::Element => &element::ElementTag,
            Self::Template => &include::TemplateTag,
            Self::Link => &link::LinkTag,
            Self::Css => &CSS_SHORTCUT,
            Self::Js => &JS_SHORTCUT,
        }
    }
}

/// Tag name to kind mapping. Unknown names have no entry and fail to parse.
#[derive(Debug, Clone)]
pub struct TagRegistry {
    by_name: HashMap<String, TagKind>,
}

impl Default for TagRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TagRegistry {
    /// Registry with every built-in tag.
    pub fn new() -> Self {
        let by_name = TagKind::ALL
            .into_iter()
            .map(|kind| (kind.name().to_string(), kind))
            .collect();
        Self { by_name }
    }

    /// Kind registered under `name`.
    pub fn lookup(&self, name: &str) -> Option<TagKind> {
        self.by_name.get(&name.to_ascii_lowercase()).copied()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Small HTML element builder with escaped attribute values.
#[derive(Debug, Clone)]
pub(crate) struct HtmlElement {
    name: String,
    attrs: Vec<(String, Option<String>)>,
}

impl HtmlElement {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
        }
    }

    pub(crate) fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((key.into(), Some(value.into())));
        self
    }

    pub(crate) fn attr_opt(self, key: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.attr(key, value),
            None => self,
        }
    }

    pub(crate) fn flag(mut self, key: impl Into<String>) -> Self {
        self.attrs.push((key.into(), None));
        self
    }

    /// Opening tag only, for void elements.
    pub(crate) fn open(&self) -> String {
        let mut out = format!("<{}", self.name);
        for (key, value) in &self.attrs {
            out.push(' ');
            out.push_str(key);
            if let Some(value) = value {
                out.push_str("=\"");
                out.push_str(&escape_html(value));
                out.push('"');
            }
        }
        out.push('>');
        out
    }

    /// Element wrapping `inner`.
    pub(crate) fn wrap(&self, inner: &str) -> String {
        format!("{}{inner}</{}>", self.open(), self.name)
    }
}

/// Elements rendered without a closing tag when they have no content.
pub(crate) const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_names() {
        let registry = TagRegistry::new();
        assert_eq!(
            registry.names(),
            vec!["asset", "content", "css", "echo", "js", "link", "loop", "tag", "template"]
        );
        assert_eq!(registry.lookup("TAG"), Some(TagKind::Element));
        assert_eq!(registry.lookup("bogus"), None);
    }

    #[test]
    fn test_html_element() {
        let el = HtmlElement::new("a")
            .attr("href", "/x?a=1&b=2")
            .attr_opt("title", None)
            .flag("download");
        assert_eq!(el.open(), r#"<a href="/x?a=1&amp;b=2" download>"#);
        assert_eq!(el.wrap("go"), r#"<a href="/x?a=1&amp;b=2" download>go</a>"#);
    }
}
