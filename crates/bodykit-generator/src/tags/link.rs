//! `link`: an anchor to a URL or to the current node.

use super::{HtmlElement, TagProcessor};
use crate::template::{Engine, RenderScope, Result, TagInstance};

/// `{@link url="/about/" label="About" /}`, `{@link /}` or `{@link url="$node:url"}...{/link}`.
pub(super) struct LinkTag;

impl TagProcessor for LinkTag {
    fn render(
        &self,
        tag: &TagInstance,
        scope: RenderScope<'_>,
        engine: &Engine<'_>,
    ) -> Result<String> {
        let config = &engine.context().config;

        let href = match tag.attrs.get("url") {
            Some(url) => {
                let url = engine.interpolate(url, scope);
                if url.starts_with('/') && !url.starts_with("//") {
                    config.url_for(&url)
                } else {
                    url.into_owned()
                }
            }
            None => scope.node.url.clone(),
        };

        let label = if tag.is_paired() {
            let inner = scope.enter(scope.node, &tag.file)?;
            engine.render_nodes(&tag.children, inner)?
        } else {
            match tag.attrs.get("label") {
                Some(label) => engine.interpolate(label, scope).into_owned(),
                None => scope.node.title.clone(),
            }
        };

        let mut anchor = HtmlElement::new("a").attr("href", href);
        for (key, value) in tag
            .attrs
            .named()
            .filter(|(key, _)| !matches!(*key, "url" | "label"))
        {
            anchor = anchor.attr(key, engine.interpolate(value, scope));
        }
        Ok(anchor.wrap(&label))
    }
}
