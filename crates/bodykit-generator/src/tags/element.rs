//! `tag`: a generic HTML element.

use super::{HtmlElement, TagProcessor, VOID_ELEMENTS};
use crate::template::{Engine, RenderScope, Result, TagInstance};

/// `{@tag div class="card" text="$node:title" /}` or `{@tag section}...{/tag}`.
///
/// The first positional word is the element name; further bare words become
/// boolean attributes.
pub(super) struct ElementTag;

fn is_element_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
}

impl TagProcessor for ElementTag {
    fn render(
        &self,
        tag: &TagInstance,
        scope: RenderScope<'_>,
        engine: &Engine<'_>,
    ) -> Result<String> {
        let Some((name, flags)) = tag.attrs.positional().split_first() else {
            return Err(tag.syntax_error("`tag` requires an element name"));
        };
        if !is_element_name(name) {
            return Err(tag.syntax_error(format!("invalid element name `{name}`")));
        }

        let name = name.to_ascii_lowercase();
        let mut element = HtmlElement::new(name.as_str());
        for (key, value) in tag.attrs.named().filter(|(key, _)| *key != "text") {
            element = element.attr(key, engine.interpolate(value, scope));
        }
        for flag in flags {
            element = element.flag(flag.as_str());
        }

        let inner = if tag.is_paired() {
            let inner_scope = scope.enter(scope.node, &tag.file)?;
            Some(engine.render_nodes(&tag.children, inner_scope)?)
        } else {
            tag.attrs
                .get("text")
                .map(|text| engine.interpolate(text, scope).into_owned())
        };

        Ok(match inner {
            Some(inner) => element.wrap(&inner),
            None if VOID_ELEMENTS.contains(&name.as_str()) => element.open(),
            None => element.wrap(""),
        })
    }
}
