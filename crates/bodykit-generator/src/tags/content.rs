//! `content`: the node body rendered as a template, then as markdown.

use super::TagProcessor;
use crate::template::{Engine, RenderScope, Result, TagInstance};

/// `{@content /}`, `{@content raw /}` or `{@content template="name" /}`.
pub(super) struct ContentTag;

impl TagProcessor for ContentTag {
    fn render(
        &self,
        tag: &TagInstance,
        scope: RenderScope<'_>,
        engine: &Engine<'_>,
    ) -> Result<String> {
        let node = scope.node;

        let html = match tag.attrs.get("template") {
            Some(name) => {
                let template = engine
                    .context()
                    .templates
                    .get(name)
                    .ok_or_else(|| tag.unresolved("template", name))?;
                let inner = scope.enter(node, &template.file)?;
                engine.render_template(template, inner)?
            }
            None => {
                let file = node.source_path.to_string_lossy();
                let inner = scope.enter(node, &file)?;
                engine.render_str(&node.body, inner)?
            }
        };

        if tag.attrs.has_flag("raw") {
            Ok(html)
        } else {
            Ok(engine.context().markdown.render(&html))
        }
    }
}
