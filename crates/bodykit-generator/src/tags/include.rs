//! `template`: include another named template.

use super::TagProcessor;
use crate::template::{Engine, RenderScope, Result, TagInstance};

/// `{@template partials/card /}` or `{@template name="footer" optional /}`.
pub(super) struct TemplateTag;

impl TagProcessor for TemplateTag {
    fn render(
        &self,
        tag: &TagInstance,
        scope: RenderScope<'_>,
        engine: &Engine<'_>,
    ) -> Result<String> {
        let name = tag
            .attrs
            .get("name")
            .or_else(|| tag.attrs.first_positional(&["optional"]))
            .ok_or_else(|| tag.syntax_error("`template` requires a template name"))?;

        let Some(template) = engine.context().templates.get(name) else {
            if tag.attrs.has_flag("optional") {
                return Ok(String::new());
            }
            return Err(tag.unresolved("template", name));
        };

        let inner = scope.enter(scope.node, &template.file)?;
        engine.render_template(template, inner)
    }
}
