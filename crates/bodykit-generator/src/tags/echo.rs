//! `echo`: a single variable value.

use super::TagProcessor;
use crate::template::{Engine, Modifier, RenderScope, Result, TagInstance, VarScope};

/// `{@echo node=title upper default="Untitled" /}`.
pub(super) struct EchoTag;

impl TagProcessor for EchoTag {
    fn render(
        &self,
        tag: &TagInstance,
        scope: RenderScope<'_>,
        engine: &Engine<'_>,
    ) -> Result<String> {
        let (var_scope, name) = [
            ("node", VarScope::Node),
            ("meta", VarScope::Meta),
            ("global", VarScope::Global),
        ]
        .into_iter()
        .find_map(|(key, var_scope)| tag.attrs.get(key).map(|name| (var_scope, name)))
        .ok_or_else(|| tag.syntax_error("`echo` requires a `node`, `meta` or `global` attribute"))?;

        let mut modifiers = Vec::new();
        if let Some(fallback) = tag.attrs.get("default") {
            modifiers.push(Modifier::Default(fallback.to_string()));
        }
        for word in tag.attrs.positional() {
            let modifier = Modifier::parse(word, None)
                .ok_or_else(|| tag.syntax_error(format!("unknown modifier `{word}`")))?;
            modifiers.push(modifier);
        }

        Ok(engine.vars(scope.node).resolve(var_scope, name, &modifiers))
    }
}
