//! `loop`: render a template once per query match.

use std::borrow::Cow;

use bodykit_core::{ContentNode, Entry};
use tracing::trace;

use super::TagProcessor;
use crate::{
    query::{Order, Query, search},
    template::{Engine, RenderScope, Result, TagInstance},
};

/// `{@loop type="post" sort="timestamp" order="desc" limit=5 template="card" /}`
/// or `{@loop type="post"}...{/loop}`.
pub(super) struct LoopTag;

impl LoopTag {
    fn query(tag: &TagInstance, scope: RenderScope<'_>, engine: &Engine<'_>) -> Result<Query> {
        let attr = |key: &str| tag.attrs.get(key).map(|v| engine.interpolate(v, scope));

        let mut query = Query::of_type(engine.interpolate(tag.required("type")?, scope));

        if let Some(sort) = attr("sort").filter(|s| !s.is_empty()) {
            query.sort = sort.into_owned();
        }
        if let Some(order) = attr("order") {
            query.order = order.parse::<Order>().map_err(|e| tag.syntax_error(e))?;
        }
        if let Some(limit) = attr("limit") {
            query.limit = limit
                .trim()
                .parse()
                .map_err(|_| tag.syntax_error(format!("`limit` must be an integer, got `{limit}`")))?;
        }
        if let Some(page) = attr("page") {
            let page = page.trim();
            query.page = if page.is_empty() {
                None
            } else {
                Some(page.parse().map_err(|_| {
                    tag.syntax_error(format!("`page` must be a non-negative integer, got `{page}`"))
                })?)
            };
        }
        query.keywords = attr("keywords").map(Cow::into_owned);
        query.include_assets = tag.attrs.has_flag("include_assets");

        Ok(query)
    }
}

impl TagProcessor for LoopTag {
    fn render(
        &self,
        tag: &TagInstance,
        scope: RenderScope<'_>,
        engine: &Engine<'_>,
    ) -> Result<String> {
        let query = Self::query(tag, scope, engine)?;

        let template = match tag.attrs.get("template") {
            Some(name) => Some(
                engine
                    .context()
                    .templates
                    .get(name)
                    .ok_or_else(|| tag.unresolved("template", name))?,
            ),
            None if tag.is_paired() => None,
            None => {
                return Err(tag.syntax_error("`loop` requires a `template` attribute or a body"));
            }
        };

        let collection = &engine.context().collection;
        let results = search(collection, &query);
        trace!(type_filter = %query.type_filter, matches = results.len(), "loop query");

        let mut out = String::new();
        for entry in results {
            let item: Cow<'_, ContentNode> = match entry {
                Entry::Content(node) => Cow::Borrowed(node),
                Entry::Asset(asset) => Cow::Owned(ContentNode::from_asset(asset)),
            };
            let rendered = match template {
                Some(template) => {
                    let inner = scope.enter(&item, &template.file)?;
                    engine.render_template(template, inner)?
                }
                None => {
                    let inner = scope.enter(&item, &tag.file)?;
                    engine.render_nodes(&tag.children, inner)?
                }
            };
            out.push_str(&rendered);
        }

        Ok(out)
    }
}
