//! `asset`, `css` and `js`: versioned references to stylesheets, scripts,
//! fonts and images.

use bodykit_core::format::make_slug;

use super::{HtmlElement, TagProcessor};
use crate::{
    assets::{AssetKind, ResolvedAsset},
    template::{Engine, RenderScope, Result, TagInstance},
};

/// Attributes consumed by the `asset` tag itself.
const RESERVED: &[&str] = &["type", "name", "path", "version", "alt", "title", "width", "height"];

/// `{@asset type=css name=main /}`, `{@asset type=image name=logo.png alt="Logo" /}`.
pub(super) struct AssetTag;

/// `{@css main /}` and `{@js app defer /}`.
pub(super) struct ShortcutTag(pub(super) AssetKind);

impl TagProcessor for AssetTag {
    fn render(
        &self,
        tag: &TagInstance,
        scope: RenderScope<'_>,
        engine: &Engine<'_>,
    ) -> Result<String> {
        let kind: AssetKind = tag
            .required("type")?
            .parse()
            .map_err(|e: String| tag.syntax_error(e))?;

        let resolved = if let Some(name) = tag.attrs.get("name") {
            let name = engine.interpolate(name, scope);
            match resolve(kind, &name, tag, engine)? {
                Some(resolved) => resolved,
                None => return Ok(String::new()),
            }
        } else if let Some(path) = tag.attrs.get("path") {
            engine.resolver().direct(&engine.interpolate(path, scope))
        } else {
            return Err(tag.syntax_error("`asset` requires a `name` or `path` attribute"));
        };

        Ok(emit(kind, &with_version(resolved, tag), tag, scope, engine))
    }
}

impl TagProcessor for ShortcutTag {
    fn render(
        &self,
        tag: &TagInstance,
        scope: RenderScope<'_>,
        engine: &Engine<'_>,
    ) -> Result<String> {
        let kind = self.0;
        let name = tag
            .attrs
            .get("name")
            .or_else(|| tag.attrs.first_positional(&["optional", "defer", "async", "module"]))
            .ok_or_else(|| tag.syntax_error(format!("`{}` requires an asset name", tag.name)))?;
        let name = engine.interpolate(name, scope);

        match resolve(kind, &name, tag, engine)? {
            Some(resolved) => Ok(emit(kind, &with_version(resolved, tag), tag, scope, engine)),
            None => Ok(String::new()),
        }
    }
}

/// Resolve a named asset; `Ok(None)` only when the tag is `optional`.
fn resolve(
    kind: AssetKind,
    name: &str,
    tag: &TagInstance,
    engine: &Engine<'_>,
) -> Result<Option<ResolvedAsset>> {
    match engine.resolver().resolve(kind, name) {
        Some(resolved) => Ok(Some(resolved)),
        None if tag.attrs.has_flag("optional") => Ok(None),
        None => Err(tag.unresolved(kind.as_str(), name)),
    }
}

fn with_version(resolved: ResolvedAsset, tag: &TagInstance) -> ResolvedAsset {
    match tag.attrs.get("version") {
        Some(version) => ResolvedAsset {
            version: version.to_string(),
            ..resolved
        },
        None => resolved,
    }
}

fn emit(
    kind: AssetKind,
    asset: &ResolvedAsset,
    tag: &TagInstance,
    scope: RenderScope<'_>,
    engine: &Engine<'_>,
) -> String {
    let url = asset.url();
    let id = make_slug(&asset.path);
    let attr = |key: &str| tag.attrs.get(key).map(|v| engine.interpolate(v, scope).into_owned());

    match kind {
        AssetKind::Css => HtmlElement::new("link")
            .attr("rel", "stylesheet")
            .attr("id", id)
            .attr("href", url)
            .attr_opt("media", attr("media").as_deref())
            .open(),
        AssetKind::Js => {
            let mut script = HtmlElement::new("script").attr("id", id).attr("src", url);
            if tag.attrs.has_flag("module") {
                script = script.attr("type", "module");
            }
            for flag in ["defer", "async"] {
                if tag.attrs.has_flag(flag) {
                    script = script.flag(flag);
                }
            }
            script.wrap("")
        }
        AssetKind::Font => {
            let ext = asset.path.rsplit_once('.').map_or("woff2", |(_, ext)| ext);
            HtmlElement::new("link")
                .attr("rel", "preload")
                .attr("href", url)
                .attr("as", "font")
                .attr("type", format!("font/{ext}"))
                .flag("crossorigin")
                .open()
        }
        AssetKind::Image => {
            let img = HtmlElement::new("img")
                .attr("src", url)
                .attr("alt", attr("alt").unwrap_or_default())
                .attr_opt("title", attr("title").as_deref())
                .attr_opt("width", attr("width").as_deref())
                .attr_opt("height", attr("height").as_deref())
                .open();

            let mut figure = HtmlElement::new("figure");
            for (key, value) in tag
                .attrs
                .named()
                .filter(|(key, _)| !RESERVED.contains(key) && *key != "caption")
            {
                figure = figure.attr(key, engine.interpolate(value, scope));
            }
            let caption = attr("caption")
                .map(|caption| HtmlElement::new("figcaption").wrap(&caption))
                .unwrap_or_default();
            figure.wrap(&format!("{img}{caption}"))
        }
    }
}
