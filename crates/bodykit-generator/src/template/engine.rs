//! Render engine: walks a parsed tree, interpolating text and dispatching tags.

use std::borrow::Cow;

use bodykit_core::ContentNode;

use super::{
    error::{RenderError, Result, SourcePos},
    parser::{Node, parse},
    store::Template,
    vars::VarContext,
};
use crate::{assets::AssetResolver, context::BuildContext};

/// Deepest allowed chain of nested renders.
pub const MAX_DEPTH: usize = 50;

/// The node being rendered and how deep the current render chain is.
#[derive(Debug, Clone, Copy)]
pub struct RenderScope<'a> {
    /// Node variables and tags resolve against.
    pub node: &'a ContentNode,
    /// File whose text is being rendered.
    pub file: &'a str,
    /// Number of nested renders above this one.
    pub depth: usize,
}

impl<'a> RenderScope<'a> {
    /// Scope of a top-level render.
    pub fn root(node: &'a ContentNode, file: &'a str) -> Self {
        Self {
            node,
            file,
            depth: 0,
        }
    }

    /// Scope one level deeper, failing past [`MAX_DEPTH`].
    pub fn enter<'b>(&self, node: &'b ContentNode, file: &'b str) -> Result<RenderScope<'b>> {
        let depth = self.depth + 1;
        if depth > MAX_DEPTH {
            return Err(RenderError::RecursionLimit {
                file: file.to_string(),
                limit: MAX_DEPTH,
            });
        }
        Ok(RenderScope { node, file, depth })
    }
}

/// Renders templates against one pass's [`BuildContext`].
#[derive(Clone, Copy)]
pub struct Engine<'a> {
    ctx: &'a BuildContext,
}

impl<'a> Engine<'a> {
    /// Create an engine over a build context.
    pub fn new(ctx: &'a BuildContext) -> Self {
        Self { ctx }
    }

    /// The shared build context.
    pub fn context(&self) -> &'a BuildContext {
        self.ctx
    }

    /// Asset resolver for this pass.
    pub fn resolver(&self) -> AssetResolver<'a> {
        self.ctx.resolver()
    }

    /// Render a node through the template for its type, or the default template.
    pub fn render_page(&self, node: &ContentNode) -> Result<String> {
        let template = self
            .ctx
            .templates
            .page_template(&node.node_type, &self.ctx.config.build.default_template)
            .ok_or_else(|| RenderError::UnresolvedReference {
                file: node.source_path.display().to_string(),
                pos: SourcePos::default(),
                kind: "template".to_string(),
                name: node.node_type.clone(),
            })?;

        self.render_template(template, RenderScope::root(node, &template.file))
    }

    /// Render a named template in `scope`.
    pub fn render_template(&self, template: &Template, scope: RenderScope<'_>) -> Result<String> {
        let nodes = template.nodes(&self.ctx.registry)?;
        self.render_nodes(&nodes, scope)
    }

    /// Parse and render template text in `scope`.
    pub fn render_str(&self, source: &str, scope: RenderScope<'_>) -> Result<String> {
        let nodes = parse(source, scope.file, &self.ctx.registry)?;
        self.render_nodes(&nodes, scope)
    }

    /// Render parsed nodes in `scope`.
    pub fn render_nodes(&self, nodes: &[Node], scope: RenderScope<'_>) -> Result<String> {
        let mut out = String::new();
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(&self.interpolate(text, scope)),
                Node::Tag(tag) => {
                    let rendered = tag.kind.processor().render(tag, scope, self)?;
                    out.push_str(&rendered);
                }
            }
        }
        Ok(out)
    }

    /// Replace variable tokens in `text` for the scope's node.
    pub fn interpolate<'t>(&self, text: &'t str, scope: RenderScope<'_>) -> Cow<'t, str> {
        self.vars(scope.node).interpolate(text)
    }

    /// Variable lookup context for `node`.
    pub fn vars<'n>(&self, node: &'n ContentNode) -> VarContext<'n>
    where
        'a: 'n,
    {
        VarContext {
            node,
            config: &self.ctx.config,
            now: self.ctx.started,
        }
    }
}
