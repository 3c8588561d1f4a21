//! Builds a tag tree from the token stream.
//!
//! Paired tags match with a stack: a closer closes the innermost open tag and
//! must carry its name.

use std::sync::Arc;

use super::{
    attrs::Attributes,
    error::{RenderError, Result, SourcePos},
    lexer::{LineIndex, Token, tokenize},
};
use crate::tags::{TagKind, TagRegistry};

/// One node of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Literal text, interpolated at render time.
    Text(String),
    /// A tag invocation.
    Tag(TagInstance),
}

/// A parsed tag with its attributes and, for paired tags, its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagInstance {
    /// Lowercased tag name as written.
    pub name: String,

    /// Processor the name resolved to.
    pub kind: TagKind,

    /// Parsed attributes.
    pub attrs: Attributes,

    /// Exact source text between opener and closer; `None` when self-closing.
    pub body: Option<String>,

    /// Parsed body.
    pub children: Vec<Node>,

    /// File the tag was parsed from.
    pub file: Arc<str>,

    /// Position of the opener.
    pub pos: SourcePos,
}

impl TagInstance {
    /// Whether the tag was written as an opener/closer pair.
    pub fn is_paired(&self) -> bool {
        self.body.is_some()
    }

    /// Syntax error at this tag.
    pub fn syntax_error(&self, message: impl Into<String>) -> RenderError {
        RenderError::syntax(self.file.as_ref(), self.pos, message)
    }

    /// Unresolved reference error at this tag.
    pub fn unresolved(&self, kind: &str, name: &str) -> RenderError {
        RenderError::UnresolvedReference {
            file: self.file.to_string(),
            pos: self.pos,
            kind: kind.to_string(),
            name: name.to_string(),
        }
    }

    /// Value of a required attribute; a missing or empty value is a syntax error.
    pub fn required(&self, key: &str) -> Result<&str> {
        self.attrs
            .get(key)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                self.syntax_error(format!("`{}` requires a `{key}` attribute", self.name))
            })
    }
}

struct Frame {
    tag: TagInstance,
    body_start: usize,
    children: Vec<Node>,
}

/// Parse template text into a tree.
pub fn parse(source: &str, file: &str, registry: &TagRegistry) -> Result<Vec<Node>> {
    let index = LineIndex::new(source);
    let file: Arc<str> = Arc::from(file);

    let tokens = tokenize(source)
        .map_err(|e| RenderError::syntax(file.as_ref(), index.pos(e.offset), e.message))?;

    let mut root: Vec<Node> = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();

    for token in tokens {
        match token {
            Token::Text { text, .. } => {
                push_node(&mut root, &mut stack, Node::Text(text.to_string()));
            }
            Token::Open {
                name,
                attrs,
                self_closing,
                start,
                end,
            } => {
                let pos = index.pos(start);
                let name = name.to_ascii_lowercase();
                let Some(kind) = registry.lookup(&name) else {
                    return Err(RenderError::UnknownTag {
                        file: file.to_string(),
                        pos,
                        name,
                    });
                };
                let attrs = Attributes::parse(attrs)
                    .map_err(|message| RenderError::syntax(file.as_ref(), pos, message))?;

                let tag = TagInstance {
                    name,
                    kind,
                    attrs,
                    body: None,
                    children: Vec::new(),
                    file: Arc::clone(&file),
                    pos,
                };

                if self_closing {
                    push_node(&mut root, &mut stack, Node::Tag(tag));
                } else {
                    stack.push(Frame {
                        tag,
                        body_start: end,
                        children: Vec::new(),
                    });
                }
            }
            Token::Close { name, start, .. } => {
                let pos = index.pos(start);
                let name = name.to_ascii_lowercase();
                let Some(frame) = stack.pop() else {
                    return Err(RenderError::syntax(
                        file.as_ref(),
                        pos,
                        format!("closing tag `{{/{name}}}` has no open tag"),
                    ));
                };
                if frame.tag.name != name {
                    return Err(RenderError::syntax(
                        file.as_ref(),
                        pos,
                        format!(
                            "closing tag `{{/{name}}}` does not match `{{@{}}}` opened at {}",
                            frame.tag.name, frame.tag.pos
                        ),
                    ));
                }

                let mut tag = frame.tag;
                tag.body = Some(source[frame.body_start..start].to_string());
                tag.children = frame.children;
                push_node(&mut root, &mut stack, Node::Tag(tag));
            }
        }
    }

    if let Some(frame) = stack.pop() {
        return Err(RenderError::syntax(
            file.as_ref(),
            frame.tag.pos,
            format!(
                "tag `{{@{}}}` is never closed; expected `{{/{}}}` or a self-closing `/}}`",
                frame.tag.name, frame.tag.name
            ),
        ));
    }

    Ok(root)
}

fn push_node(root: &mut Vec<Node>, stack: &mut [Frame], node: Node) {
    match stack.last_mut() {
        Some(frame) => frame.children.push(node),
        None => root.push(node),
    }
}
