//! Tag template engine.
//!
//! Templates are tokenized in one pass into a tree of text spans and tag
//! instances, then rendered against a [`BuildContext`](crate::context::BuildContext).
//! Tag grammar:
//!
//! - self-closing: `{@name attrs /}`
//! - paired: `{@name attrs}...{/name}`
//!
//! Text spans may carry `$scope:name(:modifier)*` variable tokens.

pub mod attrs;
pub mod engine;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod store;
pub mod vars;

pub use attrs::Attributes;
pub use engine::{Engine, MAX_DEPTH, RenderScope};
pub use error::{RenderError, Result, SourcePos};
pub use parser::{Node, TagInstance, parse};
pub use store::{Template, TemplateStore};
pub use vars::{Modifier, VarContext, VarScope};
