//! Bodykit Core Library
//!
//! Core types, configuration, front matter and error handling for the Bodykit
//! content pipeline.

pub mod config;
pub mod content;
pub mod error;
pub mod format;
pub mod frontmatter;
pub mod markdown;

pub use config::Config;
pub use content::{AssetNode, Collection, ContentNode, Entry, NodeLocation};
pub use error::{CoreError, Result};
pub use frontmatter::{FrontMatter, Metadata};
pub use markdown::MarkdownRenderer;
