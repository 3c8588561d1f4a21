//! Bodykit Parser Library
//!
//! Markdown-to-HTML rendering behind the [`MarkdownRenderer`] boundary.

pub mod markdown;

pub use bodykit_core::MarkdownRenderer;
pub use markdown::PulldownRenderer;
