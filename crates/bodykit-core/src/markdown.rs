//! Boundary to the markdown-to-HTML collaborator.

use crate::format::strip_html;

/// Renders markdown text to HTML.
///
/// Implementations must be pure: the same input always yields the same HTML
/// and rendering has no side effects the pipeline relies on.
pub trait MarkdownRenderer: Send + Sync {
    /// Render markdown to HTML.
    fn render(&self, text: &str) -> String;

    /// Render markdown to plain text, used for excerpts.
    fn plain_text(&self, text: &str) -> String {
        strip_html(&self.render(text))
    }
}

/// Renderer that passes text through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughRenderer;

impl MarkdownRenderer for PassthroughRenderer {
    fn render(&self, text: &str) -> String {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough_plain_text_strips_tags() {
        let renderer = PassthroughRenderer;
        assert_eq!(renderer.render("<b>x</b>"), "<b>x</b>");
        assert_eq!(renderer.plain_text("<b>x</b> y"), "x y");
    }
}
