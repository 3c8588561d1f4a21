//! Markdown renderer using pulldown-cmark.

use bodykit_core::{MarkdownRenderer, format::make_slug, format::strip_html};
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd, html};

/// Markdown renderer that also assigns slug ids to headings.
#[derive(Debug, Clone)]
pub struct PulldownRenderer {
    options: Options,
    heading_ids: bool,
}

impl Default for PulldownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PulldownRenderer {
    /// Create a renderer with the default extensions enabled.
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

        Self {
            options,
            heading_ids: true,
        }
    }

    /// Disable automatic heading ids.
    #[must_use]
    pub fn without_heading_ids(mut self) -> Self {
        self.heading_ids = false;
        self
    }

    fn events<'a>(&self, text: &'a str) -> Vec<Event<'a>> {
        let events: Vec<_> = Parser::new_ext(text, self.options).collect();
        if self.heading_ids {
            with_heading_ids(events)
        } else {
            events
        }
    }
}

impl MarkdownRenderer for PulldownRenderer {
    fn render(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len() * 3 / 2);
        html::push_html(&mut out, self.events(text).into_iter());
        out
    }

    fn plain_text(&self, text: &str) -> String {
        let mut out = String::new();
        for event in Parser::new_ext(text, self.options) {
            match event {
                Event::Text(t) | Event::Code(t) => out.push_str(&t),
                Event::Html(t) | Event::InlineHtml(t) => out.push_str(&strip_html(&t)),
                Event::SoftBreak => out.push(' '),
                Event::HardBreak => out.push('\n'),
                Event::End(
                    TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item | TagEnd::CodeBlock,
                ) => out.push('\n'),
                _ => {}
            }
        }
        out
    }
}

/// Give headings without an explicit id a slug of their text.
fn with_heading_ids(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut out = Vec::with_capacity(events.len());
    let mut heading_start: Option<usize> = None;
    let mut heading_text = String::new();

    for event in events {
        match &event {
            Event::Start(Tag::Heading { .. }) => {
                heading_start = Some(out.len());
                heading_text.clear();
            }
            Event::Text(t) | Event::Code(t) if heading_start.is_some() => {
                heading_text.push_str(t);
            }
            Event::End(TagEnd::Heading(_)) => {
                let slug = make_slug(heading_text.trim());
                if let Some(index) = heading_start.take()
                    && !slug.is_empty()
                    && let Event::Start(Tag::Heading { id, .. }) = &mut out[index]
                    && id.is_none()
                {
                    *id = Some(CowStr::from(slug));
                }
            }
            _ => {}
        }
        out.push(event);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_basic() {
        let renderer = PulldownRenderer::new();
        let html = renderer.render("Body **text**");
        assert_eq!(html.trim(), "<p>Body <strong>text</strong></p>");
    }

    #[test]
    fn test_heading_ids() {
        let renderer = PulldownRenderer::new();
        let html = renderer.render("# Hello World\n\n## Custom {#mine}");
        assert!(html.contains(r#"<h1 id="hello-world">Hello World</h1>"#));
        assert!(html.contains(r#"<h2 id="mine">Custom</h2>"#));

        let plain = PulldownRenderer::new().without_heading_ids();
        assert!(plain.render("# Hello").contains("<h1>Hello</h1>"));
    }

    #[test]
    fn test_passes_html_through() {
        let renderer = PulldownRenderer::new();
        let html = renderer.render("<div class=\"x\">raw</div>\n");
        assert!(html.contains("<div class=\"x\">raw</div>"));
    }

    #[test]
    fn test_plain_text_lines() {
        let renderer = PulldownRenderer::new();
        let text = renderer.plain_text("# Title\n\nFirst *para*\ncontinues.\n\n- item");
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines, vec!["Title", "First para continues.", "item"]);
    }

    #[test]
    fn test_tables_enabled() {
        let renderer = PulldownRenderer::new();
        let html = renderer.render("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<table>"));
    }
}
