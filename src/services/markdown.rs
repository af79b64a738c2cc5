//! Markdown rendering service
//!
//! Converts record content from Markdown to HTML with pulldown-cmark. The
//! rendered HTML is persisted alongside the source so read endpoints never
//! pay the parsing cost.

use pulldown_cmark::{html, Options, Parser};

/// A thread-safe Markdown renderer.
///
/// Supports the common Markdown features plus tables, strikethrough and
/// smart punctuation.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    options: Options,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer {
    /// Creates a renderer with the extension set used for record content.
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_SMART_PUNCTUATION);
        Self { options }
    }

    /// Renders Markdown text to an HTML string.
    pub fn render(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.options);
        let mut output = String::new();
        html::push_html(&mut output, parser);
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_headings_and_emphasis() {
        let renderer = MarkdownRenderer::new();
        let output = renderer.render("# Early Years\n\nA **decisive** season.");
        assert!(output.contains("<h1>Early Years</h1>"));
        assert!(output.contains("<strong>decisive</strong>"));
    }

    #[test]
    fn test_render_tables() {
        let renderer = MarkdownRenderer::new();
        let output = renderer.render("| Season | Goals |\n|--------|-------|\n| 2001 | 14 |");
        assert!(output.contains("<table>"));
        assert!(output.contains("<td>14</td>"));
    }

    #[test]
    fn test_render_empty_input() {
        let renderer = MarkdownRenderer::new();
        assert_eq!(renderer.render(""), "");
    }

    #[test]
    fn test_render_plain_text_becomes_paragraph() {
        let renderer = MarkdownRenderer::new();
        let output = renderer.render("Moved to the academy in 1994.");
        assert!(output.starts_with("<p>"));
        assert!(output.contains("Moved to the academy in 1994."));
    }
}
