//! Markdown to HTML rendering for the message body.

use pulldown_cmark::{Options, Parser, html};

use crate::config::MarkdownConfig;
use crate::error::Result;

/// Turns a note's markdown source into formatted (HTML) text.
pub trait MarkdownRenderer {
    fn render(&self, source: &str) -> Result<String>;
}

/// CommonMark renderer with GitHub-style extensions.
#[derive(Debug, Clone, Copy)]
pub struct CommonMarkRenderer {
    options: Options,
}

impl CommonMarkRenderer {
    pub fn new(config: &MarkdownConfig) -> Self {
        let mut options = Options::empty();
        options.set(Options::ENABLE_TABLES, config.tables);
        options.set(Options::ENABLE_STRIKETHROUGH, config.strikethrough);
        options.set(Options::ENABLE_TASKLISTS, config.tasklists);
        options.set(Options::ENABLE_FOOTNOTES, config.footnotes);
        Self { options }
    }
}

impl Default for CommonMarkRenderer {
    fn default() -> Self {
        Self::new(&MarkdownConfig::default())
    }
}

impl MarkdownRenderer for CommonMarkRenderer {
    fn render(&self, source: &str) -> Result<String> {
        let parser = Parser::new_ext(source, self.options);
        let mut html_output = String::with_capacity(source.len() * 3 / 2);
        html::push_html(&mut html_output, parser);
        Ok(html_output)
    }
}

/// Convert HTML content to readable plain text.
pub fn html_to_text(html: &str, width: usize) -> String {
    html2text::from_read(html.as_bytes(), width)
}

/// Check if a file path points to a markdown file.
pub fn is_markdown_path(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let lower = ext.to_lowercase();
            lower == "md" || lower == "markdown" || lower == "mdown"
        })
        .unwrap_or(false)
}
