//! Plain text extraction from article markup.
//!
//! Joomla stores article bodies as HTML fragments. The generator only needs
//! the readable text, so tags are dropped, non-visible elements are skipped
//! and whitespace is collapsed.
//!
//! # Example
//!
//! ```rust
//! use metagen_core::clean_html;
//!
//! assert_eq!(clean_html(Some("<p>Rome is a <b>city</b>.</p>")), "Rome is a city.");
//! assert_eq!(clean_html(None), "");
//! ```

use ego_tree::iter::Edge;
use scraper::{Html, Node};

use crate::record::ContentRecord;

/// Elements whose text is never shown to a reader.
const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Elements that separate words when their tags are removed.
const BLOCK_ELEMENTS: [&str; 18] = [
    "p",
    "div",
    "br",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "li",
    "blockquote",
    "pre",
    "td",
    "th",
    "tr",
    "section",
    "article",
    "hr",
];

/// Source of cleaned body text for a record.
///
/// The batch runner goes through this trait so the extraction step can be
/// observed or replaced.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, record: &ContentRecord) -> String;
}

/// Default extractor built on [`body_text`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlTextExtractor;

impl TextExtractor for HtmlTextExtractor {
    fn extract(&self, record: &ContentRecord) -> String {
        body_text(record)
    }
}

/// Converts markup into trimmed plain text.
///
/// Never fails: html5ever recovers from malformed input, so broken markup
/// yields whatever text could be recovered.
pub fn clean_html(html: Option<&str>) -> String {
    let html = match html {
        Some(h) if !h.trim().is_empty() => h,
        _ => return String::new(),
    };

    let fragment = Html::parse_fragment(html);
    let mut output = String::with_capacity(html.len() / 2);

    for edge in fragment.root_element().traverse() {
        match edge {
            Edge::Open(node) => match node.value() {
                Node::Text(text) => {
                    let hidden = node.ancestors().any(|ancestor| {
                        ancestor
                            .value()
                            .as_element()
                            .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
                    });
                    if !hidden {
                        output.push_str(text);
                    }
                }
                Node::Element(el) if BLOCK_ELEMENTS.contains(&el.name()) => output.push(' '),
                _ => {}
            },
            // Text following a closed block must not run into its last word.
            Edge::Close(node) => {
                if node.value().as_element().is_some_and(|el| BLOCK_ELEMENTS.contains(&el.name())) {
                    output.push(' ');
                }
            }
        }
    }

    collapse_whitespace(&output)
}

/// Picks `fulltext`, falling back to `introtext` when it is blank, and cleans it.
pub fn body_text(record: &ContentRecord) -> String {
    let source = match record.fulltext.as_deref() {
        Some(full) if !full.trim().is_empty() => Some(full),
        _ => record.introtext.as_deref(),
    };
    clean_html(source)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
