use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

/// NewsAPI cuts `content` short and appends e.g. `… [+2311 chars]`
static TRUNCATION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*…?\s*\[\+\d+ chars\]\s*$").unwrap());

/// Extract plain text from HTML content, preserving some structure
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_fragment(html);
    let mut text = String::new();

    for node in document.root_element().descendants() {
        if let Some(text_node) = node.value().as_text() {
            text.push_str(text_node);
        }
        // Add space after block elements to preserve word boundaries
        if let Some(element) = node.value().as_element() {
            match element.name() {
                "p" | "br" | "div" | "li" => text.push(' '),
                _ => {}
            }
        }
    }

    // Collapse whitespace and trim
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Plain text without the provider's truncation marker; `None` when nothing is left
pub fn clean_text(raw: Option<&str>) -> Option<String> {
    let raw = raw?;
    let without_marker = TRUNCATION_MARKER.replace(raw, "");
    let text = if without_marker.contains('<') {
        html_to_text(&without_marker)
    } else {
        without_marker.split_whitespace().collect::<Vec<_>>().join(" ")
    };

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
