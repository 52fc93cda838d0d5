//! Plain-text extraction from HTML pages.

use scraper::{Html, Node};

/// Elements whose subtrees carry chrome rather than content.
const SKIP_TAGS: [&str; 5] = ["script", "style", "nav", "header", "footer"];

/// Strip a page down to readable text for model extraction.
///
/// Boilerplate subtrees are dropped entirely, every text fragment is trimmed,
/// blank lines are removed, and the result is cut to `max_chars` characters
/// (with a "..." marker when truncation happened).
pub fn extract_page_text(html: &str, max_chars: usize) -> String {
    let document = Html::parse_document(html);
    let mut lines = Vec::new();
    visit(document.tree.root(), &mut lines);
    truncate_chars(&lines.join("\n"), max_chars)
}

fn visit(node: ego_tree::NodeRef<'_, Node>, lines: &mut Vec<String>) {
    for child in node.children() {
        match child.value() {
            Node::Element(el) if SKIP_TAGS.contains(&el.name()) => continue,
            Node::Text(text) => {
                for line in text.lines() {
                    let line = line.trim();
                    if !line.is_empty() {
                        lines.push(line.to_string());
                    }
                }
            }
            _ => visit(child, lines),
        }
    }
}

/// Character-based truncation (page text is routinely non-ASCII).
fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}
