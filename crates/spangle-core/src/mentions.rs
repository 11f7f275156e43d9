//! Mention expansion over the parsed document tree
//!
//! Rewrites `@handle` tokens in text nodes into profile links. This walks
//! the same tree representation the main conversion uses instead of
//! re-running regexes over serialized markup, so tag attributes and
//! already-anchored text can never match.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::tree::{DocElement, DocNode};

/// A handle is 3+ word characters
static MENTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@([A-Za-z0-9_]{3,})").unwrap());

/// Full-width look-alike, normalized back to ASCII after substitution
const FULLWIDTH_AT: char = '\u{ff20}';

/// Contexts mention substitution must not enter
const SKIP_TAGS: [&str; 3] = ["a", "code", "pre"];

/// Expand mentions in place, and collapse the message's first literal
/// newline into a line-break element
pub fn expand(nodes: &mut Vec<DocNode>) {
    collapse_first_newline(nodes);
    walk(nodes);
}

fn walk(nodes: &mut Vec<DocNode>) {
    let mut i = 0;
    while i < nodes.len() {
        match &mut nodes[i] {
            DocNode::Element(el) => {
                if !SKIP_TAGS.contains(&el.name.as_str()) {
                    walk(&mut el.children);
                }
                i += 1;
            }
            DocNode::Text(text) => {
                if text.contains('@') {
                    let replacement = expand_text(text);
                    let advance = replacement.len().max(1);
                    nodes.splice(i..=i, replacement);
                    i += advance;
                } else if text.contains(FULLWIDTH_AT) {
                    *text = text.replace(FULLWIDTH_AT, "@");
                    i += 1;
                } else {
                    i += 1;
                }
            }
        }
    }
}

fn expand_text(text: &str) -> Vec<DocNode> {
    let mut out = Vec::new();
    let mut cursor = 0;
    for caps in MENTION_RE.captures_iter(text) {
        let m = caps.get(0).expect("whole match");
        // a mention cannot continue a longer word (e.g. an email local part)
        let boundary = text[..m.start()]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_ascii_alphanumeric() && c != '_');
        if !boundary {
            continue;
        }
        push_text(&mut out, &text[cursor..m.start()]);
        let handle = caps.get(1).expect("handle group").as_str();
        out.push(mention_anchor(handle));
        cursor = m.end();
    }
    push_text(&mut out, &text[cursor..]);
    out
}

fn push_text(out: &mut Vec<DocNode>, text: &str) {
    if !text.is_empty() {
        out.push(DocNode::Text(text.replace(FULLWIDTH_AT, "@")));
    }
}

fn mention_anchor(handle: &str) -> DocNode {
    let mut anchor = DocElement::new("a");
    anchor.attrs = vec![
        ("class".to_string(), "mention".to_string()),
        ("href".to_string(), format!("/users/{handle}")),
    ];
    anchor.children = vec![DocNode::Text(format!("@{handle}"))];
    DocNode::Element(anchor)
}

/// Elements whose text keeps its newlines verbatim; a break element in
/// these contexts would be a formatting artifact, not author intent
const NO_COLLAPSE_TAGS: [&str; 10] = [
    "pre", "code", "table", "thead", "tbody", "tfoot", "tr", "th", "td", "li",
];

/// Turn the first literal newline of the message into a `<br>` element
///
/// Structural whitespace-only nodes between blocks are skipped, as are
/// code, table and list-item contexts; only a newline embedded in real
/// running text counts.
fn collapse_first_newline(nodes: &mut Vec<DocNode>) -> bool {
    let mut i = 0;
    while i < nodes.len() {
        match &mut nodes[i] {
            DocNode::Element(el) => {
                if !NO_COLLAPSE_TAGS.contains(&el.name.as_str())
                    && collapse_first_newline(&mut el.children)
                {
                    return true;
                }
                i += 1;
            }
            DocNode::Text(text) => {
                if text.trim().is_empty() {
                    i += 1;
                    continue;
                }
                if let Some(pos) = text.find('\n') {
                    let before = text[..pos].to_string();
                    let after = text[pos + 1..].to_string();
                    let mut replacement = Vec::new();
                    if !before.is_empty() {
                        replacement.push(DocNode::Text(before));
                    }
                    replacement.push(DocNode::Element(DocElement::new("br")));
                    if !after.is_empty() {
                        replacement.push(DocNode::Text(after));
                    }
                    nodes.splice(i..=i, replacement);
                    return true;
                }
                i += 1;
            }
        }
    }
    false
}
