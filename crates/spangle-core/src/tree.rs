//! Parsed document tree
//!
//! The HTML produced by the Markdown pass is rebuilt as a plain tree of
//! typed nodes. Both the mention expander and the render-tree converter
//! walk this representation, which keeps the pipeline independent of any
//! host DOM.

use ego_tree::NodeRef;
use scraper::{Html, Node};

/// A node of the parsed document
#[derive(Debug, Clone, PartialEq)]
pub enum DocNode {
    Element(DocElement),
    Text(String),
}

/// An element node: tag name, attributes and ordered children
#[derive(Debug, Clone, PartialEq)]
pub struct DocElement {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<DocNode>,
}

impl DocElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// First value of the named attribute
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|v| v.split_whitespace().any(|c| c == class))
    }
}

/// Parse an HTML fragment into document nodes
///
/// Entity references are decoded into text during parsing. Comments and
/// doctypes are dropped; unknown tags come through as ordinary elements.
pub fn parse_fragment(html: &str) -> Vec<DocNode> {
    let doc = Html::parse_fragment(html);
    let mut out = Vec::new();
    for child in doc.tree.root().children() {
        match child.value() {
            // the fragment parser wraps content in a synthetic <html> element
            Node::Element(el) if el.name() == "html" => {
                for inner in child.children() {
                    if let Some(node) = build(inner) {
                        out.push(node);
                    }
                }
            }
            _ => {
                if let Some(node) = build(child) {
                    out.push(node);
                }
            }
        }
    }
    out
}

fn build(node: NodeRef<'_, Node>) -> Option<DocNode> {
    match node.value() {
        Node::Text(text) => Some(DocNode::Text((**text).to_string())),
        Node::Element(el) => {
            let mut element = DocElement::new(el.name());
            element.attrs = el
                .attrs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            element.children = node.children().filter_map(build).collect();
            Some(DocNode::Element(element))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_fragment() {
        let nodes = parse_fragment("<p>hi <b>there</b></p>");
        assert_eq!(nodes.len(), 1);
        let DocNode::Element(p) = &nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(p.name, "p");
        assert_eq!(p.children.len(), 2);
        assert_eq!(p.children[0], DocNode::Text("hi ".to_string()));
    }

    #[test]
    fn test_attributes_and_classes() {
        let nodes = parse_fragment(r#"<a class="mention bright" href="/users/abc">@abc</a>"#);
        let DocNode::Element(a) = &nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(a.attr("href"), Some("/users/abc"));
        assert!(a.has_class("mention"));
        assert!(!a.has_class("ment"));
    }

    #[test]
    fn test_entities_decode_to_text() {
        let nodes = parse_fragment("<p>&lt;T&gt;</p>");
        let DocNode::Element(p) = &nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(p.children[0], DocNode::Text("<T>".to_string()));
    }

    #[test]
    fn test_unknown_tags_pass_through() {
        let nodes = parse_fragment("<widget data-x=\"1\">inner</widget>");
        let DocNode::Element(el) = &nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(el.name, "widget");
        assert_eq!(el.attr("data-x"), Some("1"));
    }
}
