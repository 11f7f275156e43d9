//! Typed render-tree nodes
//!
//! The converter's output: a host-agnostic tree the view layer draws
//! directly. Serializable so front-ends and tools can consume it as JSON.

use serde::{Deserialize, Serialize};

/// Where a link points after classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LinkTarget {
    /// Client-side navigation within the application
    Internal { path: String },
    /// Regular external navigation
    External { href: String },
    /// Profile link produced by mention expansion
    Mention { handle: String },
}

/// Embedded component substituted for an image node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EmbedNode {
    /// Reference into the application itself; a path rewrite, no fetch
    InternalLink { path: String, label: String },
    /// Click-to-play placeholder; the player mounts on interaction only
    YouTube {
        video_id: String,
        url: String,
        /// Last playback position recorded for this content, if any
        resume_at: Option<f64>,
        started: bool,
    },
    /// Video hosted by the platform itself
    PlatformVideo { path: String },
    /// Plain image; `secret` gates it behind a reveal overlay
    Image {
        src: String,
        alt: String,
        secret: bool,
    },
    /// Image the host reported as failed to load, degraded to a link
    LinkFallback { href: String, label: String },
    /// Nothing classified and no usable href could be formed
    Broken,
}

/// A list item, re-rendered with the themed marker color
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    pub marker_color: String,
    pub children: Vec<RenderNode>,
}

/// A table cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    pub children: Vec<RenderNode>,
}

/// A node of the rendered document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderNode {
    Text {
        text: String,
    },
    LineBreak,
    ThematicBreak,
    Paragraph {
        children: Vec<RenderNode>,
    },
    Heading {
        level: u8,
        children: Vec<RenderNode>,
    },
    Strong {
        children: Vec<RenderNode>,
    },
    Emphasis {
        children: Vec<RenderNode>,
    },
    Underline {
        children: Vec<RenderNode>,
    },
    Strikethrough {
        children: Vec<RenderNode>,
    },
    /// Inline span carrying parsed style properties (color, fontSize, ...)
    Styled {
        properties: Vec<(String, String)>,
        children: Vec<RenderNode>,
    },
    Code {
        code: String,
    },
    CodeBlock {
        lang: Option<String>,
        code: String,
    },
    Link {
        target: LinkTarget,
        color: String,
        children: Vec<RenderNode>,
    },
    List {
        ordered: bool,
        start: Option<u64>,
        items: Vec<ListItem>,
    },
    Blockquote {
        children: Vec<RenderNode>,
    },
    /// Rendered inside a horizontally scrollable container
    Table {
        headers: Vec<TableCell>,
        rows: Vec<Vec<TableCell>>,
        scrollable: bool,
    },
    /// Read-only: checked state reflects the source, changes are inert
    Checkbox {
        checked: bool,
    },
    /// Content hidden until the reader reveals it
    Spoiler {
        children: Vec<RenderNode>,
    },
    Embed {
        embed: EmbedNode,
    },
    /// Generic pass-through for tags without a dedicated rule
    Element {
        name: String,
        attrs: Vec<(String, String)>,
        style: Vec<(String, String)>,
        children: Vec<RenderNode>,
    },
}

impl RenderNode {
    pub fn text(text: impl Into<String>) -> Self {
        RenderNode::Text { text: text.into() }
    }

    /// Mutable access to this node's direct children, if it has any
    pub fn children_mut(&mut self) -> Option<&mut Vec<RenderNode>> {
        match self {
            RenderNode::Paragraph { children }
            | RenderNode::Heading { children, .. }
            | RenderNode::Strong { children }
            | RenderNode::Emphasis { children }
            | RenderNode::Underline { children }
            | RenderNode::Strikethrough { children }
            | RenderNode::Styled { children, .. }
            | RenderNode::Link { children, .. }
            | RenderNode::Blockquote { children }
            | RenderNode::Spoiler { children }
            | RenderNode::Element { children, .. } => Some(children),
            _ => None,
        }
    }

    /// Visible text of this subtree, line breaks included
    pub fn plain_text(&self) -> String {
        fn collect(node: &RenderNode, out: &mut String) {
            match node {
                RenderNode::Text { text } => out.push_str(text),
                RenderNode::LineBreak => out.push('\n'),
                RenderNode::ThematicBreak => {}
                RenderNode::Code { code } | RenderNode::CodeBlock { code, .. } => {
                    out.push_str(code);
                }
                RenderNode::Checkbox { checked } => {
                    out.push_str(if *checked { "[x]" } else { "[ ]" });
                }
                RenderNode::Embed { embed } => match embed {
                    EmbedNode::Broken => out.push_str("![]()"),
                    EmbedNode::InternalLink { label, .. }
                    | EmbedNode::LinkFallback { label, .. } => out.push_str(label),
                    _ => {}
                },
                RenderNode::List { items, .. } => {
                    for item in items {
                        for child in &item.children {
                            collect(child, out);
                        }
                        out.push('\n');
                    }
                }
                RenderNode::Table { headers, rows, .. } => {
                    for cell in headers {
                        for child in &cell.children {
                            collect(child, out);
                        }
                        out.push(' ');
                    }
                    out.push('\n');
                    for row in rows {
                        for cell in row {
                            for child in &cell.children {
                                collect(child, out);
                            }
                            out.push(' ');
                        }
                        out.push('\n');
                    }
                }
                RenderNode::Paragraph { children }
                | RenderNode::Heading { children, .. }
                | RenderNode::Strong { children }
                | RenderNode::Emphasis { children }
                | RenderNode::Underline { children }
                | RenderNode::Strikethrough { children }
                | RenderNode::Styled { children, .. }
                | RenderNode::Link { children, .. }
                | RenderNode::Blockquote { children }
                | RenderNode::Spoiler { children }
                | RenderNode::Element { children, .. } => {
                    for child in children {
                        collect(child, out);
                    }
                }
            }
        }
        let mut out = String::new();
        collect(self, &mut out);
        out
    }
}

/// Visible text of a whole node sequence
pub fn plain_text(nodes: &[RenderNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        out.push_str(&node.plain_text());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_walks_structure() {
        let node = RenderNode::Paragraph {
            children: vec![
                RenderNode::text("a "),
                RenderNode::Strong {
                    children: vec![RenderNode::text("b")],
                },
                RenderNode::LineBreak,
                RenderNode::text("c"),
            ],
        };
        assert_eq!(node.plain_text(), "a b\nc");
    }

    #[test]
    fn test_broken_embed_is_literal_placeholder() {
        let node = RenderNode::Embed {
            embed: EmbedNode::Broken,
        };
        assert_eq!(node.plain_text(), "![]()");
    }

    #[test]
    fn test_serde_round_trip() {
        let node = RenderNode::Link {
            target: LinkTarget::Mention {
                handle: "abc".to_string(),
            },
            color: "#2d6ccb".to_string(),
            children: vec![RenderNode::text("@abc")],
        };
        let json = serde_json::to_string(&node).expect("serialize");
        let back: RenderNode = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(node, back);
    }
}
