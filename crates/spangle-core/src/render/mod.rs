//! Document-tree to render-tree conversion
//!
//! A single depth-first recursive walk with tag-specific substitution
//! rules. The conversion is pure; embedded-content rendering is delegated
//! to the resolver, and the render context is threaded through unchanged.

pub mod node;
pub mod style;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::context::RenderContext;
use crate::embed::{ensure_scheme, EmbedResolver};
use crate::error::{RenderError, RenderResult};
use crate::escape::{revert_custom_escapes, unescape_html};
use crate::tree::{DocElement, DocNode};

use node::{LinkTarget, ListItem, RenderNode, TableCell};

/// Deepest markup nesting the converter follows
pub const MAX_DEPTH: usize = 64;

/// Bare URLs in running text become links
static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://[^\s<>\[\]()]+").unwrap());

/// Parents whose embedded newlines are preprocessor artifacts, not
/// intentional breaks
const NO_SPLIT_PARENTS: [&str; 8] = ["table", "thead", "tbody", "tfoot", "tr", "th", "td", "li"];

/// Contexts where bare URLs must not be rewritten into links
const NO_AUTOLINK_PARENTS: [&str; 3] = ["a", "code", "pre"];

/// Convert a parsed document into render nodes
pub fn convert(
    nodes: &[DocNode],
    ctx: &RenderContext,
    resolver: &mut EmbedResolver,
) -> RenderResult<Vec<RenderNode>> {
    convert_children(nodes, ctx, resolver, None, 0)
}

fn convert_children(
    nodes: &[DocNode],
    ctx: &RenderContext,
    resolver: &mut EmbedResolver,
    parent: Option<&str>,
    depth: usize,
) -> RenderResult<Vec<RenderNode>> {
    if depth > MAX_DEPTH {
        return Err(RenderError::DepthExceeded(MAX_DEPTH));
    }
    let mut out = Vec::new();
    for child in nodes {
        match child {
            DocNode::Text(text) => convert_text(text, ctx, parent, &mut out),
            DocNode::Element(el) => {
                if let Some(rendered) = convert_element(el, ctx, resolver, depth)? {
                    out.push(rendered);
                }
            }
        }
    }
    Ok(out)
}

/// Text-node rule: split embedded newlines into line breaks unless the
/// content is AI-authored or the parent treats newlines as artifacts.
/// Whitespace-only nodes drop, except pure runs of spaces.
fn convert_text(
    text: &str,
    ctx: &RenderContext,
    parent: Option<&str>,
    out: &mut Vec<RenderNode>,
) {
    if text.trim().is_empty() {
        if !text.is_empty() && text.chars().all(|c| c == ' ') {
            out.push(RenderNode::text(text));
        }
        return;
    }

    let suppress_breaks =
        ctx.is_ai_message || parent.is_some_and(|p| NO_SPLIT_PARENTS.contains(&p));
    if text.contains('\n') && !suppress_breaks {
        for (idx, segment) in text.split('\n').enumerate() {
            if idx > 0 {
                out.push(RenderNode::LineBreak);
            }
            if !segment.is_empty() {
                push_text_autolinked(segment, ctx, parent, out);
            }
        }
    } else {
        push_text_autolinked(text, ctx, parent, out);
    }
}

fn push_text_autolinked(
    text: &str,
    ctx: &RenderContext,
    parent: Option<&str>,
    out: &mut Vec<RenderNode>,
) {
    let linkable = !parent.is_some_and(|p| NO_AUTOLINK_PARENTS.contains(&p));
    if !linkable || !URL_RE.is_match(text) {
        out.push(RenderNode::text(text));
        return;
    }
    let mut last = 0;
    for m in URL_RE.find_iter(text) {
        if m.start() > last {
            out.push(RenderNode::text(&text[last..m.start()]));
        }
        let url = m.as_str().to_string();
        out.push(RenderNode::Link {
            target: LinkTarget::External { href: url.clone() },
            color: ctx.link_color.clone(),
            children: vec![RenderNode::text(url)],
        });
        last = m.end();
    }
    if last < text.len() {
        out.push(RenderNode::text(&text[last..]));
    }
}

fn convert_element(
    el: &DocElement,
    ctx: &RenderContext,
    resolver: &mut EmbedResolver,
    depth: usize,
) -> RenderResult<Option<RenderNode>> {
    let children =
        |resolver: &mut EmbedResolver| convert_children(&el.children, ctx, resolver, Some(el.name.as_str()), depth + 1);

    let rendered = match el.name.as_str() {
        "a" => convert_link(el, ctx, resolver, depth)?,
        "code" => RenderNode::Code {
            code: inline_code_text(el),
        },
        "pre" => convert_pre(el),
        // AI text uses em/strong with inverted meaning
        "em" => {
            let children = children(resolver)?;
            if ctx.is_ai_message {
                RenderNode::Strong { children }
            } else {
                RenderNode::Emphasis { children }
            }
        }
        "strong" => {
            let children = children(resolver)?;
            if ctx.is_ai_message {
                RenderNode::Emphasis { children }
            } else {
                RenderNode::Strong { children }
            }
        }
        "b" => RenderNode::Strong {
            children: children(resolver)?,
        },
        "i" => RenderNode::Emphasis {
            children: children(resolver)?,
        },
        "u" | "ins" => RenderNode::Underline {
            children: children(resolver)?,
        },
        "s" | "del" | "strike" => RenderNode::Strikethrough {
            children: children(resolver)?,
        },
        "span" => RenderNode::Styled {
            properties: style::parse_style(el.attr("style").unwrap_or("")),
            children: children(resolver)?,
        },
        "img" => resolver.resolve(
            el.attr("src").unwrap_or(""),
            el.attr("alt").unwrap_or(""),
            ctx,
        ),
        "ul" => convert_list(el, false, ctx, resolver, depth)?,
        "ol" => convert_list(el, true, ctx, resolver, depth)?,
        "table" => convert_table(el, ctx, resolver, depth)?,
        "input" => {
            if el.attr("type") == Some("checkbox") {
                // read-only: checked reflects the source, changes are inert
                RenderNode::Checkbox {
                    checked: el.attr("checked").is_some(),
                }
            } else {
                generic(el, ctx, resolver, depth)?
            }
        }
        "br" => RenderNode::LineBreak,
        "hr" => RenderNode::ThematicBreak,
        "p" => RenderNode::Paragraph {
            children: children(resolver)?,
        },
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => RenderNode::Heading {
            level: el.name.as_bytes()[1] - b'0',
            children: children(resolver)?,
        },
        "blockquote" => RenderNode::Blockquote {
            children: children(resolver)?,
        },
        _ => generic(el, ctx, resolver, depth)?,
    };
    Ok(Some(rendered))
}

fn convert_link(
    el: &DocElement,
    ctx: &RenderContext,
    resolver: &mut EmbedResolver,
    depth: usize,
) -> RenderResult<RenderNode> {
    let href = el.attr("href").unwrap_or("").trim().to_string();
    let mut children = convert_children(&el.children, ctx, resolver, Some("a"), depth + 1)?;
    // link text shows the author's literal characters
    revert_text_escapes(&mut children);

    if el.has_class("mention") {
        let handle = href.rsplit('/').next().unwrap_or("").to_string();
        return Ok(RenderNode::Link {
            target: LinkTarget::Mention { handle },
            color: ctx.link_color.clone(),
            children,
        });
    }
    if href.is_empty() {
        // nothing to point at; pass the element through untouched
        return Ok(RenderNode::Element {
            name: el.name.clone(),
            attrs: el.attrs.clone(),
            style: Vec::new(),
            children,
        });
    }
    let target = if ctx.site.is_internal(&href) {
        LinkTarget::Internal {
            path: ctx.site.internal_path(&href).unwrap_or(href),
        }
    } else {
        LinkTarget::External {
            href: ensure_scheme(&href),
        }
    };
    Ok(RenderNode::Link {
        target,
        color: ctx.link_color.clone(),
        children,
    })
}

fn revert_text_escapes(nodes: &mut [RenderNode]) {
    for node in nodes.iter_mut() {
        if let RenderNode::Text { text } = node {
            *text = revert_custom_escapes(text);
        } else if let Some(children) = node.children_mut() {
            revert_text_escapes(children);
        }
    }
}

/// Inline code: `<br>` children become literal newlines, and both the
/// pipeline's HTML escaping and its custom backslash escapes are reversed
fn inline_code_text(el: &DocElement) -> String {
    let mut code = String::new();
    collect_code_text(el, &mut code);
    revert_custom_escapes(&unescape_html(&code))
}

fn collect_code_text(el: &DocElement, out: &mut String) {
    for child in &el.children {
        match child {
            DocNode::Text(text) => out.push_str(text),
            DocNode::Element(e) if e.name == "br" => out.push('\n'),
            DocNode::Element(e) => collect_code_text(e, out),
        }
    }
}

fn convert_pre(el: &DocElement) -> RenderNode {
    // fenced blocks parse as <pre><code class="language-x">
    let code_el = el.children.iter().find_map(|child| match child {
        DocNode::Element(e) if e.name == "code" => Some(e),
        _ => None,
    });
    let source = code_el.unwrap_or(el);
    let lang = source.attr("class").and_then(|classes| {
        classes
            .split_whitespace()
            .find_map(|class| class.strip_prefix("language-"))
            .map(String::from)
    });
    let mut code = String::new();
    collect_code_text(source, &mut code);
    if code.ends_with('\n') {
        code.pop();
    }
    RenderNode::CodeBlock {
        lang,
        code: revert_custom_escapes(&unescape_html(&code)),
    }
}

fn convert_list(
    el: &DocElement,
    ordered: bool,
    ctx: &RenderContext,
    resolver: &mut EmbedResolver,
    depth: usize,
) -> RenderResult<RenderNode> {
    let start = el.attr("start").and_then(|s| s.parse().ok());
    let mut items = Vec::new();
    for child in elements(&el.children) {
        if child.name == "li" {
            items.push(ListItem {
                marker_color: ctx.marker_color.clone(),
                children: convert_children(&child.children, ctx, resolver, Some("li"), depth + 1)?,
            });
        }
    }
    Ok(RenderNode::List {
        ordered,
        start,
        items,
    })
}

fn convert_table(
    el: &DocElement,
    ctx: &RenderContext,
    resolver: &mut EmbedResolver,
    depth: usize,
) -> RenderResult<RenderNode> {
    let mut headers: Vec<TableCell> = Vec::new();
    let mut rows: Vec<Vec<TableCell>> = Vec::new();
    for section in elements(&el.children) {
        match section.name.as_str() {
            "thead" => {
                for tr in elements(&section.children).filter(|e| e.name == "tr") {
                    let cells = convert_row(tr, ctx, resolver, depth)?;
                    if headers.is_empty() {
                        headers = cells;
                    } else {
                        rows.push(cells);
                    }
                }
            }
            "tbody" | "tfoot" => {
                for tr in elements(&section.children).filter(|e| e.name == "tr") {
                    rows.push(convert_row(tr, ctx, resolver, depth)?);
                }
            }
            "tr" => rows.push(convert_row(section, ctx, resolver, depth)?),
            _ => {}
        }
    }
    Ok(RenderNode::Table {
        headers,
        rows,
        scrollable: true,
    })
}

fn convert_row(
    tr: &DocElement,
    ctx: &RenderContext,
    resolver: &mut EmbedResolver,
    depth: usize,
) -> RenderResult<Vec<TableCell>> {
    let mut cells = Vec::new();
    for cell in elements(&tr.children) {
        if cell.name == "th" || cell.name == "td" {
            cells.push(TableCell {
                children: convert_children(
                    &cell.children,
                    ctx,
                    resolver,
                    Some(cell.name.as_str()),
                    depth + 1,
                )?,
            });
        }
    }
    Ok(cells)
}

fn generic(
    el: &DocElement,
    ctx: &RenderContext,
    resolver: &mut EmbedResolver,
    depth: usize,
) -> RenderResult<RenderNode> {
    let style = style::parse_style(el.attr("style").unwrap_or(""));
    let attrs = el
        .attrs
        .iter()
        .filter(|(k, _)| k != "style")
        .cloned()
        .collect();
    let children = convert_children(&el.children, ctx, resolver, Some(el.name.as_str()), depth + 1)?;
    Ok(RenderNode::Element {
        name: el.name.clone(),
        attrs,
        style,
        children,
    })
}

fn elements(nodes: &[DocNode]) -> impl Iterator<Item = &DocElement> {
    nodes.iter().filter_map(|node| match node {
        DocNode::Element(el) => Some(el),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SiteConfig;
    use crate::render::node::EmbedNode;
    use crate::tree::parse_fragment;

    fn conv(html: &str, ctx: &RenderContext) -> Vec<RenderNode> {
        let nodes = parse_fragment(html);
        let mut resolver = EmbedResolver::new(SiteConfig::default());
        convert(&nodes, ctx, &mut resolver).expect("convert")
    }

    fn para_children(nodes: Vec<RenderNode>) -> Vec<RenderNode> {
        for node in nodes {
            if let RenderNode::Paragraph { children } = node {
                return children;
            }
        }
        panic!("no paragraph");
    }

    #[test]
    fn test_em_strong_swap_for_ai() {
        let human = RenderContext::default();
        let mut ai = RenderContext::default();
        ai.is_ai_message = true;

        let from_human = para_children(conv("<p><em>x</em></p>", &human));
        assert!(matches!(from_human[0], RenderNode::Emphasis { .. }));
        let from_ai = para_children(conv("<p><em>x</em></p>", &ai));
        assert!(matches!(from_ai[0], RenderNode::Strong { .. }));

        let from_human = para_children(conv("<p><strong>x</strong></p>", &human));
        assert!(matches!(from_human[0], RenderNode::Strong { .. }));
        let from_ai = para_children(conv("<p><strong>x</strong></p>", &ai));
        assert!(matches!(from_ai[0], RenderNode::Emphasis { .. }));
    }

    #[test]
    fn test_newline_splitting_outside_structural_parents() {
        let ctx = RenderContext::default();
        let children = para_children(conv("<p>a\nb</p>", &ctx));
        assert_eq!(
            children,
            vec![
                RenderNode::text("a"),
                RenderNode::LineBreak,
                RenderNode::text("b"),
            ]
        );
    }

    #[test]
    fn test_ai_newlines_render_as_is() {
        let mut ctx = RenderContext::default();
        ctx.is_ai_message = true;
        let children = para_children(conv("<p>a\nb</p>", &ctx));
        assert_eq!(children, vec![RenderNode::text("a\nb")]);
    }

    #[test]
    fn test_no_split_inside_table_cells_or_list_items() {
        let ctx = RenderContext::default();
        let nodes = conv(
            "<table><tbody><tr><td>a\nb</td></tr></tbody></table>",
            &ctx,
        );
        let RenderNode::Table { rows, .. } = &nodes[0] else {
            panic!("expected table");
        };
        assert_eq!(rows[0][0].children, vec![RenderNode::text("a\nb")]);

        let nodes = conv("<ul><li>a\nb</li></ul>", &ctx);
        let RenderNode::List { items, .. } = &nodes[0] else {
            panic!("expected list");
        };
        assert_eq!(items[0].children, vec![RenderNode::text("a\nb")]);
        assert_eq!(items[0].marker_color, ctx.marker_color);
    }

    #[test]
    fn test_space_runs_survive_other_whitespace_drops() {
        let ctx = RenderContext::default();
        let children = para_children(conv("<p>a<span>  </span>b</p>", &ctx));
        let RenderNode::Styled { children: inner, .. } = &children[1] else {
            panic!("expected styled span");
        };
        assert_eq!(inner, &vec![RenderNode::text("  ")]);
    }

    #[test]
    fn test_link_classification() {
        let ctx = RenderContext::default();
        let children = para_children(conv(r#"<p><a href="/missions/1">go</a></p>"#, &ctx));
        assert!(matches!(
            &children[0],
            RenderNode::Link {
                target: LinkTarget::Internal { path },
                ..
            } if path == "/missions/1"
        ));

        let children = para_children(conv(r#"<p><a href="example.com/x">x</a></p>"#, &ctx));
        assert!(matches!(
            &children[0],
            RenderNode::Link {
                target: LinkTarget::External { href },
                ..
            } if href == "http://example.com/x"
        ));

        let children = para_children(conv(
            r#"<p><a class="mention" href="/users/abc">@abc</a></p>"#,
            &ctx,
        ));
        assert!(matches!(
            &children[0],
            RenderNode::Link {
                target: LinkTarget::Mention { handle },
                ..
            } if handle == "abc"
        ));
    }

    #[test]
    fn test_bare_urls_autolink_outside_code() {
        let ctx = RenderContext::default();
        let children = para_children(conv("<p>see https://example.com now</p>", &ctx));
        assert_eq!(children.len(), 3);
        assert!(matches!(children[1], RenderNode::Link { .. }));

        let nodes = conv("<code>https://example.com</code>", &ctx);
        assert!(matches!(nodes[0], RenderNode::Code { .. }));
    }

    #[test]
    fn test_inline_code_unescapes() {
        let ctx = RenderContext::default();
        let nodes = conv("<code>a \\- b<br>c</code>", &ctx);
        let RenderNode::Code { code } = &nodes[0] else {
            panic!("expected code");
        };
        assert_eq!(code, "a - b\nc");
    }

    #[test]
    fn test_code_block_language() {
        let ctx = RenderContext::default();
        let nodes = conv(
            "<pre><code class=\"language-rust\">fn main() {}\n</code></pre>",
            &ctx,
        );
        assert_eq!(
            nodes[0],
            RenderNode::CodeBlock {
                lang: Some("rust".to_string()),
                code: "fn main() {}".to_string(),
            }
        );
    }

    #[test]
    fn test_checkbox_is_inert_and_reflects_source() {
        let ctx = RenderContext::default();
        let nodes = conv(
            "<ul><li><input type=\"checkbox\" checked=\"\" disabled=\"\">done</li></ul>",
            &ctx,
        );
        let RenderNode::List { items, .. } = &nodes[0] else {
            panic!("expected list");
        };
        assert!(matches!(
            items[0].children[0],
            RenderNode::Checkbox { checked: true }
        ));
    }

    #[test]
    fn test_table_is_scrollable() {
        let ctx = RenderContext::default();
        let nodes = conv(
            "<table><thead><tr><th>h</th></tr></thead><tbody><tr><td>v</td></tr></tbody></table>",
            &ctx,
        );
        let RenderNode::Table {
            headers,
            rows,
            scrollable,
        } = &nodes[0]
        else {
            panic!("expected table");
        };
        assert!(*scrollable);
        assert_eq!(headers.len(), 1);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_img_routes_through_resolver() {
        let ctx = RenderContext::default();
        let nodes = conv("<img src=\"\" alt=\"\">", &ctx);
        assert!(matches!(
            nodes[0],
            RenderNode::Embed {
                embed: EmbedNode::Broken
            }
        ));
    }

    #[test]
    fn test_generic_passthrough_normalizes_style() {
        let ctx = RenderContext::default();
        let nodes = conv(
            "<widget class=\"x\" style=\"border-top:1px\">inner</widget>",
            &ctx,
        );
        let RenderNode::Element {
            name,
            attrs,
            style,
            children,
        } = &nodes[0]
        else {
            panic!("expected element");
        };
        assert_eq!(name, "widget");
        assert_eq!(attrs, &vec![("class".to_string(), "x".to_string())]);
        assert_eq!(
            style,
            &vec![("borderTop".to_string(), "1px".to_string())]
        );
        assert_eq!(children, &vec![RenderNode::text("inner")]);
    }

    #[test]
    fn test_depth_limit() {
        let mut inner = DocNode::Text("deep".to_string());
        for _ in 0..(MAX_DEPTH + 2) {
            let mut el = DocElement::new("span");
            el.children = vec![inner];
            inner = DocNode::Element(el);
        }
        let ctx = RenderContext::default();
        let mut resolver = EmbedResolver::new(SiteConfig::default());
        let result = convert(&[inner], &ctx, &mut resolver);
        assert!(matches!(result, Err(RenderError::DepthExceeded(_))));
    }
}
