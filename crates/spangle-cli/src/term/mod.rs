//! ANSI rendering of the render-node tree
//!
//! The CLI's view layer: walks the typed nodes the core produced and draws
//! them as styled terminal text. Layout happens on span lines first so
//! wrapping can respect display width, then everything is painted once.

pub mod wrap;

use crossterm::style::{Attribute, Color, Stylize};
use spangle_core::render::node::{EmbedNode, LinkTarget, RenderNode, TableCell};
use spangle_core::Rendered;
use unicode_width::UnicodeWidthStr;

use crate::theme::Theme;

/// Style applied to a run of text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpanStyle {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    pub dim: bool,
}

/// A styled run of text
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub text: String,
    pub style: SpanStyle,
}

impl Span {
    pub fn new(text: impl Into<String>, style: SpanStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    pub fn width(&self) -> usize {
        UnicodeWidthStr::width(self.text.as_str())
    }
}

pub type Line = Vec<Span>;

/// Render a tree to ANSI-styled text
pub fn render(rendered: &Rendered, theme: &Theme, width: usize, reveal: bool) -> String {
    let lines = layout(&rendered.nodes, theme, reveal);
    let lines: Vec<Line> = if width > 0 {
        lines
            .iter()
            .flat_map(|line| wrap::wrap_spans(line, width))
            .collect()
    } else {
        lines
    };
    paint(&lines)
}

/// Lay a tree out as logical span lines, unwrapped
pub fn layout(nodes: &[RenderNode], theme: &Theme, reveal: bool) -> Vec<Line> {
    let mut writer = Writer {
        theme,
        reveal,
        lines: Vec::new(),
        current: Vec::new(),
    };
    let base = SpanStyle {
        fg: Some(theme.text_color),
        ..SpanStyle::default()
    };
    for node in nodes {
        writer.walk(node, &base);
    }
    writer.finish()
}

fn paint(lines: &[Line]) -> String {
    let mut out = String::new();
    for line in lines {
        for span in line {
            out.push_str(&paint_span(span));
        }
        out.push('\n');
    }
    out
}

fn paint_span(span: &Span) -> String {
    if span.style == SpanStyle::default() {
        return span.text.clone();
    }
    let mut styled = span.text.clone().stylize();
    if let Some(fg) = span.style.fg {
        styled = styled.with(fg);
    }
    if let Some(bg) = span.style.bg {
        styled = styled.on(bg);
    }
    if span.style.bold {
        styled = styled.attribute(Attribute::Bold);
    }
    if span.style.italic {
        styled = styled.attribute(Attribute::Italic);
    }
    if span.style.underline {
        styled = styled.attribute(Attribute::Underlined);
    }
    if span.style.strike {
        styled = styled.attribute(Attribute::CrossedOut);
    }
    if span.style.dim {
        styled = styled.attribute(Attribute::Dim);
    }
    styled.to_string()
}

struct Writer<'a> {
    theme: &'a Theme,
    reveal: bool,
    lines: Vec<Line>,
    current: Line,
}

impl Writer<'_> {
    fn push(&mut self, text: &str, style: &SpanStyle) {
        if !text.is_empty() {
            self.current.push(Span::new(text, style.clone()));
        }
    }

    fn newline(&mut self) {
        self.lines.push(std::mem::take(&mut self.current));
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.newline();
        }
    }

    /// End a block element: flush and leave a single blank line
    fn end_block(&mut self) {
        self.flush();
        if !matches!(self.lines.last(), Some(line) if line.is_empty()) {
            self.lines.push(Vec::new());
        }
    }

    fn finish(mut self) -> Vec<Line> {
        self.flush();
        while matches!(self.lines.last(), Some(line) if line.is_empty()) {
            self.lines.pop();
        }
        self.lines
    }

    fn dim(&self) -> SpanStyle {
        SpanStyle {
            fg: Some(self.theme.dim_color),
            ..SpanStyle::default()
        }
    }

    fn walk(&mut self, node: &RenderNode, style: &SpanStyle) {
        match node {
            RenderNode::Text { text } => {
                for (idx, segment) in text.split('\n').enumerate() {
                    if idx > 0 {
                        self.newline();
                    }
                    self.push(segment, style);
                }
            }
            RenderNode::LineBreak => self.newline(),
            RenderNode::ThematicBreak => {
                self.flush();
                self.push(&"─".repeat(24), &self.dim());
                self.end_block();
            }
            RenderNode::Paragraph { children } => {
                self.flush();
                for child in children {
                    self.walk(child, style);
                }
                self.end_block();
            }
            RenderNode::Heading { children, .. } => {
                self.flush();
                let heading = SpanStyle {
                    fg: Some(self.theme.heading_color),
                    bold: true,
                    ..SpanStyle::default()
                };
                for child in children {
                    self.walk(child, &heading);
                }
                self.end_block();
            }
            RenderNode::Strong { children } => {
                let style = SpanStyle {
                    bold: true,
                    ..style.clone()
                };
                for child in children {
                    self.walk(child, &style);
                }
            }
            RenderNode::Emphasis { children } => {
                let style = SpanStyle {
                    italic: true,
                    ..style.clone()
                };
                for child in children {
                    self.walk(child, &style);
                }
            }
            RenderNode::Underline { children } => {
                let style = SpanStyle {
                    underline: true,
                    ..style.clone()
                };
                for child in children {
                    self.walk(child, &style);
                }
            }
            RenderNode::Strikethrough { children } => {
                let style = SpanStyle {
                    strike: true,
                    ..style.clone()
                };
                for child in children {
                    self.walk(child, &style);
                }
            }
            RenderNode::Styled {
                properties,
                children,
            } => {
                let mut style = style.clone();
                if let Some((_, color)) = properties.iter().find(|(k, _)| k == "color") {
                    style.fg = Some(self.theme.parse_color(color));
                }
                // font sizes have no terminal equivalent; color is enough
                for child in children {
                    self.walk(child, &style);
                }
            }
            RenderNode::Code { code } => {
                let style = SpanStyle {
                    fg: Some(self.theme.code_color),
                    bg: Some(self.theme.code_bg_color),
                    ..SpanStyle::default()
                };
                self.push(&format!(" {code} "), &style);
            }
            RenderNode::CodeBlock { lang, code } => {
                self.flush();
                if let Some(lang) = lang {
                    self.push(&format!("[{lang}]"), &self.dim());
                    self.newline();
                }
                let style = SpanStyle {
                    fg: Some(self.theme.code_color),
                    bg: Some(self.theme.code_bg_color),
                    ..SpanStyle::default()
                };
                for line in code.split('\n') {
                    self.push(line, &style);
                    self.newline();
                }
                self.end_block();
            }
            RenderNode::Link {
                target,
                color,
                children,
            } => {
                let fg = match target {
                    LinkTarget::Mention { .. } => self.theme.mention_color,
                    _ => self.theme.parse_color(color),
                };
                let style = SpanStyle {
                    fg: Some(fg),
                    underline: true,
                    ..SpanStyle::default()
                };
                for child in children {
                    self.walk(child, &style);
                }
            }
            RenderNode::List {
                ordered,
                start,
                items,
            } => {
                self.flush();
                let begin = start.unwrap_or(1);
                for (idx, item) in items.iter().enumerate() {
                    let marker_style = SpanStyle {
                        fg: Some(self.theme.parse_color(&item.marker_color)),
                        ..SpanStyle::default()
                    };
                    let marker = if *ordered {
                        format!("{}. ", begin + idx as u64)
                    } else {
                        "• ".to_string()
                    };
                    self.push(&marker, &marker_style);
                    for child in &item.children {
                        self.walk(child, style);
                    }
                    self.flush();
                }
                self.end_block();
            }
            RenderNode::Blockquote { children } => {
                self.flush();
                let inner = layout(children, self.theme, self.reveal);
                let bar = self.dim();
                for line in inner {
                    self.current.push(Span::new("│ ", bar.clone()));
                    self.current.extend(line);
                    self.newline();
                }
                self.end_block();
            }
            RenderNode::Table { headers, rows, .. } => {
                self.render_table(headers, rows);
            }
            RenderNode::Checkbox { checked } => {
                let text = if *checked { "[x] " } else { "[ ] " };
                self.push(text, &self.dim());
            }
            RenderNode::Spoiler { children } => {
                if self.reveal {
                    for child in children {
                        self.walk(child, style);
                    }
                } else {
                    self.flush();
                    self.push("[spoiler hidden]", &self.dim());
                    self.end_block();
                }
            }
            RenderNode::Embed { embed } => self.render_embed(embed, style),
            RenderNode::Element { children, .. } => {
                for child in children {
                    self.walk(child, style);
                }
            }
        }
    }

    fn render_embed(&mut self, embed: &EmbedNode, style: &SpanStyle) {
        let link = SpanStyle {
            fg: Some(self.theme.link_color),
            underline: true,
            ..SpanStyle::default()
        };
        match embed {
            EmbedNode::InternalLink { label, .. } => self.push(label, &link),
            EmbedNode::YouTube {
                video_id,
                resume_at,
                ..
            } => {
                let text = match resume_at {
                    Some(at) => format!("[▶ youtube {video_id} (resume at {at:.0}s)]"),
                    None => format!("[▶ youtube {video_id} (click to play)]"),
                };
                self.push(
                    &text,
                    &SpanStyle {
                        fg: Some(self.theme.link_color),
                        ..SpanStyle::default()
                    },
                );
            }
            EmbedNode::PlatformVideo { path } => {
                self.push(
                    &format!("[▶ video {path}]"),
                    &SpanStyle {
                        fg: Some(self.theme.link_color),
                        ..SpanStyle::default()
                    },
                );
            }
            EmbedNode::Image { src, alt, secret } => {
                if *secret && !self.reveal {
                    self.push("[image (click to reveal)]", &self.dim());
                } else {
                    let label = if alt.is_empty() { src } else { alt };
                    self.push(&format!("[image {label}]"), &self.dim());
                }
            }
            EmbedNode::LinkFallback { href, label } => {
                self.push(label, &link);
                if label != href {
                    self.push(&format!(" ({href})"), &self.dim());
                }
            }
            EmbedNode::Broken => self.push("![]()", style),
        }
    }

    fn render_table(&mut self, headers: &[TableCell], rows: &[Vec<TableCell>]) {
        self.flush();
        let cols = headers
            .len()
            .max(rows.iter().map(Vec::len).max().unwrap_or(0));
        if cols == 0 {
            return;
        }

        let header_texts: Vec<String> = headers.iter().map(cell_text).collect();
        let row_texts: Vec<Vec<String>> = rows
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();

        let mut widths = vec![1usize; cols];
        for (idx, text) in header_texts.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(text.as_str()));
        }
        for row in &row_texts {
            for (idx, text) in row.iter().enumerate() {
                widths[idx] = widths[idx].max(UnicodeWidthStr::width(text.as_str()));
            }
        }

        let border = SpanStyle {
            fg: Some(self.theme.border_color),
            ..SpanStyle::default()
        };
        let header_style = SpanStyle {
            fg: Some(self.theme.text_color),
            bold: true,
            ..SpanStyle::default()
        };
        let body_style = SpanStyle {
            fg: Some(self.theme.text_color),
            ..SpanStyle::default()
        };

        self.rule_line(&widths, '┌', '┬', '┐', &border);
        if !header_texts.is_empty() {
            self.cells_line(&header_texts, &widths, &header_style, &border);
            self.rule_line(&widths, '├', '┼', '┤', &border);
        }
        for row in &row_texts {
            self.cells_line(row, &widths, &body_style, &border);
        }
        self.rule_line(&widths, '└', '┴', '┘', &border);
        self.end_block();
    }

    fn rule_line(&mut self, widths: &[usize], left: char, mid: char, right: char, style: &SpanStyle) {
        let mut text = String::new();
        text.push(left);
        for (idx, width) in widths.iter().enumerate() {
            if idx > 0 {
                text.push(mid);
            }
            text.push_str(&"─".repeat(width + 2));
        }
        text.push(right);
        self.push(&text, style);
        self.newline();
    }

    fn cells_line(
        &mut self,
        cells: &[String],
        widths: &[usize],
        text_style: &SpanStyle,
        border: &SpanStyle,
    ) {
        for (idx, width) in widths.iter().enumerate() {
            self.push("│", border);
            let content = cells.get(idx).map(String::as_str).unwrap_or("");
            let pad = width.saturating_sub(UnicodeWidthStr::width(content));
            self.push(&format!(" {}{} ", content, " ".repeat(pad)), text_style);
        }
        self.push("│", border);
        self.newline();
    }
}

fn cell_text(cell: &TableCell) -> String {
    cell.children
        .iter()
        .map(RenderNode::plain_text)
        .collect::<String>()
        .replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(line: &Line) -> String {
        line.iter().map(|span| span.text.as_str()).collect()
    }

    fn all_text(lines: &[Line]) -> String {
        lines
            .iter()
            .map(text_of)
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_paragraph_layout() {
        let nodes = vec![RenderNode::Paragraph {
            children: vec![RenderNode::text("hello")],
        }];
        let lines = layout(&nodes, &Theme::default(), false);
        assert_eq!(all_text(&lines), "hello");
    }

    #[test]
    fn test_strong_text_is_bold() {
        let nodes = vec![RenderNode::Paragraph {
            children: vec![RenderNode::Strong {
                children: vec![RenderNode::text("loud")],
            }],
        }];
        let lines = layout(&nodes, &Theme::default(), false);
        assert!(lines[0][0].style.bold);
    }

    #[test]
    fn test_spoiler_hidden_until_reveal() {
        let nodes = vec![RenderNode::Spoiler {
            children: vec![RenderNode::Paragraph {
                children: vec![RenderNode::text("the twist")],
            }],
        }];
        let hidden = layout(&nodes, &Theme::default(), false);
        assert_eq!(all_text(&hidden), "[spoiler hidden]");
        let revealed = layout(&nodes, &Theme::default(), true);
        assert_eq!(all_text(&revealed), "the twist");
    }

    #[test]
    fn test_secret_image_obscured_until_reveal() {
        let nodes = vec![RenderNode::Embed {
            embed: EmbedNode::Image {
                src: "https://pics.example/cat.png".to_string(),
                alt: "secret".to_string(),
                secret: true,
            },
        }];
        let hidden = layout(&nodes, &Theme::default(), false);
        assert_eq!(all_text(&hidden), "[image (click to reveal)]");
        let revealed = layout(&nodes, &Theme::default(), true);
        assert!(all_text(&revealed).contains("secret"));
    }

    #[test]
    fn test_youtube_placeholder_text() {
        let nodes = vec![RenderNode::Embed {
            embed: EmbedNode::YouTube {
                video_id: "abc123".to_string(),
                url: "https://youtu.be/abc123".to_string(),
                resume_at: None,
                started: false,
            },
        }];
        let lines = layout(&nodes, &Theme::default(), false);
        assert_eq!(all_text(&lines), "[▶ youtube abc123 (click to play)]");
    }

    #[test]
    fn test_table_borders() {
        let cell = |text: &str| TableCell {
            children: vec![RenderNode::text(text)],
        };
        let nodes = vec![RenderNode::Table {
            headers: vec![cell("h")],
            rows: vec![vec![cell("v")]],
            scrollable: true,
        }];
        let lines = layout(&nodes, &Theme::default(), false);
        let text = all_text(&lines);
        assert!(text.starts_with('┌'));
        assert!(text.contains("│ h │"));
        assert!(text.contains("│ v │"));
        assert!(text.ends_with('┘'));
    }

    #[test]
    fn test_render_emits_trailing_newline() {
        let rendered = Rendered {
            nodes: vec![RenderNode::Paragraph {
                children: vec![RenderNode::text("hi")],
            }],
            fallback: false,
        };
        let out = render(&rendered, &Theme::default(), 80, false);
        assert!(out.ends_with('\n'));
    }
}
