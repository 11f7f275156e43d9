//! Text-effect dialect tokenizer
//!
//! The platform's inline markup (single-asterisk bold, double-asterisk
//! italic, underline/strikethrough runs, color and size spans) is parsed in
//! a single left-to-right scan into a token tree. Matchers run in one fixed
//! precedence order per position and span interiors are re-tokenized, so
//! nesting never depends on substitution order the way chained regex
//! replacement did.

/// Deepest span nesting the tokenizer will follow; interiors below this
/// are kept as literal text
pub const MAX_SPAN_DEPTH: usize = 8;

/// Color names accepted as span delimiters, e.g. `blue|like this|blue`
pub const PALETTE: [&str; 9] = [
    "red", "orange", "gold", "green", "lime", "blue", "purple", "pink", "gray",
];

/// A parsed piece of dialect input
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Plain text, subject to escaping on serialization
    Text(String),
    /// Backtick code span carried through untouched
    Verbatim(String),
    /// `*bold*`
    Bold(Vec<Token>),
    /// `**italic**`
    Italic(Vec<Token>),
    /// `__underline__`
    Underline(Vec<Token>),
    /// `--strikethrough--`
    Strikethrough(Vec<Token>),
    /// `blue|text|blue`
    Color {
        name: &'static str,
        children: Vec<Token>,
    },
    /// `h[text]h`, `b[text]b`, `s[text]s`, `t[text]t`
    Size {
        class: SizeClass,
        children: Vec<Token>,
    },
}

/// Font-size classes of the size-span markers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeClass {
    Huge,
    Big,
    Small,
    Tiny,
}

impl SizeClass {
    pub fn from_marker(c: char) -> Option<Self> {
        match c {
            'h' => Some(SizeClass::Huge),
            'b' => Some(SizeClass::Big),
            's' => Some(SizeClass::Small),
            't' => Some(SizeClass::Tiny),
            _ => None,
        }
    }

    pub fn marker(self) -> char {
        match self {
            SizeClass::Huge => 'h',
            SizeClass::Big => 'b',
            SizeClass::Small => 's',
            SizeClass::Tiny => 't',
        }
    }

    /// CSS font-size the span maps to
    pub fn em(self) -> &'static str {
        match self {
            SizeClass::Huge => "1.9em",
            SizeClass::Big => "1.3em",
            SizeClass::Small => "0.7em",
            SizeClass::Tiny => "0.5em",
        }
    }
}

/// Tokenize dialect input into a token tree
pub fn tokenize(input: &str) -> Vec<Token> {
    let chars: Vec<char> = input.chars().collect();
    tokenize_at(&chars, 0)
}

fn tokenize_at(chars: &[char], depth: usize) -> Vec<Token> {
    if depth >= MAX_SPAN_DEPTH {
        return vec![Token::Text(chars.iter().collect())];
    }

    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut i = 0;

    while i < chars.len() {
        if let Some((token, next)) = match_span(chars, i, depth) {
            flush_text(&mut tokens, &mut text);
            tokens.push(token);
            i = next;
        } else {
            text.push(chars[i]);
            i += 1;
        }
    }

    flush_text(&mut tokens, &mut text);
    tokens
}

fn flush_text(tokens: &mut Vec<Token>, text: &mut String) {
    if !text.is_empty() {
        tokens.push(Token::Text(std::mem::take(text)));
    }
}

/// Try every span matcher at position `i`, in precedence order
fn match_span(chars: &[char], i: usize, depth: usize) -> Option<(Token, usize)> {
    match_verbatim(chars, i)
        .or_else(|| match_size(chars, i, depth))
        .or_else(|| match_color(chars, i, depth))
        .or_else(|| match_italic(chars, i, depth))
        .or_else(|| match_bold(chars, i, depth))
        .or_else(|| match_underline(chars, i, depth))
        .or_else(|| match_strikethrough(chars, i, depth))
}

/// Backtick spans are atomic: no dialect markup applies inside them
fn match_verbatim(chars: &[char], i: usize) -> Option<(Token, usize)> {
    if chars[i] != '`' {
        return None;
    }
    let close = scan(chars, i + 1, |j| chars[j] == '`')?;
    let raw: String = chars[i..=close].iter().collect();
    Some((Token::Verbatim(raw), close + 1))
}

fn match_size(chars: &[char], i: usize, depth: usize) -> Option<(Token, usize)> {
    let class = SizeClass::from_marker(chars[i])?;
    if chars.get(i + 1) != Some(&'[') {
        return None;
    }
    // marker letters only open a span on a word boundary
    if i > 0 && chars[i - 1].is_ascii_alphanumeric() {
        return None;
    }
    let marker = class.marker();
    let close = scan(chars, i + 2, |j| {
        chars[j] == ']' && chars.get(j + 1) == Some(&marker)
    })?;
    let inner = &chars[i + 2..close];
    if !valid_inner(inner) {
        return None;
    }
    let token = Token::Size {
        class,
        children: tokenize_at(inner, depth + 1),
    };
    Some((token, close + 2))
}

fn match_color(chars: &[char], i: usize, depth: usize) -> Option<(Token, usize)> {
    if !chars[i].is_ascii_alphabetic() {
        return None;
    }
    // delimiter names only match on a word boundary
    if i > 0 && chars[i - 1].is_ascii_alphanumeric() {
        return None;
    }
    for name in PALETTE {
        let len = name.chars().count();
        if !starts_with_at(chars, i, name) || chars.get(i + len) != Some(&'|') {
            continue;
        }
        let start = i + len + 1;
        let Some(close) = scan(chars, start, |j| chars[j] == '|') else {
            continue;
        };
        if !starts_with_at(chars, close + 1, name) {
            continue;
        }
        let after = close + 1 + len;
        if chars.get(after).is_some_and(|c| c.is_ascii_alphanumeric()) {
            continue;
        }
        let inner = &chars[start..close];
        if !valid_inner(inner) {
            continue;
        }
        let token = Token::Color {
            name,
            children: tokenize_at(inner, depth + 1),
        };
        return Some((token, after));
    }
    None
}

fn match_italic(chars: &[char], i: usize, depth: usize) -> Option<(Token, usize)> {
    if chars[i] != '*' || chars.get(i + 1) != Some(&'*') {
        return None;
    }
    let close = scan(chars, i + 2, |j| {
        chars[j] == '*' && chars.get(j + 1) == Some(&'*')
    })?;
    let inner = &chars[i + 2..close];
    if !valid_inner(inner) || edged_by_space(inner) {
        return None;
    }
    let token = Token::Italic(tokenize_at(inner, depth + 1));
    Some((token, close + 2))
}

fn match_bold(chars: &[char], i: usize, depth: usize) -> Option<(Token, usize)> {
    if chars[i] != '*' {
        return None;
    }
    // numeric-adjacency guard: 3*4*5 stays arithmetic, not emphasis
    if i > 0 && chars[i - 1].is_ascii_digit() {
        return None;
    }
    let close = scan(chars, i + 1, |j| chars[j] == '*')?;
    if chars.get(close + 1).is_some_and(|c| c.is_ascii_digit()) {
        return None;
    }
    let inner = &chars[i + 1..close];
    if !valid_inner(inner) || edged_by_space(inner) || inner.contains(&'*') {
        return None;
    }
    let token = Token::Bold(tokenize_at(inner, depth + 1));
    Some((token, close + 1))
}

fn match_underline(chars: &[char], i: usize, depth: usize) -> Option<(Token, usize)> {
    if chars[i] != '_' || chars.get(i + 1) != Some(&'_') {
        return None;
    }
    let close = scan(chars, i + 2, |j| {
        chars[j] == '_' && chars.get(j + 1) == Some(&'_')
    })?;
    let inner = &chars[i + 2..close];
    if !valid_inner(inner) || edged_by_space(inner) {
        return None;
    }
    let token = Token::Underline(tokenize_at(inner, depth + 1));
    Some((token, close + 2))
}

fn match_strikethrough(chars: &[char], i: usize, depth: usize) -> Option<(Token, usize)> {
    if chars[i] != '-' || chars.get(i + 1) != Some(&'-') {
        return None;
    }
    let close = scan(chars, i + 2, |j| {
        chars[j] == '-' && chars.get(j + 1) == Some(&'-')
    })?;
    let inner = &chars[i + 2..close];
    if !valid_inner(inner) || edged_by_space(inner) {
        return None;
    }
    // dash runs (--- rules, arrows) are not spans
    if inner[0] == '-' || inner[inner.len() - 1] == '-' {
        return None;
    }
    let token = Token::Strikethrough(tokenize_at(inner, depth + 1));
    Some((token, close + 2))
}

fn scan(chars: &[char], from: usize, pred: impl Fn(usize) -> bool) -> Option<usize> {
    (from..chars.len()).find(|&j| pred(j))
}

fn starts_with_at(chars: &[char], at: usize, name: &str) -> bool {
    let mut j = at;
    for c in name.chars() {
        if chars.get(j) != Some(&c) {
            return false;
        }
        j += 1;
    }
    true
}

/// Span interiors must be non-empty and stay on one line
fn valid_inner(inner: &[char]) -> bool {
    !inner.is_empty() && !inner.contains(&'\n')
}

fn edged_by_space(inner: &[char]) -> bool {
    inner[0].is_whitespace() || inner[inner.len() - 1].is_whitespace()
}

/// Serialization options for [`to_markup`]
#[derive(Debug, Clone)]
pub struct MarkupOptions {
    /// Backslash-escape `-` and `=` in text so Markdown cannot read them
    /// as thematic breaks or setext underlines
    pub escape_block_chars: bool,
    /// Backslash-escape leftover `*` and `_` so Markdown cannot invent
    /// emphasis the dialect rejected
    pub escape_emphasis: bool,
}

impl Default for MarkupOptions {
    fn default() -> Self {
        Self {
            escape_block_chars: true,
            escape_emphasis: true,
        }
    }
}

/// Serialize a token tree back to inline markup for the Markdown pass
pub fn to_markup(tokens: &[Token], opts: &MarkupOptions) -> String {
    let mut out = String::new();
    let mut at_line_start = true;
    write_tokens(tokens, opts, &mut out, &mut at_line_start);
    out
}

fn write_tokens(
    tokens: &[Token],
    opts: &MarkupOptions,
    out: &mut String,
    at_line_start: &mut bool,
) {
    for token in tokens {
        match token {
            Token::Text(text) => {
                escape_text(text, opts, *at_line_start, out);
                *at_line_start = text.ends_with('\n');
            }
            Token::Verbatim(raw) => {
                out.push_str(raw);
                *at_line_start = false;
            }
            Token::Bold(children) => wrap_tag("b", children, opts, out, at_line_start),
            Token::Italic(children) => wrap_tag("i", children, opts, out, at_line_start),
            Token::Underline(children) => wrap_tag("u", children, opts, out, at_line_start),
            Token::Strikethrough(children) => wrap_tag("s", children, opts, out, at_line_start),
            Token::Color { name, children } => {
                out.push_str(&format!("<span style=\"color:{name}\">"));
                *at_line_start = false;
                write_tokens(children, opts, out, at_line_start);
                out.push_str("</span>");
            }
            Token::Size { class, children } => {
                out.push_str(&format!("<span style=\"font-size:{}\">", class.em()));
                *at_line_start = false;
                write_tokens(children, opts, out, at_line_start);
                out.push_str("</span>");
            }
        }
    }
}

fn wrap_tag(
    tag: &str,
    children: &[Token],
    opts: &MarkupOptions,
    out: &mut String,
    at_line_start: &mut bool,
) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    *at_line_start = false;
    write_tokens(children, opts, out, at_line_start);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn escape_text(text: &str, opts: &MarkupOptions, starts_line: bool, out: &mut String) {
    for (idx, line) in text.split('\n').enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        let at_start = starts_line || idx > 0;
        escape_line(line, opts, at_start, out);
    }
}

fn escape_line(line: &str, opts: &MarkupOptions, at_line_start: bool, out: &mut String) {
    // a leading "* " bullet is left alone so Markdown still sees the list
    let bullet = opts.escape_emphasis && at_line_start && line.trim_start().starts_with("* ");
    let mut bullet_star_seen = false;
    for c in line.chars() {
        match c {
            '*' | '_' if opts.escape_emphasis => {
                if c == '*' && bullet && !bullet_star_seen {
                    bullet_star_seen = true;
                    out.push(c);
                } else {
                    out.push('\\');
                    out.push(c);
                }
            }
            '-' | '=' if opts.escape_block_chars => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markup(input: &str) -> String {
        to_markup(&tokenize(input), &MarkupOptions::default())
    }

    #[test]
    fn test_single_asterisk_is_bold() {
        assert_eq!(tokenize("*bold*"), vec![Token::Bold(vec![Token::Text("bold".into())])]);
        assert_eq!(markup("*bold*"), "<b>bold</b>");
    }

    #[test]
    fn test_digit_adjacent_asterisk_stays_literal() {
        assert_eq!(tokenize("3*4*5"), vec![Token::Text("3*4*5".into())]);
        // the leftover asterisks are escaped away from Markdown
        assert_eq!(markup("3*4*5"), "3\\*4\\*5");
    }

    #[test]
    fn test_double_asterisk_is_italic() {
        assert_eq!(markup("**soft**"), "<i>soft</i>");
    }

    #[test]
    fn test_underline_and_strikethrough() {
        assert_eq!(markup("__u__"), "<u>u</u>");
        assert_eq!(markup("--old--"), "<s>old</s>");
    }

    #[test]
    fn test_dash_run_is_not_strikethrough() {
        assert_eq!(tokenize("----"), vec![Token::Text("----".into())]);
    }

    #[test]
    fn test_color_span() {
        let tokens = tokenize("blue|sky|blue");
        assert_eq!(
            tokens,
            vec![Token::Color {
                name: "blue",
                children: vec![Token::Text("sky".into())]
            }]
        );
        assert_eq!(markup("blue|sky|blue"), "<span style=\"color:blue\">sky</span>");
    }

    #[test]
    fn test_color_needs_word_boundary() {
        assert_eq!(tokenize("unblue|x|blue"), vec![Token::Text("unblue|x|blue".into())]);
    }

    #[test]
    fn test_size_spans() {
        assert_eq!(markup("h[loud]h"), "<span style=\"font-size:1.9em\">loud</span>");
        assert_eq!(markup("t[tiny]t"), "<span style=\"font-size:0.5em\">tiny</span>");
    }

    #[test]
    fn test_nesting() {
        let tokens = tokenize("*red|hot|red*");
        assert_eq!(
            tokens,
            vec![Token::Bold(vec![Token::Color {
                name: "red",
                children: vec![Token::Text("hot".into())]
            }])]
        );
    }

    #[test]
    fn test_unterminated_span_stays_literal() {
        assert_eq!(tokenize("*dangling"), vec![Token::Text("*dangling".into())]);
    }

    #[test]
    fn test_spans_do_not_cross_lines() {
        assert_eq!(tokenize("*a\nb*"), vec![Token::Text("*a\nb*".into())]);
    }

    #[test]
    fn test_verbatim_backticks_skip_everything() {
        assert_eq!(markup("`a --x-- b`"), "`a --x-- b`");
    }

    #[test]
    fn test_bullet_line_keeps_marker() {
        assert_eq!(markup("* item one"), "* item one");
        // a mid-line asterisk pair still becomes bold on a bullet line
        assert_eq!(markup("* item *loud*"), "* item <b>loud</b>");
    }

    #[test]
    fn test_block_char_escaping() {
        assert_eq!(markup("a - b = c"), "a \\- b \\= c");
        let table_opts = MarkupOptions {
            escape_block_chars: false,
            escape_emphasis: true,
        };
        assert_eq!(to_markup(&tokenize("a - b"), &table_opts), "a - b");
    }
}
