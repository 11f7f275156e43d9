//! Width-aware wrapping of styled spans
//!
//! Wraps at word boundaries using unicode display width, never byte
//! length. Words longer than the wrap width are force-broken by character.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::{Line, Span};

/// Wrap one logical line of spans to `max_width` columns
pub fn wrap_spans(line: &Line, max_width: usize) -> Vec<Line> {
    if max_width == 0 {
        return vec![line.clone()];
    }
    let total: usize = line.iter().map(Span::width).sum();
    if total <= max_width {
        return vec![line.clone()];
    }

    let mut out: Vec<Line> = Vec::new();
    let mut current: Line = Vec::new();
    let mut current_width = 0usize;

    for span in line {
        for piece in segments(&span.text) {
            let piece_width = UnicodeWidthStr::width(piece);
            let is_space = piece.chars().all(char::is_whitespace);

            if is_space {
                // whitespace never starts a line and never overflows one
                if !current.is_empty() && current_width + piece_width <= max_width {
                    current.push(Span::new(piece, span.style.clone()));
                    current_width += piece_width;
                }
                continue;
            }

            if current_width + piece_width > max_width && !current.is_empty() {
                commit(&mut out, &mut current);
                current_width = 0;
            }

            if piece_width > max_width {
                current_width = force_break(piece, span, max_width, &mut out, &mut current);
            } else {
                current.push(Span::new(piece, span.style.clone()));
                current_width += piece_width;
            }
        }
    }

    commit(&mut out, &mut current);
    if out.is_empty() {
        out.push(Vec::new());
    }
    out
}

/// Break an overlong word by character, filling lines as it goes
fn force_break(
    word: &str,
    span: &Span,
    max_width: usize,
    out: &mut Vec<Line>,
    current: &mut Line,
) -> usize {
    let mut chunk = String::new();
    let mut chunk_width = 0usize;
    for c in word.chars() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if chunk_width + w > max_width && !chunk.is_empty() {
            current.push(Span::new(std::mem::take(&mut chunk), span.style.clone()));
            commit(out, current);
            chunk_width = 0;
        }
        chunk.push(c);
        chunk_width += w;
    }
    if !chunk.is_empty() {
        current.push(Span::new(chunk, span.style.clone()));
    }
    chunk_width
}

fn commit(out: &mut Vec<Line>, current: &mut Line) {
    // drop trailing whitespace from the committed line
    while let Some(last) = current.last_mut() {
        let trimmed = last.text.trim_end();
        if trimmed.is_empty() {
            current.pop();
        } else {
            if trimmed.len() != last.text.len() {
                last.text = trimmed.to_string();
            }
            break;
        }
    }
    if !current.is_empty() {
        out.push(std::mem::take(current));
    }
}

/// Alternating runs of whitespace and non-whitespace
fn segments(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_space: Option<bool> = None;
    for (idx, c) in text.char_indices() {
        let space = c.is_whitespace();
        match in_space {
            Some(prev) if prev == space => {}
            Some(_) => {
                out.push(&text[start..idx]);
                start = idx;
                in_space = Some(space);
            }
            None => in_space = Some(space),
        }
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::SpanStyle;

    fn plain(text: &str) -> Line {
        vec![Span::new(text, SpanStyle::default())]
    }

    fn text_of(line: &Line) -> String {
        line.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn test_short_line_untouched() {
        let wrapped = wrap_spans(&plain("hello"), 10);
        assert_eq!(wrapped.len(), 1);
        assert_eq!(text_of(&wrapped[0]), "hello");
    }

    #[test]
    fn test_wraps_at_word_boundaries() {
        let wrapped = wrap_spans(&plain("hello world foo"), 10);
        let texts: Vec<String> = wrapped.iter().map(text_of).collect();
        assert_eq!(texts, vec!["hello", "world foo"]);
    }

    #[test]
    fn test_long_words_force_broken() {
        let wrapped = wrap_spans(&plain("superlongword"), 5);
        let texts: Vec<String> = wrapped.iter().map(text_of).collect();
        assert_eq!(texts, vec!["super", "longw", "ord"]);
    }

    #[test]
    fn test_style_survives_wrapping() {
        let style = SpanStyle {
            bold: true,
            ..SpanStyle::default()
        };
        let line = vec![
            Span::new("plain and ", SpanStyle::default()),
            Span::new("bold words here", style.clone()),
        ];
        let wrapped = wrap_spans(&line, 12);
        assert!(wrapped.len() > 1);
        let last = wrapped.last().expect("lines");
        assert!(last.iter().all(|s| s.style == style));
    }
}
