//! Author-text preprocessing ahead of the Markdown pass
//!
//! Reconciles the custom dialect and literal user intent with standard
//! Markdown semantics: escapes injection-prone characters, applies the
//! dialect, and keeps intentional vertical whitespace alive through
//! Markdown's paragraph collapsing.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::dialect::{self, MarkupOptions};
use crate::escape;

/// Cap on padded blank lines within a single blank run
pub const MAX_PADDED_BLANKS: usize = 9;

/// Message prefixes that mark the whole message as a spoiler
const SPOILER_PREFIXES: [&str; 2] = ["/secret ", "/spoiler "];

/// A line with at least two pipes reads as a table row
static TABLE_ROW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[^\n]*\|[^\n]*\|").unwrap());

static ORDERED_ITEM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\d+\.\s").unwrap());

/// Preprocessor output
#[derive(Debug, Clone, PartialEq)]
pub struct Preprocessed {
    /// Text safe to hand to the Markdown pass
    pub text: String,
    /// The message carried a spoiler prefix; the rendered tree gets gated
    pub spoiler: bool,
}

/// Prepare raw author text for the Markdown pass
pub fn preprocess(raw: &str, is_ai: bool) -> Preprocessed {
    let (body, spoiler) = strip_spoiler_prefix(raw);
    let escaped = escape::escape_angles(body);
    // AI messages are plain Markdown: no dialect, no block-char escaping
    let marked = if is_ai { escaped } else { apply_dialect(&escaped) };
    Preprocessed {
        text: pad_blank_lines(&marked),
        spoiler,
    }
}

fn strip_spoiler_prefix(raw: &str) -> (&str, bool) {
    for prefix in SPOILER_PREFIXES {
        if let Some(rest) = raw.strip_prefix(prefix) {
            return (rest, true);
        }
    }
    (raw, false)
}

fn apply_dialect(text: &str) -> String {
    let opts = MarkupOptions {
        escape_block_chars: !TABLE_ROW_RE.is_match(text),
        escape_emphasis: true,
    };
    if !opts.escape_block_chars {
        // a table anywhere disables '-'/'=' escaping for the whole message;
        // known tradeoff, kept for compatibility
        debug!("pipe table detected, keeping '-'/'=' unescaped");
    }

    // fenced regions pass through untouched; spans never cross lines, so
    // tokenizing line by line is equivalent to one pass over the text
    let mut out = String::with_capacity(text.len() + 16);
    let mut in_fence = false;
    for (idx, line) in text.split('\n').enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            out.push_str(line);
        } else if in_fence {
            out.push_str(line);
        } else {
            out.push_str(&dialect::to_markup(&dialect::tokenize(line), &opts));
        }
    }
    out
}

/// Keep intentional vertical whitespace through Markdown
///
/// A single blank line stays a plain paragraph break. Every blank line past
/// the first in a run becomes its own non-breaking-space paragraph (capped),
/// so the rendered output shows the same number of empty lines the author
/// typed. Runs inside an ordered-list run are left alone so the numbering
/// survives.
fn pad_blank_lines(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut in_fence = false;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            out.push(line.to_string());
            i += 1;
            continue;
        }
        if in_fence || !line.trim().is_empty() {
            out.push(line.to_string());
            i += 1;
            continue;
        }

        let start = i;
        while i < lines.len() && lines[i].trim().is_empty() {
            i += 1;
        }
        let run = i - start;
        out.push(String::new());
        if run > 1 && !inside_ordered_run(&lines, start, i) {
            let extras = (run - 1).min(MAX_PADDED_BLANKS);
            for _ in 0..extras {
                out.push("\u{00a0}".to_string());
                out.push(String::new());
            }
        }
    }

    out.join("\n")
}

fn inside_ordered_run(lines: &[&str], start: usize, end: usize) -> bool {
    let prev = lines[..start].iter().rev().find(|l| !l.trim().is_empty());
    let next = lines[end..].iter().find(|l| !l.trim().is_empty());
    matches!(
        (prev, next),
        (Some(p), Some(n)) if ORDERED_ITEM_RE.is_match(p) && ORDERED_ITEM_RE.is_match(n)
    )
}
