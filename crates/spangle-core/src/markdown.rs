//! Markdown conversion using pulldown-cmark

use pulldown_cmark::{html, Options, Parser};

/// Convert preprocessed text to an HTML fragment
///
/// GFM tables, strikethrough and task lists are enabled. The conversion is
/// deterministic and touches neither the network nor the file system.
pub fn to_html(text: &str) -> String {
    let options =
        Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let parser = Parser::new_ext(text, options);
    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraph() {
        assert_eq!(to_html("hello"), "<p>hello</p>\n");
    }

    #[test]
    fn test_inline_html_passes_through() {
        let html = to_html("before <b>kept</b> after");
        assert!(html.contains("<b>kept</b>"));
    }

    #[test]
    fn test_table_extension() {
        let html = to_html("| a | b |\n| - | - |\n| c | d |");
        assert!(html.contains("<table>"));
        assert!(html.contains("<th>a</th>"));
        assert!(html.contains("<td>c</td>"));
    }

    #[test]
    fn test_tasklist_extension() {
        let html = to_html("- [x] done\n- [ ] open");
        assert!(html.contains("checkbox"));
    }

    #[test]
    fn test_backslash_escapes_resolve() {
        assert_eq!(to_html("a \\- b"), "<p>a - b</p>\n");
    }
}
