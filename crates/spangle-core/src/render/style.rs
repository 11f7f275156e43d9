//! Inline style-attribute parsing

/// Parse a CSS style attribute into (camelCased property, value) pairs
///
/// Malformed declarations are dropped rather than reported; a style string
/// is presentation data, never an error source.
pub fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (key, value) = decl.split_once(':')?;
            let key = key.trim();
            let value = value.trim();
            if key.is_empty() || value.is_empty() {
                return None;
            }
            Some((camel_case(key), value.to_string()))
        })
        .collect()
}

fn camel_case(prop: &str) -> String {
    let mut out = String::with_capacity(prop.len());
    let mut upper_next = false;
    for c in prop.chars() {
        if c == '-' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}
