//! Compiled regular expressions shared by the recognizers.
//!
//! Every pattern is compiled at most once per process through a `OnceLock`.

use regex::Regex;

macro_rules! static_regex {
    ($(#[$meta:meta])* $name:ident, $pattern:expr) => {
        $(#[$meta])*
        pub(crate) fn $name() -> &'static Regex {
            use std::sync::OnceLock;
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($pattern).expect(concat!("Invalid regex: ", stringify!($name))))
        }
    };
}

static_regex!(
    /// `## Title` with the marker run captured.
    heading,
    r"^(#+)\s+(.*)$"
);
static_regex!(ordered_marker, r"^\d+\.\s+");
static_regex!(bullet_marker, r"^[-*+]\s+");
static_regex!(list_marker, r"^([-*+]\s+|\d+\.\s+)");
static_regex!(
    /// A list marker that may stand alone on its line (`-` or `3.`).
    bare_marker,
    r"^(?:[-*+]|\d+\.)(?:\s|$)"
);
static_regex!(horizontal_rule, r"^(?:_{3,}|-{3,}|\*{3,})\s*$");
static_regex!(import_line, r"^import\s");
static_regex!(bold_italic, r"\*\*\*(.+?)\*\*\*");
static_regex!(bold, r"\*\*(.+?)\*\*");
static_regex!(code_span, r"`([^`]+)`");
static_regex!(link, r"\[([^\]]+)\]\(([^)]+)\)");
static_regex!(badge, r#"(?s)<Badge\s+color="([^"]+)">(.*?)</Badge>"#);
static_regex!(any_tag, r"<[^>]+/?>");
static_regex!(table_separator, r"^\|[\s\-:|]+\|$");
static_regex!(
    /// `key="value"` or `key='value'` attribute pairs.
    attribute,
    r#"(\w[\w-]*)=(?:"([^"]*)"|'([^']*)')"#
);
static_regex!(line_break, r"(?i)<br\s*/?>");
static_regex!(tag_name, r"^</?([A-Za-z][\w:.-]*)");
static_regex!(
    /// One `tag[n]` step of an element address.
    address_segment,
    r"^([A-Za-z0-9:_.-]+)\[(\d+)\]$"
);

/// Parses `key="value"` pairs out of an opening tag.
pub(crate) fn parse_attributes(tag: &str) -> Vec<(String, String)> {
    attribute()
        .captures_iter(tag)
        .map(|caps| {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map(|m| m.as_str())
                .unwrap_or_default();
            (caps[1].to_string(), value.to_string())
        })
        .collect()
}

/// Unwraps single-star italic (`*x*`) while leaving `**` runs untouched.
///
/// A star opens only when it is not preceded by another star, and the matching
/// star must not be followed by one.
pub(crate) fn unwrap_single_star(s: &str) -> String {
    replace_single_star(s, |inner| inner.to_string())
}

/// Rewrites every single-star italic span through `f`.
pub(crate) fn replace_single_star(s: &str, f: impl Fn(&str) -> String) -> String {
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut i = 0usize;
    let mut copied = 0usize;
    while i < bytes.len() {
        if bytes[i] == b'*' && (i == 0 || bytes[i - 1] != b'*') {
            if let Some(close) = find_single_star_close(bytes, i) {
                out.push_str(&s[copied..i]);
                out.push_str(&f(&s[i + 1..close]));
                i = close + 1;
                copied = i;
                continue;
            }
        }
        i += 1;
    }
    out.push_str(&s[copied..]);
    out
}

fn find_single_star_close(bytes: &[u8], open: usize) -> Option<usize> {
    let rel = bytes[open + 1..].iter().position(|&b| b == b'*')?;
    let close = open + 1 + rel;
    let empty = close == open + 1;
    let followed = bytes.get(close + 1) == Some(&b'*');
    (!empty && !followed).then_some(close)
}

/// Byte ranges of single-star italic spans, including the stars.
pub(crate) fn single_star_spans(s: &str) -> Vec<(usize, usize)> {
    let bytes = s.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0usize;
    while i < bytes.len() {
        if bytes[i] == b'*' && (i == 0 || bytes[i - 1] != b'*') {
            if let Some(close) = find_single_star_close(bytes, i) {
                spans.push((i, close + 1));
                i = close + 1;
                continue;
            }
        }
        i += 1;
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_captures_marker_and_title() {
        let caps = heading().captures("### Setup guide").unwrap();
        assert_eq!(&caps[1], "###");
        assert_eq!(&caps[2], "Setup guide");
    }

    #[test]
    fn attributes_accept_both_quote_styles() {
        let attrs = parse_attributes(r#"<Callout type="info" emoji='💡'>"#);
        assert_eq!(
            attrs,
            vec![
                ("type".to_string(), "info".to_string()),
                ("emoji".to_string(), "💡".to_string())
            ]
        );
    }

    #[test]
    fn single_star_ignores_bold() {
        assert_eq!(unwrap_single_star("a *b* c"), "a b c");
        assert_eq!(unwrap_single_star("**bold**"), "**bold**");
        assert_eq!(unwrap_single_star("2 * 3"), "2 * 3");
    }

    #[test]
    fn single_star_spans_cover_stars() {
        assert_eq!(single_star_spans("x *em* y"), vec![(2, 6)]);
    }

    #[test]
    fn separator_row() {
        assert!(table_separator().is_match("|---|:--:|"));
        assert!(!table_separator().is_match("| a | b |"));
    }
}
