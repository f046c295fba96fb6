use crate::text::patterns;

/// Markup-tag syntax shared by callouts, figures and generic element blocks.
pub struct Element;

impl Element {
    /// Tags that may start a paragraph line without opening a markup block.
    pub const INLINE_TAGS: &'static [&'static str] = &[
        "a", "b", "i", "u", "s", "em", "strong", "code", "span", "br", "sub", "sup", "del",
        "kbd", "mark", "Badge",
    ];

    /// Elements that never have a closing tag.
    pub const VOID_TAGS: &'static [&'static str] =
        &["img", "br", "hr", "col", "input", "meta", "link", "source", "wbr"];

    pub fn is_void(name: &str) -> bool {
        Self::VOID_TAGS.contains(&name)
    }

    /// Name of the opening tag at the very start of `s`.
    pub fn leading_tag(s: &str) -> Option<&str> {
        if s.starts_with("</") {
            return None;
        }
        patterns::tag_name()
            .captures(s)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// The tag name when `s` opens a block-level element.
    pub fn opens_block(s: &str) -> Option<&str> {
        Self::leading_tag(s).filter(|name| !Self::INLINE_TAGS.contains(name))
    }

    /// Index just past the `>` closing the tag that starts at `start`.
    ///
    /// `>` inside quoted attribute values does not close the tag.
    pub fn tag_end(s: &str, start: usize) -> Option<usize> {
        let mut quote: Option<u8> = None;
        for (i, &b) in s.as_bytes().iter().enumerate().skip(start) {
            match quote {
                Some(q) if b == q => quote = None,
                Some(_) => {}
                None if b == b'"' || b == b'\'' => quote = Some(b),
                None if b == b'>' => return Some(i + 1),
                None => {}
            }
        }
        None
    }

    /// Net change in open `name` elements across `line`.
    ///
    /// Self-closing tags count zero; a tag name must be followed by whitespace,
    /// `>` or `/` so `<figcaption>` never counts as `<figure>`.
    pub fn depth_delta(line: &str, name: &str) -> i32 {
        let bytes = line.as_bytes();
        let mut delta = 0i32;
        let mut i = 0usize;
        while let Some(rel) = line[i..].find('<') {
            let at = i + rel;
            let rest = &line[at + 1..];
            if let Some(after) = rest.strip_prefix('/') {
                if Self::names_tag(after, name) {
                    delta -= 1;
                }
            } else if Self::names_tag(rest, name) {
                match Self::tag_end(line, at) {
                    Some(end) if bytes[end - 2] == b'/' => {}
                    _ => delta += 1,
                }
            }
            i = at + 1;
        }
        delta
    }

    fn names_tag(rest: &str, name: &str) -> bool {
        rest.strip_prefix(name).is_some_and(|tail| {
            tail.is_empty() || tail.starts_with(|c: char| c.is_whitespace() || c == '>' || c == '/')
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_tag_names() {
        assert_eq!(Element::leading_tag("<details open>"), Some("details"));
        assert_eq!(Element::leading_tag("</details>"), None);
        assert_eq!(Element::opens_block("<Badge color=\"red\">x</Badge>"), None);
        assert_eq!(Element::opens_block("<table>"), Some("table"));
        assert!(Element::is_void("img"));
    }

    #[test]
    fn tag_end_skips_quoted_gt() {
        let s = r#"<img alt="a > b" src="x.png"/> tail"#;
        assert_eq!(Element::tag_end(s, 0), Some(30));
    }

    #[test]
    fn depth_counts_nested_and_self_closing() {
        assert_eq!(Element::depth_delta("<div><div>", "div"), 2);
        assert_eq!(Element::depth_delta("<div/></div>", "div"), -1);
        assert_eq!(Element::depth_delta("<figure><figcaption>c</figcaption>", "figure"), 1);
    }
}
