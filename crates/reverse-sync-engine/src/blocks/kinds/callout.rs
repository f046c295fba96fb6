use std::collections::BTreeMap;
use std::ops::Range;

use super::element::Element;
use crate::text::patterns;

/// `<Callout type="..." emoji="...">` containers.
pub struct Callout;

impl Callout {
    pub const TAG: &'static str = "Callout";
    const CLOSE: &'static str = "</Callout>";

    pub fn is_open(remainder: &str) -> bool {
        Element::leading_tag(remainder) == Some(Self::TAG)
    }

    /// Attributes of the opening tag.
    pub fn attributes(text: &str) -> BTreeMap<String, String> {
        let start = text.find('<').unwrap_or(0);
        let end = Element::tag_end(text, start).unwrap_or(text.len());
        patterns::parse_attributes(&text[start..end])
            .into_iter()
            .collect()
    }

    /// Byte range of the body between the opening and closing tags.
    ///
    /// When a tag sits on its own line the body starts on the next line (or
    /// ends at the start of the closing line). An unterminated callout's body
    /// runs to the end of `text`.
    pub fn body_range(text: &str) -> Range<usize> {
        let open_start = text.find('<').unwrap_or(0);
        let open_end = Element::tag_end(text, open_start).unwrap_or(text.len());
        let body_start = match text[open_end..].find('\n') {
            Some(nl) if text[open_end..open_end + nl].trim().is_empty() => open_end + nl + 1,
            _ => open_end,
        };

        let body_end = match text.rfind(Self::CLOSE) {
            Some(close) if close >= body_start => {
                let line_start = text[..close].rfind('\n').map_or(0, |nl| nl + 1);
                if line_start >= body_start && text[line_start..close].trim().is_empty() {
                    line_start
                } else {
                    close
                }
            }
            _ => text.len(),
        };
        body_start..body_end.max(body_start)
    }

    /// Target macro name for a callout `type`.
    pub fn macro_name(kind: &str) -> &'static str {
        match kind {
            "info" => "info",
            "important" => "note",
            "error" => "warning",
            _ => "tip",
        }
    }
}
