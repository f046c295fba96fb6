use std::collections::BTreeMap;

use super::element::Element;
use crate::text::patterns;

/// `<figure><img .../><figcaption>..</figcaption></figure>` blocks.
pub struct Figure;

impl Figure {
    pub const TAG: &'static str = "figure";

    pub fn is_open(remainder: &str) -> bool {
        Element::leading_tag(remainder) == Some(Self::TAG)
    }

    /// The image attributes plus a `caption` entry when a caption exists.
    pub fn attributes(text: &str) -> BTreeMap<String, String> {
        let mut attrs = BTreeMap::new();
        if let Some(start) = text.find("<img") {
            let end = Element::tag_end(text, start).unwrap_or(text.len());
            attrs.extend(patterns::parse_attributes(&text[start..end]));
        }
        if let Some(caption) = Self::caption(text) {
            attrs.insert("caption".to_string(), caption.to_string());
        }
        attrs
    }

    fn caption(text: &str) -> Option<&str> {
        let open = text.find("<figcaption")?;
        let body = Element::tag_end(text, open)?;
        let close = text[body..].find("</figcaption>")? + body;
        let caption = text[body..close].trim();
        (!caption.is_empty()).then_some(caption)
    }
}

/// Final path component of an image `src`.
pub fn basename(src: &str) -> &str {
    src.rsplit('/').next().unwrap_or(src)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_attributes_and_caption() {
        let text = "<figure data-layout=\"center\">\n\
                    <img src=\"/img/a/shot.png\" alt=\"shot\" width=\"600\" />\n\
                    <figcaption>The **login** page</figcaption>\n\
                    </figure>\n";
        let attrs = Figure::attributes(text);
        assert_eq!(attrs["src"], "/img/a/shot.png");
        assert_eq!(attrs["width"], "600");
        assert_eq!(attrs["caption"], "The **login** page");
        assert!(!attrs.contains_key("data-layout"));
    }

    #[test]
    fn basename_of_src() {
        assert_eq!(basename("/a/b/c.png"), "c.png");
        assert_eq!(basename("c.png"), "c.png");
    }
}
