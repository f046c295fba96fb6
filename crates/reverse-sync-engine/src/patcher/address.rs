use crate::mapper::{ADF_EXTENSION, STRUCTURED_MACRO, block_children, content_container, segment_name};
use crate::markup::{Document, NodeId, NodeKind};
use crate::text::patterns;

/// Splits `tag[n]` into its tag and 1-based index.
fn parse_segment(segment: &str) -> Option<(&str, usize)> {
    let caps = patterns::address_segment().captures(segment)?;
    let tag = caps.get(1)?.as_str();
    let n: usize = caps[2].parse().ok()?;
    (n > 0).then_some((tag, n))
}

/// Resolves a mapper address such as `p[3]`, `macro-info[1]/p[2]` or
/// `ul[1]/li[2]/p[1]` against `doc`.
///
/// The first segment counts top-level elements the way the mapper does
/// (layout cells entered, loose text counted as `p`). Each later segment
/// counts direct children, looking inside the body of a macro or extension.
pub fn resolve_address(doc: &Document, address: &str) -> Option<NodeId> {
    let mut segments = address.split('/');
    let (tag, n) = parse_segment(segments.next()?)?;
    let mut current = top_level(doc, tag, n)?;

    for segment in segments {
        let (tag, n) = parse_segment(segment)?;
        let scope = match doc.name(current) {
            Some(STRUCTURED_MACRO | ADF_EXTENSION) => content_container(doc, current)?,
            _ => current,
        };
        current = doc
            .element_children(scope)
            .filter(|&c| doc.name(c) == Some(tag))
            .nth(n - 1)?;
    }
    Some(current)
}

fn top_level(doc: &Document, tag: &str, n: usize) -> Option<NodeId> {
    block_children(doc, doc.root())
        .into_iter()
        .filter(|&c| match &doc.node(c).kind {
            NodeKind::Text(_) => {
                tag == "p" && doc.text(c).is_some_and(|t| !t.trim().is_empty())
            }
            NodeKind::Element(_) => segment_name(doc, c).as_deref() == Some(tag),
            _ => false,
        })
        .nth(n - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::map_document;
    use rstest::rstest;

    const PAGE: &str = concat!(
        "<p>one</p><h2>head</h2>",
        "<ac:structured-macro ac:name=\"note\"><ac:parameter ac:name=\"title\">t</ac:parameter>",
        "<ac:rich-text-body><p>inner one</p><p>inner two</p></ac:rich-text-body></ac:structured-macro>",
        "<ul><li><p>a</p><ol><li><p>a.1</p></li><li><p>a.2</p></li></ol></li></ul>",
        "<ac:layout><ac:layout-section><ac:layout-cell><p>cell</p></ac:layout-cell></ac:layout-section></ac:layout>"
    );

    #[rstest]
    #[case("p[1]", Some("one"))]
    #[case("p[2]", Some("cell"))]
    #[case("h2[1]", Some("head"))]
    #[case("macro-note[1]/p[2]", Some("inner two"))]
    #[case("ul[1]/li[1]/ol[1]/li[2]", Some("a.2"))]
    #[case("ul[1]/li[1]/p[1]", Some("a"))]
    #[case("p[3]", None)]
    #[case("p[0]", None)]
    #[case("macro-info[1]/p[1]", None)]
    #[case("not an address", None)]
    fn resolves(#[case] address: &str, #[case] text: Option<&str>) {
        let doc = Document::parse(PAGE);
        let found = resolve_address(&doc, address).map(|id| doc.text_content(id));
        assert_eq!(found.as_deref(), text);
    }

    #[test]
    fn every_mapper_address_resolves() {
        let doc = Document::parse(PAGE);
        for record in map_document(&doc) {
            assert!(
                resolve_address(&doc, &record.address).is_some(),
                "{} did not resolve",
                record.address
            );
        }
    }
}
