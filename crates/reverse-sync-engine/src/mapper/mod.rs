//! # Target Mapper
//!
//! Flattens a target document into ordered [`TargetElementRecord`]s with
//! positional addresses.
//!
//! ## Addressing
//!
//! A top-level element is addressed `{tag}[{n}]`, where `n` counts earlier
//! siblings with the same tag. Structured macros use `macro-{name}[{n}]` and
//! count only macros of that name. Children of a callout body are addressed
//! `{parent}/{tag}[{n}]`.
//!
//! ## Key Invariants
//!
//! - Layout containers (`ac:layout` > section > cell) produce no record; their
//!   cells' children are walked as if they were top level.
//! - Addresses are unique within one parse.
//! - Plain text substitutes each emoticon with its fallback character.

pub mod record;

use std::collections::HashMap;

use crate::markup::{Document, NodeId, NodeKind};

pub use record::{RecordKind, TargetElementRecord};

/// Macro names whose rich-text bodies get child records.
pub const CALLOUT_MACROS: &[&str] = &["tip", "info", "note", "warning", "panel"];

const CHILD_TAGS: &[&str] = &["p", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "table"];

pub(crate) const STRUCTURED_MACRO: &str = "ac:structured-macro";
pub(crate) const ADF_EXTENSION: &str = "ac:adf-extension";
pub(crate) const MACRO_PREFIX: &str = "macro-";

pub(crate) fn is_heading_tag(tag: &str) -> bool {
    matches!(tag, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

/// Block-level children of `parent`, entering layout cells.
pub fn block_children(doc: &Document, parent: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    for &child in doc.children(parent) {
        if doc.name(child) != Some("ac:layout") {
            out.push(child);
            continue;
        }
        for section in doc.element_children(child) {
            if doc.name(section) != Some("ac:layout-section") {
                continue;
            }
            for cell in doc.element_children(section) {
                if doc.name(cell) == Some("ac:layout-cell") {
                    out.extend_from_slice(doc.children(cell));
                }
            }
        }
    }
    out
}

/// The address segment name of a top-level element.
pub(crate) fn segment_name(doc: &Document, id: NodeId) -> Option<String> {
    let name = doc.name(id)?;
    if name == STRUCTURED_MACRO {
        let macro_name = doc.attr(id, "ac:name").unwrap_or_default();
        return Some(format!("{MACRO_PREFIX}{macro_name}"));
    }
    Some(name.to_string())
}

/// The body holding the child elements of a container element.
pub(crate) fn content_container(doc: &Document, id: NodeId) -> Option<NodeId> {
    if let Some(body) = doc.find_descendant(id, "ac:rich-text-body") {
        return Some(body);
    }
    let node = doc.find_descendant(id, "ac:adf-node")?;
    doc.find_descendant(node, "ac:adf-content")
}

/// The node whose text is an element's plain text: the literal body of a code
/// macro, the rich-text body of a callout macro, otherwise the element itself.
pub fn plain_root(doc: &Document, id: NodeId) -> NodeId {
    if doc.name(id) != Some(STRUCTURED_MACRO) {
        return id;
    }
    let body = match doc.attr(id, "ac:name").unwrap_or_default() {
        "code" => doc.find_descendant(id, "ac:plain-text-body"),
        name if CALLOUT_MACROS.contains(&name) => doc.find_descendant(id, "ac:rich-text-body"),
        _ => None,
    };
    body.unwrap_or(id)
}

/// Trimmed plain text of an element, as recorded by the mapper.
pub fn plain_text(doc: &Document, id: NodeId) -> String {
    doc.text_content(plain_root(doc, id)).trim().to_string()
}

/// The `panel-type` attribute of an `ac:adf-extension`.
pub fn adf_panel_type(doc: &Document, id: NodeId) -> String {
    let Some(node) = doc.find_descendant(id, "ac:adf-node") else {
        return String::new();
    };
    doc.descendants(node)
        .into_iter()
        .find(|&d| {
            doc.name(d) == Some("ac:adf-attribute") && doc.attr(d, "key") == Some("panel-type")
        })
        .map(|attr| doc.text_content(attr).trim().to_string())
        .unwrap_or_default()
}

/// Parses `markup` and records its elements.
pub fn map_target(markup: &str) -> Vec<TargetElementRecord> {
    let doc = Document::parse(markup);
    map_document(&doc)
}

pub fn map_document(doc: &Document) -> Vec<TargetElementRecord> {
    let mut mapper = Mapper::default();
    for child in block_children(doc, doc.root()) {
        mapper.top_level(doc, child);
    }
    mapper.records
}

#[derive(Default)]
struct Mapper {
    records: Vec<TargetElementRecord>,
    counters: HashMap<String, usize>,
}

impl Mapper {
    fn top_level(&mut self, doc: &Document, id: NodeId) {
        let name = match &doc.node(id).kind {
            NodeKind::Text(_) => {
                let text = doc.text(id).unwrap_or_default();
                if !text.trim().is_empty() {
                    self.add("p", RecordKind::Paragraph, &text, &text);
                }
                return;
            }
            NodeKind::Element(data) => data.name.as_str(),
            _ => return,
        };

        match name {
            "p" => {
                self.add(name, RecordKind::Paragraph, &doc.inner_markup(id), &doc.text_content(id));
            }
            n if is_heading_tag(n) => {
                self.add(n, RecordKind::Heading, &doc.inner_markup(id), &doc.text_content(id));
            }
            "ul" | "ol" => {
                let idx = self.add(name, RecordKind::List, &doc.outer_markup(id), &doc.text_content(id));
                self.records[idx].item_texts = list_item_texts(doc, id);
            }
            "table" => {
                self.add(name, RecordKind::Table, &doc.outer_markup(id), &doc.text_content(id));
            }
            STRUCTURED_MACRO => self.structured_macro(doc, id),
            ADF_EXTENSION => {
                let idx = self.add(
                    name,
                    RecordKind::HtmlBlock,
                    &doc.outer_markup(id),
                    &doc.text_content(id),
                );
                if CALLOUT_MACROS.contains(&adf_panel_type(doc, id).as_str()) {
                    self.container_children(doc, content_container(doc, id), idx);
                }
            }
            other => {
                self.add(other, RecordKind::HtmlBlock, &doc.outer_markup(id), &doc.text_content(id));
            }
        }
    }

    fn structured_macro(&mut self, doc: &Document, id: NodeId) {
        let macro_name = doc.attr(id, "ac:name").unwrap_or_default().to_string();
        let segment = format!("{MACRO_PREFIX}{macro_name}");
        let outer = doc.outer_markup(id);

        if macro_name == "code" {
            let plain = doc
                .find_descendant(id, "ac:plain-text-body")
                .map(|body| doc.text_content(body))
                .unwrap_or_default();
            self.add(&segment, RecordKind::Code, &outer, &plain);
            return;
        }

        let idx = self.add(&segment, RecordKind::HtmlBlock, &outer, &plain_text(doc, id));
        if CALLOUT_MACROS.contains(&macro_name.as_str()) {
            self.container_children(doc, doc.find_descendant(id, "ac:rich-text-body"), idx);
        }
    }

    fn container_children(&mut self, doc: &Document, container: Option<NodeId>, parent: usize) {
        let Some(container) = container else {
            return;
        };
        let parent_address = self.records[parent].address.clone();
        let mut counters: HashMap<&str, usize> = HashMap::new();

        for child in doc.element_children(container) {
            let Some(tag) = doc.name(child).filter(|t| CHILD_TAGS.contains(t)) else {
                continue;
            };
            let n = counters.entry(tag).or_default();
            *n += 1;
            let kind = RecordKind::for_child_tag(tag);
            let rich = match kind {
                RecordKind::List | RecordKind::Table => doc.outer_markup(child),
                _ => doc.inner_markup(child),
            };
            let ordinal = self.records.len();
            let id = format!("{}-{}", kind.as_str(), ordinal + 1);
            let item_texts = match kind {
                RecordKind::List => list_item_texts(doc, child),
                _ => Vec::new(),
            };
            self.records.push(TargetElementRecord {
                id: id.clone(),
                kind,
                address: format!("{parent_address}/{tag}[{n}]"),
                rich_text: rich.trim().to_string(),
                plain_text: doc.text_content(child).trim().to_string(),
                ordinal,
                child_ids: Vec::new(),
                item_texts,
            });
            self.records[parent].child_ids.push(id);
        }
    }

    /// Appends a top-level record and returns its index.
    fn add(&mut self, segment: &str, kind: RecordKind, rich: &str, plain: &str) -> usize {
        let n = self.counters.entry(segment.to_string()).or_default();
        *n += 1;
        let ordinal = self.records.len();
        self.records.push(TargetElementRecord {
            id: format!("{}-{}", kind.as_str(), ordinal + 1),
            kind,
            address: format!("{segment}[{n}]"),
            rich_text: rich.trim().to_string(),
            plain_text: plain.trim().to_string(),
            ordinal,
            child_ids: Vec::new(),
            item_texts: Vec::new(),
        });
        ordinal
    }
}

fn list_item_texts(doc: &Document, list: NodeId) -> Vec<String> {
    doc.element_children(list)
        .filter(|&li| doc.name(li) == Some("li"))
        .map(|li| doc.text_content(li).trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn addresses(records: &[TargetElementRecord]) -> Vec<&str> {
        records.iter().map(|r| r.address.as_str()).collect()
    }

    #[test]
    fn top_level_addresses_count_per_tag() {
        let records = map_target("<h2>A</h2><p>one</p><p>two</p><ul><li><p>x</p></li></ul>");
        assert_eq!(addresses(&records), vec!["h2[1]", "p[1]", "p[2]", "ul[1]"]);
        assert_eq!(records[0].kind, RecordKind::Heading);
        assert_eq!(records[2].id, "paragraph-3");
        assert_eq!(records[3].rich_text, "<ul><li><p>x</p></li></ul>");
        assert_eq!(records[3].item_texts, vec!["x"]);
    }

    #[test]
    fn paragraph_keeps_inner_markup() {
        let records = map_target("<p>Hello <strong>big</strong> world</p>");
        assert_eq!(records[0].rich_text, "Hello <strong>big</strong> world");
        assert_eq!(records[0].plain_text, "Hello big world");
    }

    #[test]
    fn code_macro_plain_text_is_body() {
        let records = map_target(concat!(
            r#"<ac:structured-macro ac:name="code"><ac:parameter ac:name="language">sh</ac:parameter>"#,
            "<ac:plain-text-body><![CDATA[ls -la]]></ac:plain-text-body></ac:structured-macro>"
        ));
        assert_eq!(records[0].address, "macro-code[1]");
        assert_eq!(records[0].kind, RecordKind::Code);
        assert_eq!(records[0].plain_text, "ls -la");
    }

    #[test]
    fn callout_children_are_recorded() {
        let records = map_target(concat!(
            r#"<ac:structured-macro ac:name="info"><ac:parameter ac:name="title">T</ac:parameter>"#,
            "<ac:rich-text-body><p>First</p><p>Second <ac:emoticon ac:name=\"tick\" ac:emoji-fallback=\"✅\" /></p>",
            "<ul><li>x</li></ul></ac:rich-text-body></ac:structured-macro>"
        ));
        assert_eq!(
            addresses(&records),
            vec!["macro-info[1]", "macro-info[1]/p[1]", "macro-info[1]/p[2]", "macro-info[1]/ul[1]"]
        );
        assert_eq!(records[0].plain_text, "FirstSecond ✅x");
        assert_eq!(records[0].child_ids, vec!["paragraph-2", "paragraph-3", "list-4"]);
        assert_eq!(records[2].plain_text, "Second ✅");
        assert_eq!(records[2].parent_address(), Some("macro-info[1]"));
    }

    #[test]
    fn non_callout_macro_has_no_children() {
        let records = map_target(
            r#"<ac:structured-macro ac:name="expand"><ac:rich-text-body><p>x</p></ac:rich-text-body></ac:structured-macro>"#,
        );
        assert_eq!(addresses(&records), vec!["macro-expand[1]"]);
        assert!(!records[0].has_children());
    }

    #[test]
    fn adf_panel_children() {
        let records = map_target(concat!(
            "<ac:adf-extension><ac:adf-node type=\"panel\">",
            "<ac:adf-attribute key=\"panel-type\">note</ac:adf-attribute>",
            "<ac:adf-content><p>Inside</p></ac:adf-content></ac:adf-node></ac:adf-extension>"
        ));
        assert_eq!(addresses(&records), vec!["ac:adf-extension[1]", "ac:adf-extension[1]/p[1]"]);
    }

    #[test]
    fn layout_cells_are_flattened() {
        let records = map_target(concat!(
            "<ac:layout><ac:layout-section><ac:layout-cell><p>a</p></ac:layout-cell>",
            "<ac:layout-cell><p>b</p></ac:layout-cell></ac:layout-section></ac:layout>",
            "<p>c</p>"
        ));
        assert_eq!(addresses(&records), vec!["p[1]", "p[2]", "p[3]"]);
    }

    #[test]
    fn bare_top_level_text_is_paragraph() {
        let records = map_target("loose text\n<p>x</p>");
        assert_eq!(addresses(&records), vec!["p[1]", "p[2]"]);
        assert_eq!(records[0].plain_text, "loose text");
    }
}
