//! # Structural Patcher
//!
//! Applies [`PatchOperation`]s to target markup.
//!
//! ## Key Invariants
//!
//! - Every address is resolved against the unmodified tree before anything
//!   changes, so deletes and inserts in one batch never shift the elements
//!   later operations refer to.
//! - Operations apply in a fixed order: deletes, inserts, modifications.
//! - A modification only applies while the element still shows the plain text
//!   the patch was built against; otherwise it is skipped. Applying a batch a
//!   second time is therefore a no-op for modifications.
//! - Bytes outside the touched elements are preserved exactly.

mod address;
mod text;

use std::collections::HashMap;

use crate::mapper::{block_children, plain_root, plain_text};
use crate::markup::{Document, NodeId};
use crate::patch::PatchOperation;
use crate::text::collapse_ws;

pub use address::resolve_address;
pub use text::{apply_text_changes, map_text_range, replace_code_body};

use text::PLAIN_TEXT_BODY;

/// What happened to one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub applied: usize,
    /// Addresses that did not resolve or no longer showed the expected text.
    pub skipped: Vec<String>,
}

/// Applies `patches` to `markup` and returns the patched markup.
pub fn apply_patches(markup: &str, patches: &[PatchOperation]) -> String {
    apply_patches_with_report(markup, patches).0
}

pub fn apply_patches_with_report(markup: &str, patches: &[PatchOperation]) -> (String, ApplyReport) {
    let mut doc = Document::parse(markup);
    let report = apply_to_document(&mut doc, patches);
    (doc.serialize(), report)
}

/// Applies `patches` to an already parsed document.
pub fn apply_to_document(doc: &mut Document, patches: &[PatchOperation]) -> ApplyReport {
    let resolved: Vec<Option<NodeId>> = patches
        .iter()
        .map(|p| p.address().and_then(|a| resolve_address(doc, a)))
        .collect();
    let front = block_children(doc, doc.root())
        .into_iter()
        .find(|&c| doc.is_element(c));

    let mut report = ApplyReport::default();

    for (patch, &node) in patches.iter().zip(&resolved) {
        if let PatchOperation::Delete { address } = patch {
            match node {
                Some(id) => {
                    doc.detach(id);
                    report.applied += 1;
                }
                None => report.miss(address),
            }
        }
    }

    // Inserts sharing an anchor are chained in batch order.
    let mut tails: HashMap<Option<NodeId>, NodeId> = HashMap::new();
    for (patch, &node) in patches.iter().zip(&resolved) {
        let PatchOperation::Insert { after, markup } = patch else {
            continue;
        };
        if after.is_some() && node.is_none() {
            report.miss(after.as_deref().unwrap_or_default());
            continue;
        }
        let nodes = doc.parse_fragment(markup);
        let Some(&last) = nodes.last() else {
            continue;
        };
        match (tails.get(&node).copied(), node) {
            (Some(tail), _) | (None, Some(tail)) => {
                let mut prev = tail;
                for &n in &nodes {
                    doc.insert_after(prev, n);
                    prev = n;
                }
            }
            (None, None) => match front {
                Some(first) => {
                    for &n in &nodes {
                        doc.insert_before(first, n);
                    }
                }
                None => {
                    let root = doc.root();
                    for &n in &nodes {
                        doc.append_child(root, n);
                    }
                }
            },
        }
        tails.insert(node, last);
        report.applied += 1;
    }

    for (patch, &node) in patches.iter().zip(&resolved) {
        let (address, old_plain, edit) = match patch {
            PatchOperation::ModifyText {
                address,
                old_plain,
                new_plain,
            } => (address, old_plain, Edit::Text(new_plain)),
            PatchOperation::ModifyInner {
                address,
                old_plain,
                new_inner,
            } => (address, old_plain, Edit::Inner(new_inner)),
            _ => continue,
        };
        let Some(id) = node else {
            report.miss(address);
            continue;
        };
        let live = plain_text(doc, id);
        if collapse_ws(&live) != collapse_ws(old_plain) {
            log::debug!("{address} no longer shows the expected text, skipped");
            report.skipped.push(address.clone());
            continue;
        }
        match edit {
            Edit::Text(new_plain) => {
                let root = plain_root(doc, id);
                if doc.name(root) == Some(PLAIN_TEXT_BODY) {
                    replace_code_body(doc, root, new_plain);
                } else {
                    apply_text_changes(doc, root, &live, new_plain);
                }
            }
            Edit::Inner(new_inner) => doc.replace_children(id, new_inner),
        }
        report.applied += 1;
    }

    log::debug!(
        "applied {} of {} patches, {} skipped",
        report.applied,
        patches.len(),
        report.skipped.len()
    );
    report
}

enum Edit<'p> {
    Text(&'p str),
    Inner(&'p str),
}

impl ApplyReport {
    fn miss(&mut self, address: &str) {
        log::debug!("{address} did not resolve");
        self.skipped.push(address.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn modify(address: &str, old: &str, new: &str) -> PatchOperation {
        PatchOperation::ModifyText {
            address: address.into(),
            old_plain: old.into(),
            new_plain: new.into(),
        }
    }

    #[test]
    fn per_item_edits_do_not_leak() {
        let markup = "<ul><li><p>item A text</p></li><li><p>item B text</p></li></ul>";
        let patched = apply_patches(
            markup,
            &[
                modify("ul[1]/li[1]", "item A text", "item A text appended"),
                modify("ul[1]/li[2]", "item B text", "item B text modified"),
            ],
        );
        assert_eq!(
            patched,
            "<ul><li><p>item A text appended</p></li><li><p>item B text modified</p></li></ul>"
        );
    }

    #[test]
    fn only_the_edited_occurrence_changes() {
        let markup = concat!(
            "<p>Uploads are capped at <strong>700MB</strong> per file. ",
            "Archives over 700MB are rejected.</p>"
        );
        let patched = apply_patches(
            markup,
            &[modify(
                "p[1]",
                "Uploads are capped at 700MB per file. Archives over 700MB are rejected.",
                "Uploads are capped at 700MB per file. Archives over 700MB are split.",
            )],
        );
        assert_eq!(
            patched,
            concat!(
                "<p>Uploads are capped at <strong>700MB</strong> per file. ",
                "Archives over 700MB are split.</p>"
            )
        );
    }

    #[test]
    fn code_macro_body_is_edited_in_place() {
        let markup = concat!(
            "<ac:structured-macro ac:name=\"code\"><ac:parameter ac:name=\"language\">sh</ac:parameter>",
            "<ac:plain-text-body><![CDATA[ls -la]]></ac:plain-text-body></ac:structured-macro>"
        );
        let patched = apply_patches(markup, &[modify("macro-code[1]", "ls -la", "ls -lah")]);
        assert_eq!(patched, markup.replace("ls -la", "ls -lah"));
    }

    #[test]
    fn multi_line_code_body_keeps_its_layout() {
        let markup = concat!(
            "<ac:structured-macro ac:name=\"code\">",
            "<ac:plain-text-body><![CDATA[echo a\n    echo b\n- item **kw** <x>]]></ac:plain-text-body>",
            "</ac:structured-macro>"
        );
        let (patched, report) = apply_patches_with_report(
            markup,
            &[modify(
                "macro-code[1]",
                "echo a\n    echo b\n- item **kw** <x>",
                "echo A\n    echo b\n- item **kw** <x>",
            )],
        );
        assert_eq!(report.applied, 1);
        assert_eq!(patched, markup.replace("echo a", "echo A"));
    }

    #[test]
    fn code_body_with_cdata_terminator_is_split() {
        let markup = "<ac:structured-macro ac:name=\"code\"><ac:plain-text-body><![CDATA[a]]></ac:plain-text-body></ac:structured-macro>";
        let patched = apply_patches(markup, &[modify("macro-code[1]", "a", "x]]>y")]);
        assert!(patched.contains("<![CDATA[x]]]]><![CDATA[>y]]>"));
        let doc = Document::parse(&patched);
        let code = doc.find_child(doc.root(), "ac:structured-macro").unwrap();
        assert_eq!(doc.text_content(code), "x]]>y");
    }

    #[test]
    fn stale_old_text_is_skipped() {
        let markup = "<p>hand edited</p>";
        let (patched, report) =
            apply_patches_with_report(markup, &[modify("p[1]", "original", "changed")]);
        assert_eq!(patched, markup);
        assert_eq!(report.skipped, vec!["p[1]"]);
        assert_eq!(report.applied, 0);
    }

    #[test]
    fn applying_twice_is_a_no_op() {
        let markup = "<h2>Title</h2><p>Para one.</p><ul><li><p>a</p></li></ul>";
        let patches = vec![
            modify("p[1]", "Para one.", "Para ONE."),
            PatchOperation::ModifyInner {
                address: "ul[1]".into(),
                old_plain: "a".into(),
                new_inner: "<li><p>a</p></li><li><p>b</p></li>".into(),
            },
        ];
        let once = apply_patches(markup, &patches);
        assert_eq!(apply_patches(&once, &patches), once);
    }

    #[test]
    fn addresses_resolve_before_deletes() {
        let markup = "<p>one</p><p>two</p><p>three</p>";
        let patched = apply_patches(
            markup,
            &[
                PatchOperation::Delete {
                    address: "p[1]".into(),
                },
                modify("p[3]", "three", "THREE"),
            ],
        );
        assert_eq!(patched, "<p>two</p><p>THREE</p>");
    }

    #[test]
    fn inserts_keep_batch_order() {
        let markup = "<h2>A</h2><p>one</p>";
        let patched = apply_patches(
            markup,
            &[
                PatchOperation::Insert {
                    after: Some("h2[1]".into()),
                    markup: "<p>x</p>".into(),
                },
                PatchOperation::Insert {
                    after: Some("h2[1]".into()),
                    markup: "<p>y</p>".into(),
                },
                PatchOperation::Insert {
                    after: None,
                    markup: "<p>first</p>".into(),
                },
            ],
        );
        assert_eq!(patched, "<p>first</p><h2>A</h2><p>x</p><p>y</p><p>one</p>");
    }

    #[test]
    fn modify_inner_replaces_children() {
        let markup = "<p>plain words</p>";
        let patched = apply_patches(
            markup,
            &[PatchOperation::ModifyInner {
                address: "p[1]".into(),
                old_plain: "plain words".into(),
                new_inner: "plain <strong>words</strong>".into(),
            }],
        );
        assert_eq!(patched, "<p>plain <strong>words</strong></p>");
    }
}
