//! List strategies.
//!
//! A list element is patched one `li` at a time so that an edit at the end of
//! one item never bleeds into its neighbour. When the item structure no longer
//! lines up, the whole list (or item) is re-rendered.

use crate::blocks::kinds::ListItem;
use crate::blocks::{Block, BlockKind};
use crate::mapper::{RecordKind, TargetElementRecord, plain_text};
use crate::markup::NodeId;
use crate::patcher::resolve_address;
use crate::render::{paragraph_text, render_inline, render_list_inner};
use crate::text::normalize_to_plain;

use super::{
    Batch, Edit, Planner, Strategy, contained_in, emit_element_patch, find_containing,
    has_inline_boundary_change, has_inline_format_change, resolve_child,
};

/// Item text without its marker, lines joined.
fn item_body(item: &str) -> String {
    paragraph_text(ListItem::strip_marker(item.trim_start()))
}

fn item_plain(item: &str) -> String {
    normalize_to_plain(item, &BlockKind::List)
}

/// Inner markup of the single `li` rendered for `item`.
fn item_inner(item: &str) -> String {
    let rendered = render_list_inner(item);
    match rendered
        .strip_prefix("<li>")
        .and_then(|r| r.strip_suffix("</li>"))
    {
        Some(inner) => inner.to_string(),
        None => rendered,
    }
}

/// Direct patch on a mapped list element.
pub(crate) fn plan_list_record(
    planner: &Planner<'_>,
    record: &TargetElementRecord,
    old: &Block,
    new: &Block,
    batch: &mut Batch,
) {
    let old_items = ListItem::split_top_level(&old.text);
    let new_items = ListItem::split_top_level(&new.text);
    let list = resolve_address(planner.doc, &record.address);

    let Some(list) = list.filter(|_| {
        old_items.len() == new_items.len() && old_items.len() == record.item_texts.len()
    }) else {
        log::debug!(
            "{}: {} → {} items, re-rendering the list",
            record.address,
            old_items.len(),
            new_items.len()
        );
        rebuild_list(record, old, new, batch);
        return;
    };

    let items: Vec<NodeId> = planner
        .doc
        .element_children(list)
        .filter(|&c| planner.doc.name(c) == Some("li"))
        .collect();
    for (k, (o, n)) in old_items.iter().zip(&new_items).enumerate() {
        if o != n {
            let address = format!("{}/li[{}]", record.address, k + 1);
            plan_item(planner, &address, items[k], o, n, batch);
        }
    }
}

fn rebuild_list(record: &TargetElementRecord, old: &Block, new: &Block, batch: &mut Batch) {
    emit_element_patch(
        batch,
        Strategy::List,
        &record.address,
        &record.plain_text,
        Edit {
            old_plain: item_plain(&old.text),
            new_plain: item_plain(&new.text),
            new_inner: Some(render_list_inner(&new.text)),
        },
    );
}

/// Patches one `li` at `address`, descending into nested lists.
fn plan_item(
    planner: &Planner<'_>,
    address: &str,
    li: NodeId,
    old_item: &str,
    new_item: &str,
    batch: &mut Batch,
) {
    let doc = planner.doc;
    let first_p = doc.element_children(li).find(|&c| doc.name(c) == Some("p"));

    if !ListItem::has_nested_items(old_item) && !ListItem::has_nested_items(new_item) {
        let (old_body, new_body) = (item_body(old_item), item_body(new_item));
        let new_inner = has_inline_format_change(&old_body, &new_body).then(|| {
            let inline = render_inline(&new_body);
            match first_p {
                Some(_) => format!("<p>{inline}</p>"),
                None => inline,
            }
        });
        emit_element_patch(
            batch,
            Strategy::List,
            address,
            &plain_text(doc, li),
            Edit {
                old_plain: item_plain(old_item),
                new_plain: item_plain(new_item),
                new_inner,
            },
        );
        return;
    }

    let old_subs = ListItem::sub_items(old_item);
    let new_subs = ListItem::sub_items(new_item);
    let sublist = doc
        .element_children(li)
        .find(|&c| matches!(doc.name(c), Some("ul" | "ol")));
    let sub_lis: Vec<NodeId> = sublist.map_or_else(Vec::new, |s| {
        doc.element_children(s)
            .filter(|&c| doc.name(c) == Some("li"))
            .collect()
    });
    let (Some(sublist), Some(first_p)) = (sublist, first_p) else {
        rebuild_item(planner, address, li, new_item, batch);
        return;
    };
    if old_subs.len() != new_subs.len() || sub_lis.len() != old_subs.len() {
        rebuild_item(planner, address, li, new_item, batch);
        return;
    }

    let (old_first, new_first) = (ListItem::first_line(old_item), ListItem::first_line(new_item));
    if old_first != new_first {
        let new_inner = has_inline_format_change(old_first, new_first).then(|| render_inline(new_first));
        emit_element_patch(
            batch,
            Strategy::List,
            &format!("{address}/p[1]"),
            &plain_text(doc, first_p),
            Edit {
                old_plain: normalize_to_plain(old_first, &BlockKind::Paragraph),
                new_plain: normalize_to_plain(new_first, &BlockKind::Paragraph),
                new_inner,
            },
        );
    }

    let tag = doc.name(sublist).unwrap_or("ul");
    for (k, (o, n)) in old_subs.iter().zip(&new_subs).enumerate() {
        if o != n {
            let sub_address = format!("{address}/{tag}[1]/li[{}]", k + 1);
            plan_item(planner, &sub_address, sub_lis[k], o, n, batch);
        }
    }
}

fn rebuild_item(planner: &Planner<'_>, address: &str, li: NodeId, new_item: &str, batch: &mut Batch) {
    log::debug!("{address}: nested structure changed, re-rendering the item");
    let current = plain_text(planner.doc, li);
    emit_element_patch(
        batch,
        Strategy::List,
        address,
        &current,
        Edit {
            old_plain: current.clone(),
            new_plain: item_plain(new_item),
            new_inner: Some(item_inner(new_item)),
        },
    );
}

/// A list block without an element of its own: each changed item is matched
/// against the children of `parent`, or against any element containing it.
pub(crate) fn plan_list_items(
    planner: &Planner<'_>,
    position: usize,
    parent: Option<&TargetElementRecord>,
    old: &Block,
    new: &Block,
    batch: &mut Batch,
) {
    let old_items = ListItem::split_items(&old.text);
    let new_items = ListItem::split_items(&new.text);
    if old_items.len() != new_items.len() {
        match parent {
            Some(list) if list.kind == RecordKind::List => rebuild_list(list, old, new, batch),
            _ => batch.skip(position, "list item count changed"),
        }
        return;
    }

    let children = parent.map_or_else(Vec::new, |p| planner.index.children(p));
    for (o, n) in old_items.iter().zip(&new_items) {
        if o == n {
            continue;
        }
        let (old_plain, new_plain) = (item_plain(o), item_plain(n));

        if let Some(child) = resolve_child(&old_plain, &children) {
            planner.claim(child, batch);
            let new_inner = (child.kind == RecordKind::Paragraph && has_inline_format_change(o, n))
                .then(|| render_inline(&item_body(n)));
            emit_element_patch(
                batch,
                Strategy::List,
                &child.address,
                &child.plain_text,
                Edit {
                    old_plain,
                    new_plain,
                    new_inner,
                },
            );
            continue;
        }

        if let Some(list) = parent.filter(|p| p.kind == RecordKind::List)
            && has_inline_boundary_change(&item_body(o), &item_body(n))
        {
            rebuild_list(list, old, new, batch);
            return;
        }

        let container = parent
            .filter(|p| contained_in(&old_plain, p))
            .or_else(|| find_containing(&old_plain, planner.index.records(), &batch.used));
        match container {
            Some(record) => batch.group(&record.address, Strategy::List, old_plain, new_plain),
            None => batch.skip(position, "list item has no containing element"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{entry, plan, plan_with};
    use super::super::{PatchOperation, Strategy};
    use pretty_assertions::assert_eq;

    const TWO_ITEMS: &str = "<ul><li><p>item A text</p></li><li><p>item B text</p></li></ul>";

    #[test]
    fn each_item_gets_its_own_patch() {
        let plan = plan(
            "- item A text\n- item B text\n",
            "- item A text appended\n- item B text modified\n",
            TWO_ITEMS,
        );
        assert_eq!(
            plan.operations(),
            vec![
                PatchOperation::ModifyText {
                    address: "ul[1]/li[1]".into(),
                    old_plain: "item A text".into(),
                    new_plain: "item A text appended".into(),
                },
                PatchOperation::ModifyText {
                    address: "ul[1]/li[2]".into(),
                    old_plain: "item B text".into(),
                    new_plain: "item B text modified".into(),
                },
            ]
        );
        assert!(plan.patches.iter().all(|p| p.strategy == Strategy::List));
    }

    #[test]
    fn item_count_change_rerenders_list() {
        let plan = plan(
            "- item A text\n- item B text\n",
            "- item A text\n- item B text\n- item C text\n",
            TWO_ITEMS,
        );
        assert_eq!(plan.operations().len(), 1);
        let PatchOperation::ModifyInner { address, new_inner, .. } = &plan.operations()[0] else {
            panic!("expected ModifyInner");
        };
        assert_eq!(address, "ul[1]");
        assert_eq!(new_inner.matches("<li>").count(), 3);
    }

    #[test]
    fn item_format_change_rerenders_item() {
        let plan = plan(
            "- item A text\n- item B text\n",
            "- item A **text**\n- item B text\n",
            TWO_ITEMS,
        );
        assert_eq!(
            plan.operations(),
            vec![PatchOperation::ModifyInner {
                address: "ul[1]/li[1]".into(),
                old_plain: "item A text".into(),
                new_inner: "<p>item A <strong>text</strong></p>".into(),
            }]
        );
    }

    #[test]
    fn nested_item_patches_reach_sub_items() {
        let target = concat!(
            "<ol><li><p>Parent step</p><ol><li><p>Child one</p></li>",
            "<li><p>Child two</p></li></ol></li></ol>"
        );
        let plan = plan_with(
            "1. Parent step\n    1. Child one\n    2. Child two\n",
            "1. Parent step\n    1. Child one\n    2. Child two revised\n",
            target,
            Some(vec![entry("ol[1]", &[0])]),
        );
        assert_eq!(
            plan.operations(),
            vec![PatchOperation::ModifyText {
                address: "ol[1]/li[1]/ol[1]/li[2]".into(),
                old_plain: "Child two".into(),
                new_plain: "Child two revised".into(),
            }]
        );
    }

    #[test]
    fn list_inside_callout_patches_its_item() {
        let target = concat!(
            "<ac:structured-macro ac:name=\"tip\"><ac:rich-text-body>",
            "<p>Intro sentence.</p><ul><li><p>first entry</p></li></ul>",
            "</ac:rich-text-body></ac:structured-macro>"
        );
        let previous = "<Callout type=\"tip\">\nIntro sentence.\n\n- first entry\n</Callout>\n";
        let next = "<Callout type=\"tip\">\nIntro sentence.\n\n- first entry edited\n</Callout>\n";
        let plan = plan(previous, next, target);
        assert_eq!(
            plan.operations(),
            vec![PatchOperation::ModifyText {
                address: "macro-tip[1]/ul[1]/li[1]".into(),
                old_plain: "first entry".into(),
                new_plain: "first entry edited".into(),
            }]
        );
    }
}
