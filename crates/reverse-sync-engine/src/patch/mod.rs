//! # Patch Builder
//!
//! Turns block changes into [`PatchOperation`]s addressed at target elements.
//!
//! ## Strategy Ladder
//!
//! A modified block is resolved by trying each rung of [`LADDER`] in order;
//! the first rung that answers decides the strategy:
//!
//! 1. the mapped element has children and one of them matches the old text;
//! 2. the mapped element has children, the block is a list and its text is
//!    not inside the element: patch item by item;
//! 3. the mapped element has children: accumulate into the element;
//! 4. nothing is mapped: search for an unused element containing the text;
//! 5. nothing is mapped: list or table item strategies, else skip;
//! 6. the mapped element does not contain the old text: look for a better one;
//! 7. patch the mapped element directly.
//!
//! ## Key Invariants
//!
//! - The used-address set lives in the [`Batch`] of one `build_patches` call.
//! - A patch never claims an element whose text already shows the new text.
//! - Containing edits on one element are folded into a single patch, applied
//!   in change order.

pub mod inline;
mod list;
pub mod resolve;
mod table;

use std::collections::HashSet;

use serde::Serialize;

use crate::blocks::kinds::Table;
use crate::blocks::{Block, BlockKind};
use crate::diff::{Alignment, BlockChange, ChangeKind};
use crate::mapper::{RecordKind, TargetElementRecord};
use crate::markup::Document;
use crate::render::{RenderContext, paragraph_text, render_block, render_heading_inline, render_inline};
use crate::sidecar::SidecarIndex;
use crate::text::{collapse_ws, normalize_to_plain, patterns, strip_for_compare, transfer_text_changes};

pub use inline::{has_inline_boundary_change, has_inline_format_change};
pub use resolve::{contained_in, find_containing, resolve_child};

/// One edit of the target document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PatchOperation {
    Delete {
        address: String,
    },
    /// `after: None` inserts before the first block element.
    Insert {
        after: Option<String>,
        markup: String,
    },
    ModifyText {
        address: String,
        old_plain: String,
        new_plain: String,
    },
    ModifyInner {
        address: String,
        old_plain: String,
        new_inner: String,
    },
}

impl PatchOperation {
    /// The element the operation is resolved against.
    pub fn address(&self) -> Option<&str> {
        match self {
            PatchOperation::Delete { address }
            | PatchOperation::ModifyText { address, .. }
            | PatchOperation::ModifyInner { address, .. } => Some(address),
            PatchOperation::Insert { after, .. } => after.as_deref(),
        }
    }
}

/// How a patch was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Direct,
    Containing,
    List,
    Table,
    Insert,
    Delete,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Direct => "direct",
            Strategy::Containing => "containing",
            Strategy::List => "list",
            Strategy::Table => "table",
            Strategy::Insert => "insert",
            Strategy::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedPatch {
    pub strategy: Strategy,
    #[serde(flatten)]
    pub operation: PatchOperation,
}

/// A change that produced no patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedChange {
    pub position: usize,
    pub reason: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatchPlan {
    pub patches: Vec<PlannedPatch>,
    pub skipped: Vec<SkippedChange>,
}

impl PatchPlan {
    pub fn operations(&self) -> Vec<PatchOperation> {
        self.patches.iter().map(|p| p.operation.clone()).collect()
    }
}

/// Edits queued on one containing element.
#[derive(Debug)]
struct Group {
    address: String,
    strategy: Strategy,
    edits: Vec<(String, String)>,
}

/// Mutable state of one batch.
#[derive(Debug, Default)]
pub(crate) struct Batch {
    /// Addresses already claimed by a direct patch.
    pub(crate) used: HashSet<String>,
    groups: Vec<Group>,
    plan: PatchPlan,
}

impl Batch {
    pub(crate) fn push(&mut self, strategy: Strategy, operation: PatchOperation) {
        log::debug!(
            "{} patch on {}",
            strategy.as_str(),
            operation.address().unwrap_or("<start>")
        );
        self.plan.patches.push(PlannedPatch {
            strategy,
            operation,
        });
    }

    /// Queues an edit on a containing element. The first edit queued on an
    /// element decides the strategy label of its patch.
    pub(crate) fn group(&mut self, address: &str, strategy: Strategy, old_plain: String, new_plain: String) {
        log::debug!("{} edit queued on {address}", strategy.as_str());
        match self.groups.iter_mut().find(|g| g.address == address) {
            Some(group) => group.edits.push((old_plain, new_plain)),
            None => self.groups.push(Group {
                address: address.to_string(),
                strategy,
                edits: vec![(old_plain, new_plain)],
            }),
        }
    }

    pub(crate) fn skip(&mut self, position: usize, reason: &'static str) {
        log::debug!("change at block {position} skipped: {reason}");
        self.plan.skipped.push(SkippedChange { position, reason });
    }
}

/// An edit of one element's text, with the inner markup to use when inline
/// formatting changed.
pub(crate) struct Edit {
    pub(crate) old_plain: String,
    pub(crate) new_plain: String,
    pub(crate) new_inner: Option<String>,
}

/// Emits a text or inner-markup patch on one element whose live plain text is
/// `current`, or nothing when the element already shows the new text.
pub(crate) fn emit_element_patch(
    batch: &mut Batch,
    strategy: Strategy,
    address: &str,
    current: &str,
    edit: Edit,
) {
    let old_c = collapse_ws(&edit.old_plain);
    let new_c = collapse_ws(&edit.new_plain);
    let cur_c = collapse_ws(current);
    if old_c == new_c && edit.new_inner.is_none() {
        return;
    }
    if old_c != cur_c && new_c == cur_c {
        log::debug!("{address} already shows the new text");
        return;
    }
    if let Some(new_inner) = edit.new_inner {
        batch.push(
            strategy,
            PatchOperation::ModifyInner {
                address: address.to_string(),
                old_plain: current.to_string(),
                new_inner,
            },
        );
        return;
    }
    let new_plain = if old_c != cur_c {
        transfer_text_changes(&edit.old_plain, &edit.new_plain, current)
    } else {
        edit.new_plain
    };
    if new_plain == current {
        return;
    }
    batch.push(
        strategy,
        PatchOperation::ModifyText {
            address: address.to_string(),
            old_plain: current.to_string(),
            new_plain,
        },
    );
}

/// Where a modified block's edit goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Resolution<'a> {
    Direct(&'a TargetElementRecord),
    Containing(&'a TargetElementRecord),
    ListItems(Option<&'a TargetElementRecord>),
    TableRows(Option<&'a TargetElementRecord>),
    Skip(&'static str),
}

/// What the ladder knows about one modified block.
pub(crate) struct Probe<'p, 'a> {
    old_plain: &'p str,
    block: &'p Block,
    mapped: Option<&'a TargetElementRecord>,
    used: &'p HashSet<String>,
}

type Rung = for<'a, 'p> fn(&Planner<'a>, &Probe<'p, 'a>) -> Option<Resolution<'a>>;

/// The strategy ladder, tried top to bottom.
const LADDER: [Rung; 7] = [
    try_child,
    try_list_in_container,
    try_container,
    try_unmapped_containing,
    try_unmapped_kind,
    try_stale_address,
    try_direct,
];

fn with_children<'a>(probe: &Probe<'_, 'a>) -> Option<&'a TargetElementRecord> {
    probe.mapped.filter(|r| r.has_children())
}

fn try_child<'a>(planner: &Planner<'a>, probe: &Probe<'_, 'a>) -> Option<Resolution<'a>> {
    let parent = with_children(probe)?;
    let children = planner.index.children(parent);
    resolve_child(probe.old_plain, &children).map(Resolution::Direct)
}

fn try_list_in_container<'a>(_: &Planner<'a>, probe: &Probe<'_, 'a>) -> Option<Resolution<'a>> {
    let parent = with_children(probe)?;
    (probe.block.kind == BlockKind::List && !contained_in(probe.old_plain, parent))
        .then_some(Resolution::ListItems(Some(parent)))
}

fn try_container<'a>(_: &Planner<'a>, probe: &Probe<'_, 'a>) -> Option<Resolution<'a>> {
    with_children(probe).map(Resolution::Containing)
}

fn try_unmapped_containing<'a>(
    planner: &Planner<'a>,
    probe: &Probe<'_, 'a>,
) -> Option<Resolution<'a>> {
    if probe.mapped.is_some() {
        return None;
    }
    find_containing(probe.old_plain, planner.index.records(), probe.used).map(Resolution::Containing)
}

fn try_unmapped_kind<'a>(_: &Planner<'a>, probe: &Probe<'_, 'a>) -> Option<Resolution<'a>> {
    if probe.mapped.is_some() {
        return None;
    }
    Some(match probe.block.kind {
        BlockKind::List => Resolution::ListItems(None),
        BlockKind::Table if Table::is_markdown_table(&probe.block.text) => {
            Resolution::TableRows(None)
        }
        _ => Resolution::Skip("no mapped element"),
    })
}

fn try_stale_address<'a>(planner: &Planner<'a>, probe: &Probe<'_, 'a>) -> Option<Resolution<'a>> {
    let mapped = probe.mapped?;
    if contained_in(probe.old_plain, mapped) {
        return None;
    }
    find_containing(probe.old_plain, planner.index.records(), probe.used)
        .filter(|better| better.address != mapped.address)
        .map(Resolution::Containing)
}

fn try_direct<'a>(_: &Planner<'a>, probe: &Probe<'_, 'a>) -> Option<Resolution<'a>> {
    probe.mapped.map(Resolution::Direct)
}

/// Read-only inputs of one batch.
pub(crate) struct Planner<'a> {
    pub(crate) index: &'a SidecarIndex,
    pub(crate) doc: &'a Document,
    pub(crate) alignment: &'a Alignment,
    pub(crate) ctx: &'a RenderContext,
}

/// Builds the patches for `changes` against the parsed target `doc`.
pub fn build_patches(
    changes: &[BlockChange],
    alignment: &Alignment,
    index: &SidecarIndex,
    doc: &Document,
    ctx: &RenderContext,
) -> PatchPlan {
    let planner = Planner {
        index,
        doc,
        alignment,
        ctx,
    };
    let mut batch = Batch::default();
    for change in changes {
        match change.kind {
            ChangeKind::Deleted => planner.delete(change, &mut batch),
            ChangeKind::Added => planner.insert(change, &mut batch),
            ChangeKind::Modified => planner.modify(change, &mut batch),
        }
    }
    planner.flush_groups(&mut batch);
    log::debug!(
        "{} changes produced {} patches, {} skipped",
        changes.len(),
        batch.plan.patches.len(),
        batch.plan.skipped.len()
    );
    batch.plan
}

impl<'a> Planner<'a> {
    fn delete(&self, change: &BlockChange, batch: &mut Batch) {
        let Some(block) = change.previous.as_ref().filter(|b| b.is_content()) else {
            return;
        };
        match self.index.lookup(change.position) {
            Some(record) if batch.used.insert(record.address.clone()) => batch.push(
                Strategy::Delete,
                PatchOperation::Delete {
                    address: record.address.clone(),
                },
            ),
            Some(_) => {}
            None => {
                log::debug!("deleted {} block has no element", block.kind.name());
                batch.skip(change.position, "no mapped element");
            }
        }
    }

    fn insert(&self, change: &BlockChange, batch: &mut Batch) {
        let Some(block) = change.next.as_ref().filter(|b| b.is_content()) else {
            return;
        };
        let markup = render_block(block, self.ctx);
        if markup.is_empty() {
            batch.skip(change.position, "block renders to nothing");
            return;
        }
        let after = (0..change.position).rev().find_map(|j| {
            let previous = self.alignment.get(&j)?;
            self.index.lookup(*previous).map(|r| r.address.clone())
        });
        batch.push(Strategy::Insert, PatchOperation::Insert { after, markup });
    }

    fn modify(&self, change: &BlockChange, batch: &mut Batch) {
        let (Some(old), Some(new)) = (change.previous.as_ref(), change.next.as_ref()) else {
            return;
        };
        if !old.is_content() {
            return;
        }
        let mapped = self.index.lookup(change.position);

        if let Some(parent) = mapped.filter(|r| r.has_children())
            && old.kind == BlockKind::Callout
            && new.kind == BlockKind::Callout
        {
            let old_children: Vec<&Block> = old.content_children().collect();
            let new_children: Vec<&Block> = new.content_children().collect();
            if old_children.len() == new_children.len() {
                for (o, n) in old_children.into_iter().zip(new_children) {
                    self.modify_block(change.position, o, n, Some(parent), batch);
                }
                return;
            }
        }
        self.modify_block(change.position, old, new, mapped, batch);
    }

    fn modify_block(
        &self,
        position: usize,
        old: &Block,
        new: &Block,
        mapped: Option<&'a TargetElementRecord>,
        batch: &mut Batch,
    ) {
        if old.text == new.text {
            return;
        }
        let old_plain = normalize_to_plain(&old.text, &old.kind);
        let new_plain = normalize_to_plain(&new.text, &new.kind);
        let resolution = {
            let probe = Probe {
                old_plain: &old_plain,
                block: old,
                mapped,
                used: &batch.used,
            };
            LADDER
                .iter()
                .find_map(|rung| rung(self, &probe))
                .unwrap_or(Resolution::Skip("no strategy applies"))
        };
        log::debug!("block {position} resolved as {resolution:?}");

        match resolution {
            Resolution::Direct(record) => {
                self.claim(record, batch);
                if record.kind == RecordKind::List
                    && old.kind == BlockKind::List
                    && new.kind == BlockKind::List
                {
                    list::plan_list_record(self, record, old, new, batch);
                    return;
                }
                // code bodies compare literally; indentation is content
                if record.kind == RecordKind::Code
                    && new.kind == BlockKind::Code
                    && collapse_ws(&old_plain) == collapse_ws(&record.plain_text)
                {
                    if new_plain != record.plain_text {
                        batch.push(
                            Strategy::Direct,
                            PatchOperation::ModifyText {
                                address: record.address.clone(),
                                old_plain: record.plain_text.clone(),
                                new_plain,
                            },
                        );
                    }
                    return;
                }
                let new_inner = match record.kind {
                    RecordKind::Heading | RecordKind::Paragraph
                        if has_inline_format_change(&old.text, &new.text) =>
                    {
                        inline_markup(new)
                    }
                    _ => None,
                };
                emit_element_patch(
                    batch,
                    Strategy::Direct,
                    &record.address,
                    &record.plain_text,
                    Edit {
                        old_plain,
                        new_plain,
                        new_inner,
                    },
                );
            }
            Resolution::Containing(record) => {
                batch.group(&record.address, Strategy::Containing, old_plain, new_plain)
            }
            Resolution::ListItems(parent) => list::plan_list_items(self, position, parent, old, new, batch),
            Resolution::TableRows(container) => {
                table::plan_table_rows(self, position, container, old, new, batch)
            }
            Resolution::Skip(reason) => batch.skip(position, reason),
        }
    }

    /// Marks a record, its children and its parent as used.
    pub(crate) fn claim(&self, record: &TargetElementRecord, batch: &mut Batch) {
        batch.used.insert(record.address.clone());
        for child in self.index.children(record) {
            batch.used.insert(child.address.clone());
        }
        if let Some(parent) = record.parent_address() {
            batch.used.insert(parent.to_string());
        }
    }

    fn flush_groups(&self, batch: &mut Batch) {
        for Group {
            address,
            strategy,
            edits,
        } in std::mem::take(&mut batch.groups)
        {
            let Some(record) = self.index.record(&address) else {
                continue;
            };
            let mut text = record.plain_text.clone();
            for (old, new) in &edits {
                let current = strip_for_compare(&text);
                if !current.contains(&strip_for_compare(old)) && current.contains(&strip_for_compare(new)) {
                    log::debug!("{address} already shows a containing edit");
                    continue;
                }
                text = transfer_text_changes(old, new, &text);
            }
            if text != record.plain_text {
                batch.push(
                    strategy,
                    PatchOperation::ModifyText {
                        address,
                        old_plain: record.plain_text.clone(),
                        new_plain: text,
                    },
                );
            }
        }
    }
}

/// Target inline markup for a heading or paragraph block.
fn inline_markup(block: &Block) -> Option<String> {
    match block.kind {
        BlockKind::Heading => {
            let caps = patterns::heading().captures(block.text.trim())?;
            Some(render_heading_inline(&caps[2]))
        }
        BlockKind::Paragraph => Some(render_inline(&paragraph_text(&block.text))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::parse_blocks;
    use crate::diff::diff_blocks;
    use crate::mapper::map_document;
    use crate::sidecar::{SidecarEntry, match_records};
    use pretty_assertions::assert_eq;

    /// Plans the edit `previous` → `next` against `target`, mapping by text
    /// unless `entries` are given.
    pub(crate) fn plan_with(
        previous: &str,
        next: &str,
        target: &str,
        entries: Option<Vec<SidecarEntry>>,
    ) -> PatchPlan {
        let (prev, next) = (parse_blocks(previous), parse_blocks(next));
        let doc = Document::parse(target);
        let records = map_document(&doc);
        let entries = entries.unwrap_or_else(|| match_records(&records, &prev));
        let index = SidecarIndex::new(&entries, records);
        let (changes, alignment) = diff_blocks(&prev, &next);
        build_patches(&changes, &alignment, &index, &doc, &RenderContext::for_blocks(&next))
    }

    pub(crate) fn plan(previous: &str, next: &str, target: &str) -> PatchPlan {
        plan_with(previous, next, target, None)
    }

    pub(crate) fn entry(address: &str, blocks: &[usize]) -> SidecarEntry {
        SidecarEntry {
            xhtml_xpath: address.to_string(),
            xhtml_type: String::new(),
            mdx_blocks: blocks.to_vec(),
        }
    }

    #[test]
    fn paragraph_edit_is_direct() {
        let plan = plan("# T\n\nPara one.\n", "# T\n\nPara ONE.\n", "<p>Para one.</p>");
        assert_eq!(
            plan.patches,
            vec![PlannedPatch {
                strategy: Strategy::Direct,
                operation: PatchOperation::ModifyText {
                    address: "p[1]".into(),
                    old_plain: "Para one.".into(),
                    new_plain: "Para ONE.".into(),
                },
            }]
        );
    }

    #[test]
    fn format_change_rerenders_inner() {
        let plan = plan("Make it bold.\n", "Make it **bold**.\n", "<p>Make it bold.</p>");
        assert_eq!(
            plan.operations(),
            vec![PatchOperation::ModifyInner {
                address: "p[1]".into(),
                old_plain: "Make it bold.".into(),
                new_inner: "Make it <strong>bold</strong>.".into(),
            }]
        );
    }

    #[test]
    fn target_already_edited_is_skipped() {
        let plan = plan_with(
            "Old words.\n",
            "New words.\n",
            "<p>New words.</p>",
            Some(vec![entry("p[1]", &[0])]),
        );
        assert!(plan.patches.is_empty());
        assert!(plan.skipped.is_empty());
    }

    #[test]
    fn callout_edit_targets_one_child() {
        let previous = "<Callout type=\"info\">\nFirst paragraph stays.\n\nSecond paragraph here.\n</Callout>\n";
        let next = "<Callout type=\"info\">\nFirst paragraph stays.\n\nSecond paragraph changed.\n</Callout>\n";
        let target = concat!(
            "<ac:structured-macro ac:name=\"info\"><ac:rich-text-body>",
            "<p>First paragraph stays.</p><p>Second paragraph here.</p>",
            "</ac:rich-text-body></ac:structured-macro>"
        );
        let plan = plan(previous, next, target);
        assert_eq!(
            plan.operations(),
            vec![PatchOperation::ModifyText {
                address: "macro-info[1]/p[2]".into(),
                old_plain: "Second paragraph here.".into(),
                new_plain: "Second paragraph changed.".into(),
            }]
        );
        assert_eq!(plan.patches[0].strategy, Strategy::Direct);
    }

    #[test]
    fn unmapped_paragraph_uses_containing_element() {
        let previous = "Intro line.\n\nNested sentence inside.\n";
        let next = "Intro line.\n\nNested sentence in here.\n";
        let target = "<p>Intro line.</p><div><span>Nested sentence inside.</span> extra</div>";
        let plan = plan_with(previous, next, target, Some(vec![entry("p[1]", &[0])]));
        assert_eq!(
            plan.patches,
            vec![PlannedPatch {
                strategy: Strategy::Containing,
                operation: PatchOperation::ModifyText {
                    address: "div[1]".into(),
                    old_plain: "Nested sentence inside. extra".into(),
                    new_plain: "Nested sentence in here. extra".into(),
                },
            }]
        );
    }

    #[test]
    fn added_block_anchors_to_previous_element() {
        let plan = plan("One.\n\nTwo.\n", "One.\n\nInserted.\n\nTwo.\n", "<p>One.</p><p>Two.</p>");
        assert_eq!(
            plan.operations(),
            vec![PatchOperation::Insert {
                after: Some("p[1]".into()),
                markup: "<p>Inserted.</p>".into(),
            }]
        );
    }

    #[test]
    fn added_first_block_has_no_anchor() {
        let plan = plan("Two.\n", "Zero.\n\nTwo.\n", "<p>Two.</p>");
        assert_eq!(
            plan.operations(),
            vec![PatchOperation::Insert {
                after: None,
                markup: "<p>Zero.</p>".into(),
            }]
        );
    }

    #[test]
    fn deleted_block_removes_element() {
        let plan = plan("One.\n\nTwo.\n", "One.\n", "<p>One.</p><p>Two.</p>");
        assert_eq!(
            plan.operations(),
            vec![PatchOperation::Delete {
                address: "p[2]".into()
            }]
        );
    }

    #[test]
    fn unmapped_change_without_container_is_skipped() {
        let plan = plan("Some text here.\n", "Other text here.\n", "<h1>Title</h1>");
        assert!(plan.patches.is_empty());
        assert_eq!(plan.skipped[0].reason, "no mapped element");
    }

    #[test]
    fn patch_serializes_with_action_tag() {
        let patch = PlannedPatch {
            strategy: Strategy::Delete,
            operation: PatchOperation::Delete {
                address: "p[1]".into(),
            },
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"strategy": "delete", "action": "delete", "address": "p[1]"})
        );
    }
}
