//! # Reverse Sync
//!
//! The whole pipeline for one page: parse both block texts, map the target,
//! diff, index, build patches and apply them.

use serde::Serialize;

use crate::blocks::{Block, parse_blocks};
use crate::diff::{BlockChange, diff_blocks};
use crate::mapper::map_document;
use crate::markup::Document;
use crate::patch::{PatchPlan, build_patches};
use crate::patcher::{ApplyReport, apply_to_document};
use crate::render::RenderContext;
use crate::sidecar::{MappingFile, SidecarIndex, match_records};

/// Result of syncing one page.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub markup: String,
    pub changes: Vec<BlockChange>,
    pub plan: PatchPlan,
    pub applied: ApplyReport,
}

/// One line of the patch summary: where a patch went and how it was derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategyLabel {
    pub address: String,
    pub strategy: &'static str,
}

impl SyncOutcome {
    /// Whether the markup differs from the input.
    pub fn changed(&self) -> bool {
        self.applied.applied > 0
    }

    pub fn strategies(&self) -> Vec<StrategyLabel> {
        self.plan
            .patches
            .iter()
            .map(|p| StrategyLabel {
                address: p.operation.address().unwrap_or("<start>").to_string(),
                strategy: p.strategy.as_str(),
            })
            .collect()
    }
}

/// Carries the edit `previous` → `next` onto `target`.
///
/// Without a `mapping`, one is derived from `previous` and `target` by text
/// matching.
pub fn sync_document(
    previous: &str,
    next: &str,
    target: &str,
    mapping: Option<&MappingFile>,
) -> SyncOutcome {
    let previous_blocks = parse_blocks(previous);
    let next_blocks = parse_blocks(next);
    sync_blocks(&previous_blocks, &next_blocks, target, mapping)
}

/// [`sync_document`] on already parsed blocks.
pub fn sync_blocks(
    previous: &[Block],
    next: &[Block],
    target: &str,
    mapping: Option<&MappingFile>,
) -> SyncOutcome {
    let mut doc = Document::parse(target);
    let records = map_document(&doc);
    let (changes, alignment) = diff_blocks(previous, next);
    log::info!(
        "{} block changes across {} → {} blocks",
        changes.len(),
        previous.len(),
        next.len()
    );

    let entries = match mapping {
        Some(file) => file.mappings.clone(),
        None => match_records(&records, previous),
    };
    let index = SidecarIndex::new(&entries, records);
    let plan = build_patches(
        &changes,
        &alignment,
        &index,
        &doc,
        &RenderContext::for_blocks(next),
    );
    log::info!(
        "{} patches planned, {} changes skipped",
        plan.patches.len(),
        plan.skipped.len()
    );

    let applied = apply_to_document(&mut doc, &plan.operations());
    SyncOutcome {
        markup: doc.serialize(),
        changes,
        plan,
        applied,
    }
}
