//! # Block Differ
//!
//! Aligns two block sequences and classifies each position.
//!
//! Blocks are compared by a key: structural blocks by kind, content blocks by
//! their whitespace-collapsed plain text. A Myers diff over the keys yields
//! equal, replace, insert and delete runs:
//!
//! - equal runs align pairwise and report `Modified` only when the raw text
//!   differs;
//! - replace runs of equal length align pairwise as `Modified`;
//! - unequal replace runs become `Deleted` followed by `Added`.

use std::collections::BTreeMap;

use serde::Serialize;
use similar::{Algorithm, DiffTag, capture_diff_slices};

use crate::blocks::Block;
use crate::text::{collapse_ws, normalize_to_plain};

/// Next-position → previous-position for aligned blocks.
pub type Alignment = BTreeMap<usize, usize>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Modified,
    Added,
    Deleted,
}

/// One classified block difference.
///
/// `position` indexes the previous sequence for `Modified` and `Deleted` and
/// the next sequence for `Added`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockChange {
    pub position: usize,
    pub kind: ChangeKind,
    pub previous: Option<Block>,
    pub next: Option<Block>,
}

impl BlockChange {
    pub fn modified(position: usize, previous: &Block, next: &Block) -> Self {
        Self {
            position,
            kind: ChangeKind::Modified,
            previous: Some(previous.clone()),
            next: Some(next.clone()),
        }
    }

    pub fn added(position: usize, next: &Block) -> Self {
        Self {
            position,
            kind: ChangeKind::Added,
            previous: None,
            next: Some(next.clone()),
        }
    }

    pub fn deleted(position: usize, previous: &Block) -> Self {
        Self {
            position,
            kind: ChangeKind::Deleted,
            previous: Some(previous.clone()),
            next: None,
        }
    }
}

/// The comparison key of a block.
pub fn block_key(block: &Block) -> String {
    if !block.is_content() {
        return format!("__non_content_{}__", block.kind.name());
    }
    collapse_ws(&normalize_to_plain(&block.text, &block.kind))
}

/// Diffs `previous` against `next`, returning the changes and the alignment.
pub fn diff_blocks(previous: &[Block], next: &[Block]) -> (Vec<BlockChange>, Alignment) {
    let old_keys: Vec<String> = previous.iter().map(block_key).collect();
    let new_keys: Vec<String> = next.iter().map(block_key).collect();

    let mut changes = Vec::new();
    let mut alignment = Alignment::new();

    for op in capture_diff_slices(Algorithm::Myers, &old_keys, &new_keys) {
        let (tag, old, new) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => {
                for (i, j) in old.zip(new) {
                    alignment.insert(j, i);
                    if previous[i].text != next[j].text {
                        changes.push(BlockChange::modified(i, &previous[i], &next[j]));
                    }
                }
            }
            DiffTag::Replace if old.len() == new.len() => {
                for (i, j) in old.zip(new) {
                    alignment.insert(j, i);
                    changes.push(BlockChange::modified(i, &previous[i], &next[j]));
                }
            }
            DiffTag::Replace => {
                changes.extend(old.map(|i| BlockChange::deleted(i, &previous[i])));
                changes.extend(new.map(|j| BlockChange::added(j, &next[j])));
            }
            DiffTag::Insert => {
                changes.extend(new.map(|j| BlockChange::added(j, &next[j])));
            }
            DiffTag::Delete => {
                changes.extend(old.map(|i| BlockChange::deleted(i, &previous[i])));
            }
        }
    }
    (changes, alignment)
}
