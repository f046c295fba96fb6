//! Character-level change transfer.
//!
//! A block edit is expressed as a diff between two plain texts. The target
//! element shows the same words with different formatting noise (whitespace,
//! joined list items, surrounding sibling text), so the diff is projected onto
//! the target through a character alignment rather than applied directly.

use std::collections::BTreeMap;
use std::ops::Range;

use similar::{Algorithm, DiffTag, capture_diff_slices};

/// Source character index → target character index.
pub type CharMap = BTreeMap<usize, usize>;

/// One diff opcode over character indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opcode {
    pub tag: DiffTag,
    pub old: Range<usize>,
    pub new: Range<usize>,
}

/// Myers opcodes between two character slices.
pub fn char_opcodes(old: &[char], new: &[char]) -> Vec<Opcode> {
    capture_diff_slices(Algorithm::Myers, old, new)
        .iter()
        .map(|op| {
            let (tag, old, new) = op.as_tag_tuple();
            Opcode { tag, old, new }
        })
        .collect()
}

/// Aligns the characters of `source` onto `target`.
///
/// When `source` occurs verbatim inside `target` the alignment is a plain
/// offset. Otherwise every character inside an `Equal` run of a Myers diff is
/// mapped and the rest stay unmapped.
pub fn align_chars(source: &str, target: &str) -> CharMap {
    if !source.is_empty()
        && let Some(byte_idx) = target.find(source)
    {
        let offset = target[..byte_idx].chars().count();
        return (0..source.chars().count()).map(|i| (i, i + offset)).collect();
    }

    let src: Vec<char> = source.chars().collect();
    let tgt: Vec<char> = target.chars().collect();
    let mut map = CharMap::new();
    for op in char_opcodes(&src, &tgt) {
        if op.tag == DiffTag::Equal {
            for (i, j) in op.old.zip(op.new) {
                map.insert(i, j);
            }
        }
    }
    map
}

/// Where text inserted before source index `pos` lands in the target.
pub fn find_insert_pos(map: &CharMap, pos: usize) -> usize {
    if let Some((_, &before)) = map.range(..pos).next_back() {
        return before + 1;
    }
    map.range(pos..).next().map(|(_, &after)| after).unwrap_or(0)
}

/// Applies the `old` → `new` character diff onto `target`.
///
/// Deleted source characters remove their aligned target characters.
/// Replacement text takes the place of the first replaced character when it is
/// aligned, and other inserted text lands at [`find_insert_pos`]. Unaligned
/// target characters are left alone.
pub fn transfer_text_changes(old: &str, new: &str, target: &str) -> String {
    if old.is_empty() && new.is_empty() {
        return target.to_string();
    }
    let map = align_chars(old, target);
    let old_chars: Vec<char> = old.chars().collect();
    let new_chars: Vec<char> = new.chars().collect();
    let target_chars: Vec<char> = target.chars().collect();

    let mut deleted = vec![false; target_chars.len()];
    let mut inserts: BTreeMap<usize, String> = BTreeMap::new();

    for op in char_opcodes(&old_chars, &new_chars) {
        if op.tag == DiffTag::Equal {
            continue;
        }
        for i in op.old.clone() {
            if let Some(&t) = map.get(&i)
                && let Some(flag) = deleted.get_mut(t)
            {
                *flag = true;
            }
        }
        if !op.new.is_empty() {
            let pos = match (op.tag, map.get(&op.old.start)) {
                (DiffTag::Replace, Some(&mapped)) => mapped,
                _ => find_insert_pos(&map, op.old.start),
            };
            inserts
                .entry(pos)
                .or_default()
                .extend(&new_chars[op.new.clone()]);
        }
    }

    let mut out = String::with_capacity(target.len() + new.len());
    for (k, c) in target_chars.iter().enumerate() {
        if let Some(text) = inserts.get(&k) {
            out.push_str(text);
        }
        if !deleted[k] {
            out.push(*c);
        }
    }
    if let Some(tail) = inserts.range(target_chars.len()..).next() {
        out.push_str(tail.1);
    }
    out
}
