//! Matching changed block text to target records.

use std::collections::HashSet;

use crate::mapper::TargetElementRecord;
use crate::text::{collapse_ws, strip_for_compare, strip_list_marker};

/// Minimum collapsed length for a containment search.
pub const MIN_CONTAINING_CHARS: usize = 5;

const CHILD_PREFIX_CHARS: usize = 20;

/// Comparison keys of one text.
struct Keys {
    collapsed: String,
    sig: String,
}

impl Keys {
    fn of(text: &str) -> Self {
        Self {
            collapsed: collapse_ws(text),
            sig: strip_for_compare(text),
        }
    }
}

type ChildTier = fn(&Keys, &Keys) -> bool;

fn same_collapsed(old: &Keys, child: &Keys) -> bool {
    old.collapsed == child.collapsed
}

fn same_signature(old: &Keys, child: &Keys) -> bool {
    !old.sig.is_empty() && old.sig == child.sig
}

fn child_marker_stripped(old: &Keys, child: &Keys) -> bool {
    !old.sig.is_empty() && strip_list_marker(&child.sig) == old.sig
}

fn old_marker_stripped(old: &Keys, child: &Keys) -> bool {
    !child.sig.is_empty() && strip_list_marker(&old.sig) == child.sig
}

fn shared_prefix(old: &Keys, child: &Keys) -> bool {
    let child_len = child.sig.chars().count();
    child_len >= CHILD_PREFIX_CHARS
        && old.sig.chars().count() <= child_len * 2
        && old.sig.chars().take(CHILD_PREFIX_CHARS).eq(child.sig.chars().take(CHILD_PREFIX_CHARS))
}

const CHILD_TIERS: [ChildTier; 5] = [
    same_collapsed,
    same_signature,
    child_marker_stripped,
    old_marker_stripped,
    shared_prefix,
];

/// The child record whose plain text matches `old_plain`, trying each tier
/// over all children before the next.
pub fn resolve_child<'r>(
    old_plain: &str,
    children: &[&'r TargetElementRecord],
) -> Option<&'r TargetElementRecord> {
    let old = Keys::of(old_plain);
    let keys: Vec<Keys> = children.iter().map(|c| Keys::of(&c.plain_text)).collect();
    CHILD_TIERS.iter().find_map(|tier| {
        children
            .iter()
            .zip(&keys)
            .find(|(_, child)| tier(&old, child))
            .map(|(&record, _)| record)
    })
}

/// Whether the plain text of `record` contains `text`, ignoring whitespace.
pub fn contained_in(text: &str, record: &TargetElementRecord) -> bool {
    strip_for_compare(&record.plain_text).contains(&strip_for_compare(text))
}

/// The first unused record whose plain text contains `old_plain`.
///
/// Leaf records are preferred over containers so that an edit inside a callout
/// lands on the paragraph rather than the whole macro.
pub fn find_containing<'r>(
    old_plain: &str,
    records: &'r [TargetElementRecord],
    used: &HashSet<String>,
) -> Option<&'r TargetElementRecord> {
    if collapse_ws(old_plain).chars().count() < MIN_CONTAINING_CHARS {
        return None;
    }
    let sig = strip_for_compare(old_plain);
    let candidates = || {
        records
            .iter()
            .filter(|r| !used.contains(&r.address))
            .filter(|r| strip_for_compare(&r.plain_text).contains(&sig))
    };
    candidates()
        .find(|r| !r.has_children())
        .or_else(|| candidates().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::map_target;
    use pretty_assertions::assert_eq;

    const CALLOUT: &str = concat!(
        "<ac:structured-macro ac:name=\"note\"><ac:rich-text-body>",
        "<p>First   paragraph</p>",
        "<ul><li><p>only item</p></li></ul>",
        "<p>A rather long paragraph that keeps going on</p>",
        "</ac:rich-text-body></ac:structured-macro>",
        "<p>Outside text</p>"
    );

    fn child_addresses(records: &[TargetElementRecord]) -> Vec<&TargetElementRecord> {
        records.iter().filter(|r| r.parent_address().is_some()).collect()
    }

    #[test]
    fn tiers_in_order() {
        let records = map_target(CALLOUT);
        let children = child_addresses(&records);
        let hit = |old: &str| resolve_child(old, &children).map(|r| r.address.as_str());

        assert_eq!(hit("First   paragraph"), Some("macro-note[1]/p[1]"));
        assert_eq!(hit("First paragraph"), Some("macro-note[1]/p[1]"));
        assert_eq!(hit("- only item"), Some("macro-note[1]/ul[1]"));
        assert_eq!(
            hit("A rather long paragraph that has changed"),
            Some("macro-note[1]/p[2]")
        );
        assert_eq!(hit("unrelated"), None);
    }

    #[test]
    fn containment_prefers_leaves_and_skips_used() {
        let records = map_target(CALLOUT);
        let mut used = HashSet::new();
        let found = find_containing("paragraph that keeps", &records, &used);
        assert_eq!(found.map(|r| r.address.as_str()), Some("macro-note[1]/p[2]"));

        used.insert("macro-note[1]/p[2]".to_string());
        let found = find_containing("paragraph that keeps", &records, &used);
        assert_eq!(found.map(|r| r.address.as_str()), Some("macro-note[1]"));

        assert!(find_containing("Out", &records, &HashSet::new()).is_none());
    }
}
