//! Text-node projection of a plain-text edit.
//!
//! The element's plain text is the concatenation of its text leaves with
//! formatting whitespace in between. Each leaf is located in the old text, and
//! the slice of the new text that the diff maps onto that range replaces it,
//! so inline markup around the leaves is never touched.
//!
//! Code bodies are literal: they are never projected onto, only replaced
//! whole by [`replace_code_body`].

use similar::DiffTag;

use crate::markup::{Document, NodeId, NodeKind};
use crate::text::transfer::{Opcode, char_opcodes};

pub(crate) const PLAIN_TEXT_BODY: &str = "ac:plain-text-body";

/// Index of `needle` in `hay` at or after `from`.
fn find_chars(hay: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.is_empty() || from > hay.len() {
        return None;
    }
    hay[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| from + i)
}

/// The part of `new` that the old range `start..end` turns into.
///
/// Replaced runs are split proportionally. Inserted text belongs to the range
/// whose half-open span contains the insertion point.
pub fn map_text_range(new: &[char], opcodes: &[Opcode], start: usize, end: usize) -> String {
    let mut out = String::new();
    for op in opcodes {
        let (i1, i2) = (op.old.start, op.old.end);
        let (j1, j2) = (op.new.start, op.new.end);
        let lo = i1.max(start);
        let hi = i2.min(end);
        match op.tag {
            DiffTag::Equal if lo < hi => {
                out.extend(&new[j1 + (lo - i1)..j1 + (hi - i1)]);
            }
            DiffTag::Replace if lo < hi => {
                let old_len = (i2 - i1).max(1);
                let new_len = j2 - j1;
                let ns = j1 + (lo - i1) * new_len / old_len;
                let ne = j1 + (hi - i1) * new_len / old_len;
                out.extend(&new[ns..ne]);
            }
            DiffTag::Insert if start <= i1 && i1 < end => out.extend(&new[j1..j2]),
            _ => {}
        }
    }
    out
}

/// Sets the literal body of a code macro's `ac:plain-text-body` to `text`,
/// as a single CDATA section. Newlines and indentation are kept as given.
pub fn replace_code_body(doc: &mut Document, body: NodeId, text: &str) {
    let leaves = doc.text_leaves(body);
    if let &[only] = leaves.as_slice()
        && matches!(doc.node(only).kind, NodeKind::Cdata(_))
        && !text.contains("]]>")
    {
        doc.set_text(only, text);
        return;
    }
    let escaped = text.replace("]]>", "]]]]><![CDATA[>");
    doc.replace_children(body, &format!("<![CDATA[{escaped}]]>"));
}

/// Rewrites the text leaves under `root` so that its plain text changes from
/// `old` to `new`.
///
/// Leaves keep their own leading and trailing whitespace, except that leading
/// whitespace is dropped when the text between the previous leaf and this one
/// was deleted.
pub fn apply_text_changes(doc: &mut Document, root: NodeId, old: &str, new: &str) {
    let old: Vec<char> = old.trim().chars().collect();
    let new: Vec<char> = new.trim().chars().collect();
    let opcodes = char_opcodes(&old, &new);
    let leaves: Vec<NodeId> = doc
        .text_leaves(root)
        .into_iter()
        .filter(|&leaf| !doc.has_ancestor(leaf, PLAIN_TEXT_BODY))
        .collect();
    if leaves.is_empty() {
        return;
    }

    let mut ranges: Vec<(usize, usize)> = Vec::with_capacity(leaves.len());
    let mut pos = 0;
    for &leaf in &leaves {
        let text = doc.leaf_text(leaf).unwrap_or_default();
        let stripped: Vec<char> = text.trim().chars().collect();
        match find_chars(&old, &stripped, pos) {
            Some(at) => {
                ranges.push((at, at + stripped.len()));
                pos = at + stripped.len();
            }
            None => ranges.push((pos, pos)),
        }
    }
    let last = ranges.iter().rposition(|(s, e)| s != e);

    for (i, (&leaf, &(start, end))) in leaves.iter().zip(&ranges).enumerate() {
        if start == end {
            continue;
        }
        // The last leaf also takes text appended at the very end.
        let effective_end = if Some(i) == last { end + 1 } else { end };
        let mapped = map_text_range(&new, &opcodes, start, effective_end);

        let text = doc.leaf_text(leaf).unwrap_or_default();
        let body = text.trim_start();
        let mut leading = &text[..text.len() - body.len()];
        let trailing = &body[body.trim_end().len()..];

        if !leading.is_empty() && i > 0 {
            let prev_end = ranges[i - 1].1;
            if prev_end < start && map_text_range(&new, &opcodes, prev_end, start).is_empty() {
                leading = "";
            }
        }
        let replaced = format!("{leading}{mapped}{trailing}");
        doc.set_text(leaf, &replaced);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn apply(markup: &str, old: &str, new: &str) -> String {
        let mut doc = Document::parse(markup);
        let root = doc.root();
        apply_text_changes(&mut doc, root, old, new);
        doc.serialize()
    }

    #[test]
    fn inline_markup_is_preserved() {
        assert_eq!(
            apply(
                "<p>Use the <strong>Save</strong> button now.</p>",
                "Use the Save button now.",
                "Use the Save button later."
            ),
            "<p>Use the <strong>Save</strong> button later.</p>"
        );
    }

    #[test]
    fn trailing_insert_lands_on_last_leaf() {
        assert_eq!(
            apply("<p>a <em>b</em></p>", "a b", "a b c"),
            "<p>a <em>b c</em></p>"
        );
    }

    #[test]
    fn boundary_insert_is_not_duplicated() {
        assert_eq!(
            apply("<p>ab</p><p>cd</p>", "abcd", "abXcd"),
            "<p>ab</p><p>Xcd</p>"
        );
    }

    #[test]
    fn deleted_gap_drops_leading_space() {
        assert_eq!(
            apply(
                "<p><strong>ID</strong> check</p>",
                "ID check",
                "IDcheck"
            ),
            "<p><strong>ID</strong>check</p>"
        );
    }

    #[test]
    fn code_bodies_are_not_projected_onto() {
        let markup = concat!(
            "<div><p>run this</p><ac:structured-macro ac:name=\"code\">",
            "<ac:plain-text-body><![CDATA[ls]]></ac:plain-text-body></ac:structured-macro></div>"
        );
        let patched = apply(markup, "run this", "run that");
        assert!(patched.contains("<p>run that</p>"));
        assert!(patched.contains("<![CDATA[ls]]>"));
    }

    #[test]
    fn code_body_is_replaced_whole() {
        let mut doc = Document::parse("<ac:plain-text-body><![CDATA[a\n  b]]></ac:plain-text-body>");
        let body = doc.find_child(doc.root(), "ac:plain-text-body").unwrap();
        replace_code_body(&mut doc, body, "a\n  b\n  c");
        assert_eq!(
            doc.serialize(),
            "<ac:plain-text-body><![CDATA[a\n  b\n  c]]></ac:plain-text-body>"
        );
    }

    #[test]
    fn proportional_replace() {
        let old: Vec<char> = "abcd".chars().collect();
        let new: Vec<char> = "wxyz".chars().collect();
        let ops = char_opcodes(&old, &new);
        assert_eq!(map_text_range(&new, &ops, 0, 2), "wx");
        assert_eq!(map_text_range(&new, &ops, 2, 4), "yz");
    }
}
