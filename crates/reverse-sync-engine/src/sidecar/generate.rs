//! Mapping generation by ordered text matching.
//!
//! Reproduces the address → block-positions table the forward converter
//! writes, for pages that were converted without one. Each top-level target
//! record is matched against the content blocks from a moving pointer, looking
//! at most [`LOOKAHEAD`] blocks ahead.

use std::collections::HashSet;

use crate::blocks::{Block, BlockKind, StructuralKind, parse_blocks};
use crate::mapper::{RecordKind, TargetElementRecord, map_target};
use crate::text::{collapse_ws, normalize_to_plain};

use super::{MappingFile, SidecarEntry};

pub const LOOKAHEAD: usize = 5;

const PREFIX_CHARS: usize = 50;
const MIN_PREFIX_SIG: usize = 10;
const SHORT_PREFIX: usize = 20;
const NEXT_SIGNATURES: usize = 3;
const CHILD_SCAN_SLACK: usize = 5;

/// Builds a mapping file for `target` against the blocks of `block_text`.
pub fn generate_mapping(target: &str, block_text: &str, page_id: &str) -> MappingFile {
    let records = map_target(target);
    let blocks = parse_blocks(block_text);
    MappingFile {
        source_page_id: page_id.to_string(),
        mappings: match_records(&records, &blocks),
        ..MappingFile::default()
    }
}

/// Matches the top-level records against `blocks`, one entry per record.
pub fn match_records(records: &[TargetElementRecord], blocks: &[Block]) -> Vec<SidecarEntry> {
    let content: Vec<usize> = blocks
        .iter()
        .enumerate()
        .filter(|(_, b)| b.is_content())
        .map(|(i, _)| i)
        .collect();
    let first_content = content.first().copied().unwrap_or(blocks.len());
    let empties: Vec<usize> = blocks
        .iter()
        .enumerate()
        .filter(|&(i, b)| b.kind == BlockKind::Structural(StructuralKind::Blank) && i > first_content)
        .map(|(i, _)| i)
        .collect();
    let plains: Vec<String> = content
        .iter()
        .map(|&i| collapse_ws(&normalize_to_plain(&blocks[i].text, &blocks[i].kind)))
        .collect();

    let child_ids: HashSet<&str> = records
        .iter()
        .flat_map(|r| r.child_ids.iter().map(String::as_str))
        .collect();
    let top: Vec<&TargetElementRecord> = records
        .iter()
        .filter(|r| !child_ids.contains(r.id.as_str()))
        .collect();

    let mut ptr: usize = 0;
    let mut empty_ptr = 0;
    let mut entries = Vec::with_capacity(top.len());

    for (t, record) in top.iter().enumerate() {
        let plain = collapse_ws(&record.plain_text);
        let mdx_blocks = if plain.is_empty() {
            if record.kind == RecordKind::Paragraph {
                // Only blank lines after the last matched content block.
                if let Some(last) = ptr.checked_sub(1).map(|p| content[p]) {
                    while empties.get(empty_ptr).is_some_and(|&e| e <= last) {
                        empty_ptr += 1;
                    }
                }
                match empties.get(empty_ptr) {
                    Some(&blank) => {
                        empty_ptr += 1;
                        vec![blank]
                    }
                    None => Vec::new(),
                }
            } else {
                Vec::new()
            }
        } else if ptr >= content.len() {
            Vec::new()
        } else if let Some(at) = find_text_match(&plain, &plains, ptr) {
            let mut matched = vec![content[at]];
            ptr = at + 1;
            if record.has_children() {
                let extra = count_child_blocks(record, &top[t + 1..], &plains, ptr);
                for _ in 0..extra {
                    if ptr < content.len() {
                        matched.push(content[ptr]);
                        ptr += 1;
                    }
                }
            }
            matched
        } else {
            log::debug!("no block matches {} ({plain:.40})", record.address);
            Vec::new()
        };

        entries.push(SidecarEntry {
            xhtml_xpath: record.address.clone(),
            xhtml_type: record.kind.as_str().to_string(),
            mdx_blocks,
        });
    }
    entries
}

/// Whitespace-free text signature.
fn signature(s: &str) -> String {
    s.split_whitespace().collect()
}

/// The first `n` characters of `s`.
fn prefix(s: &str, n: usize) -> &str {
    s.char_indices().nth(n).map_or(s, |(i, _)| &s[..i])
}

/// Index into `plains` of the block matching `plain`, searching from `start`.
fn find_text_match(plain: &str, plains: &[String], start: usize) -> Option<usize> {
    let end = (start + LOOKAHEAD).min(plains.len());
    let window = start..end;
    let sig = signature(plain);

    if let Some(at) = window.clone().find(|&p| plains[p] == plain) {
        return Some(at);
    }
    if let Some(at) = window.clone().find(|&p| signature(&plains[p]) == sig) {
        return Some(at);
    }
    if sig.chars().count() >= MIN_PREFIX_SIG {
        let head = prefix(&sig, PREFIX_CHARS);
        let hit = window.clone().find(|&p| {
            let block_sig = signature(&plains[p]);
            !block_sig.is_empty()
                && (block_sig.contains(head) || sig.contains(prefix(&block_sig, PREFIX_CHARS)))
        });
        if hit.is_some() {
            return hit;
        }
    }
    // Emoticons without a fallback leave the target text shorter than the
    // block text, so a short prefix is tried last.
    window.into_iter().find(|&p| {
        let block_sig = signature(&plains[p]);
        block_sig.chars().count() >= SHORT_PREFIX && sig.contains(prefix(&block_sig, SHORT_PREFIX))
    })
}

/// How many blocks after a matched container belong to its children.
fn count_child_blocks(
    record: &TargetElementRecord,
    following: &[&TargetElementRecord],
    plains: &[String],
    ptr: usize,
) -> usize {
    let next_sigs: Vec<String> = following
        .iter()
        .map(|r| signature(&r.plain_text))
        .filter(|s| !s.is_empty())
        .take(NEXT_SIGNATURES)
        .collect();
    if next_sigs.is_empty() {
        return record.child_ids.len();
    }

    let mut count = 0;
    for offset in 0..record.child_ids.len() + CHILD_SCAN_SLACK {
        let Some(plain) = plains.get(ptr + offset) else {
            break;
        };
        let block_sig = signature(plain);
        if block_sig.is_empty() {
            count += 1;
            continue;
        }
        let hit = next_sigs.iter().any(|ns| {
            *ns == block_sig
                || (ns.chars().count() >= MIN_PREFIX_SIG && block_sig.contains(prefix(ns, PREFIX_CHARS)))
                || (block_sig.chars().count() >= MIN_PREFIX_SIG
                    && ns.contains(prefix(&block_sig, PREFIX_CHARS)))
        });
        if hit {
            break;
        }
        count += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn positions(file: &MappingFile) -> Vec<(&str, Vec<usize>)> {
        file.mappings
            .iter()
            .map(|e| (e.xhtml_xpath.as_str(), e.mdx_blocks.clone()))
            .collect()
    }

    #[test]
    fn matches_in_order() {
        let mdx = "---\ntitle: T\n---\n\n## Setup\n\nFirst paragraph here.\n\n- a\n- b\n";
        let xhtml = "<h1>Setup</h1><p>First paragraph here.</p><ul><li><p>a</p></li><li><p>b</p></li></ul>";
        let file = generate_mapping(xhtml, mdx, "7");
        assert_eq!(
            positions(&file),
            vec![("h1[1]", vec![2]), ("p[1]", vec![4]), ("ul[1]", vec![6])]
        );
        assert_eq!(file.version, 2);
        assert_eq!(file.source_page_id, "7");
    }

    #[test]
    fn unmatched_records_map_to_nothing() {
        let mdx = "Only text.\n";
        let xhtml = "<ac:image><ri:attachment ri:filename=\"a.png\" /></ac:image><p>Only text.</p>";
        let file = generate_mapping(xhtml, mdx, "");
        assert_eq!(positions(&file), vec![("ac:image[1]", vec![]), ("p[1]", vec![0])]);
    }

    #[test]
    fn empty_paragraph_takes_next_blank() {
        let mdx = "One.\n\nTwo.\n";
        let xhtml = "<p>One.</p><p /><p>Two.</p>";
        let file = generate_mapping(xhtml, mdx, "");
        assert_eq!(
            positions(&file),
            vec![("p[1]", vec![0]), ("p[2]", vec![1]), ("p[3]", vec![2])]
        );
    }

    #[test]
    fn code_body_that_looks_like_markdown_still_maps() {
        let mdx = "Intro.\n\n```sh\nls -la\n  cd /tmp\n- item **kw** <x>\n```\n\nAfter.\n";
        let xhtml = concat!(
            "<p>Intro.</p>",
            "<ac:structured-macro ac:name=\"code\"><ac:parameter ac:name=\"language\">sh</ac:parameter>",
            "<ac:plain-text-body><![CDATA[ls -la\n  cd /tmp\n- item **kw** <x>]]></ac:plain-text-body>",
            "</ac:structured-macro>",
            "<p>After.</p>"
        );
        let file = generate_mapping(xhtml, mdx, "");
        assert_eq!(
            positions(&file),
            vec![("p[1]", vec![0]), ("macro-code[1]", vec![2]), ("p[2]", vec![4])]
        );
    }

    #[test]
    fn whitespace_insensitive_match() {
        let mdx = "A  sentence\nwrapped.\n";
        let xhtml = "<p>A sentence wrapped.</p>";
        let file = generate_mapping(xhtml, mdx, "");
        assert_eq!(positions(&file), vec![("p[1]", vec![0])]);
    }

    #[test]
    fn short_prefix_tolerates_missing_emoticon() {
        let plains = vec!["Deployment finished successfully ✅ today".to_string()];
        assert_eq!(
            find_text_match("Deployment finished successfully today", &plains, 0),
            Some(0)
        );
    }

    #[test]
    fn callout_consumes_until_next_record() {
        let mdx = "<Callout type=\"info\">\nInside one.\n\nInside two.\n</Callout>\n\nAfter the callout.\n";
        let xhtml = concat!(
            "<ac:structured-macro ac:name=\"info\"><ac:rich-text-body>",
            "<p>Inside one.</p><p>Inside two.</p></ac:rich-text-body></ac:structured-macro>",
            "<p>After the callout.</p>"
        );
        let file = generate_mapping(xhtml, mdx, "");
        assert_eq!(
            positions(&file),
            vec![("macro-info[1]", vec![0]), ("p[1]", vec![2])]
        );
    }

    #[test]
    fn prefix_is_char_based() {
        assert_eq!(prefix("가나다라", 2), "가나");
        assert_eq!(prefix("ab", 5), "ab");
    }
}
