//! Byte-exact top-level fragment extraction.
//!
//! The tree tells which top-level elements exist and in what order; their
//! boundaries are then located in the raw text so that fragments are slices
//! of the input and never re-serialized.

use crate::error::StructuralError;
use crate::mapper::block_children;
use crate::markup::tree::is_void;
use crate::markup::{Document, NodeKind};

/// Characters that may follow a tag name inside an opening tag.
const NAME_TERMINATORS: [u8; 6] = [b' ', b'>', b'/', b'\t', b'\n', b'\r'];

/// A markup document split at its top-level elements.
///
/// `prefix + fragments[0] + separators[0] + ... + fragments[n-1] + suffix`
/// reproduces the input.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FragmentSplit {
    pub prefix: String,
    pub fragments: Vec<String>,
    pub separators: Vec<String>,
    pub suffix: String,
}

impl FragmentSplit {
    pub fn reassemble(&self) -> String {
        reassemble(&self.prefix, &self.fragments, &self.separators, &self.suffix)
    }
}

/// Interleaves fragments and separators inside an envelope.
pub fn reassemble(prefix: &str, fragments: &[String], separators: &[String], suffix: &str) -> String {
    let mut out = String::from(prefix);
    for (i, fragment) in fragments.iter().enumerate() {
        if i > 0
            && let Some(sep) = separators.get(i - 1)
        {
            out.push_str(sep);
        }
        out.push_str(fragment);
    }
    out.push_str(suffix);
    out
}

enum TopLevel {
    Tag(String),
    Text(String),
}

/// Splits `markup` into byte-exact top-level fragments.
pub fn extract_fragments(markup: &str) -> Result<FragmentSplit, StructuralError> {
    let doc = Document::parse(markup);
    let top: Vec<TopLevel> = block_children(&doc, doc.root())
        .into_iter()
        .filter_map(|id| match &doc.node(id).kind {
            NodeKind::Element(data) => Some(TopLevel::Tag(data.name.clone())),
            NodeKind::Text(raw) => {
                let text = raw.trim();
                (!text.is_empty()).then(|| TopLevel::Text(text.to_string()))
            }
            _ => None,
        })
        .collect();

    let mut ranges: Vec<(usize, usize)> = Vec::with_capacity(top.len());
    let mut search = 0;
    for item in &top {
        match item {
            TopLevel::Tag(name) => {
                let start = find_tag_start(markup, name, search).ok_or_else(|| {
                    StructuralError::UnresolvedTag {
                        tag: name.clone(),
                        position: search,
                    }
                })?;
                let end = element_end(markup, name, start)?;
                ranges.push((start, end));
                search = end;
            }
            TopLevel::Text(text) => {
                if let Some(idx) = markup[search..].find(text.as_str()) {
                    let start = search + idx;
                    ranges.push((start, start + text.len()));
                    search = start + text.len();
                }
            }
        }
    }

    let (Some(&(first, _)), Some(&(_, last))) = (ranges.first(), ranges.last()) else {
        return Ok(FragmentSplit {
            prefix: markup.to_string(),
            ..FragmentSplit::default()
        });
    };
    Ok(FragmentSplit {
        prefix: markup[..first].to_string(),
        fragments: ranges.iter().map(|&(s, e)| markup[s..e].to_string()).collect(),
        separators: ranges
            .windows(2)
            .map(|w| markup[w[0].1..w[1].0].to_string())
            .collect(),
        suffix: markup[last..].to_string(),
    })
}

/// Byte offset of the next `<name` opening tag at or after `from`.
///
/// The name must be followed by a terminator, so `<p` never matches `<pre>`.
pub fn find_tag_start(text: &str, name: &str, from: usize) -> Option<usize> {
    let open = format!("<{name}");
    let bytes = text.as_bytes();
    let mut pos = from;
    while let Some(idx) = text.get(pos..)?.find(&open) {
        let at = pos + idx;
        match bytes.get(at + open.len()) {
            None => return Some(at),
            Some(c) if NAME_TERMINATORS.contains(c) => return Some(at),
            Some(_) => pos = at + 1,
        }
    }
    None
}

/// Offset of the `>` closing the tag that starts at `from`, skipping `>`
/// inside quoted attribute values.
fn find_tag_close(text: &str, from: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (i, &c) in text.as_bytes().iter().enumerate().skip(from) {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == b'"' || c == b'\'' => quote = Some(c),
            None if c == b'>' => return Some(i),
            None => {}
        }
    }
    None
}

/// Exclusive end offset of the element named `name` whose opening tag starts
/// at `start`.
///
/// Self-closing and void elements end at their opening tag. Otherwise nested
/// same-name elements are depth-counted until the matching end tag.
pub fn element_end(text: &str, name: &str, start: usize) -> Result<usize, StructuralError> {
    let gt = find_tag_close(text, start).ok_or_else(|| StructuralError::UnresolvedTag {
        tag: name.to_string(),
        position: start,
    })?;
    let bytes = text.as_bytes();
    if bytes[gt - 1] == b'/' || is_void(name) {
        return Ok(gt + 1);
    }

    let close = format!("</{name}>");
    let open = format!("<{name}");
    let mut depth = 1;
    let mut pos = gt + 1;
    loop {
        let Some(lt) = text[pos..].find('<').map(|i| pos + i) else {
            return Err(StructuralError::UnclosedElement {
                tag: name.to_string(),
                depth,
            });
        };
        let rest = &text[lt..];
        if rest.starts_with(&close) {
            depth -= 1;
            if depth == 0 {
                return Ok(lt + close.len());
            }
            pos = lt + close.len();
            continue;
        }
        let same_name = rest.starts_with(&open)
            && bytes
                .get(lt + open.len())
                .is_some_and(|c| NAME_TERMINATORS.contains(c));
        if !same_name {
            pos = lt + 1;
            continue;
        }
        match find_tag_close(text, lt) {
            Some(inner) if bytes[inner - 1] == b'/' => pos = inner + 1,
            Some(inner) => {
                depth += 1;
                pos = inner + 1;
            }
            None => {
                depth += 1;
                pos = lt + 1;
            }
        }
    }
}
