use crate::rope::LineRef;
use crate::text::patterns;

use super::kinds::{BlockQuote, Callout, CodeFence, Element, FenceSig, Figure, ListItem, Table};

/// What a line would open if a new block started on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Opener {
    Heading { level: u8 },
    Fence(FenceSig),
    Rule,
    Callout,
    Figure,
    /// An HTML comment; runs to the line holding `-->`.
    Comment,
    Element { name: String },
    Table,
    Quote,
    ListItem,
    Import,
}

/// Classification of a single line containing only local facts.
///
/// Each line is classified independently; the builder decides what the facts
/// mean in context (a list line inside a fence is just code).
#[derive(Debug, Clone)]
pub struct LineClass {
    pub line: LineRef,
    /// Whitespace only.
    pub is_blank: bool,
    /// Starts with whitespace.
    pub is_indented: bool,
    /// Fence signature of the left-trimmed line, for closing fences.
    pub fence_sig: Option<FenceSig>,
    pub opener: Option<Opener>,
}

impl LineClass {
    pub fn content(&self) -> &str {
        self.line.content()
    }

    /// Whether the line can start a block that interrupts a paragraph.
    pub fn interrupts_paragraph(&self) -> bool {
        !matches!(self.opener, None | Some(Opener::Import))
    }
}

/// Classifies individual lines for the block parsing phase.
pub struct LineClassifier;

impl LineClassifier {
    pub fn classify(&self, line: LineRef) -> LineClass {
        let content = line.content();
        let trimmed = content.trim_start();
        let is_blank = trimmed.trim_end().is_empty();
        let fence_sig = CodeFence::sig(trimmed);
        let opener = if is_blank {
            None
        } else {
            Self::opener(content, trimmed, fence_sig)
        };
        LineClass {
            is_blank,
            is_indented: content.len() != trimmed.len(),
            fence_sig,
            opener,
            line,
        }
    }

    fn opener(content: &str, trimmed: &str, fence_sig: Option<FenceSig>) -> Option<Opener> {
        if patterns::import_line().is_match(content) {
            return Some(Opener::Import);
        }
        if let Some(caps) = patterns::heading().captures(content) {
            let level = caps[1].len().min(6) as u8;
            return Some(Opener::Heading { level });
        }
        if let Some(sig) = fence_sig {
            return Some(Opener::Fence(sig));
        }
        if patterns::horizontal_rule().is_match(content) {
            return Some(Opener::Rule);
        }
        if Callout::is_open(trimmed) {
            return Some(Opener::Callout);
        }
        if Figure::is_open(trimmed) {
            return Some(Opener::Figure);
        }
        if ListItem::is_list_line(trimmed) {
            return Some(Opener::ListItem);
        }
        if Table::is_table_line(trimmed) {
            return Some(Opener::Table);
        }
        if BlockQuote::is_quote_line(content) {
            return Some(Opener::Quote);
        }
        if trimmed.starts_with("<!--") {
            return Some(Opener::Comment);
        }
        Element::opens_block(trimmed).map(|name| Opener::Element {
            name: name.to_string(),
        })
    }
}
