use crate::rope::Span;

use super::{
    classify::{LineClass, Opener},
    kinds::{Callout, CodeFence, Element, FenceSig, Figure, Table},
    parse_at,
    types::{Block, BlockKind, StructuralKind},
};

/// Front matter delimiter; only recognised on the first line.
const FRONT_MATTER_FENCE: &str = "---";

/// Builds blocks from classified lines with a single forward cursor.
///
/// Never fails: lines that fit no construct become paragraphs, and unclosed
/// fences, callouts and elements run to the end of the input.
pub struct BlockBuilder<'a> {
    source: &'a str,
    lines: Vec<LineClass>,
    pos: usize,
    out: Vec<Block>,
}

impl<'a> BlockBuilder<'a> {
    pub fn new(source: &'a str, lines: Vec<LineClass>) -> Self {
        Self {
            source,
            lines,
            pos: 0,
            out: vec![],
        }
    }

    pub fn finish(mut self) -> Vec<Block> {
        self.front_matter();
        while self.pos < self.lines.len() {
            self.next_block();
        }
        self.out
    }

    fn front_matter(&mut self) {
        let Some(first) = self.lines.first() else {
            return;
        };
        if first.content() != FRONT_MATTER_FENCE {
            return;
        }
        let close = self
            .lines
            .iter()
            .skip(1)
            .position(|l| l.content() == FRONT_MATTER_FENCE);
        if let Some(rel) = close {
            self.emit(BlockKind::Structural(StructuralKind::FrontMatter), rel + 1);
        }
    }

    fn next_block(&mut self) {
        let current = &self.lines[self.pos];
        if current.is_blank {
            self.emit(BlockKind::Structural(StructuralKind::Blank), self.pos);
            return;
        }
        match current.opener.clone() {
            Some(Opener::Import) => {
                self.emit(BlockKind::Structural(StructuralKind::Import), self.pos);
            }
            Some(Opener::Heading { level }) => {
                self.emit(BlockKind::Heading, self.pos).level = level;
            }
            Some(Opener::Fence(sig)) => self.fence(sig),
            Some(Opener::Rule) => {
                self.emit(BlockKind::Rule, self.pos);
            }
            Some(Opener::Callout) => self.callout(),
            Some(Opener::Figure) => {
                let end = self.element_end(Figure::TAG);
                let block = self.emit(BlockKind::Figure, end);
                block.attributes = Figure::attributes(&block.text);
            }
            Some(Opener::Comment) => {
                let end = self.scan_until(self.pos, |l| l.content().contains("-->"));
                self.emit(BlockKind::RawMarkup, end);
            }
            Some(Opener::Element { name }) => {
                let end = if Element::is_void(&name) {
                    self.pos
                } else {
                    self.element_end(&name)
                };
                self.emit(BlockKind::RawMarkup, end);
            }
            Some(Opener::ListItem) => self.list(),
            Some(Opener::Table) => {
                let end = self.run_while(|l| Table::is_table_line(l.content().trim_start()));
                self.emit(BlockKind::Table, end);
            }
            Some(Opener::Quote) => {
                let end = self.run_while(|l| matches!(l.opener, Some(Opener::Quote)));
                self.emit(BlockKind::BlockQuote, end);
            }
            None => {
                let end = self.run_while(|l| !l.is_blank && !l.interrupts_paragraph());
                self.emit(BlockKind::Paragraph, end);
            }
        }
    }

    /// Emits lines `self.pos..=end` as one block and advances past them.
    fn emit(&mut self, kind: BlockKind, end: usize) -> &mut Block {
        let first = &self.lines[self.pos].line;
        let last = &self.lines[end].line;
        let span = Span::new(first.span.start, last.span.end);
        let block = Block::new(
            kind,
            span.slice(self.source),
            span,
            (first.number, last.number),
        );
        self.pos = end + 1;
        self.out.push(block);
        let idx = self.out.len() - 1;
        &mut self.out[idx]
    }

    /// Index of the last line of the run starting at `self.pos` whose following
    /// lines satisfy `keep`.
    fn run_while(&self, keep: impl Fn(&LineClass) -> bool) -> usize {
        let mut end = self.pos;
        while end + 1 < self.lines.len() && keep(&self.lines[end + 1]) {
            end += 1;
        }
        end
    }

    /// First line at or after `from` satisfying `done`, or the last line.
    fn scan_until(&self, from: usize, done: impl Fn(&LineClass) -> bool) -> usize {
        (from..self.lines.len())
            .find(|&k| done(&self.lines[k]))
            .unwrap_or(self.lines.len() - 1)
    }

    fn fence(&mut self, sig: FenceSig) {
        let end = self.scan_until(self.pos + 1, |l| {
            CodeFence::closes(sig, l.content().trim_start())
        });
        let language = CodeFence::info(self.lines[self.pos].content().trim_start()).to_string();
        self.emit(BlockKind::Code, end).language = language;
    }

    /// The line where the element opened on `self.pos` closes.
    fn element_end(&self, name: &str) -> usize {
        let mut depth = 0i32;
        for k in self.pos..self.lines.len() {
            depth += Element::depth_delta(self.lines[k].content(), name);
            if depth <= 0 {
                return k;
            }
        }
        self.lines.len() - 1
    }

    fn callout(&mut self) {
        let end = self.element_end(Callout::TAG);
        let first_line = self.lines[self.pos].line.number;
        let block = self.emit(BlockKind::Callout, end);
        block.attributes = Callout::attributes(&block.text);

        let body = Callout::body_range(&block.text);
        let body_line = first_line + block.text[..body.start].matches('\n').count();
        block.children = parse_at(
            &block.text[body.clone()],
            block.span.start + body.start,
            body_line,
        );
    }

    /// A list runs over marker lines and indented continuation lines. Blank
    /// lines stay inside only when the next non-blank line continues the list.
    fn list(&mut self) {
        let continues = |l: &LineClass| matches!(l.opener, Some(Opener::ListItem)) || l.is_indented;
        let mut end = self.pos;
        let mut k = self.pos + 1;
        while k < self.lines.len() {
            let line = &self.lines[k];
            if !line.is_blank {
                if !continues(line) {
                    break;
                }
                end = k;
                k += 1;
                continue;
            }
            let next = (k..self.lines.len()).find(|&j| !self.lines[j].is_blank);
            match next {
                Some(j) if continues(&self.lines[j]) => k = j,
                _ => break,
            }
        }
        self.emit(BlockKind::List, end);
    }
}
