//! # Block Parsing
//!
//! Turns block-format text into an ordered sequence of typed [`Block`]s.
//!
//! ## Parsing Phases
//!
//! 1. **Line Classification** (`classify`): each line is classified into a
//!    [`LineClass`] holding local facts (blank, indented, fence signature and
//!    the construct it would open).
//! 2. **Block Construction** (`builder`): a [`BlockBuilder`] walks the classified
//!    lines with a single cursor and emits blocks.
//!
//! ## Key Invariants
//!
//! - Concatenating the `text` of the top-level blocks reproduces the input.
//! - Every blank line is its own block.
//! - Callout bodies are parsed recursively; child spans point into the
//!   original input.
//! - The parser never fails. Ambiguous input takes the most literal reading.

pub mod builder;
pub mod classify;
pub mod kinds;
pub mod types;

use xi_rope::Rope;

use crate::rope::lines_with_spans;

pub use builder::BlockBuilder;
pub use classify::{LineClass, LineClassifier, Opener};
pub use types::{Block, BlockKind, StructuralKind};

/// Parses block-format text into blocks.
pub fn parse_blocks(text: &str) -> Vec<Block> {
    parse_at(text, 0, 1)
}

/// Parses `text` as if it started at byte `offset` and line `first_line` of a
/// larger source.
pub(crate) fn parse_at(text: &str, offset: usize, first_line: usize) -> Vec<Block> {
    let rope = Rope::from(text);
    let classifier = LineClassifier;
    let lines = lines_with_spans(&rope)
        .map(|lr| classifier.classify(lr))
        .collect();
    let mut blocks = BlockBuilder::new(text, lines).finish();
    for block in &mut blocks {
        shift(block, offset, first_line - 1);
    }
    blocks
}

fn shift(block: &mut Block, offset: usize, line_delta: usize) {
    block.span = block.span.shifted(offset);
    block.lines = (block.lines.0 + line_delta, block.lines.1 + line_delta);
    for child in &mut block.children {
        shift(child, offset, line_delta);
    }
}
