//! # Target Markup
//!
//! A lossless tree over target-format markup.
//!
//! ## Parsing Phases
//!
//! 1. **Tokenizing** (`tokenize`): a `quick_xml` reader splits the input into
//!    tags, text, comments and CDATA sections whose spans tile the input.
//! 2. **Tree Building** (`tree`): tokens are nested into an arena
//!    [`Document`] that keeps every raw tag.
//!
//! ## Key Invariants
//!
//! - `Document::parse(m).serialize() == m` for any input.
//! - Mismatched end tags are kept as raw nodes, never dropped.
//! - Nodes are addressed by [`NodeId`]; parent/child links are indices.

pub mod tokenize;
pub mod tree;

pub use tokenize::{Token, TokenKind, tokenize};
pub use tree::{Document, ElementData, Node, NodeId, NodeKind};
