//! Byte spans and line iteration over an `xi_rope::Rope`.

pub mod lines;
pub mod span;

pub use lines::{LineRef, lines_with_spans};
pub use span::Span;
