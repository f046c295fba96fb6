//! Block-specific syntax knowledge.
//!
//! Each construct owns its delimiters and recognizers here so the classifier
//! and builder never hard-code syntax.

pub mod block_quote;
pub mod callout;
pub mod code_fence;
pub mod element;
pub mod figure;
pub mod list;
pub mod table;

pub use block_quote::BlockQuote;
pub use callout::Callout;
pub use code_fence::{CodeFence, FenceKind, FenceSig};
pub use element::Element;
pub use figure::{Figure, basename};
pub use list::ListItem;
pub use table::Table;
