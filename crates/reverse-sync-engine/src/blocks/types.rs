use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::rope::Span;

/// Blocks with no target-format counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructuralKind {
    /// The leading `---` delimited metadata block.
    FrontMatter,
    /// An `import ...` declaration line.
    Import,
    /// A single blank line.
    Blank,
}

/// The kind of a parsed block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    Heading,
    Paragraph,
    List,
    /// A fenced code block (``` or ~~~).
    Code,
    Table,
    /// A `<Callout>` container whose body is parsed into child blocks.
    Callout,
    /// A `<figure>` image with optional caption.
    Figure,
    /// A horizontal rule.
    Rule,
    BlockQuote,
    /// Any other block starting with a markup tag, kept verbatim.
    RawMarkup,
    Structural(StructuralKind),
}

impl BlockKind {
    /// Stable lowercase name used in persisted files and diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            BlockKind::Heading => "heading",
            BlockKind::Paragraph => "paragraph",
            BlockKind::List => "list",
            BlockKind::Code => "code_block",
            BlockKind::Table => "table",
            BlockKind::Callout => "callout",
            BlockKind::Figure => "figure",
            BlockKind::Rule => "hr",
            BlockKind::BlockQuote => "blockquote",
            BlockKind::RawMarkup => "html_block",
            BlockKind::Structural(StructuralKind::FrontMatter) => "frontmatter",
            BlockKind::Structural(StructuralKind::Import) => "import_statement",
            BlockKind::Structural(StructuralKind::Blank) => "empty",
        }
    }

    pub fn is_content(self) -> bool {
        !matches!(self, BlockKind::Structural(_))
    }
}

/// One parsed block of block-format text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    /// The exact source text, trailing newline included.
    pub text: String,
    /// Heading level (1-6); zero for other kinds.
    pub level: u8,
    /// Code block language; empty for other kinds.
    pub language: String,
    /// Callout body blocks.
    pub children: Vec<Block>,
    /// Callout tag attributes, or figure image attributes and caption.
    pub attributes: BTreeMap<String, String>,
    /// Byte span in the parsed source.
    pub span: Span,
    /// First and last 1-based source line.
    pub lines: (usize, usize),
}

impl Block {
    pub fn new(kind: BlockKind, text: impl Into<String>, span: Span, lines: (usize, usize)) -> Self {
        Self {
            kind,
            text: text.into(),
            level: 0,
            language: String::new(),
            children: Vec::new(),
            attributes: BTreeMap::new(),
            span,
            lines,
        }
    }

    pub fn is_content(&self) -> bool {
        self.kind.is_content()
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Child blocks that carry content.
    pub fn content_children(&self) -> impl Iterator<Item = &Block> {
        self.children.iter().filter(|c| c.is_content())
    }
}
