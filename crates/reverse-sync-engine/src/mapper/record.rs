use serde::{Deserialize, Serialize};

/// What a target element represents on the block side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Heading,
    Paragraph,
    List,
    Code,
    Table,
    /// Macros, extensions and any other element.
    HtmlBlock,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Heading => "heading",
            RecordKind::Paragraph => "paragraph",
            RecordKind::List => "list",
            RecordKind::Code => "code",
            RecordKind::Table => "table",
            RecordKind::HtmlBlock => "html_block",
        }
    }

    pub(crate) fn for_child_tag(tag: &str) -> Self {
        match tag {
            "ul" | "ol" => RecordKind::List,
            "table" => RecordKind::Table,
            t if super::is_heading_tag(t) => RecordKind::Heading,
            _ => RecordKind::Paragraph,
        }
    }
}

/// One addressable element of a target document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetElementRecord {
    /// `{kind}-{ordinal + 1}`, unique within a parse.
    pub id: String,
    pub kind: RecordKind,
    /// Positional path such as `p[3]` or `macro-info[1]/p[2]`.
    pub address: String,
    /// Inner markup for headings and paragraphs, outer markup otherwise.
    pub rich_text: String,
    pub plain_text: String,
    /// Position among all records of the parse.
    pub ordinal: usize,
    /// Ids of the container-child records.
    pub child_ids: Vec<String>,
    /// Plain text of each direct `li` of a list element.
    pub item_texts: Vec<String>,
}

impl TargetElementRecord {
    pub fn has_children(&self) -> bool {
        !self.child_ids.is_empty()
    }

    /// The address of the parent record, for container children.
    pub fn parent_address(&self) -> Option<&str> {
        self.address.rsplit_once('/').map(|(parent, _)| parent)
    }
}
