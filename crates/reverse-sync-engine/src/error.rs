use thiserror::Error;

/// Failures that make a round-trip record or fragment split untrustworthy.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StructuralError {
    #[error("cannot find <{tag}> at or after position {position}")]
    UnresolvedTag { tag: String, position: usize },

    #[error("unclosed <{tag}> (depth={depth})")]
    UnclosedElement { tag: String, depth: usize },

    #[error(
        "reassembled markup ({reassembled_len}) != expected ({expected_len}), first mismatch at offset {first_mismatch}"
    )]
    ReassemblyMismatch {
        reassembled_len: usize,
        expected_len: usize,
        first_mismatch: usize,
    },

    #[error("expected schema_version={expected}, got {found}")]
    SchemaVersion { expected: String, found: String },
}
