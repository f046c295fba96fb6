use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::blocks::parse_blocks;
use crate::error::StructuralError;
use crate::lost_info::LostInfo;
use crate::mapper::map_target;
use crate::sidecar::distribute_lost_info;

use super::fragments::{extract_fragments, reassemble};

pub const SCHEMA_VERSION: &str = "2";

/// Lowercase hex SHA-256 of the UTF-8 bytes of `text`.
pub fn sha256_hex(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// Byte offset of the first difference, or `None` when equal.
pub fn first_mismatch(a: &str, b: &str) -> Option<usize> {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    match a.iter().zip(b).position(|(x, y)| x != y) {
        Some(at) => Some(at),
        None if a.len() != b.len() => Some(a.len().min(b.len())),
        None => None,
    }
}

/// Text before the first and after the last fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEnvelope {
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub suffix: String,
}

/// One top-level fragment and the block it was paired with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordBlock {
    pub block_index: usize,
    pub xhtml_xpath: String,
    pub xhtml_fragment: String,
    /// Empty when no block-format block corresponds.
    #[serde(default)]
    pub mdx_content_hash: String,
    #[serde(default)]
    pub mdx_line_range: (usize, usize),
    #[serde(default)]
    pub lost_info: LostInfo,
}

/// Everything needed to restore the target markup from block text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundtripRecord {
    #[serde(default)]
    pub schema_version: String,
    #[serde(default)]
    pub page_id: String,
    #[serde(default)]
    pub mdx_sha256: String,
    #[serde(default)]
    pub source_xhtml_sha256: String,
    #[serde(default)]
    pub blocks: Vec<RecordBlock>,
    #[serde(default)]
    pub separators: Vec<String>,
    #[serde(default)]
    pub document_envelope: DocumentEnvelope,
}

impl RoundtripRecord {
    /// The stored fragments, separators and envelope joined back together.
    pub fn reassemble(&self) -> String {
        let fragments: Vec<String> = self.blocks.iter().map(|b| b.xhtml_fragment.clone()).collect();
        reassemble(
            &self.document_envelope.prefix,
            &fragments,
            &self.separators,
            &self.document_envelope.suffix,
        )
    }

    /// Checks that reassembly reproduces `expected` exactly.
    pub fn verify(&self, expected: &str) -> Result<(), StructuralError> {
        let reassembled = self.reassemble();
        match first_mismatch(&reassembled, expected) {
            None => Ok(()),
            Some(at) => Err(StructuralError::ReassemblyMismatch {
                reassembled_len: reassembled.len(),
                expected_len: expected.len(),
                first_mismatch: at,
            }),
        }
    }

    /// Rejects records written under another schema.
    pub fn check_schema(&self) -> Result<(), StructuralError> {
        if self.schema_version == SCHEMA_VERSION {
            return Ok(());
        }
        Err(StructuralError::SchemaVersion {
            expected: SCHEMA_VERSION.to_string(),
            found: self.schema_version.clone(),
        })
    }

    /// Pretty JSON with two-space indentation and a trailing newline.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        Ok(out)
    }
}

/// Builds a record for `target`, pairing its fragments with the content
/// blocks of `block_text` in order.
///
/// Entries of `page_lost_info` are attached to the fragment whose element
/// contains them. Fails when the fragments do not reassemble to `target`.
pub fn build_record(
    target: &str,
    block_text: &str,
    page_id: &str,
    page_lost_info: &LostInfo,
) -> Result<RoundtripRecord, StructuralError> {
    let records = map_target(target);
    let split = extract_fragments(target)?;
    let blocks = parse_blocks(block_text);
    let content: Vec<_> = blocks.iter().filter(|b| b.is_content()).collect();
    let mut lost = distribute_lost_info(page_lost_info, &records);

    let top_addresses: Vec<&str> = records
        .iter()
        .filter(|r| r.parent_address().is_none())
        .map(|r| r.address.as_str())
        .collect();

    let record_blocks = split
        .fragments
        .iter()
        .enumerate()
        .map(|(i, fragment)| {
            let xpath = top_addresses
                .get(i)
                .map_or_else(|| format!("unknown[{i}]"), |a| a.to_string());
            let (hash, range) = match content.get(i) {
                Some(block) => (sha256_hex(&block.text), block.lines),
                None => (String::new(), (0, 0)),
            };
            RecordBlock {
                block_index: i,
                lost_info: lost.remove(&xpath).unwrap_or_default(),
                xhtml_xpath: xpath,
                xhtml_fragment: fragment.clone(),
                mdx_content_hash: hash,
                mdx_line_range: range,
            }
        })
        .collect();

    let record = RoundtripRecord {
        schema_version: SCHEMA_VERSION.to_string(),
        page_id: page_id.to_string(),
        mdx_sha256: sha256_hex(block_text),
        source_xhtml_sha256: sha256_hex(target),
        blocks: record_blocks,
        separators: split.separators,
        document_envelope: DocumentEnvelope {
            prefix: split.prefix,
            suffix: split.suffix,
        },
    };
    record.verify(target)?;
    Ok(record)
}
