use serde::Serialize;

use crate::blocks::parse_blocks;
use crate::lost_info::apply_lost_info;
use crate::render::{RenderContext, render_block, render_document};

use super::fragments::reassemble;
use super::record::{RoundtripRecord, sha256_hex};

/// How one record block was restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpliceMethod {
    /// The block hash matched; the stored fragment was kept.
    Sidecar,
    /// The block changed and was re-rendered.
    Emitter,
    /// No block corresponds; the stored fragment was kept.
    Preserved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpliceDetail {
    pub index: usize,
    pub method: SpliceMethod,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash_expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash_actual: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpliceOutcome {
    pub markup: String,
    pub matched: usize,
    pub emitted: usize,
    pub preserved: usize,
    pub total_blocks: usize,
    pub details: Vec<SpliceDetail>,
}

/// Whether `block_text` is exactly the text the record was built from.
pub fn record_matches(block_text: &str, record: &RoundtripRecord) -> bool {
    sha256_hex(block_text) == record.mdx_sha256
}

/// Restores target markup: the stored reassembly when the block text is
/// unchanged, a full re-render otherwise.
pub fn rehydrate(block_text: &str, record: &RoundtripRecord) -> String {
    if record_matches(block_text, record) {
        return record.reassemble();
    }
    log::debug!("block text changed since record was built; re-rendering");
    fallback_rehydrate(block_text)
}

/// Re-renders every block, ignoring any record.
pub fn fallback_rehydrate(block_text: &str) -> String {
    render_document(&parse_blocks(block_text))
}

/// Restores target markup block by block, keeping stored fragments for
/// unchanged blocks and re-rendering changed ones.
pub fn splice_rehydrate(block_text: &str, record: &RoundtripRecord) -> SpliceOutcome {
    let blocks = parse_blocks(block_text);
    let ctx = RenderContext::for_blocks(&blocks);
    let content: Vec<_> = blocks.iter().filter(|b| b.is_content()).collect();

    let mut outcome = SpliceOutcome {
        markup: String::new(),
        matched: 0,
        emitted: 0,
        preserved: 0,
        total_blocks: record.blocks.len(),
        details: Vec::with_capacity(record.blocks.len()),
    };
    let mut fragments = Vec::with_capacity(record.blocks.len());
    let mut ptr = 0;

    for (i, stored) in record.blocks.iter().enumerate() {
        let current = content.get(ptr).filter(|_| !stored.mdx_content_hash.is_empty());
        let Some(block) = current else {
            fragments.push(stored.xhtml_fragment.clone());
            outcome.preserved += 1;
            outcome.details.push(SpliceDetail {
                index: i,
                method: SpliceMethod::Preserved,
                address: stored.xhtml_xpath.clone(),
                hash_expected: None,
                hash_actual: None,
            });
            continue;
        };
        ptr += 1;

        let hash = sha256_hex(&block.text);
        if hash == stored.mdx_content_hash {
            fragments.push(stored.xhtml_fragment.clone());
            outcome.matched += 1;
            outcome.details.push(SpliceDetail {
                index: i,
                method: SpliceMethod::Sidecar,
                address: stored.xhtml_xpath.clone(),
                hash_expected: None,
                hash_actual: None,
            });
            continue;
        }

        let mut emitted = render_block(block, &ctx);
        if !stored.lost_info.is_empty() {
            emitted = apply_lost_info(&emitted, &stored.lost_info);
        }
        log::debug!("re-rendered block {i} at {}", stored.xhtml_xpath);
        fragments.push(emitted);
        outcome.emitted += 1;
        outcome.details.push(SpliceDetail {
            index: i,
            method: SpliceMethod::Emitter,
            address: stored.xhtml_xpath.clone(),
            hash_expected: Some(stored.mdx_content_hash.clone()),
            hash_actual: Some(hash),
        });
    }

    outcome.markup = reassemble(
        &record.document_envelope.prefix,
        &fragments,
        &record.separators,
        &record.document_envelope.suffix,
    );
    outcome
}
