//! # Sidecar Index
//!
//! The persisted mapping file records, for each top-level target address,
//! which block positions of the block-format copy produced it. At sync time
//! the file is combined with a fresh target parse into a two-hop lookup:
//!
//! ```text
//! block position ──▶ SidecarEntry ──(address)──▶ TargetElementRecord
//! ```
//!
//! Either hop may miss; a miss is not an error and callers fall back to
//! coarser strategies.

pub mod distribute;
pub mod generate;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::lost_info::LostInfo;
use crate::mapper::TargetElementRecord;

pub use distribute::distribute_lost_info;
pub use generate::{generate_mapping, match_records};

pub const MAPPING_VERSION: u32 = 2;

/// The block positions one target address corresponds to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidecarEntry {
    pub xhtml_xpath: String,
    #[serde(default)]
    pub xhtml_type: String,
    /// Empty when the element has no block-format counterpart.
    #[serde(default)]
    pub mdx_blocks: Vec<usize>,
}

/// The persisted mapping file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingFile {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub source_page_id: String,
    #[serde(default = "default_mdx_file")]
    pub mdx_file: String,
    #[serde(default)]
    pub mappings: Vec<SidecarEntry>,
    /// Page-level lost information, redistributed per element at sync time.
    #[serde(default, skip_serializing_if = "LostInfo::is_empty")]
    pub lost_info: LostInfo,
}

fn default_version() -> u32 {
    MAPPING_VERSION
}

fn default_mdx_file() -> String {
    "page.mdx".to_string()
}

impl Default for MappingFile {
    fn default() -> Self {
        Self {
            version: MAPPING_VERSION,
            source_page_id: String::new(),
            mdx_file: default_mdx_file(),
            mappings: Vec::new(),
            lost_info: LostInfo::default(),
        }
    }
}

impl MappingFile {
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserializes to unit; treat it as an empty mapping.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// Two-hop lookup from block positions to target records.
#[derive(Debug, Clone, Default)]
pub struct SidecarIndex {
    records: Vec<TargetElementRecord>,
    by_block: HashMap<usize, SidecarEntry>,
    by_address: HashMap<String, usize>,
    by_id: HashMap<String, usize>,
}

impl SidecarIndex {
    /// Builds the index. When several entries claim the same block position
    /// the later one wins.
    pub fn new(entries: &[SidecarEntry], records: Vec<TargetElementRecord>) -> Self {
        let mut by_block = HashMap::new();
        for entry in entries {
            for &pos in &entry.mdx_blocks {
                by_block.insert(pos, entry.clone());
            }
        }
        let by_address = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.address.clone(), i))
            .collect();
        let by_id = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.clone(), i))
            .collect();
        Self {
            records,
            by_block,
            by_address,
            by_id,
        }
    }

    pub fn records(&self) -> &[TargetElementRecord] {
        &self.records
    }

    pub fn entry(&self, position: usize) -> Option<&SidecarEntry> {
        self.by_block.get(&position)
    }

    pub fn record(&self, address: &str) -> Option<&TargetElementRecord> {
        self.by_address.get(address).map(|&i| &self.records[i])
    }

    /// Block position → record, or `None` when either hop misses.
    pub fn lookup(&self, position: usize) -> Option<&TargetElementRecord> {
        let entry = self.entry(position)?;
        let record = self.record(&entry.xhtml_xpath);
        if record.is_none() {
            log::debug!(
                "sidecar entry for block {position} points at missing address {}",
                entry.xhtml_xpath
            );
        }
        record
    }

    /// The container-child records of `record`, in document order.
    pub fn children(&self, record: &TargetElementRecord) -> Vec<&TargetElementRecord> {
        record
            .child_ids
            .iter()
            .filter_map(|id| self.by_id.get(id).map(|&i| &self.records[i]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::map_target;
    use pretty_assertions::assert_eq;

    fn entry(address: &str, blocks: &[usize]) -> SidecarEntry {
        SidecarEntry {
            xhtml_xpath: address.to_string(),
            xhtml_type: "paragraph".to_string(),
            mdx_blocks: blocks.to_vec(),
        }
    }

    #[test]
    fn lookup_follows_both_hops() {
        let records = map_target("<h2>T</h2><p>one</p><p>two</p>");
        let index = SidecarIndex::new(
            &[entry("h2[1]", &[2]), entry("p[1]", &[4]), entry("p[9]", &[6])],
            records,
        );
        assert_eq!(index.lookup(4).map(|r| r.plain_text.as_str()), Some("one"));
        assert!(index.lookup(6).is_none());
        assert!(index.lookup(5).is_none());
    }

    #[test]
    fn later_entry_overwrites_position() {
        let records = map_target("<p>a</p><p>b</p>");
        let index = SidecarIndex::new(&[entry("p[1]", &[3]), entry("p[2]", &[3])], records);
        assert_eq!(index.lookup(3).map(|r| r.address.as_str()), Some("p[2]"));
    }

    #[test]
    fn children_resolve_by_id() {
        let records = map_target(concat!(
            "<ac:structured-macro ac:name=\"tip\"><ac:rich-text-body>",
            "<p>a</p><p>b</p></ac:rich-text-body></ac:structured-macro>"
        ));
        let index = SidecarIndex::new(&[], records);
        let parent = index.record("macro-tip[1]").unwrap();
        let children: Vec<_> = index.children(parent).iter().map(|r| r.address.as_str()).collect();
        assert_eq!(children, vec!["macro-tip[1]/p[1]", "macro-tip[1]/p[2]"]);
    }

    #[test]
    fn mapping_file_yaml() {
        let yaml = concat!(
            "version: 2\n",
            "source_page_id: '42'\n",
            "mappings:\n",
            "- xhtml_xpath: p[1]\n",
            "  xhtml_type: paragraph\n",
            "  mdx_blocks: [4]\n",
            "- xhtml_xpath: ac:image[1]\n",
        );
        let file = MappingFile::from_yaml(yaml).unwrap();
        assert_eq!(file.source_page_id, "42");
        assert_eq!(file.mdx_file, "page.mdx");
        assert_eq!(file.mappings[1].mdx_blocks, Vec::<usize>::new());
        assert!(file.lost_info.is_empty());

        let again = MappingFile::from_yaml(&file.to_yaml().unwrap()).unwrap();
        assert_eq!(again, file);
        assert_eq!(MappingFile::from_yaml("").unwrap(), MappingFile::default());
    }
}
