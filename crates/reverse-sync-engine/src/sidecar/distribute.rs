use std::collections::BTreeMap;

use crate::lost_info::LostInfo;
use crate::mapper::TargetElementRecord;

/// Assigns each page-level entry to the first record whose markup contains
/// it, returning a bag per address.
///
/// Entries are matched on their raw markup, filenames on the original name.
/// An entry is assigned at most once; entries found nowhere are dropped.
pub fn distribute_lost_info(
    page: &LostInfo,
    records: &[TargetElementRecord],
) -> BTreeMap<String, LostInfo> {
    let mut out: BTreeMap<String, LostInfo> = BTreeMap::new();
    let owner = |needle: &str| -> Option<String> {
        if needle.is_empty() {
            return None;
        }
        records
            .iter()
            .find(|r| r.rich_text.contains(needle))
            .map(|r| r.address.clone())
    };

    for entry in &page.emoticons {
        if let Some(address) = owner(&entry.raw) {
            out.entry(address).or_default().emoticons.push(entry.clone());
        }
    }
    for entry in &page.links {
        if let Some(address) = owner(&entry.raw) {
            out.entry(address).or_default().links.push(entry.clone());
        }
    }
    for entry in &page.filenames {
        if let Some(address) = owner(&entry.original) {
            out.entry(address).or_default().filenames.push(entry.clone());
        }
    }
    for entry in &page.adf_extensions {
        if let Some(address) = owner(&entry.raw) {
            out.entry(address).or_default().adf_extensions.push(entry.clone());
        }
    }
    for entry in &page.images {
        if let Some(address) = owner(&entry.raw) {
            out.entry(address).or_default().images.push(entry.clone());
        }
    }
    log::debug!(
        "distributed {} lost-info entries over {} elements",
        out.values().map(LostInfo::len).sum::<usize>(),
        out.len()
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lost_info::{EmoticonEntry, FilenameEntry, ImageEntry};
    use crate::mapper::map_target;

    #[test]
    fn entries_go_to_first_containing_record() {
        let tick = r#"<ac:emoticon ac:name="tick" />"#;
        let records = map_target(&format!(
            "<p>first {tick}</p><p>second {tick}</p><ac:image><ri:attachment ri:filename=\"화면.png\" /></ac:image>"
        ));
        let page = LostInfo {
            emoticons: vec![EmoticonEntry {
                raw: tick.to_string(),
                ..Default::default()
            }],
            filenames: vec![FilenameEntry {
                original: "화면.png".into(),
                normalized: "screen.png".into(),
            }],
            images: vec![ImageEntry {
                src: "/x/missing.png".into(),
                raw: "<ac:image>elsewhere</ac:image>".into(),
            }],
            ..Default::default()
        };

        let bags = distribute_lost_info(&page, &records);
        assert_eq!(bags.len(), 2);
        assert_eq!(bags["p[1]"].emoticons.len(), 1);
        assert!(!bags.contains_key("p[2]"));
        assert_eq!(bags["ac:image[1]"].filenames[0].normalized, "screen.png");
    }
}
