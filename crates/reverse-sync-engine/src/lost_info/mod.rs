//! # Lost Information
//!
//! Target constructs the block format cannot express, recorded by the forward
//! converter so that freshly rendered markup can be patched back towards the
//! original.
//!
//! [`apply_lost_info`] restores every category on rendered markup. Each entry
//! consumes at most one occurrence; entries that cannot be located are
//! skipped.

pub mod emoji;

use std::sync::OnceLock;

use html_escape::{decode_html_entities, encode_double_quoted_attribute};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::blocks::kinds::basename;
use crate::roundtrip::fragments::element_end;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmoticonEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub shortname: String,
    #[serde(default)]
    pub emoji_id: String,
    #[serde(default)]
    pub fallback: String,
    #[serde(default)]
    pub raw: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEntry {
    #[serde(default)]
    pub content_title: String,
    #[serde(default)]
    pub space_key: String,
    #[serde(default)]
    pub raw: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilenameEntry {
    #[serde(default)]
    pub original: String,
    #[serde(default)]
    pub normalized: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdfExtensionEntry {
    #[serde(default)]
    pub panel_type: String,
    #[serde(default)]
    pub raw: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageEntry {
    #[serde(default)]
    pub src: String,
    #[serde(default)]
    pub raw: String,
}

/// A categorized bag of lost constructs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LostInfo {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub emoticons: Vec<EmoticonEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<LinkEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filenames: Vec<FilenameEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub adf_extensions: Vec<AdfExtensionEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageEntry>,
}

impl LostInfo {
    pub fn is_empty(&self) -> bool {
        self.emoticons.is_empty()
            && self.links.is_empty()
            && self.filenames.is_empty()
            && self.adf_extensions.is_empty()
            && self.images.is_empty()
    }

    /// Total number of entries across categories.
    pub fn len(&self) -> usize {
        self.emoticons.len()
            + self.links.len()
            + self.filenames.len()
            + self.adf_extensions.len()
            + self.images.len()
    }
}

/// Restores lost constructs on freshly rendered markup.
pub fn apply_lost_info(rendered: &str, info: &LostInfo) -> String {
    if info.is_empty() {
        return rendered.to_string();
    }
    let mut out = rendered.to_string();
    for entry in &info.emoticons {
        out = patch_emoticon(out, entry);
    }
    for entry in &info.links {
        out = patch_link(out, entry);
    }
    for entry in &info.images {
        out = patch_image(out, entry);
    }
    for entry in &info.filenames {
        out = patch_filename(out, entry);
    }
    for entry in &info.adf_extensions {
        out = patch_adf_extension(out, entry);
    }
    out
}

/// The character the forward converter wrote for an emoticon.
pub fn emoticon_char(entry: &EmoticonEntry) -> Option<String> {
    let fallback = entry.fallback.as_str();
    if !fallback.is_empty() && !fallback.starts_with(':') {
        return Some(fallback.to_string());
    }
    if !entry.shortname.is_empty()
        && let Some(ch) = emoji::emojize(&entry.shortname)
    {
        return Some(ch.to_string());
    }
    if !fallback.is_empty() {
        return emoji::emojize(fallback).map(str::to_string);
    }
    None
}

fn patch_emoticon(out: String, entry: &EmoticonEntry) -> String {
    let Some(ch) = emoticon_char(entry) else {
        return out;
    };
    if entry.raw.is_empty() || !out.contains(&ch) {
        return out;
    }
    out.replacen(&ch, &entry.raw, 1)
}

fn rendered_link() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?s)<a href="[^"]*">(.*?)</a>"#).expect("Invalid link regex"))
}

fn patch_link(out: String, entry: &LinkEntry) -> String {
    if entry.raw.is_empty() || entry.content_title.is_empty() {
        return out;
    }
    let found = rendered_link()
        .captures_iter(&out)
        .find(|caps| decode_html_entities(&caps[1]) == entry.content_title)
        .and_then(|caps| caps.get(0))
        .map(|m| m.range());
    match found {
        Some(range) => splice(&out, range, &entry.raw),
        None => out,
    }
}

fn patch_filename(out: String, entry: &FilenameEntry) -> String {
    if entry.original.is_empty() || entry.normalized.is_empty() {
        return out;
    }
    let from = format!(
        "ri:filename=\"{}\"",
        encode_double_quoted_attribute(&entry.normalized)
    );
    let to = format!(
        "ri:filename=\"{}\"",
        encode_double_quoted_attribute(&entry.original)
    );
    out.replacen(&from, &to, 1)
}

fn patch_image(out: String, entry: &ImageEntry) -> String {
    if entry.raw.is_empty() || entry.src.is_empty() {
        return out;
    }
    let needle = format!(
        "ri:filename=\"{}\"",
        encode_double_quoted_attribute(basename(&entry.src))
    );
    let found = element_ranges(&out, "ac:image", "<ac:image")
        .into_iter()
        .find(|r| out[r.clone()].contains(&needle));
    match found {
        Some(range) => splice(&out, range, &entry.raw),
        None => out,
    }
}

/// The rendered macro an extension panel of `panel_type` turns into.
pub fn panel_macro(panel_type: &str) -> &'static str {
    match panel_type {
        "info" => "info",
        "note" => "note",
        "warning" | "error" => "warning",
        "success" | "tip" => "tip",
        _ => "panel",
    }
}

fn patch_adf_extension(out: String, entry: &AdfExtensionEntry) -> String {
    if entry.raw.is_empty() {
        return out;
    }
    let open = format!(
        "<ac:structured-macro ac:name=\"{}\"",
        panel_macro(&entry.panel_type)
    );
    match element_ranges(&out, "ac:structured-macro", &open).into_iter().next() {
        Some(range) => splice(&out, range, &entry.raw),
        None => out,
    }
}

/// Byte ranges of elements named `tag` whose opening tag starts with `open`.
fn element_ranges(markup: &str, tag: &str, open: &str) -> Vec<std::ops::Range<usize>> {
    markup
        .match_indices(open)
        .filter_map(|(start, _)| {
            let end = element_end(markup, tag, start).ok()?;
            Some(start..end)
        })
        .collect()
}

fn splice(s: &str, range: std::ops::Range<usize>, with: &str) -> String {
    let mut out = String::with_capacity(s.len() + with.len());
    out.push_str(&s[..range.start]);
    out.push_str(with);
    out.push_str(&s[range.end..]);
    out
}
