//! # Text normalisation
//!
//! Block text and target plain text never compare byte-for-byte: list markers,
//! inline emphasis, entity escapes and invisible characters all differ between
//! the two formats. The helpers here reduce both sides to comparable forms.
//!
//! - [`collapse_ws`] and [`strip_for_compare`] are the two comparison keys
//!   used throughout the patch builder.
//! - [`normalize_to_plain`] turns a block's source into the text the target
//!   element would show.
//! - [`transfer`] carries a character diff onto a differently formatted text.

pub(crate) mod patterns;
pub mod transfer;

use unicode_normalization::UnicodeNormalization;

use crate::blocks::BlockKind;
use crate::blocks::kinds::CodeFence;

pub use transfer::{align_chars, find_insert_pos, transfer_text_changes};

const INVISIBLE: [char; 11] = [
    '\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}', '\u{00AD}', '\u{3164}',
    '\u{115F}', '\u{1160}', '\u{3000}', '\u{00A0}',
];

/// Splits on whitespace and joins with single spaces.
pub fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Removes every whitespace and invisible character.
pub fn strip_for_compare(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace() && !INVISIBLE.contains(c))
        .collect()
}

/// Removes a leading `-`, `*`, `+` or `12.` marker from whitespace-free text.
pub fn strip_list_marker(s: &str) -> &str {
    if let Some(rest) = s.strip_prefix(['-', '*', '+']) {
        return rest;
    }
    let digits = s.bytes().take_while(u8::is_ascii_digit).count();
    if digits > 0 && s[digits..].starts_with('.') {
        return &s[digits + 1..];
    }
    s
}

/// NFC-normalises and replaces hidden characters that break comparisons.
pub fn clean_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.nfc() {
        match c {
            '\u{00A0}' | '\u{202F}' => out.push(' '),
            '\u{200B}' | '\u{200E}' | '\u{3164}' => {}
            other => out.push(other),
        }
    }
    out
}

/// Converts a block's source text into the plain text its target element shows.
///
/// A code block shows its body literally, so nothing is stripped from it.
pub fn normalize_to_plain(content: &str, kind: &BlockKind) -> String {
    let text = content.trim();
    match kind {
        BlockKind::Heading => return normalize_heading(text),
        BlockKind::Code => return CodeFence::body(text),
        _ => {}
    }

    let mut parts = Vec::new();
    for line in text.lines() {
        let mut s = line.trim().to_string();
        if s.is_empty()
            || s.starts_with("<figure")
            || s.starts_with("<img")
            || s.starts_with("</figure")
            || s.starts_with("```")
            || patterns::table_separator().is_match(&s)
        {
            continue;
        }
        if s.len() > 1 && s.starts_with('|') && s.ends_with('|') {
            s = table_row_text(&s);
        }
        s = patterns::ordered_marker().replace(&s, "").into_owned();
        s = patterns::bullet_marker().replace(&s, "").into_owned();
        s = patterns::bold().replace_all(&s, "$1").into_owned();
        s = patterns::code_span().replace_all(&s, "$1").into_owned();
        s = patterns::unwrap_single_star(&s);
        s = patterns::link()
            .replace_all(&s, |caps: &regex::Captures| link_title(&caps[1]).to_string())
            .into_owned();
        s = badge_to_text(&s);
        s = patterns::any_tag().replace_all(&s, "").into_owned();
        let s = html_escape::decode_html_entities(&s);
        let s = s.trim();
        if !s.is_empty() {
            parts.push(s.to_string());
        }
    }
    parts.join(" ")
}

fn normalize_heading(text: &str) -> String {
    let s = text.trim_start_matches('#').trim();
    let s = patterns::bold().replace_all(s, "$1");
    let s = patterns::code_span().replace_all(&s, "$1");
    let s = badge_to_text(&s);
    let s = patterns::any_tag().replace_all(&s, "");
    html_escape::decode_html_entities(&s).trim().to_string()
}

/// Non-empty cells of a `| a | b |` row joined by a space.
pub(crate) fn table_row_text(row: &str) -> String {
    let inner = &row[1..row.len() - 1];
    inner
        .split('|')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// `[Title | Anchor](url)` links show only `Title` in the target.
fn link_title(text: &str) -> &str {
    match text.split_once(" | ") {
        Some((title, _)) => title,
        None => text,
    }
}

/// A status badge reads as its title followed by the capitalised colour.
fn badge_to_text(s: &str) -> String {
    patterns::badge()
        .replace_all(s, |caps: &regex::Captures| {
            format!("{}{}", &caps[2], capitalize(&caps[1]))
        })
        .into_owned()
}

pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
