//! Inline-format change detection.
//!
//! A text edit can be carried onto the target by character transfer only while
//! the inline markers (code spans, bold, italic, links) keep their content and
//! the free text between them. Once a marker boundary moves, the element has to
//! be re-rendered instead.

use crate::text::{collapse_ws, patterns};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkerKind {
    Code,
    Bold,
    Italic,
    Link,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Marker {
    kind: MarkerKind,
    start: usize,
    end: usize,
    content: String,
}

/// Inline markers of `text`, ordered by position.
fn markers(text: &str) -> Vec<Marker> {
    let mut found = Vec::new();
    for caps in patterns::code_span().captures_iter(text) {
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        found.push(Marker {
            kind: MarkerKind::Code,
            start: whole.start,
            end: whole.end,
            content: caps[1].to_string(),
        });
    }
    for caps in patterns::bold().captures_iter(text) {
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        found.push(Marker {
            kind: MarkerKind::Bold,
            start: whole.start,
            end: whole.end,
            content: caps[1].to_string(),
        });
    }
    for (start, end) in patterns::single_star_spans(text) {
        found.push(Marker {
            kind: MarkerKind::Italic,
            start,
            end,
            content: text[start + 1..end - 1].to_string(),
        });
    }
    for caps in patterns::link().captures_iter(text) {
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        found.push(Marker {
            kind: MarkerKind::Link,
            start: whole.start,
            end: whole.end,
            content: caps[1].to_string(),
        });
    }
    found.sort_by_key(|m| (m.start, m.end));
    found
}

/// Collapsed free text between consecutive markers.
fn between_texts(text: &str, markers: &[Marker]) -> Vec<String> {
    markers
        .windows(2)
        .map(|w| {
            let (from, to) = (w[0].end, w[1].start);
            if from < to {
                collapse_ws(&text[from..to])
            } else {
                String::new()
            }
        })
        .collect()
}

fn leading_text(text: &str, markers: &[Marker]) -> String {
    markers
        .first()
        .map_or(String::new(), |m| collapse_ws(&text[..m.start]))
}

fn signature(markers: &[Marker]) -> Vec<(MarkerKind, &str)> {
    markers.iter().map(|m| (m.kind, m.content.as_str())).collect()
}

/// Whether `old` → `new` changes any marker, its content, or the free text
/// between two markers.
pub fn has_inline_format_change(old: &str, new: &str) -> bool {
    let (old_markers, new_markers) = (markers(old), markers(new));
    if signature(&old_markers) != signature(&new_markers) {
        return true;
    }
    between_texts(old, &old_markers) != between_texts(new, &new_markers)
}

/// Whether `old` → `new` moves a marker boundary: the marker kinds differ, or
/// the free text before the first marker or between markers changed.
pub fn has_inline_boundary_change(old: &str, new: &str) -> bool {
    let (old_markers, new_markers) = (markers(old), markers(new));
    let kinds = |ms: &[Marker]| ms.iter().map(|m| m.kind).collect::<Vec<_>>();
    if kinds(&old_markers) != kinds(&new_markers) {
        return true;
    }
    if old_markers.is_empty() {
        return false;
    }
    between_texts(old, &old_markers) != between_texts(new, &new_markers)
        || leading_text(old, &old_markers) != leading_text(new, &new_markers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("plain words", "plain sentence", false)]
    #[case("use `ls` here", "use `ls` there", false)]
    #[case("use `ls` here", "use `ls -la` here", true)]
    #[case("a **b** c", "a b c", true)]
    #[case("**x** and *y*", "**x** or *y*", true)]
    #[case("see [docs](a.md)", "see [docs](b.md) now", false)]
    fn format_change(#[case] old: &str, #[case] new: &str, #[case] expected: bool) {
        assert_eq!(has_inline_format_change(old, new), expected);
    }

    #[rstest]
    #[case("no markers", "still none", false)]
    #[case("lead **b** tail", "lead **b** other tail", false)]
    #[case("lead **b** tail", "new lead **b** tail", true)]
    #[case("**b**", "`b`", true)]
    fn boundary_change(#[case] old: &str, #[case] new: &str, #[case] expected: bool) {
        assert_eq!(has_inline_boundary_change(old, new), expected);
    }

    #[test]
    fn markers_are_ordered() {
        let found = markers("`c` then **b** then *i* then [l](u)");
        let kinds: Vec<_> = found.iter().map(|m| m.kind).collect();
        assert_eq!(
            kinds,
            vec![MarkerKind::Code, MarkerKind::Bold, MarkerKind::Italic, MarkerKind::Link]
        );
        assert_eq!(found[2].content, "i");
    }
}
