use crate::text::patterns;

/// List syntax: markers, indentation and item splitting.
pub struct ListItem;

impl ListItem {
    /// Columns a tab advances to.
    pub const TAB_WIDTH: usize = 4;

    /// Whether `line` (with any indentation) starts with a list marker.
    pub fn is_list_line(line: &str) -> bool {
        patterns::bare_marker().is_match(line.trim_start())
    }

    /// Whether the trimmed line starts with a marker followed by text.
    pub fn is_marker_line(trimmed: &str) -> bool {
        patterns::bullet_marker().is_match(trimmed) || patterns::ordered_marker().is_match(trimmed)
    }

    pub fn is_ordered(trimmed: &str) -> bool {
        trimmed.starts_with(|c: char| c.is_ascii_digit())
    }

    /// Leading indentation in columns, expanding tabs.
    pub fn indent(line: &str) -> usize {
        let mut col = 0usize;
        for c in line.chars() {
            match c {
                ' ' => col += 1,
                '\t' => col += Self::TAB_WIDTH - col % Self::TAB_WIDTH,
                _ => break,
            }
        }
        col
    }

    /// Leading whitespace length in characters (tabs count as one).
    fn raw_indent(line: &str) -> usize {
        line.chars().take_while(|c| c.is_whitespace()).count()
    }

    /// The text of a marker line without its indentation and marker.
    pub fn strip_marker(trimmed: &str) -> &str {
        match patterns::list_marker().find(trimmed) {
            Some(m) => &trimmed[m.end()..],
            None => trimmed,
        }
    }

    /// The leading `- ` / `1. ` marker of `text`, or `""`.
    pub fn marker_prefix(text: &str) -> &str {
        patterns::list_marker()
            .find(text)
            .map_or("", |m| &text[..m.end()])
    }

    /// Splits a list at blank lines and at every marker line.
    pub fn split_items(content: &str) -> Vec<String> {
        let mut items = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        for line in content.split('\n') {
            let stripped = line.trim();
            if stripped.is_empty() {
                if !current.is_empty() {
                    items.push(current.join("\n"));
                    current.clear();
                }
                continue;
            }
            if Self::is_marker_line(stripped) && !current.is_empty() {
                items.push(current.join("\n"));
                current.clear();
            }
            current.push(line);
        }
        if !current.is_empty() {
            items.push(current.join("\n"));
        }
        items
    }

    /// Splits a list into top-level items; nested items stay with their parent.
    pub fn split_top_level(content: &str) -> Vec<String> {
        let mut items = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut base_indent: Option<usize> = None;
        for line in content.split('\n') {
            let stripped = line.trim();
            if stripped.is_empty() {
                if !current.is_empty() {
                    current.push(line);
                }
                continue;
            }
            let indent = Self::raw_indent(line);
            let is_marker = Self::is_marker_line(stripped);
            if is_marker && base_indent.is_none() {
                base_indent = Some(indent);
            }
            if is_marker && Some(indent) == base_indent && !current.is_empty() {
                items.push(Self::join_trimmed(&mut current));
            }
            current.push(line);
        }
        if !current.is_empty() {
            items.push(Self::join_trimmed(&mut current));
        }
        items
    }

    fn join_trimmed(lines: &mut Vec<&str>) -> String {
        while lines.last().is_some_and(|l| l.trim().is_empty()) {
            lines.pop();
        }
        let joined = lines.join("\n");
        lines.clear();
        joined
    }

    /// First line of an item without its marker.
    pub fn first_line(item: &str) -> &str {
        let first = item.split('\n').next().unwrap_or("").trim();
        let first = patterns::ordered_marker().find(first).map_or(first, |m| &first[m.end()..]);
        patterns::bullet_marker().find(first).map_or(first, |m| &first[m.end()..])
    }

    /// Whether the item has marker lines indented deeper than its first line.
    pub fn has_nested_items(item: &str) -> bool {
        let mut lines = item.split('\n');
        let Some(first) = lines.next() else {
            return false;
        };
        let base = Self::raw_indent(first);
        lines.any(|line| {
            let stripped = line.trim();
            !stripped.is_empty() && Self::raw_indent(line) > base && Self::is_marker_line(stripped)
        })
    }

    /// The direct sub-items of a nested item.
    pub fn sub_items(item: &str) -> Vec<String> {
        let mut lines = item.split('\n');
        let Some(first) = lines.next() else {
            return Vec::new();
        };
        let base = Self::raw_indent(first);
        let mut sub_indent: Option<usize> = None;
        let mut subs = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        for line in lines {
            let stripped = line.trim();
            if stripped.is_empty() {
                if !current.is_empty() {
                    current.push(line);
                }
                continue;
            }
            let indent = Self::raw_indent(line);
            if Self::is_marker_line(stripped) && indent > base {
                let level = *sub_indent.get_or_insert(indent);
                if indent == level {
                    if !current.is_empty() {
                        subs.push(Self::join_trimmed(&mut current));
                    }
                    current.push(line);
                    continue;
                }
            }
            if !current.is_empty() {
                current.push(line);
            }
        }
        if !current.is_empty() {
            subs.push(Self::join_trimmed(&mut current));
        }
        subs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_line_detection() {
        assert!(ListItem::is_list_line("- item"));
        assert!(ListItem::is_list_line("    1. nested"));
        assert!(ListItem::is_list_line("-"));
        assert!(!ListItem::is_list_line("-not a list"));
        assert!(!ListItem::is_list_line("---"));
    }

    #[test]
    fn indent_expands_tabs() {
        assert_eq!(ListItem::indent("\t- x"), 4);
        assert_eq!(ListItem::indent("  \t- x"), 4);
        assert_eq!(ListItem::indent("      - x"), 6);
    }

    #[test]
    fn split_items_breaks_on_markers_and_blanks() {
        let items = ListItem::split_items("- a\n  more\n- b\n\n- c");
        assert_eq!(items, vec!["- a\n  more", "- b", "- c"]);
    }

    #[test]
    fn top_level_items_keep_children() {
        let content = "1. one\n    - sub a\n    - sub b\n2. two\n";
        let items = ListItem::split_top_level(content);
        assert_eq!(items, vec!["1. one\n    - sub a\n    - sub b", "2. two"]);
        assert!(ListItem::has_nested_items(&items[0]));
        assert!(!ListItem::has_nested_items(&items[1]));
        assert_eq!(ListItem::sub_items(&items[0]), vec!["    - sub a", "    - sub b"]);
        assert_eq!(ListItem::first_line(&items[0]), "one");
    }

    #[test]
    fn marker_prefix_of_text() {
        assert_eq!(ListItem::marker_prefix("- item"), "- ");
        assert_eq!(ListItem::marker_prefix("12. item"), "12. ");
        assert_eq!(ListItem::marker_prefix("item"), "");
    }
}
