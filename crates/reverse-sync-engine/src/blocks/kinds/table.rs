use crate::text::{capitalize, patterns};

/// Pipe-table syntax.
pub struct Table;

impl Table {
    pub fn is_table_line(remainder: &str) -> bool {
        remainder.starts_with('|')
    }

    pub fn is_separator(row: &str) -> bool {
        patterns::table_separator().is_match(row.trim())
    }

    fn is_row(s: &str) -> bool {
        s.len() > 1 && s.starts_with('|') && s.ends_with('|')
    }

    /// At least two non-blank lines, two of them pipe rows.
    pub fn is_markdown_table(content: &str) -> bool {
        let lines: Vec<&str> = content
            .trim()
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        lines.len() >= 2 && lines.iter().filter(|l| Self::is_row(l)).count() >= 2
    }

    /// Data rows, separators excluded.
    pub fn rows(content: &str) -> Vec<&str> {
        content
            .trim()
            .lines()
            .map(str::trim)
            .filter(|s| !s.is_empty() && !Self::is_separator(s) && Self::is_row(s))
            .collect()
    }

    /// Cells of a row, trimmed, outer pipes removed.
    pub fn cells(row: &str) -> Vec<&str> {
        let row = row.trim();
        let inner = row.strip_prefix('|').unwrap_or(row);
        let inner = inner.strip_suffix('|').unwrap_or(inner);
        inner.split('|').map(str::trim).collect()
    }

    /// The plain text a target table row shows for `row`.
    pub fn row_plain_text(row: &str) -> String {
        Self::cells(row)
            .into_iter()
            .map(|cell| {
                let s = patterns::bold().replace_all(cell, "$1");
                let s = patterns::code_span().replace_all(&s, "$1");
                let s = patterns::unwrap_single_star(&s);
                let s = patterns::link().replace_all(&s, "$1");
                let s = patterns::badge().replace_all(&s, |caps: &regex::Captures| {
                    format!("{}{}", &caps[2], capitalize(&caps[1]))
                });
                let s = patterns::any_tag().replace_all(&s, "");
                html_escape::decode_html_entities(&s).trim().to_string()
            })
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
