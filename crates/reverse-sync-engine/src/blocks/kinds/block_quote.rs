/// Blockquote syntax: the `>` prefix and its stripping.
pub struct BlockQuote;

impl BlockQuote {
    /// The blockquote prefix character.
    pub const PREFIX: char = '>';

    /// Strips blockquote prefixes from a line, returning (depth, byte_offset).
    ///
    /// Handles `> text`, `>> nested` and `> > spaced nested`.
    pub fn strip_prefixes(s: &str) -> (u8, usize) {
        let b = s.as_bytes();
        let mut i = 0usize;
        let mut depth = 0u8;

        loop {
            while i < b.len() && b[i] == b' ' {
                i += 1;
            }
            if i < b.len() && b[i] == (Self::PREFIX as u8) {
                depth = depth.saturating_add(1);
                i += 1;
                if i < b.len() && b[i] == b' ' {
                    i += 1;
                }
            } else {
                break;
            }
        }
        (depth, i)
    }

    /// A quote line starts with `>` at column zero.
    pub fn is_quote_line(s: &str) -> bool {
        s.starts_with(Self::PREFIX)
    }

    /// The quoted text with its `>` prefixes removed from every line.
    pub fn unquote(text: &str) -> String {
        text.lines()
            .map(|line| {
                let (depth, idx) = Self::strip_prefixes(line);
                if depth == 0 { line } else { &line[idx..] }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
