use xi_rope::Rope;

use super::span::Span;

/// A reference to a single line in the rope with its byte span.
#[derive(Debug, Clone)]
pub struct LineRef {
    /// Byte span of this line in the rope (includes newline if present).
    pub span: Span,
    /// 1-based line number.
    pub number: usize,
    /// The line text including its newline.
    pub text: String,
}

impl LineRef {
    /// The line without its trailing `\n` / `\r\n`.
    pub fn content(&self) -> &str {
        self.text.trim_end_matches(['\r', '\n'])
    }
}

/// Returns an iterator over lines with their byte spans.
///
/// Uses `lines_raw` to preserve newline characters so that concatenating the
/// lines of a block reproduces the block's source bytes exactly.
pub fn lines_with_spans(rope: &Rope) -> impl Iterator<Item = LineRef> + '_ {
    let mut offset = 0usize;
    rope.lines_raw(..).enumerate().map(move |(idx, line)| {
        let start = offset;
        offset += line.len();
        LineRef {
            span: Span { start, end: offset },
            number: idx + 1,
            text: line.into_owned(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_keep_newlines_and_spans() {
        let rope = Rope::from("a\nbc\n\nd");
        let lines: Vec<_> = lines_with_spans(&rope).collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1].text, "bc\n");
        assert_eq!(lines[1].span, Span::new(2, 5));
        assert_eq!(lines[1].number, 2);
        assert_eq!(lines[3].content(), "d");
    }

    #[test]
    fn crlf_is_trimmed_from_content() {
        let rope = Rope::from("x\r\ny");
        let first = lines_with_spans(&rope).next().unwrap();
        assert_eq!(first.content(), "x");
        assert_eq!(first.text, "x\r\n");
    }
}
