use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Priority {
    P1,
    P2,
    P3,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::P1 => "P1",
            Priority::P2 => "P2",
            Priority::P3 => "P3",
        }
    }
}

/// Why a case failed, read off the changed lines of its diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    InternalLinkUnresolved,
    TableCellStructureMismatch,
    BlockquoteOrParagraphGrouping,
    VerifyFilterNoise,
    NonReversibleMacroNoise,
    EmptyParagraphStyleMismatch,
    Other,
}

/// Rules in the order they are tried.
const RULES: &[(FailureReason, &[&str])] = &[
    (FailureReason::InternalLinkUnresolved, &["#link-error"]),
    (FailureReason::TableCellStructureMismatch, &["<td", "<th", "<tr"]),
    (FailureReason::BlockquoteOrParagraphGrouping, &["<blockquote"]),
    (
        FailureReason::VerifyFilterNoise,
        &["ac:local-id", "ac:macro-id", "ac:schema-version"],
    ),
    (FailureReason::NonReversibleMacroNoise, &["ac:structured-macro"]),
    (FailureReason::EmptyParagraphStyleMismatch, &["<p />", "<p/>"]),
];

impl FailureReason {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureReason::InternalLinkUnresolved => "internal_link_unresolved",
            FailureReason::TableCellStructureMismatch => "table_cell_structure_mismatch",
            FailureReason::BlockquoteOrParagraphGrouping => "blockquote_or_paragraph_grouping",
            FailureReason::VerifyFilterNoise => "verify_filter_noise",
            FailureReason::NonReversibleMacroNoise => "non_reversible_macro_noise",
            FailureReason::EmptyParagraphStyleMismatch => "empty_paragraph_style_mismatch",
            FailureReason::Other => "other",
        }
    }

    pub fn priority(self) -> Priority {
        match self {
            FailureReason::InternalLinkUnresolved
            | FailureReason::TableCellStructureMismatch
            | FailureReason::BlockquoteOrParagraphGrouping => Priority::P1,
            FailureReason::VerifyFilterNoise
            | FailureReason::NonReversibleMacroNoise
            | FailureReason::EmptyParagraphStyleMismatch => Priority::P2,
            FailureReason::Other => Priority::P3,
        }
    }
}

/// Classifies a unified diff by the first rule whose token appears on a
/// changed line.
pub fn classify_diff(diff: &str) -> FailureReason {
    let changed: Vec<&str> = diff
        .lines()
        .filter(|l| {
            (l.starts_with('+') && !l.starts_with("+++"))
                || (l.starts_with('-') && !l.starts_with("---"))
        })
        .collect();

    RULES
        .iter()
        .find(|(_, tokens)| {
            changed
                .iter()
                .any(|line| tokens.iter().any(|t| line.contains(t)))
        })
        .map_or(FailureReason::Other, |(reason, _)| *reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("-<p>x</p>\n+<p><a href=\"#link-error\">x</a></p>", FailureReason::InternalLinkUnresolved)]
    #[case("-<tr><td>a</td></tr>\n+<tr><th>a</th></tr>", FailureReason::TableCellStructureMismatch)]
    #[case("+<blockquote><p>q</p></blockquote>", FailureReason::BlockquoteOrParagraphGrouping)]
    #[case("-<ac:structured-macro ac:macro-id=\"1\">", FailureReason::VerifyFilterNoise)]
    #[case("+<ac:structured-macro ac:name=\"toc\">", FailureReason::NonReversibleMacroNoise)]
    #[case("-<p />", FailureReason::EmptyParagraphStyleMismatch)]
    #[case("-<p>a</p>\n+<p>b</p>", FailureReason::Other)]
    fn classifies(#[case] diff: &str, #[case] expected: FailureReason) {
        assert_eq!(classify_diff(diff), expected);
    }

    #[test]
    fn context_lines_do_not_count() {
        let diff = "--- expected\n+++ actual\n <table><tr><td>x</td></tr></table>\n-<p>a</p>\n+<p>b</p>\n";
        assert_eq!(classify_diff(diff), FailureReason::Other);
    }

    #[test]
    fn priorities() {
        assert_eq!(FailureReason::TableCellStructureMismatch.priority(), Priority::P1);
        assert_eq!(FailureReason::VerifyFilterNoise.priority(), Priority::P2);
        assert_eq!(FailureReason::Other.priority(), Priority::P3);
    }
}
