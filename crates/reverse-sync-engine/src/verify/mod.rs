//! # Verification
//!
//! Runs the reverse-sync pipeline over prepared case directories and judges
//! the result.
//!
//! ## Modes
//!
//! - **Expected**: `expected.xhtml` exists. Both sides are normalized (trailing
//!   whitespace per line and trailing blank lines dropped) and compared; a
//!   failure carries a unified diff and a [`FailureReason`].
//! - **Containment**: no expected markup. The case passes when the plain text
//!   of every content block of the edited text appears in the patched markup.
//!
//! A case that ships `expected.roundtrip.json` also checks that the record
//! restores `page.xhtml` from `original.mdx` byte for byte.

pub mod batch;
pub mod reasons;

use serde::Serialize;
use similar::TextDiff;

use crate::blocks::parse_blocks;
use crate::error::StructuralError;
use crate::io::CaseFiles;
use crate::mapper::map_target;
use crate::roundtrip::{RoundtripRecord, first_mismatch, rehydrate};
use crate::sync::sync_document;
use crate::text::{normalize_to_plain, strip_for_compare};

pub use batch::{BatchSummary, ReasonCount, summarize};
pub use reasons::{FailureReason, Priority, classify_diff};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyMode {
    Expected,
    Containment,
}

/// The verdict on one case.
#[derive(Debug, Clone, Serialize)]
pub struct CaseReport {
    pub name: String,
    pub mode: VerifyMode,
    pub passed: bool,
    /// Unified diff of expected against patched markup, on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,
    /// Block plain texts missing from the patched markup, in containment mode.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
    /// `None` when the case has no round-trip record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roundtrip_ok: Option<bool>,
    #[serde(skip)]
    pub patched: String,
}

impl CaseReport {
    /// A case whose files could not be loaded.
    pub fn load_failure(name: String, error: &dyn std::fmt::Display) -> Self {
        log::info!("{name}: {error}");
        Self {
            name,
            mode: VerifyMode::Containment,
            passed: false,
            diff: Some(error.to_string()),
            reason: Some(FailureReason::Other),
            missing: Vec::new(),
            roundtrip_ok: None,
            patched: String::new(),
        }
    }
}

/// Drops trailing whitespace on every line and trailing blank lines.
pub fn normalize_markup(markup: &str) -> String {
    let lines: Vec<&str> = markup.lines().map(str::trim_end).collect();
    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(0, |i| i + 1);
    lines[..end].join("\n")
}

/// Unified diff from `expected` to `actual`.
pub fn unified_diff(expected: &str, actual: &str) -> String {
    TextDiff::from_lines(expected, actual)
        .unified_diff()
        .context_radius(3)
        .header("expected", "actual")
        .to_string()
}

/// Block plain texts of `block_text` that do not appear in `markup`.
pub fn missing_texts(block_text: &str, markup: &str) -> Vec<String> {
    let haystack: String = map_target(markup)
        .iter()
        .filter(|r| r.parent_address().is_none())
        .map(|r| strip_for_compare(&r.plain_text))
        .collect();

    parse_blocks(block_text)
        .iter()
        .filter(|b| b.is_content())
        .map(|b| normalize_to_plain(&b.text, &b.kind))
        .filter(|plain| {
            let needle = strip_for_compare(plain);
            !needle.is_empty() && !haystack.contains(&needle)
        })
        .collect()
}

/// Checks that `record` restores `expected` from `block_text`.
pub fn verify_rehydration(
    block_text: &str,
    record: &RoundtripRecord,
    expected: &str,
) -> Result<(), StructuralError> {
    let restored = rehydrate(block_text, record);
    match first_mismatch(&restored, expected) {
        None => Ok(()),
        Some(at) => Err(StructuralError::ReassemblyMismatch {
            reassembled_len: restored.len(),
            expected_len: expected.len(),
            first_mismatch: at,
        }),
    }
}

/// Runs and judges one case.
pub fn verify_case(case: &CaseFiles) -> CaseReport {
    let name = case.name();
    let outcome = sync_document(&case.original, &case.improved, &case.page, case.mapping.as_ref());

    let roundtrip_ok = case.expected_record.as_ref().map(|record| {
        match verify_rehydration(&case.original, record, &case.page) {
            Ok(()) => true,
            Err(e) => {
                log::info!("{name}: round-trip check failed: {e}");
                false
            }
        }
    });

    let mut report = CaseReport {
        name,
        mode: VerifyMode::Containment,
        passed: false,
        diff: None,
        reason: None,
        missing: Vec::new(),
        roundtrip_ok,
        patched: String::new(),
    };

    match &case.expected {
        Some(expected) => {
            report.mode = VerifyMode::Expected;
            let (want, got) = (normalize_markup(expected), normalize_markup(&outcome.markup));
            if want == got {
                report.passed = true;
            } else {
                let diff = unified_diff(&want, &got);
                report.reason = Some(classify_diff(&diff));
                report.diff = Some(diff);
            }
        }
        None => {
            report.missing = missing_texts(&case.improved, &outcome.markup);
            report.passed = report.missing.is_empty();
            if !report.passed {
                report.reason = Some(FailureReason::Other);
            }
        }
    }

    if report.roundtrip_ok == Some(false) {
        report.passed = false;
        report.reason.get_or_insert(FailureReason::Other);
    }
    log::debug!(
        "{}: {}",
        report.name,
        if report.passed { "pass" } else { "fail" }
    );
    report.patched = outcome.markup;
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roundtrip::build_record;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn case(original: &str, improved: &str, page: &str, expected: Option<&str>) -> CaseFiles {
        CaseFiles {
            dir: PathBuf::from("cases/sample"),
            original: original.into(),
            improved: improved.into(),
            page: page.into(),
            mapping: None,
            expected: expected.map(Into::into),
            expected_record: None,
        }
    }

    #[test]
    fn normalization_ignores_trailing_whitespace() {
        assert_eq!(normalize_markup("<p>a</p>  \n<p>b</p>\t\n\n\n"), "<p>a</p>\n<p>b</p>");
        assert_eq!(normalize_markup("\n\n"), "");
    }

    #[test]
    fn expected_mode_passes() {
        let report = verify_case(&case(
            "Para one.\n",
            "Para ONE.\n",
            "<p>Para one.</p>\n",
            Some("<p>Para ONE.</p>   \n\n"),
        ));
        assert!(report.passed, "{:?}", report.diff);
        assert_eq!(report.mode, VerifyMode::Expected);
        assert_eq!(report.name, "sample");
    }

    #[test]
    fn expected_mode_failure_has_diff_and_reason() {
        let report = verify_case(&case(
            "Para one.\n",
            "Para ONE.\n",
            "<p>Para one.</p>\n",
            Some("<p>Para two.</p>\n"),
        ));
        assert!(!report.passed);
        let diff = report.diff.unwrap();
        assert!(diff.contains("-<p>Para two.</p>"));
        assert!(diff.contains("+<p>Para ONE.</p>"));
        assert_eq!(report.reason, Some(FailureReason::Other));
    }

    #[test]
    fn containment_mode() {
        let passing = verify_case(&case("Para one.\n", "Para ONE.\n", "<p>Para one.</p>", None));
        assert!(passing.passed);
        assert_eq!(passing.mode, VerifyMode::Containment);

        let missing = missing_texts("Para one.\n\nBrand new.\n", "<p>Para one.</p>");
        assert_eq!(missing, vec!["Brand new."]);
    }

    #[test]
    fn round_trip_record_is_checked() {
        let page = "<p>Para one.</p>";
        let mut files = case("Para one.\n", "Para one.\n", page, None);
        files.expected_record = Some(build_record(page, "Para one.\n", "1", &Default::default()).unwrap());
        assert_eq!(verify_case(&files).roundtrip_ok, Some(true));

        let mut record = files.expected_record.take().unwrap();
        record.blocks[0].xhtml_fragment = "<p>Other</p>".into();
        files.expected_record = Some(record);
        let report = verify_case(&files);
        assert_eq!(report.roundtrip_ok, Some(false));
        assert!(!report.passed);
    }
}
