use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use super::CaseReport;
use super::reasons::{FailureReason, Priority};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReasonCount {
    pub reason: FailureReason,
    pub priority: Priority,
    pub count: usize,
}

/// Counts over a set of case reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Sorted by priority, then by descending count.
    pub reasons: Vec<ReasonCount>,
}

impl BatchSummary {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

pub fn summarize(reports: &[CaseReport]) -> BatchSummary {
    let mut counts: HashMap<FailureReason, usize> = HashMap::new();
    for report in reports.iter().filter(|r| !r.passed) {
        *counts
            .entry(report.reason.unwrap_or(FailureReason::Other))
            .or_default() += 1;
    }

    let mut reasons: Vec<ReasonCount> = counts
        .into_iter()
        .map(|(reason, count)| ReasonCount {
            reason,
            priority: reason.priority(),
            count,
        })
        .collect();
    reasons.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then(b.count.cmp(&a.count))
            .then(a.reason.cmp(&b.reason))
    });

    let passed = reports.iter().filter(|r| r.passed).count();
    BatchSummary {
        total: reports.len(),
        passed,
        failed: reports.len() - passed,
        reasons,
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "[reverse-sync] total={} passed={} failed={}",
            self.total, self.passed, self.failed
        )?;
        for r in &self.reasons {
            writeln!(f, "  {:<3} {:<34} {}", r.priority.as_str(), r.reason.as_str(), r.count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::VerifyMode;
    use super::*;
    use pretty_assertions::assert_eq;

    fn report(passed: bool, reason: Option<FailureReason>) -> CaseReport {
        CaseReport {
            name: "case".into(),
            mode: VerifyMode::Expected,
            passed,
            diff: None,
            reason,
            missing: Vec::new(),
            roundtrip_ok: None,
            patched: String::new(),
        }
    }

    #[test]
    fn reasons_sort_by_priority_then_count() {
        let reports = vec![
            report(true, None),
            report(false, Some(FailureReason::Other)),
            report(false, Some(FailureReason::VerifyFilterNoise)),
            report(false, Some(FailureReason::NonReversibleMacroNoise)),
            report(false, Some(FailureReason::NonReversibleMacroNoise)),
            report(false, Some(FailureReason::TableCellStructureMismatch)),
        ];
        let summary = summarize(&reports);

        assert_eq!((summary.total, summary.passed, summary.failed), (6, 1, 5));
        let order: Vec<(FailureReason, usize)> =
            summary.reasons.iter().map(|r| (r.reason, r.count)).collect();
        assert_eq!(
            order,
            vec![
                (FailureReason::TableCellStructureMismatch, 1),
                (FailureReason::NonReversibleMacroNoise, 2),
                (FailureReason::VerifyFilterNoise, 1),
                (FailureReason::Other, 1),
            ]
        );
    }

    #[test]
    fn summary_line() {
        let summary = summarize(&[report(true, None), report(false, None)]);
        let text = summary.to_string();
        assert!(text.starts_with("[reverse-sync] total=2 passed=1 failed=1\n"));
        assert!(text.contains("other"));
        assert!(!summary.all_passed());
    }
}
