//! Consolidation of check results into one report

use crate::checks::CheckResult;
use crate::report::model::{Report, ReportEntry, SUMMARY_SHEET};
use crate::report::sink::ReportSink;
use crate::report::ReportResult;
use chrono::Utc;
use std::collections::HashSet;

/// Builds reports for one audited page
#[derive(Debug, Clone)]
pub struct ReportAggregator {
    page_url: String,
}

impl ReportAggregator {
    pub fn new(page_url: impl Into<String>) -> Self {
        Self {
            page_url: page_url.into(),
        }
    }

    /// Files every result under a unique sheet name, preserving order
    pub fn aggregate(&self, results: Vec<CheckResult>) -> Report {
        let mut taken: HashSet<String> = HashSet::new();
        taken.insert(SUMMARY_SHEET.to_string());

        let entries: Vec<ReportEntry> = results
            .into_iter()
            .map(|result| {
                let sheet_name = unique_sheet_name(result.check_name(), &mut taken);
                ReportEntry { sheet_name, result }
            })
            .collect();

        let report = Report {
            page_url: self.page_url.clone(),
            generated_at: Utc::now(),
            entries,
        };

        let empty = report.checks_without_data();
        if !empty.is_empty() {
            tracing::warn!("No detail rows from: {}", empty.join(", "));
        }
        if report.page_unavailable() {
            tracing::error!(
                "No check could load {}; the report contains no page data",
                self.page_url
            );
        }

        report
    }

    /// Writes every detail sheet and the summary, then finishes the sink
    pub fn publish(&self, report: &Report, sink: &mut dyn ReportSink) -> ReportResult<()> {
        for sheet in report.sheets() {
            tracing::debug!("Writing sheet {} ({} rows)", sheet.name, sheet.row_count());
            sink.write_sheet(&sheet)?;
        }
        sink.finish()?;

        tracing::info!(
            "Report published: {} passed, {} failed",
            report.passed_count(),
            report.failed_count()
        );
        Ok(())
    }
}

/// Claims `base`, or `base (2)`, `base (3)`, ... when already taken
fn unique_sheet_name(base: &str, taken: &mut HashSet<String>) -> String {
    let base = if base.trim().is_empty() { "Check" } else { base };

    let mut candidate = base.to_string();
    let mut n = 2;
    while taken.contains(&candidate) {
        candidate = format!("{} ({})", base, n);
        n += 1;
    }

    taken.insert(candidate.clone());
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::{CheckStatus, DetailRows, H1Record};
    use crate::report::MemorySink;

    fn h1s() -> DetailRows {
        DetailRows::H1s(vec![H1Record {
            text: "Welcome".to_string(),
        }])
    }

    #[test]
    fn test_three_results_four_sheets() {
        let results = vec![
            CheckResult::pass("H1 Tags", "H1 tags found.", h1s()),
            CheckResult::fail("URL Status", "No links found on the page", DetailRows::Links(vec![])),
            CheckResult::fail("Script Data", "timeout after 5s", DetailRows::None),
        ];

        let aggregator = ReportAggregator::new("https://example.com/");
        let report = aggregator.aggregate(results);

        let mut sink = MemorySink::new();
        aggregator.publish(&report, &mut sink).unwrap();

        assert_eq!(sink.sheets().len(), 4);
        assert!(sink.is_finished());

        let summary = sink.sheet("Summary").unwrap();
        assert_eq!(summary.columns, vec!["page_url", "testcase", "status", "comments"]);
        assert_eq!(summary.row_count(), 3);
        assert_eq!(
            summary.rows[1],
            vec![
                "https://example.com/",
                "URL Status",
                "Fail",
                "No links found on the page"
            ]
        );

        // Zero-row detail sheets still carry their header
        let links = sink.sheet("URL Status").unwrap();
        assert_eq!(links.row_count(), 0);
        assert_eq!(links.columns[0], "URL");
    }

    #[test]
    fn test_checks_without_data_reported() {
        let report = ReportAggregator::new("https://example.com/").aggregate(vec![
            CheckResult::pass("H1 Tags", "H1 tags found.", h1s()),
            CheckResult::fail("Script Data", "timeout after 5s", DetailRows::None),
        ]);

        assert_eq!(report.checks_without_data(), vec!["Script Data"]);
        assert!(!report.page_unavailable());
        assert_eq!(report.passed_count(), 1);
        assert_eq!(report.failed_count(), 1);
    }

    #[test]
    fn test_duplicate_names_get_distinct_sheets() {
        let report = ReportAggregator::new("https://example.com/").aggregate(vec![
            CheckResult::pass("H1 Tags", "", h1s()),
            CheckResult::pass("H1 Tags", "", h1s()),
            CheckResult::pass("Summary", "", DetailRows::None),
        ]);

        let names: Vec<_> = report.sheets().into_iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec!["H1 Tags", "H1 Tags (2)", "Summary (2)", "Summary"]
        );

        // Summary rows keep the check names as reported
        let testcases: Vec<_> = report.summary().into_iter().map(|r| r.testcase).collect();
        assert_eq!(testcases, vec!["H1 Tags", "H1 Tags", "Summary"]);
    }

    #[test]
    fn test_page_unavailable_flagged() {
        let report = ReportAggregator::new("https://down.example.com/").aggregate(vec![
            CheckResult::page_unavailable("H1 Tags", "Failed to load: connection refused"),
            CheckResult::page_unavailable("URL Status", "Failed to load: connection refused"),
        ]);

        assert!(report.page_unavailable());
        assert_eq!(report.summary().len(), 2);
        assert!(report
            .summary()
            .iter()
            .all(|row| row.status == CheckStatus::Fail));
    }

    #[test]
    fn test_empty_run_is_not_page_unavailable() {
        let report = ReportAggregator::new("https://example.com/").aggregate(Vec::new());

        assert!(!report.page_unavailable());
        assert_eq!(report.sheets().len(), 1);
    }
}
