//! Report data model
//!
//! A `Report` keeps every check result under a unique sheet name and derives
//! the tabular `Sheet`s that sinks persist.

use crate::checks::{CheckResult, CheckStatus, DetailRows};
use chrono::{DateTime, Utc};

/// Name of the consolidated sheet
pub const SUMMARY_SHEET: &str = "Summary";

/// Columns of the consolidated sheet
pub const SUMMARY_COLUMNS: [&str; 4] = ["page_url", "testcase", "status", "comments"];

/// One named table: a header plus zero or more rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row; it must have one cell per column
    pub fn push_row(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// One line of the consolidated sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub page_url: String,
    pub testcase: String,
    pub status: CheckStatus,
    pub comments: String,
}

/// A check result filed under its sheet name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    /// Unique within the report; differs from the check name only on clashes
    pub sheet_name: String,
    pub result: CheckResult,
}

/// The consolidated outcome of one audit run
#[derive(Debug, Clone)]
pub struct Report {
    pub(crate) page_url: String,
    pub(crate) generated_at: DateTime<Utc>,
    pub(crate) entries: Vec<ReportEntry>,
}

impl Report {
    pub fn page_url(&self) -> &str {
        &self.page_url
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// Results in execution order
    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    pub fn result(&self, sheet_name: &str) -> Option<&CheckResult> {
        self.entries
            .iter()
            .find(|e| e.sheet_name == sheet_name)
            .map(|e| &e.result)
    }

    /// One summary row per executed check
    pub fn summary(&self) -> Vec<SummaryRow> {
        self.entries
            .iter()
            .map(|entry| SummaryRow {
                page_url: self.page_url.clone(),
                testcase: entry.result.check_name().to_string(),
                status: entry.result.status(),
                comments: entry.result.comment().to_string(),
            })
            .collect()
    }

    pub fn passed_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.result.status().is_pass())
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.entries.len() - self.passed_count()
    }

    /// Sheet names of checks that produced no detail rows
    pub fn checks_without_data(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.result.details().is_empty())
            .map(|e| e.sheet_name.as_str())
            .collect()
    }

    /// True when checks ran but none of them could load the page
    pub fn page_unavailable(&self) -> bool {
        !self.entries.is_empty() && self.entries.iter().all(|e| !e.result.page_loaded())
    }

    /// Detail sheets in execution order, then the summary sheet
    pub fn sheets(&self) -> Vec<Sheet> {
        let mut sheets: Vec<Sheet> = self
            .entries
            .iter()
            .map(|e| detail_sheet(&e.sheet_name, &e.result))
            .collect();
        sheets.push(self.summary_sheet());
        sheets
    }

    pub fn summary_sheet(&self) -> Sheet {
        let mut sheet = Sheet::new(SUMMARY_SHEET, &SUMMARY_COLUMNS);
        for row in self.summary() {
            sheet.push_row(vec![
                row.page_url,
                row.testcase,
                row.status.to_string(),
                row.comments,
            ]);
        }
        sheet
    }
}

/// Tabulates one result's detail rows
pub fn detail_sheet(name: &str, result: &CheckResult) -> Sheet {
    match result.details() {
        DetailRows::None => Sheet::new(name, &["Status", "Comments"]),
        DetailRows::Headings(rows) => {
            let mut sheet = Sheet::new(name, &["Tag", "Text"]);
            for row in rows {
                sheet.push_row(vec![row.tag.clone(), row.text.clone()]);
            }
            sheet
        }
        DetailRows::H1s(rows) => {
            let mut sheet = Sheet::new(name, &["H1 Text"]);
            for row in rows {
                sheet.push_row(vec![row.text.clone()]);
            }
            sheet
        }
        DetailRows::Images(rows) => {
            let mut sheet = Sheet::new(name, &["Image Index", "Image Source", "Alt Text", "Status"]);
            for row in rows {
                sheet.push_row(vec![
                    row.index.to_string(),
                    row.source.clone().unwrap_or_else(|| "No Source".to_string()),
                    row.alt_text.clone().unwrap_or_else(|| "None".to_string()),
                    row.status.to_string(),
                ]);
            }
            sheet
        }
        DetailRows::Links(rows) => {
            let mut sheet = Sheet::new(
                name,
                &["URL", "HTTP Status", "Status", "Error Message", "Attempts"],
            );
            for row in rows {
                sheet.push_row(vec![
                    row.url.clone(),
                    row.http_status.map(|s| s.to_string()).unwrap_or_default(),
                    row.status.to_string(),
                    row.error_message.clone(),
                    row.attempts.to_string(),
                ]);
            }
            sheet
        }
        DetailRows::Currencies(rows) => {
            let mut sheet = Sheet::new(
                name,
                &["Currency Name", "Currency Symbol", "Status", "Reason"],
            );
            for row in rows {
                sheet.push_row(vec![
                    row.currency_name.clone(),
                    row.currency_symbol.clone(),
                    row.status.to_string(),
                    row.reason.clone(),
                ]);
            }
            sheet
        }
        DetailRows::Payload(rows) => {
            let mut sheet = Sheet::new(name, &["Key", "Value", "Status"]);
            for row in rows {
                sheet.push_row(vec![
                    row.key.clone(),
                    row.value.clone().unwrap_or_default(),
                    row.status.to_string(),
                ]);
            }
            sheet
        }
    }
}
