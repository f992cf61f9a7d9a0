//! Markdown report generation
//!
//! This module renders a report as one human-readable markdown document:
//! run information followed by one table per sheet.

use crate::report::model::Sheet;
use crate::report::sink::{replace_or_push, ReportSink};
use crate::report::ReportResult;
use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Collects sheets and writes the document on `finish`
pub struct MarkdownSink {
    path: PathBuf,
    page_url: String,
    started_at: DateTime<Utc>,
    sheets: Vec<Sheet>,
}

impl MarkdownSink {
    pub fn new(path: &Path, page_url: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            page_url: page_url.into(),
            started_at: Utc::now(),
            sheets: Vec::new(),
        }
    }
}

impl ReportSink for MarkdownSink {
    fn write_sheet(&mut self, sheet: &Sheet) -> ReportResult<()> {
        replace_or_push(&mut self.sheets, sheet);
        Ok(())
    }

    fn finish(&mut self) -> ReportResult<()> {
        let markdown = format_markdown_report(&self.page_url, self.started_at, &self.sheets);

        let mut file = File::create(&self.path)?;
        file.write_all(markdown.as_bytes())?;

        tracing::info!("Markdown report written to {}", self.path.display());
        Ok(())
    }
}

/// Formats sheets as a markdown document
///
/// The summary sheet, when present, is rendered first.
pub fn format_markdown_report(
    page_url: &str,
    generated_at: DateTime<Utc>,
    sheets: &[Sheet],
) -> String {
    let mut md = String::new();

    // Title
    md.push_str("# Page Audit Report\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Page**: {}\n", page_url));
    md.push_str(&format!("- **Generated**: {}\n", generated_at.to_rfc3339()));
    md.push_str(&format!("- **Sheets**: {}\n\n", sheets.len()));

    let (summary, details): (Vec<&Sheet>, Vec<&Sheet>) = sheets
        .iter()
        .partition(|s| s.name == crate::report::SUMMARY_SHEET);

    for sheet in summary.into_iter().chain(details) {
        md.push_str(&format!("## {}\n\n", sheet.name));
        push_table(&mut md, sheet);
    }

    md
}

fn push_table(md: &mut String, sheet: &Sheet) {
    let header: Vec<String> = sheet.columns.iter().map(|c| escape_cell(c)).collect();
    md.push_str(&format!("| {} |\n", header.join(" | ")));

    let rule: Vec<&str> = sheet.columns.iter().map(|_| "---").collect();
    md.push_str(&format!("|{}|\n", rule.join("|")));

    for row in &sheet.rows {
        let cells: Vec<String> = row.iter().map(|c| escape_cell(c)).collect();
        md.push_str(&format!("| {} |\n", cells.join(" | ")));
    }

    if sheet.rows.is_empty() {
        md.push_str("\n_No rows._\n");
    }
    md.push('\n');
}

/// Keeps a cell on one line and inside its column
fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|").replace(['\r', '\n'], " ")
}
