//! Report module for consolidating and persisting audit results
//!
//! This module handles:
//! - Merging check results into one report (detail sheets plus `Summary`)
//! - Writing sheets through the `ReportSink` trait
//! - SQLite, markdown and in-memory sinks
//! - Writing the configured output files, one failure not blocking the other

mod aggregator;
mod markdown;
mod model;
mod outputs;
mod sink;
mod sqlite;

pub use aggregator::ReportAggregator;
pub use markdown::{format_markdown_report, MarkdownSink};
pub use model::{
    detail_sheet, Report, ReportEntry, Sheet, SummaryRow, SUMMARY_COLUMNS, SUMMARY_SHEET,
};
pub use outputs::write_outputs;
pub use sink::{MemorySink, ReportSink};
pub use sqlite::{RunRecord, SqliteSink};

use thiserror::Error;

/// Errors that can occur while writing a report
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for report operations
pub type ReportResult<T> = Result<T, ReportError>;
