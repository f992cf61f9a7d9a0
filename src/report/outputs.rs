//! Writing a finished report to the configured output files

use crate::config::OutputConfig;
use crate::report::aggregator::ReportAggregator;
use crate::report::markdown::MarkdownSink;
use crate::report::model::Report;
use crate::report::sqlite::SqliteSink;
use crate::report::{ReportError, ReportResult};
use std::path::{Path, PathBuf};

/// Publishes `report` to the SQLite database and the markdown summary
///
/// Each output is attempted independently and failures are logged. Returns
/// the paths that were written, or an error when none could be.
pub fn write_outputs(
    report: &Report,
    output: &OutputConfig,
    config_hash: &str,
) -> ReportResult<Vec<PathBuf>> {
    let aggregator = ReportAggregator::new(report.page_url());
    let mut written = Vec::new();
    let mut failures = Vec::new();

    let db_path = Path::new(&output.database_path);
    let database = ensure_parent_dir(db_path)
        .and_then(|_| SqliteSink::open(db_path, report.page_url(), config_hash))
        .and_then(|mut sink| aggregator.publish(report, &mut sink));
    match database {
        Ok(()) => written.push(db_path.to_path_buf()),
        Err(e) => {
            tracing::error!("Failed to write report database {}: {}", db_path.display(), e);
            failures.push(format!("{}: {}", db_path.display(), e));
        }
    }

    let summary_path = Path::new(&output.summary_path);
    let markdown = ensure_parent_dir(summary_path).and_then(|_| {
        let mut sink = MarkdownSink::new(summary_path, report.page_url());
        aggregator.publish(report, &mut sink)
    });
    match markdown {
        Ok(()) => written.push(summary_path.to_path_buf()),
        Err(e) => {
            tracing::error!(
                "Failed to write markdown summary {}: {}",
                summary_path.display(),
                e
            );
            failures.push(format!("{}: {}", summary_path.display(), e));
        }
    }

    if written.is_empty() {
        return Err(ReportError::Write(format!(
            "no report output could be written ({})",
            failures.join("; ")
        )));
    }

    Ok(written)
}

fn ensure_parent_dir(path: &Path) -> ReportResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}
