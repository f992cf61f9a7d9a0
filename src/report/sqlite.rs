//! SQLite report sink
//!
//! Every sheet becomes its own table named after the sheet, with one TEXT
//! column per sheet column. Rewriting a sheet drops and recreates its table.
//! Two bookkeeping tables record the runs and which sheets they wrote.
//!
//! The database holds the document of the latest run only: opening a sink
//! drops the previous run's sheets. Run history stays in `audit_runs`.

use crate::report::model::Sheet;
use crate::report::sink::ReportSink;
use crate::report::{ReportError, ReportResult};
use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;

/// Bookkeeping schema
pub const SCHEMA_SQL: &str = r#"
-- One row per audit run
CREATE TABLE IF NOT EXISTS audit_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    page_url TEXT NOT NULL,
    config_hash TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    status TEXT NOT NULL
);

-- Sheets present in the database and the run that last wrote them
CREATE TABLE IF NOT EXISTS audit_sheets (
    name TEXT PRIMARY KEY,
    columns TEXT NOT NULL,
    row_count INTEGER NOT NULL,
    run_id INTEGER NOT NULL REFERENCES audit_runs(id),
    written_at TEXT NOT NULL
);
"#;

/// A recorded audit run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRecord {
    pub id: i64,
    pub page_url: String,
    pub config_hash: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub status: String,
}

/// Writes report sheets into a SQLite database
pub struct SqliteSink {
    conn: Connection,
    run_id: i64,
}

impl SqliteSink {
    /// Opens (or creates) the database and starts a run record
    pub fn open(path: &Path, page_url: &str, config_hash: &str) -> ReportResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;
        Self::start(conn, page_url, config_hash)
    }

    /// In-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory(page_url: &str, config_hash: &str) -> ReportResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::start(conn, page_url, config_hash)
    }

    fn start(mut conn: Connection, page_url: &str, config_hash: &str) -> ReportResult<Self> {
        conn.execute_batch(SCHEMA_SQL)?;

        let tx = conn.transaction()?;
        let previous = {
            let mut stmt = tx.prepare("SELECT name FROM audit_sheets")?;
            let names = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            names
        };
        for name in &previous {
            tx.execute_batch(&format!("DROP TABLE IF EXISTS {};", quote_identifier(name)))?;
        }
        tx.execute("DELETE FROM audit_sheets", [])?;

        tx.execute(
            "INSERT INTO audit_runs (page_url, config_hash, started_at, status)
             VALUES (?1, ?2, ?3, 'running')",
            params![page_url, config_hash, Utc::now().to_rfc3339()],
        )?;
        let run_id = tx.last_insert_rowid();
        tx.commit()?;

        if !previous.is_empty() {
            tracing::debug!("Cleared {} sheets from the previous run", previous.len());
        }
        tracing::debug!("Started report run {}", run_id);

        Ok(Self { conn, run_id })
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    pub fn get_run(&self, run_id: i64) -> ReportResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, page_url, config_hash, started_at, finished_at, status
                 FROM audit_runs WHERE id = ?1",
                params![run_id],
                |row| {
                    Ok(RunRecord {
                        id: row.get(0)?,
                        page_url: row.get(1)?,
                        config_hash: row.get(2)?,
                        started_at: row.get(3)?,
                        finished_at: row.get(4)?,
                        status: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(run)
    }

    /// Names of all sheets in the database, sorted
    pub fn sheet_names(&self) -> ReportResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM audit_sheets ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    /// Reads a sheet back, rows in write order
    pub fn read_sheet(&self, name: &str) -> ReportResult<Option<Sheet>> {
        let columns_json: Option<String> = self
            .conn
            .query_row(
                "SELECT columns FROM audit_sheets WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;

        let Some(columns_json) = columns_json else {
            return Ok(None);
        };
        let columns: Vec<String> = serde_json::from_str(&columns_json)?;

        let mut stmt = self.conn.prepare(&format!(
            "SELECT * FROM {} ORDER BY rowid",
            quote_identifier(name)
        ))?;
        let width = columns.len();
        let rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|i| row.get::<_, String>(i))
                    .collect::<Result<Vec<_>, _>>()
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Sheet {
            name: name.to_string(),
            columns,
            rows,
        }))
    }
}

impl ReportSink for SqliteSink {
    fn write_sheet(&mut self, sheet: &Sheet) -> ReportResult<()> {
        if sheet.columns.is_empty() {
            return Err(ReportError::Write(format!(
                "sheet '{}' has no columns",
                sheet.name
            )));
        }

        let table = quote_identifier(&sheet.name);
        let column_defs: Vec<String> = sheet
            .columns
            .iter()
            .map(|c| format!("{} TEXT NOT NULL", quote_identifier(c)))
            .collect();

        let tx = self.conn.transaction()?;
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {table};
             CREATE TABLE {table} ({});",
            column_defs.join(", ")
        ))?;

        {
            let placeholders: Vec<String> =
                (1..=sheet.columns.len()).map(|i| format!("?{}", i)).collect();
            let mut insert = tx.prepare(&format!(
                "INSERT INTO {} VALUES ({})",
                table,
                placeholders.join(", ")
            ))?;
            for row in &sheet.rows {
                insert.execute(params_from_iter(row.iter()))?;
            }
        }

        tx.execute(
            "INSERT OR REPLACE INTO audit_sheets (name, columns, row_count, run_id, written_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                sheet.name,
                serde_json::to_string(&sheet.columns)?,
                sheet.rows.len() as i64,
                self.run_id,
                Utc::now().to_rfc3339()
            ],
        )?;
        tx.commit()?;

        Ok(())
    }

    fn finish(&mut self) -> ReportResult<()> {
        self.conn.execute(
            "UPDATE audit_runs SET finished_at = ?1, status = 'completed' WHERE id = ?2",
            params![Utc::now().to_rfc3339(), self.run_id],
        )?;
        Ok(())
    }
}

/// Quotes an SQL identifier, doubling embedded quotes
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn links_sheet() -> Sheet {
        let mut sheet = Sheet::new("URL Status", &["URL", "Status"]);
        sheet.push_row(vec!["https://a.com/".into(), "Pass".into()]);
        sheet.push_row(vec!["https://b.com/".into(), "Fail".into()]);
        sheet
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("URL Status"), "\"URL Status\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_write_and_read_sheet() {
        let mut sink = SqliteSink::open_in_memory("https://example.com/", "abc").unwrap();

        sink.write_sheet(&links_sheet()).unwrap();

        let sheet = sink.read_sheet("URL Status").unwrap().unwrap();
        assert_eq!(sheet, links_sheet());
        assert!(sink.read_sheet("Missing").unwrap().is_none());
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let mut sink = SqliteSink::open_in_memory("https://example.com/", "abc").unwrap();

        sink.write_sheet(&links_sheet()).unwrap();
        sink.write_sheet(&links_sheet()).unwrap();

        assert_eq!(sink.read_sheet("URL Status").unwrap().unwrap().row_count(), 2);
        assert_eq!(sink.sheet_names().unwrap(), vec!["URL Status"]);
    }

    #[test]
    fn test_zero_row_sheet() {
        let mut sink = SqliteSink::open_in_memory("https://example.com/", "abc").unwrap();

        sink.write_sheet(&Sheet::new("Script Data", &["Key", "Value", "Status"]))
            .unwrap();

        let sheet = sink.read_sheet("Script Data").unwrap().unwrap();
        assert_eq!(sheet.columns, vec!["Key", "Value", "Status"]);
        assert_eq!(sheet.row_count(), 0);
    }

    #[test]
    fn test_run_lifecycle_on_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.db");

        let first_run = {
            let mut sink = SqliteSink::open(&path, "https://example.com/", "hash-1").unwrap();
            let run = sink.get_run(sink.run_id()).unwrap().unwrap();
            assert_eq!(run.status, "running");
            assert!(run.finished_at.is_none());

            sink.write_sheet(&links_sheet()).unwrap();
            sink.finish().unwrap();
            sink.run_id()
        };

        let sink = SqliteSink::open(&path, "https://example.com/", "hash-2").unwrap();
        assert_ne!(sink.run_id(), first_run);

        let run = sink.get_run(first_run).unwrap().unwrap();
        assert_eq!(run.status, "completed");
        assert_eq!(run.config_hash, "hash-1");
        assert!(run.finished_at.is_some());

        // A new run starts from an empty document
        assert!(sink.read_sheet("URL Status").unwrap().is_none());
        assert!(sink.sheet_names().unwrap().is_empty());
    }

    #[test]
    fn test_reopen_keeps_only_latest_run_sheets() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.db");

        {
            let mut sink = SqliteSink::open(&path, "https://example.com/", "hash-1").unwrap();
            sink.write_sheet(&links_sheet()).unwrap();
            sink.write_sheet(&Sheet::new("Image Alt Text", &["Image Index", "Status"]))
                .unwrap();
            sink.write_sheet(&Sheet::new("Summary", &["page_url", "testcase", "status", "comments"]))
                .unwrap();
            sink.finish().unwrap();
        }

        let mut sink = SqliteSink::open(&path, "https://example.com/", "hash-2").unwrap();
        sink.write_sheet(&Sheet::new("H1 Tags", &["H1 Text"])).unwrap();
        sink.write_sheet(&Sheet::new("Summary", &["page_url", "testcase", "status", "comments"]))
            .unwrap();
        sink.finish().unwrap();

        assert_eq!(sink.sheet_names().unwrap(), vec!["H1 Tags", "Summary"]);
        assert!(sink.read_sheet("Image Alt Text").unwrap().is_none());

        let table_count: i64 = sink
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'URL Status'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(table_count, 0);

        // Run history is kept
        let runs: i64 = sink
            .conn
            .query_row("SELECT COUNT(*) FROM audit_runs", [], |row| row.get(0))
            .unwrap();
        assert_eq!(runs, 2);
    }
}
