//! Report sink trait and the in-memory sink

use crate::report::model::Sheet;
use crate::report::ReportResult;

/// Destination for report sheets
///
/// Writing a sheet whose name was already written replaces it, so
/// publishing the same report twice leaves the same result.
pub trait ReportSink {
    /// Persists one sheet, replacing any earlier sheet with the same name
    fn write_sheet(&mut self, sheet: &Sheet) -> ReportResult<()>;

    /// Flushes and closes the document
    fn finish(&mut self) -> ReportResult<()>;
}

/// Keeps sheets in memory, in write order
#[derive(Debug, Default)]
pub struct MemorySink {
    sheets: Vec<Sheet>,
    finished: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl ReportSink for MemorySink {
    fn write_sheet(&mut self, sheet: &Sheet) -> ReportResult<()> {
        replace_or_push(&mut self.sheets, sheet);
        Ok(())
    }

    fn finish(&mut self) -> ReportResult<()> {
        self.finished = true;
        Ok(())
    }
}

/// Replaces the sheet with the same name in place, or appends
pub(crate) fn replace_or_push(sheets: &mut Vec<Sheet>, sheet: &Sheet) {
    match sheets.iter_mut().find(|s| s.name == sheet.name) {
        Some(existing) => *existing = sheet.clone(),
        None => sheets.push(sheet.clone()),
    }
}
