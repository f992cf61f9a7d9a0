//! Result model shared by every check
//!
//! A `CheckResult` is a fixed envelope (name, status, comment) around a
//! tagged set of detail rows. Counts are always folded from the rows; nothing
//! keeps a running tally.

use crate::links::LinkRecord;
use std::fmt;

/// Comment used when a failure is constructed without a cause
const UNSPECIFIED_FAILURE: &str = "Check failed without a reported cause";

/// Verdict for a check or a single detail row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckStatus {
    Pass,
    Fail,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "Pass",
            Self::Fail => "Fail",
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    /// `Pass` when `ok` holds, `Fail` otherwise
    pub fn from_bool(ok: bool) -> Self {
        if ok {
            Self::Pass
        } else {
            Self::Fail
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One heading in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingRecord {
    /// Uppercase tag, `H1` to `H6`
    pub tag: String,
    pub text: String,
}

impl HeadingRecord {
    /// Numeric level parsed from the tag
    pub fn level(&self) -> Option<u8> {
        self.tag
            .strip_prefix(|c: char| c.eq_ignore_ascii_case(&'h'))
            .and_then(|n| n.parse::<u8>().ok())
            .filter(|n| (1..=6).contains(n))
    }
}

/// Text of one H1 element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct H1Record {
    pub text: String,
}

/// Alt-text verdict for one image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    /// 1-based position in document order
    pub index: usize,
    pub source: Option<String>,
    pub alt_text: Option<String>,
    pub status: CheckStatus,
}

/// Outcome of selecting one currency option
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyRecord {
    pub currency_name: String,
    pub currency_symbol: String,
    pub status: CheckStatus,
    pub reason: String,
}

/// One required key of the embedded payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadField {
    pub key: String,
    pub value: Option<String>,
    pub status: CheckStatus,
}

/// Check-specific detail rows
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DetailRows {
    /// The check produced no rows (e.g. the page never loaded)
    #[default]
    None,
    Headings(Vec<HeadingRecord>),
    H1s(Vec<H1Record>),
    Images(Vec<ImageRecord>),
    Links(Vec<LinkRecord>),
    Currencies(Vec<CurrencyRecord>),
    Payload(Vec<PayloadField>),
}

impl DetailRows {
    pub fn len(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Headings(rows) => rows.len(),
            Self::H1s(rows) => rows.len(),
            Self::Images(rows) => rows.len(),
            Self::Links(rows) => rows.len(),
            Self::Currencies(rows) => rows.len(),
            Self::Payload(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Per-row statuses, for row schemas that carry one
    pub fn statuses(&self) -> Vec<CheckStatus> {
        match self {
            Self::Images(rows) => rows.iter().map(|r| r.status).collect(),
            Self::Links(rows) => rows.iter().map(|r| r.status).collect(),
            Self::Currencies(rows) => rows.iter().map(|r| r.status).collect(),
            Self::Payload(rows) => rows.iter().map(|r| r.status).collect(),
            Self::None | Self::Headings(_) | Self::H1s(_) => Vec::new(),
        }
    }

    /// Number of rows marked `Fail`
    pub fn failed_count(&self) -> usize {
        self.statuses().iter().filter(|s| !s.is_pass()).count()
    }

    /// Number of rows marked `Pass`
    pub fn passed_count(&self) -> usize {
        self.statuses().iter().filter(|s| s.is_pass()).count()
    }
}

/// The verdict of one check invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    check_name: String,
    status: CheckStatus,
    comment: String,
    details: DetailRows,
    page_loaded: bool,
}

impl CheckResult {
    /// Builds a result; a `Fail` with an empty comment gets a generic cause
    pub fn new(
        check_name: impl Into<String>,
        status: CheckStatus,
        comment: impl Into<String>,
        details: DetailRows,
    ) -> Self {
        let mut comment = comment.into();
        if status == CheckStatus::Fail && comment.trim().is_empty() {
            comment = UNSPECIFIED_FAILURE.to_string();
        }

        Self {
            check_name: check_name.into(),
            status,
            comment,
            details,
            page_loaded: true,
        }
    }

    pub fn pass(
        check_name: impl Into<String>,
        comment: impl Into<String>,
        details: DetailRows,
    ) -> Self {
        Self::new(check_name, CheckStatus::Pass, comment, details)
    }

    pub fn fail(
        check_name: impl Into<String>,
        comment: impl Into<String>,
        details: DetailRows,
    ) -> Self {
        Self::new(check_name, CheckStatus::Fail, comment, details)
    }

    /// A failure recorded because the page never loaded for this check
    pub fn page_unavailable(check_name: impl Into<String>, comment: impl Into<String>) -> Self {
        Self {
            page_loaded: false,
            ..Self::fail(check_name, comment, DetailRows::None)
        }
    }

    pub fn check_name(&self) -> &str {
        &self.check_name
    }

    pub fn status(&self) -> CheckStatus {
        self.status
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn details(&self) -> &DetailRows {
        &self.details
    }

    /// False when the check never saw the page
    pub fn page_loaded(&self) -> bool {
        self.page_loaded
    }
}
