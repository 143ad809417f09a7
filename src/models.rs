//! Data models for report processing.
//!
//! This module contains the core data structures shared by the classifier,
//! the aggregator and the report generator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity level of a reported issue.
///
/// Ordered from least to most severe, so `--fail-on` thresholds can compare
/// with `>=`. Keyword detection uses [`Severity::DETECTION_ORDER`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Findings flagged for manual review
    Review,
    /// Warnings
    Warning,
    /// Errors
    Error,
    /// Critical defects
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

impl Severity {
    /// Order in which keywords are checked against a cell; the first hit wins.
    pub const DETECTION_ORDER: [Severity; 4] = [
        Severity::Critical,
        Severity::Error,
        Severity::Warning,
        Severity::Review,
    ];

    /// The literal keyword searched for in report cells.
    pub fn keyword(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::Error => "Error",
            Severity::Warning => "Warning",
            Severity::Review => "Review",
        }
    }

    /// Column header used in the summary sheet.
    pub fn header(&self) -> &'static str {
        match self {
            Severity::Critical => "(1)Critical",
            Severity::Error => "(2)Error",
            Severity::Warning => "(3)Warning",
            Severity::Review => "(4)Review",
        }
    }

    /// Returns the first severity whose keyword is contained in `text`.
    ///
    /// Matching is case-sensitive. A cell mentioning both "Critical" and
    /// "Error" is reported as `Critical` only.
    pub fn detect(text: &str) -> Option<Severity> {
        Self::DETECTION_ORDER
            .into_iter()
            .find(|severity| text.contains(severity.keyword()))
    }
}

/// A single spreadsheet cell value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    /// Returns the text content, if this is a text cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Short name of the value kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            CellValue::Empty => "an empty cell",
            CellValue::Text(_) => "text",
            CellValue::Number(_) => "a number",
            CellValue::Bool(_) => "a boolean",
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<usize> for CellValue {
    fn from(n: usize) -> Self {
        CellValue::Number(n as f64)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
        }
    }
}

/// Per-severity keyword counts for one sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub error: usize,
    pub warning: usize,
    pub review: usize,
}

impl SeverityCounts {
    #[cfg(test)]
    pub fn new(critical: usize, error: usize, warning: usize, review: usize) -> Self {
        Self {
            critical,
            error,
            warning,
            review,
        }
    }

    /// Increment the counter for `severity`.
    pub fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::Error => self.error += 1,
            Severity::Warning => self.warning += 1,
            Severity::Review => self.review += 1,
        }
    }

    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::Error => self.error,
            Severity::Warning => self.warning,
            Severity::Review => self.review,
        }
    }

    pub fn total(&self) -> usize {
        self.critical + self.error + self.warning + self.review
    }

    /// Returns true if any severity at or above `threshold` has a non-zero count.
    pub fn any_at_or_above(&self, threshold: Severity) -> bool {
        Severity::DETECTION_ORDER
            .into_iter()
            .any(|severity| severity >= threshold && self.get(severity) > 0)
    }
}

impl std::ops::AddAssign for SeverityCounts {
    fn add_assign(&mut self, other: Self) {
        self.critical += other.critical;
        self.error += other.error;
        self.warning += other.warning;
        self.review += other.review;
    }
}

/// Aggregated severity counts for one module sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryEntry {
    /// Module (sheet) name.
    pub module: String,
    /// Keyword counts for the module.
    pub counts: SeverityCounts,
}

impl SummaryEntry {
    pub fn new(module: impl Into<String>, counts: SeverityCounts) -> Self {
        Self {
            module: module.into(),
            counts,
        }
    }
}

/// Number of rows copied into one module sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRows {
    pub module: String,
    pub rows: usize,
}

/// Result of splitting a combined report into module sheets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitOutcome {
    /// Name of the sheet the rows were read from.
    pub source_sheet: String,
    /// Number of rows inspected.
    pub rows_scanned: usize,
    /// Number of rows that matched no rule.
    pub rows_unmatched: usize,
    /// Rows copied per module, in rule order.
    pub modules: Vec<ModuleRows>,
}

impl SplitOutcome {
    pub fn rows_matched(&self) -> usize {
        self.modules.iter().map(|m| m.rows).sum()
    }
}

/// Metadata about a processing run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Subcommand that produced the report.
    pub command: String,
    /// Workbook that was read.
    pub input: String,
    /// Workbook that was written.
    pub output: String,
    /// Date and time of the run.
    pub generated_at: DateTime<Utc>,
    /// Number of sheets in the saved workbook.
    pub sheets: usize,
    /// Whether saving was skipped.
    pub dry_run: bool,
    /// Duration of the run in seconds.
    pub duration_seconds: f64,
}

/// What a run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RunOutcome {
    Split(SplitOutcome),
    Summary { entries: Vec<SummaryEntry> },
}

/// The complete run report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub outcome: RunOutcome,
}
