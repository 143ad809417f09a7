//! In-memory workbook model.
//!
//! A workbook is an ordered list of uniquely named sheets. Each sheet is a
//! dense row-major grid anchored at `A1`, so column letters read from the
//! configuration map directly onto cell positions.

pub mod io;

use crate::error::{ReportError, Result};
use crate::models::CellValue;

/// Highest column Excel supports (`XFD`), zero-indexed.
pub const MAX_COLUMN: usize = 16_383;

/// Longest sheet name Excel accepts.
const MAX_SHEET_NAME_LEN: usize = 31;

/// Table decoration written around a sheet's used range on save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    /// Workbook-unique table name (e.g. `Table1`).
    pub name: String,
    pub first_column: bool,
    pub last_column: bool,
    pub banded_rows: bool,
    pub banded_columns: bool,
}

impl TableSpec {
    /// The summary table style: last column emphasised, striped columns only.
    pub fn summary(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            first_column: false,
            last_column: true,
            banded_rows: false,
            banded_columns: true,
        }
    }
}

/// A named grid of cell values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    name: String,
    rows: Vec<Vec<CellValue>>,
    table: Option<TableSpec>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
            table: None,
        }
    }

    /// Build a sheet from rows of values.
    pub fn from_rows<R, C>(name: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator<Item = Vec<C>>,
        C: Into<CellValue>,
    {
        let mut sheet = Self::new(name);
        for row in rows {
            sheet.append_row(row.into_iter().map(Into::into).collect());
        }
        sheet
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Width of the widest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Append a row below the last one. Trailing empty cells are dropped.
    pub fn append_row(&mut self, mut row: Vec<CellValue>) {
        while row.last().is_some_and(CellValue::is_empty) {
            row.pop();
        }
        self.rows.push(row);
    }

    /// Returns the cell at zero-indexed `(row, col)`, if it lies inside the grid.
    pub fn cell(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|cells| cells.get(col))
    }

    pub fn table(&self) -> Option<&TableSpec> {
        self.table.as_ref()
    }

    pub fn set_table(&mut self, table: TableSpec) {
        self.table = Some(table);
    }
}

/// An ordered collection of sheets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(Sheet::name).collect()
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.sheets.iter().position(|s| s.name == name)
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Resolve the sheet a command works on: the named one, or the first sheet.
    pub fn resolve_sheet(&self, name: Option<&str>) -> Result<&Sheet> {
        match name {
            Some(name) => self
                .sheet(name)
                .ok_or_else(|| ReportError::SheetNotFound(name.to_string())),
            None => self.sheets.first().ok_or(ReportError::NoSheets),
        }
    }

    /// Append a sheet after the existing ones.
    pub fn add_sheet(&mut self, sheet: Sheet) -> Result<()> {
        let index = self.sheets.len();
        self.insert_sheet(index, sheet)
    }

    /// Insert a sheet at `index` (clamped to the sheet count).
    pub fn insert_sheet(&mut self, index: usize, sheet: Sheet) -> Result<()> {
        validate_sheet_name(&sheet.name)?;
        if self.position(&sheet.name).is_some() {
            return Err(ReportError::SheetExists(sheet.name));
        }
        let index = index.min(self.sheets.len());
        self.sheets.insert(index, sheet);
        Ok(())
    }

    /// Remove and return the sheet called `name`.
    pub fn remove_sheet(&mut self, name: &str) -> Option<Sheet> {
        let index = self.position(name)?;
        Some(self.sheets.remove(index))
    }
}

/// Check a name against Excel's sheet-name rules.
pub fn validate_sheet_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        Some("name is empty")
    } else if name.chars().count() > MAX_SHEET_NAME_LEN {
        Some("name is longer than 31 characters")
    } else if name.contains(['[', ']', ':', '*', '?', '/', '\\']) {
        Some("name contains one of []:*?/\\")
    } else if name.starts_with('\'') || name.ends_with('\'') {
        Some("name starts or ends with an apostrophe")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(ReportError::InvalidSheetName {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// Parse column letters (`"A"`, `"b"`, `"GH"`) into a zero-indexed column.
pub fn parse_column(letters: &str) -> Result<usize> {
    let invalid = || ReportError::InvalidColumn(letters.to_string());

    let trimmed = letters.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(invalid());
    }

    let mut acc = 0usize;
    for c in trimmed.to_ascii_uppercase().bytes() {
        let digit = (c - b'A') as usize + 1;
        acc = acc
            .checked_mul(26)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(invalid)?;
    }

    let col = acc - 1;
    if col > MAX_COLUMN {
        return Err(invalid());
    }
    Ok(col)
}

/// Convert a zero-indexed column to letters (0 -> A, 25 -> Z, 26 -> AA).
pub fn column_letters(col: usize) -> String {
    let mut letters = Vec::new();
    let mut n = col + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// A1-style reference for zero-indexed `(row, col)`.
pub fn cell_name(row: usize, col: usize) -> String {
    format!("{}{}", column_letters(col), row + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_column() {
        assert_eq!(parse_column("A").unwrap(), 0);
        assert_eq!(parse_column("b").unwrap(), 1);
        assert_eq!(parse_column("Z").unwrap(), 25);
        assert_eq!(parse_column("AA").unwrap(), 26);
        assert_eq!(parse_column("GH").unwrap(), 189);
        assert_eq!(parse_column("XFD").unwrap(), MAX_COLUMN);
        assert!(parse_column("XFE").is_err());
        assert!(parse_column("").is_err());
        assert!(parse_column("B2").is_err());
    }

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(189), "GH");
        assert_eq!(cell_name(2, 1), "B3");
    }

    #[test]
    fn test_append_row_trims_trailing_empties() {
        let mut sheet = Sheet::new("s");
        sheet.append_row(vec![
            CellValue::from("a"),
            CellValue::Empty,
            CellValue::from("c"),
            CellValue::Empty,
            CellValue::Empty,
        ]);
        assert_eq!(sheet.rows()[0].len(), 3);
        assert_eq!(sheet.width(), 3);
        assert_eq!(sheet.cell(0, 1), Some(&CellValue::Empty));
        assert_eq!(sheet.cell(0, 9), None);
    }

    #[test]
    fn test_insert_and_resolve() {
        let mut workbook = Workbook::new();
        assert!(matches!(
            workbook.resolve_sheet(None),
            Err(ReportError::NoSheets)
        ));

        workbook.add_sheet(Sheet::new("report")).unwrap();
        workbook.add_sheet(Sheet::new("awsdm")).unwrap();
        workbook.insert_sheet(0, Sheet::new("summary")).unwrap();

        assert_eq!(workbook.sheet_names(), vec!["summary", "report", "awsdm"]);
        assert_eq!(workbook.resolve_sheet(None).unwrap().name(), "summary");
        assert_eq!(workbook.resolve_sheet(Some("awsdm")).unwrap().name(), "awsdm");
        assert!(matches!(
            workbook.resolve_sheet(Some("missing")),
            Err(ReportError::SheetNotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_sheet_rejected() {
        let mut workbook = Workbook::new();
        workbook.add_sheet(Sheet::new("bbrpc")).unwrap();
        assert!(matches!(
            workbook.add_sheet(Sheet::new("bbrpc")),
            Err(ReportError::SheetExists(_))
        ));
        assert!(workbook.remove_sheet("bbrpc").is_some());
        assert!(workbook.is_empty());
    }

    #[test]
    fn test_validate_sheet_name() {
        assert!(validate_sheet_name("alert_announce").is_ok());
        assert!(validate_sheet_name("").is_err());
        assert!(validate_sheet_name("a/b").is_err());
        assert!(validate_sheet_name("'quoted'").is_err());
        assert!(validate_sheet_name(&"x".repeat(32)).is_err());
    }
}
