//! Workbook loading and saving.
//!
//! Reading goes through `calamine`, which accepts xlsx, xlsm, xlsb, xls and
//! ods. Writing always produces xlsx through `rust_xlsxwriter`. Only cell
//! values survive a load/save cycle; formatting is not carried over.

use super::{Sheet, TableSpec, Workbook};
use crate::error::{ReportError, Result};
use crate::models::CellValue;
use calamine::{open_workbook_auto, Data, Range, Reader};
use rust_xlsxwriter::{Table, TableColumn, TableStyle, Workbook as XlsxWorkbook, Worksheet};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Load every sheet of a spreadsheet file, in workbook order.
pub fn load(path: &Path) -> Result<Workbook> {
    info!("Loading workbook: {}", path.display());

    let mut source = open_workbook_auto(path)?;
    let sheet_names: Vec<String> = source.sheet_names().to_vec();

    if sheet_names.is_empty() {
        return Err(ReportError::NoSheets);
    }

    let mut workbook = Workbook::new();
    for name in &sheet_names {
        let range = source.worksheet_range(name)?;
        let sheet = sheet_from_range(name, &range);
        debug!(
            "Read sheet '{}': {} rows, {} columns",
            name,
            sheet.row_count(),
            sheet.width()
        );
        workbook.add_sheet(sheet)?;
    }

    Ok(workbook)
}

/// Convert a calamine range into a sheet anchored at `A1`.
fn sheet_from_range(name: &str, range: &Range<Data>) -> Sheet {
    let mut sheet = Sheet::new(name);

    let Some((start_row, start_col)) = range.start() else {
        return sheet;
    };

    for _ in 0..start_row {
        sheet.append_row(Vec::new());
    }

    for row in range.rows() {
        let mut cells = vec![CellValue::Empty; start_col as usize];
        cells.extend(row.iter().map(cell_value));
        sheet.append_row(cells);
    }

    sheet
}

fn cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        // Dates keep their serial number; the number format is not preserved.
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        // Error values and ISO date/duration strings are kept as their text.
        other => CellValue::Text(other.to_string()),
    }
}

/// Save the workbook to `path`, replacing any existing file.
///
/// The file is written to a temporary sibling and renamed into place, so the
/// target is either fully replaced or left untouched.
pub fn save(workbook: &Workbook, path: &Path) -> Result<()> {
    let buffer = render(workbook)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(&buffer)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| ReportError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;

    info!(
        "Saved {} sheets to {} ({} bytes)",
        workbook.len(),
        path.display(),
        buffer.len()
    );
    Ok(())
}

/// Serialize the workbook to xlsx bytes.
pub fn render(workbook: &Workbook) -> Result<Vec<u8>> {
    let mut xlsx = XlsxWorkbook::new();

    for sheet in workbook.sheets() {
        let worksheet = xlsx.add_worksheet();
        worksheet.set_name(sheet.name())?;
        write_cells(worksheet, sheet)?;

        if let Some(spec) = sheet.table() {
            add_table(worksheet, sheet, spec)?;
        }
    }

    Ok(xlsx.save_to_buffer()?)
}

fn write_cells(worksheet: &mut Worksheet, sheet: &Sheet) -> Result<()> {
    for (row_idx, row) in sheet.rows().iter().enumerate() {
        let row32 = to_row(row_idx)?;
        for (col_idx, cell) in row.iter().enumerate() {
            let col16 = to_col(col_idx)?;
            match cell {
                CellValue::Empty => {}
                CellValue::Text(s) => {
                    worksheet.write_string(row32, col16, s)?;
                }
                CellValue::Number(n) => {
                    worksheet.write_number(row32, col16, *n)?;
                }
                CellValue::Bool(b) => {
                    worksheet.write_boolean(row32, col16, *b)?;
                }
            }
        }
    }
    Ok(())
}

/// Wrap the sheet's used range in an Excel table. The first row is the header.
fn add_table(worksheet: &mut Worksheet, sheet: &Sheet, spec: &TableSpec) -> Result<()> {
    let height = sheet.row_count();
    let width = sheet.width();

    // A table needs a header and at least one data row.
    if height < 2 || width == 0 {
        debug!("Sheet '{}' has no data rows, skipping table", sheet.name());
        return Ok(());
    }

    let columns: Vec<TableColumn> = (0..width)
        .map(|col| {
            let header = sheet.cell(0, col).map(ToString::to_string).unwrap_or_default();
            TableColumn::new().set_header(header.as_str())
        })
        .collect();

    let table = Table::new()
        .set_name(spec.name.as_str())
        .set_style(TableStyle::Medium4)
        .set_first_column(spec.first_column)
        .set_last_column(spec.last_column)
        .set_banded_rows(spec.banded_rows)
        .set_banded_columns(spec.banded_columns)
        .set_columns(&columns);

    worksheet.add_table(0, 0, to_row(height - 1)?, to_col(width - 1)?, &table)?;
    Ok(())
}

fn to_row(row: usize) -> Result<u32> {
    u32::try_from(row).map_err(|_| ReportError::InvalidColumn(format!("row {} out of range", row + 1)))
}

fn to_col(col: usize) -> Result<u16> {
    u16::try_from(col).map_err(|_| ReportError::InvalidColumn(format!("column {} out of range", col + 1)))
}
