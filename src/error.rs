//! Error types for report processing.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading, transforming or saving a report workbook.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read workbook: {0}")]
    Read(#[from] calamine::Error),

    #[error("Failed to write workbook: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),

    #[error("Failed to replace {path}: {source}")]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Workbook contains no sheets")]
    NoSheets,

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Sheet already exists: {0}")]
    SheetExists(String),

    #[error("Invalid sheet name '{name}': {reason}")]
    InvalidSheetName { name: String, reason: &'static str },

    #[error("Expected text in sheet '{sheet}' cell {cell}, found {found}")]
    NonTextCell {
        sheet: String,
        cell: String,
        found: &'static str,
    },

    #[error("Invalid column: {0}")]
    InvalidColumn(String),

    #[error("Invalid classification rule: {0}")]
    InvalidRule(String),
}

pub type Result<T> = std::result::Result<T, ReportError>;
