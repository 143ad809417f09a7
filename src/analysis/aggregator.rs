//! Severity tallying and summary building.
//!
//! This module counts severity keywords in a sheet column and collects the
//! per-sheet counts into a summary sheet.

use crate::error::Result;
use crate::models::{CellValue, Severity, SeverityCounts, SummaryEntry};
use crate::workbook::{Sheet, TableSpec, Workbook};
use tracing::{debug, info, warn};

/// Header row of the summary sheet.
pub fn summary_header() -> Vec<CellValue> {
    std::iter::once(CellValue::from("module"))
        .chain(
            Severity::DETECTION_ORDER
                .iter()
                .map(|severity| CellValue::from(severity.header())),
        )
        .collect()
}

/// Count severity keywords in `column` of every row of `sheet`.
///
/// Each text cell counts at most once, for the first keyword it contains.
/// Empty and non-text cells are skipped.
pub fn tally_sheet(sheet: &Sheet, column: usize) -> SeverityCounts {
    let mut counts = SeverityCounts::default();

    for (row_idx, row) in sheet.rows().iter().enumerate() {
        let Some(text) = row.get(column).and_then(CellValue::as_text) else {
            continue;
        };

        match Severity::detect(text) {
            Some(severity) => counts.record(severity),
            None => debug!(
                "{}: row {} has no severity keyword: {:?}",
                sheet.name(),
                row_idx + 1,
                text
            ),
        }
    }

    debug!(
        "{}: critical={} error={} warning={} review={}",
        sheet.name(),
        counts.critical,
        counts.error,
        counts.warning,
        counts.review
    );

    counts
}

/// Tally every sheet except the summary sheet(s), in workbook order.
///
/// A sheet is treated as a summary sheet when its name contains `summary_name`.
pub fn build_summary(workbook: &Workbook, column: usize, summary_name: &str) -> Vec<SummaryEntry> {
    workbook
        .sheets()
        .iter()
        .filter(|sheet| {
            let is_summary = sheet.name().contains(summary_name);
            if is_summary {
                debug!("Skipping summary sheet '{}'", sheet.name());
            }
            !is_summary
        })
        .map(|sheet| SummaryEntry::new(sheet.name(), tally_sheet(sheet, column)))
        .collect()
}

/// Build the summary sheet: header row, then one row per entry.
pub fn summary_sheet(entries: &[SummaryEntry], name: &str, table_name: &str) -> Sheet {
    let mut sheet = Sheet::new(name);
    sheet.append_row(summary_header());

    for entry in entries {
        let mut row = vec![CellValue::from(entry.module.as_str())];
        row.extend(
            Severity::DETECTION_ORDER
                .iter()
                .map(|severity| CellValue::from(entry.counts.get(*severity))),
        );
        sheet.append_row(row);
    }

    sheet.set_table(TableSpec::summary(table_name));
    sheet
}

/// Where the summary sheet goes in the workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    First,
    Last,
}

/// Put `sheet` into the workbook, replacing any sheet with the same name.
pub fn place_summary(workbook: &mut Workbook, sheet: Sheet, placement: Placement) -> Result<()> {
    if workbook.remove_sheet(sheet.name()).is_some() {
        warn!("Replacing existing '{}' sheet", sheet.name());
    }

    let index = match placement {
        Placement::First => 0,
        Placement::Last => workbook.len(),
    };

    info!(
        "Writing '{}' sheet with {} entries",
        sheet.name(),
        sheet.row_count().saturating_sub(1)
    );
    workbook.insert_sheet(index, sheet)
}

/// Sum of all entries' counts.
pub fn total_counts(entries: &[SummaryEntry]) -> SeverityCounts {
    entries.iter().fold(SeverityCounts::default(), |mut acc, entry| {
        acc += entry.counts;
        acc
    })
}

/// Entries sorted by severity, worst first (critical, then error, ...).
pub fn rank_by_severity(entries: &[SummaryEntry]) -> Vec<&SummaryEntry> {
    let mut ranked: Vec<&SummaryEntry> = entries.iter().collect();
    ranked.sort_by_key(|entry| {
        std::cmp::Reverse((
            entry.counts.critical,
            entry.counts.error,
            entry.counts.warning,
            entry.counts.review,
        ))
    });
    ranked
}

/// Generate a text summary of the entries.
pub fn generate_summary_text(entries: &[SummaryEntry]) -> String {
    let mut lines = Vec::new();

    for entry in entries {
        lines.push(format!(
            "{}: {} critical, {} error, {} warning, {} review",
            entry.module,
            entry.counts.critical,
            entry.counts.error,
            entry.counts.warning,
            entry.counts.review
        ));
    }

    let total = total_counts(entries);
    lines.push(format!(
        "Total: {} critical, {} error, {} warning, {} review ({} issues)",
        total.critical,
        total.error,
        total.warning,
        total.review,
        total.total()
    ));

    lines.join("\n")
}
