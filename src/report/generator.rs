//! Markdown and JSON run report generation.
//!
//! This module renders the outcome of a split or summary run for people
//! (Markdown) or for tooling (JSON).

use crate::analysis::{rank_by_severity, total_counts};
use crate::models::{Report, ReportMetadata, RunOutcome, Severity, SplitOutcome, SummaryEntry};
use anyhow::Result;
use std::path::Path;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# Klocwork Report Summary\n\n");

    // Metadata section
    output.push_str(&generate_metadata_section(&report.metadata));

    match report.outcome {
        RunOutcome::Split(ref outcome) => output.push_str(&generate_split_section(outcome)),
        RunOutcome::Summary { ref entries } => {
            output.push_str(&generate_summary_section(entries));
            output.push_str(&generate_ranking_section(entries));
        }
    }

    // Footer
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Command:** `{}`\n", metadata.command));
    section.push_str(&format!("- **Input:** {}\n", metadata.input));
    if metadata.dry_run {
        section.push_str("- **Output:** not saved (dry run)\n");
    } else {
        section.push_str(&format!("- **Output:** {}\n", metadata.output));
    }
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Sheets:** {}\n", metadata.sheets));
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the rows-per-module section of a split run.
fn generate_split_section(outcome: &SplitOutcome) -> String {
    let mut section = String::new();

    section.push_str("## Modules\n\n");
    section.push_str(&format!(
        "Sheet `{}`: {} rows scanned, {} matched, {} unmatched.\n\n",
        outcome.source_sheet,
        outcome.rows_scanned,
        outcome.rows_matched(),
        outcome.rows_unmatched
    ));

    section.push_str("| Module | Rows |\n");
    section.push_str("|:---|:---:|\n");
    for module in &outcome.modules {
        section.push_str(&format!("| {} | {} |\n", module.module, module.rows));
    }
    section.push('\n');

    section
}

/// Generate the severity table, one row per module plus a total.
fn generate_summary_section(entries: &[SummaryEntry]) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");

    if entries.is_empty() {
        section.push_str("No module sheets were found.\n\n");
        return section;
    }

    section.push_str("| module |");
    for severity in Severity::DETECTION_ORDER {
        section.push_str(&format!(" {} |", severity.header()));
    }
    section.push_str(" **Total** |\n");
    section.push_str("|:---|:---:|:---:|:---:|:---:|:---:|\n");

    for entry in entries {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            entry.module,
            entry.counts.critical,
            entry.counts.error,
            entry.counts.warning,
            entry.counts.review,
            entry.counts.total()
        ));
    }

    let total = total_counts(entries);
    section.push_str(&format!(
        "| **Total** | **{}** | **{}** | **{}** | **{}** | **{}** |\n\n",
        total.critical,
        total.error,
        total.warning,
        total.review,
        total.total()
    ));

    section
}

/// Generate the list of modules with the most severe findings.
fn generate_ranking_section(entries: &[SummaryEntry]) -> String {
    let ranked: Vec<_> = rank_by_severity(entries)
        .into_iter()
        .filter(|entry| entry.counts.total() > 0)
        .take(5)
        .collect();

    if ranked.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Most Affected Modules\n\n");
    for (i, entry) in ranked.iter().enumerate() {
        section.push_str(&format!(
            "{}. `{}`: {} critical, {} error\n",
            i + 1,
            entry.module,
            entry.counts.critical,
            entry.counts.error
        ));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    format!("---\n\n*Report generated by kwreport v{}*\n", env!("CARGO_PKG_VERSION"))
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write the report to a file in the requested format.
pub fn write_report(report: &Report, path: &Path, json: bool) -> Result<()> {
    let content = if json {
        generate_json_report(report)?
    } else {
        generate_markdown_report(report)
    };

    std::fs::write(path, content)?;
    Ok(())
}
