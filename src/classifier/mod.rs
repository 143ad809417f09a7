//! Row classification for splitting a combined report into module sheets.
//!
//! Rules are an ordered list of `(pattern, module)` pairs. A cell's text is
//! tested against them top to bottom and the first pattern it contains
//! decides the module.

use crate::config::{ClassificationRule, SplitConfig};
use crate::error::{ReportError, Result};
use crate::models::{CellValue, ModuleRows, SplitOutcome};
use crate::workbook::{self, Sheet, Workbook};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use tracing::{debug, info};

/// Return the first rule whose pattern is contained in `text`.
pub fn classify<'a>(text: &str, rules: &'a [ClassificationRule]) -> Option<&'a ClassificationRule> {
    rules.iter().find(|rule| text.contains(rule.pattern.as_str()))
}

/// A validated, ordered list of classification rules.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<ClassificationRule>,
}

impl RuleSet {
    /// Validate rules: patterns must be non-empty and modules valid sheet names.
    pub fn new(rules: Vec<ClassificationRule>) -> Result<Self> {
        if rules.is_empty() {
            return Err(ReportError::InvalidRule("no rules configured".to_string()));
        }

        for rule in &rules {
            if rule.pattern.is_empty() {
                return Err(ReportError::InvalidRule(format!(
                    "empty pattern for module '{}'",
                    rule.module
                )));
            }
            workbook::validate_sheet_name(&rule.module)?;
        }

        Ok(Self { rules })
    }

    pub fn classify(&self, text: &str) -> Option<&ClassificationRule> {
        classify(text, &self.rules)
    }

    /// Classify a cell that must hold text.
    ///
    /// Any other value, including an empty cell, is rejected instead of being
    /// treated as a non-match.
    pub fn classify_cell(
        &self,
        cell: &CellValue,
        sheet: &str,
        row: usize,
        col: usize,
    ) -> Result<Option<&ClassificationRule>> {
        match cell.as_text() {
            Some(text) => Ok(self.classify(text)),
            None => Err(ReportError::NonTextCell {
                sheet: sheet.to_string(),
                cell: workbook::cell_name(row, col),
                found: cell.kind(),
            }),
        }
    }

    /// Module names in first-appearance order, without duplicates.
    pub fn modules(&self) -> Vec<&str> {
        let mut modules: Vec<&str> = Vec::new();
        for rule in &self.rules {
            if !modules.contains(&rule.module.as_str()) {
                modules.push(&rule.module);
            }
        }
        modules
    }
}

/// Column settings for a split, resolved from letters to indices.
#[derive(Debug, Clone)]
pub struct SplitOptions {
    /// Column to classify; `None` checks every text cell left to right.
    pub match_column: Option<usize>,
    /// Last column copied (inclusive).
    pub last_column: usize,
    /// Draw a progress bar while scanning rows.
    pub show_progress: bool,
}

impl SplitOptions {
    pub fn from_config(config: &SplitConfig) -> Result<Self> {
        let match_column = config
            .match_column
            .as_deref()
            .map(workbook::parse_column)
            .transpose()?;

        Ok(Self {
            match_column,
            last_column: workbook::parse_column(&config.last_column)?,
            show_progress: false,
        })
    }
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            match_column: None,
            last_column: 189, // GH
            show_progress: false,
        }
    }
}

/// Copy every classified row of `source` into a new sheet per module.
///
/// One sheet is created for every module, in rule order, even if no row
/// matches it. Rows are copied verbatim up to `last_column`; rows matching no
/// rule are not copied anywhere. The workbook is left unchanged on error.
pub fn split_into_modules(
    workbook: &mut Workbook,
    source: Option<&str>,
    rules: &RuleSet,
    options: &SplitOptions,
) -> Result<SplitOutcome> {
    let modules = rules.modules();
    if let Some(existing) = modules.iter().find(|m| workbook.position(m).is_some()) {
        return Err(ReportError::SheetExists(existing.to_string()));
    }

    let source = workbook.resolve_sheet(source)?;
    info!(
        "Splitting sheet '{}' ({} rows) into {} modules",
        source.name(),
        source.row_count(),
        modules.len()
    );

    let index: HashMap<&str, usize> = modules.iter().enumerate().map(|(i, m)| (*m, i)).collect();
    let mut buckets: Vec<Sheet> = modules.iter().map(|m| Sheet::new(*m)).collect();
    let mut outcome = SplitOutcome {
        source_sheet: source.name().to_string(),
        ..Default::default()
    };

    let progress = options.show_progress.then(|| {
        let pb = ProgressBar::new(source.row_count() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} rows")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    });

    for (row_idx, row) in source.rows().iter().enumerate() {
        outcome.rows_scanned += 1;
        if let Some(ref pb) = progress {
            pb.inc(1);
        }

        let rule = match options.match_column {
            Some(col) => rules.classify_cell(
                row.get(col).unwrap_or(&CellValue::Empty),
                source.name(),
                row_idx,
                col,
            )?,
            None => {
                let mut texts = row.iter().filter_map(CellValue::as_text).peekable();
                if texts.peek().is_none() {
                    debug!("Row {} has no text cells, leaving it unmatched", row_idx + 1);
                }
                texts.find_map(|text| rules.classify(text))
            }
        };

        match rule {
            Some(rule) => {
                debug!("Row {} -> {}", row_idx + 1, rule.module);
                let end = row.len().min(options.last_column + 1);
                buckets[index[rule.module.as_str()]].append_row(row[..end].to_vec());
            }
            None => outcome.rows_unmatched += 1,
        }
    }

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    for sheet in buckets {
        outcome.modules.push(ModuleRows {
            module: sheet.name().to_string(),
            rows: sheet.row_count(),
        });
        workbook.add_sheet(sheet)?;
    }

    info!(
        "Matched {} of {} rows ({} unmatched)",
        outcome.rows_matched(),
        outcome.rows_scanned,
        outcome.rows_unmatched
    );

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALERT: &str = "poky/build/tmp-glibc/work/armv7a-vfp-neon-oe-linux-gnueabi/alert-announce/";
    const BBRPC: &str = "poky/build/tmp-glibc/work/armv7a-vfp-neon-oe-linux-gnueabi/bbrpc/";

    fn rules() -> RuleSet {
        RuleSet::new(vec![
            ClassificationRule::new(ALERT, "alert_announce"),
            ClassificationRule::new(BBRPC, "bbrpc"),
        ])
        .unwrap()
    }

    fn report_workbook(rows: Vec<Vec<CellValue>>) -> Workbook {
        let mut workbook = Workbook::new();
        workbook.add_sheet(Sheet::from_rows("report", rows)).unwrap();
        workbook
    }

    fn text_row(cells: &[&str]) -> Vec<CellValue> {
        cells.iter().map(|c| CellValue::from(*c)).collect()
    }

    #[test]
    fn test_classify_first_rule_wins() {
        let rules = vec![
            ClassificationRule::new("src/", "src"),
            ClassificationRule::new("src/net/", "net"),
        ];
        assert_eq!(classify("a/src/net/x.c", &rules).map(|r| r.module.as_str()), Some("src"));
        assert_eq!(classify("lib/x.c", &rules), None);
    }

    #[test]
    fn test_classify_is_case_sensitive() {
        let rules = vec![ClassificationRule::new("Bbrpc/", "bbrpc")];
        assert!(classify("work/bbrpc/x.c", &rules).is_none());
    }

    #[test]
    fn test_classify_cell_rejects_non_text() {
        let rules = rules();
        let err = rules
            .classify_cell(&CellValue::Number(3.0), "report", 4, 0)
            .unwrap_err();
        match err {
            ReportError::NonTextCell { sheet, cell, found } => {
                assert_eq!(sheet, "report");
                assert_eq!(cell, "A5");
                assert_eq!(found, "a number");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(rules.classify_cell(&CellValue::Empty, "report", 0, 0).is_err());
    }

    #[test]
    fn test_rule_set_validation() {
        assert!(RuleSet::new(Vec::new()).is_err());
        assert!(RuleSet::new(vec![ClassificationRule::new("", "m")]).is_err());
        assert!(RuleSet::new(vec![ClassificationRule::new("p/", "bad/name")]).is_err());
    }

    #[test]
    fn test_modules_deduplicated_in_order() {
        let rules = RuleSet::new(vec![
            ClassificationRule::new("a/", "alpha"),
            ClassificationRule::new("b/", "beta"),
            ClassificationRule::new("c/", "alpha"),
        ])
        .unwrap();
        assert_eq!(rules.modules(), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_split_scenario() {
        let row1 = text_row(&[format!("{}foo.c", ALERT).as_str(), "Critical: null deref"]);
        let row2 = text_row(&[format!("{}bar.c", BBRPC).as_str(), "Error: leak"]);
        let row3 = text_row(&["unrelated/x.c", "Warning: unused"]);
        let mut workbook = report_workbook(vec![row1.clone(), row2.clone(), row3.clone()]);

        let outcome =
            split_into_modules(&mut workbook, None, &rules(), &SplitOptions::default()).unwrap();

        assert_eq!(workbook.sheet_names(), vec!["report", "alert_announce", "bbrpc"]);
        assert_eq!(workbook.sheet("alert_announce").unwrap().rows(), &[row1]);
        assert_eq!(workbook.sheet("bbrpc").unwrap().rows(), &[row2]);
        assert!(workbook
            .sheets()
            .iter()
            .skip(1)
            .all(|s| !s.rows().contains(&row3)));

        assert_eq!(outcome.rows_scanned, 3);
        assert_eq!(outcome.rows_unmatched, 1);
        assert_eq!(outcome.rows_matched(), 2);
    }

    #[test]
    fn test_split_creates_empty_module_sheets() {
        let mut workbook = report_workbook(vec![text_row(&["nothing here"])]);

        let outcome =
            split_into_modules(&mut workbook, None, &rules(), &SplitOptions::default()).unwrap();

        assert_eq!(workbook.len(), 3);
        assert_eq!(workbook.sheet("bbrpc").unwrap().row_count(), 0);
        assert_eq!(
            outcome.modules,
            vec![
                ModuleRows { module: "alert_announce".to_string(), rows: 0 },
                ModuleRows { module: "bbrpc".to_string(), rows: 0 },
            ]
        );
    }

    #[test]
    fn test_split_row_without_text_is_unmatched() {
        let mut workbook = report_workbook(vec![
            vec![CellValue::Number(3.0), CellValue::Empty, CellValue::Bool(false)],
            text_row(&[format!("{}util.c", BBRPC).as_str()]),
        ]);

        let outcome =
            split_into_modules(&mut workbook, None, &rules(), &SplitOptions::default()).unwrap();

        assert_eq!(outcome.rows_scanned, 2);
        assert_eq!(outcome.rows_unmatched, 1);
        assert_eq!(workbook.sheet("bbrpc").unwrap().row_count(), 1);
    }

    #[test]
    fn test_split_row_goes_to_one_module_only() {
        // Both patterns occur in the row: the leftmost matching cell decides.
        let row = text_row(&[format!("{}b.c", BBRPC).as_str(), format!("{}a.c", ALERT).as_str()]);
        let mut workbook = report_workbook(vec![row.clone()]);

        split_into_modules(&mut workbook, None, &rules(), &SplitOptions::default()).unwrap();

        assert_eq!(workbook.sheet("bbrpc").unwrap().row_count(), 1);
        assert_eq!(workbook.sheet("alert_announce").unwrap().row_count(), 0);
    }

    #[test]
    fn test_split_skips_non_text_cells_when_scanning_whole_row() {
        let row = vec![
            CellValue::Number(7.0),
            CellValue::Empty,
            CellValue::from(format!("{}x.c", BBRPC)),
        ];
        let mut workbook = report_workbook(vec![row.clone()]);

        split_into_modules(&mut workbook, None, &rules(), &SplitOptions::default()).unwrap();

        assert_eq!(workbook.sheet("bbrpc").unwrap().rows(), &[row]);
    }

    #[test]
    fn test_split_match_column_fails_fast_on_non_text() {
        let mut workbook = report_workbook(vec![
            text_row(&[format!("{}x.c", BBRPC).as_str()]),
            vec![CellValue::Number(1.0)],
        ]);
        let options = SplitOptions {
            match_column: Some(0),
            ..Default::default()
        };

        let err = split_into_modules(&mut workbook, None, &rules(), &options).unwrap_err();

        assert!(matches!(err, ReportError::NonTextCell { .. }));
        assert_eq!(workbook.len(), 1);
    }

    #[test]
    fn test_split_match_column_ignores_other_columns() {
        let mut workbook = report_workbook(vec![text_row(&[
            "see description",
            format!("{}x.c", BBRPC).as_str(),
        ])]);
        let options = SplitOptions {
            match_column: Some(0),
            ..Default::default()
        };

        let outcome = split_into_modules(&mut workbook, None, &rules(), &options).unwrap();

        assert_eq!(outcome.rows_unmatched, 1);
    }

    #[test]
    fn test_split_truncates_at_last_column() {
        let row = text_row(&[format!("{}x.c", ALERT).as_str(), "b", "c", "d"]);
        let mut workbook = report_workbook(vec![row]);
        let options = SplitOptions {
            last_column: 1,
            ..Default::default()
        };

        split_into_modules(&mut workbook, None, &rules(), &options).unwrap();

        assert_eq!(workbook.sheet("alert_announce").unwrap().width(), 2);
    }

    #[test]
    fn test_split_refuses_existing_module_sheet() {
        let mut workbook = report_workbook(vec![text_row(&["x"])]);
        workbook.add_sheet(Sheet::new("bbrpc")).unwrap();

        let err =
            split_into_modules(&mut workbook, None, &rules(), &SplitOptions::default()).unwrap_err();

        assert!(matches!(err, ReportError::SheetExists(ref name) if name == "bbrpc"));
        assert_eq!(workbook.len(), 2);
    }

    #[test]
    fn test_split_options_from_config() {
        let config = SplitConfig {
            last_column: "GH".to_string(),
            match_column: Some("c".to_string()),
            rules: Vec::new(),
        };
        let options = SplitOptions::from_config(&config).unwrap();
        assert_eq!(options.last_column, 189);
        assert_eq!(options.match_column, Some(2));

        let bad = SplitConfig {
            last_column: "1".to_string(),
            ..config
        };
        assert!(SplitOptions::from_config(&bad).is_err());
    }
}
