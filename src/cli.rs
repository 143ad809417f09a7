//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::config::ClassificationRule;
use crate::models::Severity;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// kwreport - Klocwork report spreadsheet post-processor
///
/// Split a combined static-analysis report into per-module sheets and
/// tally issue severities into a summary sheet.
///
/// Examples:
///   kwreport split apps.xlsx
///   kwreport tally apps_awsdm.xlsx --module awsdm
///   kwreport summarize apps_all_module.xlsx --fail-on critical
///   kwreport --report summary.md summarize apps_all_module.xlsx
///   kwreport --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .kwreport.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Write a run report to this file
    #[arg(long, value_name = "FILE", global = true)]
    pub report: Option<PathBuf>,

    /// Run report format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT", global = true)]
    pub format: OutputFormat,

    /// Process the workbook but do not save it
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Generate a default .kwreport.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Report processing commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Copy report rows into one sheet per module
    Split(SplitArgs),
    /// Count severities in one sheet and append a summary sheet
    Tally(TallyArgs),
    /// Count severities in every sheet and insert a summary sheet first
    Summarize(SummarizeArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct SplitArgs {
    /// Workbook holding the combined report
    #[arg(default_value = "apps.xlsx", value_name = "INPUT")]
    pub input: PathBuf,

    /// Sheet to split (defaults to the first sheet)
    #[arg(short, long, value_name = "SHEET")]
    pub sheet: Option<String>,

    /// Where to save the result (defaults to overwriting INPUT)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Only classify this column; non-text cells in it are an error
    ///
    /// Without it every text cell of a row is checked, left to right.
    #[arg(long, value_name = "COLUMN")]
    pub match_column: Option<String>,

    /// Last column copied into module sheets
    #[arg(long, value_name = "COLUMN")]
    pub last_column: Option<String>,

    /// Classification rule, replaces the configured list (repeatable)
    ///
    /// Rules are tried in the order given; the first match wins.
    /// Example: --rule "work/armv7a/bbrpc/=bbrpc"
    #[arg(long = "rule", value_name = "PATTERN=MODULE", value_parser = parse_rule)]
    pub rules: Vec<ClassificationRule>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct TallyArgs {
    /// Workbook holding the module sheet
    #[arg(default_value = "apps_awsdm.xlsx", value_name = "INPUT")]
    pub input: PathBuf,

    /// Sheet to tally (defaults to the first sheet)
    #[arg(short, long, value_name = "SHEET")]
    pub sheet: Option<String>,

    /// Module label for the summary row (defaults to the sheet name)
    #[arg(short, long, value_name = "NAME")]
    pub module: Option<String>,

    /// Where to save the result (defaults to overwriting INPUT)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Column holding the severity text
    #[arg(long, value_name = "COLUMN")]
    pub column: Option<String>,

    /// Exit with code 2 if issues at or above this severity are found
    #[arg(long, value_name = "LEVEL")]
    pub fail_on: Option<FailOnLevel>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct SummarizeArgs {
    /// Workbook holding one sheet per module
    #[arg(default_value = "apps_all_module.xlsx", value_name = "INPUT")]
    pub input: PathBuf,

    /// Where to save the result (defaults to overwriting INPUT)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Column holding the severity text
    #[arg(long, value_name = "COLUMN")]
    pub column: Option<String>,

    /// Exit with code 2 if issues at or above this severity are found
    #[arg(long, value_name = "LEVEL")]
    pub fail_on: Option<FailOnLevel>,
}

/// Output format for the run report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// Severity level for --fail-on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum FailOnLevel {
    Review,
    Warning,
    Error,
    Critical,
}

impl From<FailOnLevel> for Severity {
    fn from(level: FailOnLevel) -> Self {
        match level {
            FailOnLevel::Review => Severity::Review,
            FailOnLevel::Warning => Severity::Warning,
            FailOnLevel::Error => Severity::Error,
            FailOnLevel::Critical => Severity::Critical,
        }
    }
}

/// Parse a `PATTERN=MODULE` rule. The module is taken after the last `=`.
pub fn parse_rule(s: &str) -> Result<ClassificationRule, String> {
    let (pattern, module) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("expected PATTERN=MODULE, got '{}'", s))?;

    if pattern.is_empty() || module.is_empty() {
        return Err(format!("pattern and module must not be empty in '{}'", s));
    }

    Ok(ClassificationRule::new(pattern, module))
}

impl Command {
    /// Subcommand name, as used in logs and reports.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Split(_) => "split",
            Command::Tally(_) => "tally",
            Command::Summarize(_) => "summarize",
        }
    }

    pub fn input(&self) -> &Path {
        match self {
            Command::Split(a) => &a.input,
            Command::Tally(a) => &a.input,
            Command::Summarize(a) => &a.input,
        }
    }

    /// Output path; the input is overwritten unless --output is given.
    pub fn output(&self) -> &Path {
        let output = match self {
            Command::Split(a) => a.output.as_deref(),
            Command::Tally(a) => a.output.as_deref(),
            Command::Summarize(a) => a.output.as_deref(),
        };
        output.unwrap_or_else(|| self.input())
    }

    pub fn fail_on(&self) -> Option<FailOnLevel> {
        match self {
            Command::Split(_) => None,
            Command::Tally(a) => a.fail_on,
            Command::Summarize(a) => a.fail_on,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        let Some(ref command) = self.command else {
            return Err("A command is required: split, tally or summarize".to_string());
        };

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        let input = command.input();
        if !input.exists() {
            return Err(format!("Input workbook does not exist: {}", input.display()));
        }
        if !input.is_file() {
            return Err(format!("Input path is not a file: {}", input.display()));
        }

        if let Some(ref report) = self.report {
            if report == command.output() {
                return Err("--report must not point at the output workbook".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `verbose_by_default` comes from the config file; `--quiet` overrides it.
    pub fn log_level(&self, verbose_by_default: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || verbose_by_default {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
