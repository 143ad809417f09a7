//! kwreport - Klocwork report spreadsheet post-processor
//!
//! Splits a combined static-analysis report workbook into per-module sheets
//! and tallies severity keywords into a summary sheet.
//!
//! Exit codes:
//!   0 - Success (no issues above threshold, or no --fail-on set)
//!   1 - Runtime error (missing file, unreadable workbook, bad config, etc.)
//!   2 - Issues found at or above the --fail-on threshold

mod analysis;
mod classifier;
mod cli;
mod config;
mod error;
mod models;
mod report;
mod workbook;

use analysis::Placement;
use anyhow::{Context, Result};
use chrono::Utc;
use classifier::{RuleSet, SplitOptions};
use cli::{Args, Command, OutputFormat, TallyArgs};
use config::Config;
use models::{Report, ReportMetadata, RunOutcome, Severity, SummaryEntry};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use workbook::Workbook;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration before logging so the file can turn on verbose output
    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(&args, &config);

    info!("kwreport v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Configuration: {:?}", config);

    match run(&args, &config) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .kwreport.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(config::CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", config::CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", config::CONFIG_FILE);
    println!("   Edit it to customize classification rules and columns.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config: &Config) {
    let level = args.log_level(config.general.verbose);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: failed to set tracing subscriber: {}", e);
    }
}

/// Run the selected command: load, transform, save. Returns exit code (0 or 2).
fn run(args: &Args, config: &Config) -> Result<i32> {
    let start_time = Instant::now();

    let Some(ref command) = args.command else {
        anyhow::bail!("no command given");
    };

    let input = command.input();
    let output = command.output();

    let mut workbook = workbook::io::load(input)
        .with_context(|| format!("Failed to load workbook {}", input.display()))?;
    info!("Loaded {} sheets: {:?}", workbook.len(), workbook.sheet_names());

    let outcome = match command {
        Command::Split(split) => {
            let rules = RuleSet::new(config.split.rules.clone())?;
            let mut options = SplitOptions::from_config(&config.split)?;
            options.show_progress = !args.quiet;

            println!("🔎 Splitting report into {} modules...", rules.modules().len());
            let outcome = classifier::split_into_modules(
                &mut workbook,
                split.sheet.as_deref(),
                &rules,
                &options,
            )?;
            print_split(&outcome);
            RunOutcome::Split(outcome)
        }
        Command::Tally(tally) => RunOutcome::Summary {
            entries: run_tally(&mut workbook, tally, config)?,
        },
        Command::Summarize(_) => RunOutcome::Summary {
            entries: run_summarize(&mut workbook, config)?,
        },
    };

    if args.dry_run {
        println!("\n✅ Dry run complete. {} was not modified.", output.display());
    } else {
        workbook::io::save(&workbook, output)
            .with_context(|| format!("Failed to save workbook {}", output.display()))?;
        println!("\n✅ {} is finished. Saved to: {}", command.name(), output.display());
    }

    if let Some(ref report_path) = args.report {
        let report = Report {
            metadata: ReportMetadata {
                command: command.name().to_string(),
                input: input.display().to_string(),
                output: output.display().to_string(),
                generated_at: Utc::now(),
                sheets: workbook.len(),
                dry_run: args.dry_run,
                duration_seconds: start_time.elapsed().as_secs_f64(),
            },
            outcome: outcome.clone(),
        };
        report::write_report(&report, report_path, args.format == OutputFormat::Json)
            .with_context(|| format!("Failed to write report to {}", report_path.display()))?;
        info!("Run report saved to {}", report_path.display());
    }

    // Check --fail-on threshold
    if let (Some(fail_level), RunOutcome::Summary { entries }) = (command.fail_on(), &outcome) {
        let threshold = Severity::from(fail_level);
        let total = analysis::total_counts(entries);

        if total.any_at_or_above(threshold) {
            eprintln!(
                "\n⛔ Issues found at or above {} severity. Failing (exit code 2).",
                threshold
            );
            return Ok(2);
        }
    }

    Ok(0)
}

/// Tally one sheet and append a one-row summary sheet.
fn run_tally(workbook: &mut Workbook, args: &TallyArgs, config: &Config) -> Result<Vec<SummaryEntry>> {
    let column = workbook::parse_column(&config.tally.column)?;
    let sheet = workbook.resolve_sheet(args.sheet.as_deref())?;
    let module = args.module.clone().unwrap_or_else(|| sheet.name().to_string());

    println!("🔢 Counting severities in sheet '{}' (column {})...", sheet.name(), config.tally.column);
    let counts = analysis::tally_sheet(sheet, column);
    let entries = vec![SummaryEntry::new(module, counts)];

    let summary = analysis::summary_sheet(
        &entries,
        &config.general.summary_sheet,
        &config.general.table_name,
    );
    analysis::place_summary(workbook, summary, Placement::Last)?;

    print_summary(&entries);
    Ok(entries)
}

/// Tally every module sheet and insert the summary sheet first.
fn run_summarize(workbook: &mut Workbook, config: &Config) -> Result<Vec<SummaryEntry>> {
    let column = workbook::parse_column(&config.tally.column)?;

    println!("🔢 Counting severities in all module sheets (column {})...", config.tally.column);
    let entries = analysis::build_summary(workbook, column, &config.general.summary_sheet);
    if entries.is_empty() {
        warn!("No module sheets to summarize");
    }

    let summary = analysis::summary_sheet(
        &entries,
        &config.general.summary_sheet,
        &config.general.table_name,
    );
    analysis::place_summary(workbook, summary, Placement::First)?;

    print_summary(&entries);
    Ok(entries)
}

fn print_split(outcome: &models::SplitOutcome) {
    println!("\n📊 Split Summary:");
    println!("   Source sheet: {}", outcome.source_sheet);
    println!(
        "   Rows: {} scanned | {} matched | {} unmatched",
        outcome.rows_scanned,
        outcome.rows_matched(),
        outcome.rows_unmatched
    );
    for module in &outcome.modules {
        println!("   - {}: {}", module.module, module.rows);
    }
}

fn print_summary(entries: &[SummaryEntry]) {
    println!("\n📊 Severity Summary:");
    for line in analysis::generate_summary_text(entries).lines() {
        println!("   {}", line);
    }
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so problems are reported on stderr.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("Warning: failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}
