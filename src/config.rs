//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.kwreport.toml` files.

use crate::cli::{Args, Command};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".kwreport.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Row classification settings.
    #[serde(default)]
    pub split: SplitConfig,

    /// Severity counting settings.
    #[serde(default)]
    pub tally: TallyConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Name of the summary sheet. Sheets whose name contains it are never tallied.
    #[serde(default = "default_summary_sheet")]
    pub summary_sheet: String,

    /// Name of the Excel table wrapped around the summary.
    #[serde(default = "default_table_name")]
    pub table_name: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            summary_sheet: default_summary_sheet(),
            table_name: default_table_name(),
        }
    }
}

fn default_summary_sheet() -> String {
    "summary".to_string()
}

fn default_table_name() -> String {
    "Table1".to_string()
}

/// A substring and the module its rows are filed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRule {
    /// Case-sensitive substring searched for in cell text.
    pub pattern: String,
    /// Module (and sheet) name for matching rows.
    pub module: String,
}

impl ClassificationRule {
    pub fn new(pattern: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            module: module.into(),
        }
    }
}

/// Row classification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Last column copied from each matching row.
    #[serde(default = "default_last_column")]
    pub last_column: String,

    /// Column to classify. When unset, every text cell of the row is checked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_column: Option<String>,

    /// Ordered rules; the first matching rule wins.
    #[serde(default = "default_rules")]
    pub rules: Vec<ClassificationRule>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            last_column: default_last_column(),
            match_column: None,
            rules: default_rules(),
        }
    }
}

fn default_last_column() -> String {
    "GH".to_string()
}

const WORK_DIR: &str = "poky/build/tmp-glibc/work/armv7a-vfp-neon-oe-linux-gnueabi";

fn default_rules() -> Vec<ClassificationRule> {
    [
        ("alert-announce/", "alert_announce"),
        ("awsdm/1.0-r0/fulcrum/awsdm/", "awsdm"),
        ("bbrpc/", "bbrpc"),
        ("fulcrum-voip/", "fulcrum_voip"),
        ("oem-gui/", "gui"),
        ("fota/", "fota"),
        ("get-hwid/", "get_hwid"),
        ("oem-mediaserver/", "mediaserver"),
        ("sscep-client/", "sscep_client"),
        ("diag-log/", "diag_log"),
        ("diagtool/", "diagtool"),
        ("diagnostic/", "diagnostic"),
        ("err-handle/", "error_handle"),
        ("batpersent/", "batpersent"),
    ]
    .into_iter()
    .map(|(dir, module)| ClassificationRule::new(format!("{}/{}", WORK_DIR, dir), module))
    .collect()
}

/// Severity counting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TallyConfig {
    /// Column holding the severity text.
    #[serde(default = "default_severity_column")]
    pub column: String,
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            column: default_severity_column(),
        }
    }
}

fn default_severity_column() -> String {
    "B".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &Args) {
        if args.verbose {
            self.general.verbose = true;
        }

        match args.command {
            Some(Command::Split(ref split)) => {
                if let Some(ref column) = split.match_column {
                    self.split.match_column = Some(column.clone());
                }
                if let Some(ref column) = split.last_column {
                    self.split.last_column = column.clone();
                }
                if !split.rules.is_empty() {
                    self.split.rules = split.rules.clone();
                }
            }
            Some(Command::Tally(ref tally)) => {
                if let Some(ref column) = tally.column {
                    self.tally.column = column.clone();
                }
            }
            Some(Command::Summarize(ref summarize)) => {
                if let Some(ref column) = summarize.column {
                    self.tally.column = column.clone();
                }
            }
            None => {}
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{OutputFormat, SplitArgs, TallyArgs};
    use std::path::PathBuf;

    fn args_with(command: Command) -> Args {
        Args {
            command: Some(command),
            config: None,
            verbose: false,
            quiet: false,
            report: None,
            format: OutputFormat::Markdown,
            dry_run: false,
            init_config: false,
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.summary_sheet, "summary");
        assert_eq!(config.tally.column, "B");
        assert_eq!(config.split.last_column, "GH");
        assert_eq!(config.split.rules.len(), 14);
        assert_eq!(config.split.rules[0].module, "alert_announce");
        assert_eq!(
            config.split.rules[1].pattern,
            "poky/build/tmp-glibc/work/armv7a-vfp-neon-oe-linux-gnueabi/awsdm/1.0-r0/fulcrum/awsdm/"
        );
        assert_eq!(config.split.rules[13].module, "batpersent");
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
verbose = true
summary_sheet = "overview"

[split]
match_column = "A"

[[split.rules]]
pattern = "src/net/"
module = "net"

[[split.rules]]
pattern = "src/ui/"
module = "ui"

[tally]
column = "C"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert!(config.general.verbose);
        assert_eq!(config.general.summary_sheet, "overview");
        assert_eq!(config.general.table_name, "Table1");
        assert_eq!(config.split.match_column.as_deref(), Some("A"));
        assert_eq!(config.split.last_column, "GH");
        assert_eq!(
            config.split.rules,
            vec![
                ClassificationRule::new("src/net/", "net"),
                ClassificationRule::new("src/ui/", "ui"),
            ]
        );
        assert_eq!(config.tally.column, "C");
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[[split.rules]]"));
        assert!(toml_str.contains("[tally]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.split.rules, Config::default().split.rules);
    }

    #[test]
    fn test_merge_split_args() {
        let mut config = Config::default();
        let args = args_with(Command::Split(SplitArgs {
            input: PathBuf::from("apps.xlsx"),
            sheet: None,
            output: None,
            match_column: Some("C".to_string()),
            last_column: None,
            rules: vec![ClassificationRule::new("lib/", "lib")],
        }));

        config.merge_with_args(&args);

        assert_eq!(config.split.match_column.as_deref(), Some("C"));
        assert_eq!(config.split.last_column, "GH");
        assert_eq!(config.split.rules, vec![ClassificationRule::new("lib/", "lib")]);
    }

    #[test]
    fn test_merge_keeps_rules_without_cli_rules() {
        let mut config = Config::default();
        let args = args_with(Command::Split(SplitArgs {
            input: PathBuf::from("apps.xlsx"),
            sheet: None,
            output: None,
            match_column: None,
            last_column: Some("Z".to_string()),
            rules: Vec::new(),
        }));

        config.merge_with_args(&args);

        assert_eq!(config.split.rules.len(), 14);
        assert_eq!(config.split.last_column, "Z");
    }

    #[test]
    fn test_merge_tally_column() {
        let mut config = Config::default();
        let mut args = args_with(Command::Tally(TallyArgs {
            input: PathBuf::from("apps_awsdm.xlsx"),
            sheet: None,
            module: None,
            output: None,
            column: Some("D".to_string()),
            fail_on: None,
        }));
        args.verbose = true;

        config.merge_with_args(&args);

        assert_eq!(config.tally.column, "D");
        assert!(config.general.verbose);
    }
}
