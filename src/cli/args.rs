//! Command-line argument definitions for the databank loader
//!
//! This module defines the CLI interface using the clap derive API. Loader
//! options given on the command line override those from the configuration
//! file.

use crate::app::services::dates::Frequency;
use crate::config::{LoadOptions, NameCase, RowRef, RowSelector, SkipRows};
use crate::constants::MAX_READ_CONCURRENCY;
use crate::{Error, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::str::FromStr;

/// CLI arguments for the databank loader
///
/// Loads semi-structured CSV databank files (names, class annotations and
/// comments above a dated data region) and reports the series and arrays
/// they contain.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "csv-databank",
    version,
    about = "Load CSV databank files into named time series and numeric arrays",
    long_about = "Reads CSV databank files whose leading rows carry entry names, class/shape \
                  annotations, comments and user data, parses the date column, tells missing \
                  values apart from genuine negative infinities, and rebuilds every column \
                  group into a time series or a typed numeric array."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Load one or more databank files and report their entries
    Load(LoadArgs),
    /// Show how the header rows of a file are classified
    Inspect(InspectArgs),
}

/// Arguments for the load command
#[derive(Debug, Clone, Parser)]
pub struct LoadArgs {
    /// Input files or glob patterns, loaded and merged in the order given
    #[arg(value_name = "FILES", required = true)]
    pub inputs: Vec<String>,

    #[command(flatten)]
    pub options: LoadOptionArgs,

    /// Path to configuration file (JSON format)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Number of files read concurrently
    #[arg(short = 'j', long = "workers", value_name = "COUNT")]
    pub workers: Option<usize>,

    /// List every entry with its shape and date range
    #[arg(long = "entries")]
    pub show_entries: bool,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Suppress output except errors
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output format for results
    #[arg(long = "output-format", value_enum, default_value = "human")]
    pub output_format: OutputFormat,
}

/// Arguments for the inspect command
#[derive(Debug, Clone, Parser)]
pub struct InspectArgs {
    /// Databank file to inspect
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    #[command(flatten)]
    pub options: LoadOptionArgs,

    /// Path to configuration file (JSON format)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Enable verbose logging (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Output format for the classification report
    #[arg(long = "output-format", value_enum, default_value = "human")]
    pub output_format: OutputFormat,
}

/// Loader options shared by all subcommands
#[derive(Debug, Clone, Default, ClapArgs)]
pub struct LoadOptionArgs {
    /// Case conversion of entry names
    #[arg(long = "case", value_enum)]
    pub case: Option<CaseArg>,

    /// Labels identifying the comment row
    #[arg(long = "comment-row", value_name = "LABEL", value_delimiter = ',')]
    pub comment_row: Vec<String>,

    /// Date string layout, e.g. YYYYFP, YYYY-MM-DD, Mmm-YYYY
    #[arg(long = "date-format", value_name = "LAYOUT")]
    pub date_format: Option<String>,

    /// Non-comma field separator
    #[arg(long = "delimiter", value_name = "SEP")]
    pub delimiter: Option<String>,

    /// Synthesize consecutive dates from the first data row's date
    #[arg(long = "first-date-only")]
    pub first_date_only: bool,

    /// Force a date frequency instead of detecting it
    #[arg(long = "freq", value_name = "FREQ")]
    pub freq: Option<Frequency>,

    /// Extra frequency letters, e.g. K=quarterly
    #[arg(long = "freq-letter", value_name = "LETTER=FREQ")]
    pub freq_letters: Vec<FreqLetter>,

    /// Name row labels (comma-separated) or one-based line number
    #[arg(long = "name-row", value_name = "LABELS|LINE")]
    pub name_row: Option<String>,

    /// Missing-value tokens
    #[arg(long = "nan", value_name = "TOKEN", value_delimiter = ',')]
    pub nan: Vec<String>,

    /// Entry names to keep
    #[arg(long = "select", value_name = "NAME", value_delimiter = ',')]
    pub select: Vec<String>,

    /// One-based line numbers of header rows to ignore
    #[arg(long = "skip-line", value_name = "LINE", value_delimiter = ',', conflicts_with = "skip_patterns")]
    pub skip_lines: Vec<usize>,

    /// Regular expressions for header row identifiers to ignore
    #[arg(long = "skip-pattern", value_name = "REGEX")]
    pub skip_patterns: Vec<String>,

    /// Field name for the file-level user data
    #[arg(long = "user-data", value_name = "FIELD")]
    pub user_data: Option<String>,

    /// Leading marker of per-entry user data rows
    #[arg(long = "user-data-field", value_name = "MARKER")]
    pub user_data_field: Option<String>,

    /// Extra user data rows by label or one-based line number
    #[arg(long = "user-data-row", value_name = "LABEL|LINE")]
    pub user_data_rows: Vec<String>,
}

/// Name case conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CaseArg {
    Lower,
    Upper,
    None,
}

impl From<CaseArg> for NameCase {
    fn from(case: CaseArg) -> Self {
        match case {
            CaseArg::Lower => NameCase::Lower,
            CaseArg::Upper => NameCase::Upper,
            CaseArg::None => NameCase::None,
        }
    }
}

/// Output format options for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON format for scripting
    Json,
}

/// A frequency letter alias `LETTER=FREQ`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreqLetter {
    pub letter: String,
    pub frequency: Frequency,
}

impl FromStr for FreqLetter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (letter, frequency) = s.split_once('=').ok_or_else(|| {
            Error::configuration(format!("Frequency letter '{}' must look like K=quarterly", s))
        })?;

        let letter = letter.trim();
        if letter.chars().count() != 1 {
            return Err(Error::configuration(format!(
                "Frequency letter '{}' must be a single character",
                letter
            )));
        }

        Ok(Self {
            letter: letter.to_string(),
            frequency: frequency.parse()?,
        })
    }
}

impl LoadOptionArgs {
    /// Override `options` with every option given on the command line
    pub fn apply_to(&self, mut options: LoadOptions) -> LoadOptions {
        if let Some(case) = self.case {
            options.case = case.into();
        }
        if !self.comment_row.is_empty() {
            options.comment_row = self.comment_row.clone();
        }
        if let Some(date_format) = &self.date_format {
            options.date_format = date_format.clone();
        }
        if let Some(delimiter) = &self.delimiter {
            options.delimiter = Some(delimiter.clone());
        }
        if self.first_date_only {
            options.first_date_only = true;
        }
        if let Some(freq) = self.freq {
            options.freq = Some(freq);
        }
        for alias in &self.freq_letters {
            options.freq_letters.insert(alias.letter.clone(), alias.frequency);
        }
        if let Some(name_row) = &self.name_row {
            options.name_row = parse_name_row(name_row);
        }
        if !self.nan.is_empty() {
            options.nan = self.nan.clone();
        }
        if !self.select.is_empty() {
            options.select = Some(self.select.clone());
        }
        if !self.skip_lines.is_empty() {
            options.skip_rows = SkipRows::Lines(self.skip_lines.clone());
        } else if !self.skip_patterns.is_empty() {
            options.skip_rows = SkipRows::Patterns(self.skip_patterns.clone());
        }
        if let Some(user_data) = &self.user_data {
            options.user_data = Some(user_data.clone());
        }
        if let Some(marker) = &self.user_data_field {
            options.user_data_field = marker.clone();
        }
        if !self.user_data_rows.is_empty() {
            options.user_data_field_list = self
                .user_data_rows
                .iter()
                .map(|row| match row.trim().parse::<usize>() {
                    Ok(line) => RowRef::Line(line),
                    Err(_) => RowRef::Label(row.clone()),
                })
                .collect();
        }
        options
    }
}

fn parse_name_row(value: &str) -> RowSelector {
    match value.trim().parse::<usize>() {
        Ok(line) => RowSelector::Line(line),
        Err(_) => RowSelector::Labels(value.split(',').map(|s| s.trim().to_string()).collect()),
    }
}

impl LoadArgs {
    /// Validate the load command arguments for consistency
    pub fn validate(&self) -> Result<()> {
        if let Some(workers) = self.workers {
            if workers == 0 {
                return Err(Error::configuration(
                    "Number of workers must be greater than 0".to_string(),
                ));
            }
            if workers > MAX_READ_CONCURRENCY {
                return Err(Error::configuration(format!(
                    "Number of workers cannot exceed {}",
                    MAX_READ_CONCURRENCY
                )));
            }
        }

        if let Some(config_file) = &self.config_file {
            if !config_file.exists() {
                return Err(Error::configuration(format!(
                    "Config file does not exist: {}",
                    config_file.display()
                )));
            }
        }

        Ok(())
    }

    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            log_level(self.verbose)
        }
    }

    /// Check if we should show progress bars (not in quiet mode, not JSON)
    pub fn show_progress(&self) -> bool {
        !self.quiet && self.output_format == OutputFormat::Human
    }
}

impl InspectArgs {
    /// Validate the inspect command arguments
    pub fn validate(&self) -> Result<()> {
        if !self.input.exists() {
            return Err(Error::file_not_found(self.input.display().to_string()));
        }
        if let Some(config_file) = &self.config_file {
            if !config_file.exists() {
                return Err(Error::configuration(format!(
                    "Config file does not exist: {}",
                    config_file.display()
                )));
            }
        }
        Ok(())
    }

    pub fn get_log_level(&self) -> &'static str {
        log_level(self.verbose)
    }
}

fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_load_command() {
        let args = Args::try_parse_from([
            "csv-databank",
            "load",
            "a.csv",
            "data/*.csv",
            "--freq",
            "q",
            "--nan",
            "NA,n.a.",
            "--select",
            "gdp,cpi",
            "--case",
            "lower",
            "-vv",
        ])
        .unwrap();

        match args.command {
            Some(Commands::Load(load)) => {
                assert_eq!(load.inputs, vec!["a.csv", "data/*.csv"]);
                assert_eq!(load.options.freq, Some(Frequency::Quarterly));
                assert_eq!(load.options.nan, vec!["NA", "n.a."]);
                assert_eq!(load.options.select, vec!["gdp", "cpi"]);
                assert_eq!(load.options.case, Some(CaseArg::Lower));
                assert_eq!(load.get_log_level(), "debug");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_freq_letter_parsing() {
        let alias: FreqLetter = "K=quarterly".parse().unwrap();
        assert_eq!(alias.letter, "K");
        assert_eq!(alias.frequency, Frequency::Quarterly);

        assert!("KK=quarterly".parse::<FreqLetter>().is_err());
        assert!("K".parse::<FreqLetter>().is_err());
        assert!("K=fortnightly".parse::<FreqLetter>().is_err());
    }

    #[test]
    fn test_apply_to_overrides_only_given_options() {
        let args = LoadOptionArgs {
            name_row: Some("3".to_string()),
            user_data_rows: vec!["Source".to_string(), "7".to_string()],
            skip_patterns: vec!["^Notes".to_string()],
            first_date_only: true,
            ..LoadOptionArgs::default()
        };
        let base = LoadOptions::default().with_nan(["NA"]);
        let options = args.apply_to(base);

        assert_eq!(options.name_row, RowSelector::Line(3));
        assert_eq!(
            options.user_data_field_list,
            vec![RowRef::Label("Source".to_string()), RowRef::Line(7)]
        );
        assert_eq!(options.skip_rows, SkipRows::Patterns(vec!["^Notes".to_string()]));
        assert!(options.first_date_only);
        assert_eq!(options.nan, vec!["NA"]);
        assert_eq!(options.date_format, "YYYYFP");
    }

    #[test]
    fn test_name_row_labels() {
        assert_eq!(
            parse_name_row("Variables->, Names"),
            RowSelector::Labels(vec!["Variables->".to_string(), "Names".to_string()])
        );
    }

    #[test]
    fn test_load_args_validation() {
        let temp_dir = TempDir::new().unwrap();
        let args = Args::try_parse_from(["csv-databank", "load", "x.csv", "-j", "4"]).unwrap();
        let Some(Commands::Load(mut load)) = args.command else {
            panic!("expected load command");
        };
        assert!(load.validate().is_ok());
        assert!(load.show_progress());

        load.workers = Some(0);
        assert!(load.validate().is_err());

        load.workers = Some(MAX_READ_CONCURRENCY + 1);
        assert!(load.validate().is_err());

        load.workers = None;
        load.config_file = Some(temp_dir.path().join("missing.json"));
        assert!(load.validate().is_err());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Args::try_parse_from(["csv-databank", "load", "x.csv", "-q", "-v"]).is_err());
    }
}
