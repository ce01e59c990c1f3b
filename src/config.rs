//! Configuration management and validation.
//!
//! [`LoadOptions`] is the explicit configuration for one load call: every
//! recognized option, with defaults, constructed once and passed down to the
//! loader. [`Config`] layers a JSON configuration file, environment variables
//! and command-line overrides for the CLI.

use crate::app::services::dates::{DateParser, Frequency};
use crate::constants::{
    CLASS_ROW_MARKER, CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_COMMENT_ROW_LABELS,
    DEFAULT_COMMENT_SKIP_MARKER, DEFAULT_DATE_FORMAT, DEFAULT_MISSING_TOKENS,
    DEFAULT_NAME_ROW_LABELS, DEFAULT_READ_CONCURRENCY, DEFAULT_USER_DATA_FIELD_MARKER,
    MAX_READ_CONCURRENCY,
};
use crate::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Environment variable overriding the read concurrency
pub const READ_CONCURRENCY_ENV: &str = "CSV_DATABANK_READ_CONCURRENCY";

// =============================================================================
// Function-valued options
// =============================================================================

/// Name rewrite function; `None` signals an unusable result
#[derive(Clone)]
pub struct NameFunc(Arc<dyn Fn(&str) -> Option<String> + Send + Sync>);

impl NameFunc {
    pub fn new(f: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn apply(&self, name: &str) -> Option<String> {
        (self.0)(name)
    }
}

impl fmt::Debug for NameFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NameFunc(..)")
    }
}

/// Raw-text transformation applied before any parsing
#[derive(Clone)]
pub struct PreProcessFunc(Arc<dyn Fn(&str) -> String + Send + Sync>);

impl PreProcessFunc {
    pub fn new(f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn apply(&self, text: &str) -> String {
        (self.0)(text)
    }
}

impl fmt::Debug for PreProcessFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PreProcessFunc(..)")
    }
}

// =============================================================================
// Option value types
// =============================================================================

/// Case conversion applied to entry names
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameCase {
    #[default]
    None,
    Lower,
    Upper,
}

impl NameCase {
    pub fn apply(self, name: &str) -> String {
        match self {
            NameCase::None => name.to_string(),
            NameCase::Lower => name.to_lowercase(),
            NameCase::Upper => name.to_uppercase(),
        }
    }
}

/// How the name row is located
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowSelector {
    /// One-based line number
    Line(usize),
    /// Identifier labels
    Labels(Vec<String>),
}

impl Default for RowSelector {
    fn default() -> Self {
        RowSelector::Labels(DEFAULT_NAME_ROW_LABELS.iter().map(|s| s.to_string()).collect())
    }
}

/// Header rows to ignore
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SkipRows {
    /// One-based line numbers
    Lines(Vec<usize>),
    /// Regular expressions matched against the row identifier
    Patterns(Vec<String>),
}

impl Default for SkipRows {
    fn default() -> Self {
        SkipRows::Lines(Vec::new())
    }
}

/// A header row referenced by one-based line number or identifier label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowRef {
    Line(usize),
    Label(String),
}

// =============================================================================
// Load Options
// =============================================================================

/// Options recognized by a single load call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Case conversion of entry names
    pub case: NameCase,

    /// Labels identifying the comment row
    pub comment_row: Vec<String>,

    /// Prefix identifying the class/size row
    pub class_row_marker: String,

    /// Leading marker of header rows that are discarded
    pub comment_skip_marker: String,

    /// Expected layout of date strings (see [`crate::app::services::dates::format`])
    pub date_format: String,

    /// Non-comma separator, substituted with commas before tokenizing
    pub delimiter: Option<String>,

    /// Synthesize consecutive dates from the first row's date
    pub first_date_only: bool,

    /// Force a date frequency instead of detecting it
    pub freq: Option<Frequency>,

    /// Additional frequency letters used in date strings
    pub freq_letters: BTreeMap<String, Frequency>,

    /// Name row labels or line number
    pub name_row: RowSelector,

    /// Name rewrite functions, applied in order
    #[serde(skip)]
    pub name_func: Vec<NameFunc>,

    /// Missing-value tokens (case-insensitive)
    pub nan: Vec<String>,

    /// Raw-text transformations, applied in order before parsing
    #[serde(skip)]
    pub pre_process: Vec<PreProcessFunc>,

    /// Allow-list of entry names to keep
    pub select: Option<Vec<String>>,

    /// Header rows to ignore
    pub skip_rows: SkipRows,

    /// Field name receiving the file-level user data
    pub user_data: Option<String>,

    /// Leading marker of per-entry user data field rows
    pub user_data_field: String,

    /// Explicit rows to treat as per-entry user data fields
    pub user_data_field_list: Vec<RowRef>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            case: NameCase::None,
            comment_row: DEFAULT_COMMENT_ROW_LABELS.iter().map(|s| s.to_string()).collect(),
            class_row_marker: CLASS_ROW_MARKER.to_string(),
            comment_skip_marker: DEFAULT_COMMENT_SKIP_MARKER.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            delimiter: None,
            first_date_only: false,
            freq: None,
            freq_letters: BTreeMap::new(),
            name_row: RowSelector::default(),
            name_func: Vec::new(),
            nan: DEFAULT_MISSING_TOKENS.iter().map(|s| s.to_string()).collect(),
            pre_process: Vec::new(),
            select: None,
            skip_rows: SkipRows::default(),
            user_data: None,
            user_data_field: DEFAULT_USER_DATA_FIELD_MARKER.to_string(),
            user_data_field_list: Vec::new(),
        }
    }
}

impl LoadOptions {
    pub fn with_case(mut self, case: NameCase) -> Self {
        self.case = case;
        self
    }

    pub fn with_comment_rows<S: Into<String>>(mut self, labels: impl IntoIterator<Item = S>) -> Self {
        self.comment_row = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }

    pub fn with_first_date_only(mut self) -> Self {
        self.first_date_only = true;
        self
    }

    pub fn with_freq(mut self, freq: Frequency) -> Self {
        self.freq = Some(freq);
        self
    }

    pub fn with_freq_letter(mut self, letter: impl Into<String>, freq: Frequency) -> Self {
        self.freq_letters.insert(letter.into(), freq);
        self
    }

    pub fn with_name_row_labels<S: Into<String>>(
        mut self,
        labels: impl IntoIterator<Item = S>,
    ) -> Self {
        self.name_row = RowSelector::Labels(labels.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_name_row_line(mut self, line: usize) -> Self {
        self.name_row = RowSelector::Line(line);
        self
    }

    pub fn with_name_func(
        mut self,
        f: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.name_func.push(NameFunc::new(f));
        self
    }

    pub fn with_nan<S: Into<String>>(mut self, tokens: impl IntoIterator<Item = S>) -> Self {
        self.nan = tokens.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_pre_process(mut self, f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.pre_process.push(PreProcessFunc::new(f));
        self
    }

    pub fn with_select<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.select = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_skip_lines(mut self, lines: impl IntoIterator<Item = usize>) -> Self {
        self.skip_rows = SkipRows::Lines(lines.into_iter().collect());
        self
    }

    pub fn with_skip_patterns<S: Into<String>>(
        mut self,
        patterns: impl IntoIterator<Item = S>,
    ) -> Self {
        self.skip_rows = SkipRows::Patterns(patterns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_user_data(mut self, field: impl Into<String>) -> Self {
        self.user_data = Some(field.into());
        self
    }

    pub fn with_user_data_field(mut self, marker: impl Into<String>) -> Self {
        self.user_data_field = marker.into();
        self
    }

    pub fn with_user_data_field_list(mut self, rows: impl IntoIterator<Item = RowRef>) -> Self {
        self.user_data_field_list = rows.into_iter().collect();
        self
    }

    /// Build the date parser these options describe
    pub fn date_parser(&self) -> Result<DateParser> {
        DateParser::new(&self.date_format, self.freq, &self.freq_letters)
    }

    /// Compiled skip-row patterns (empty when skip rows are line numbers)
    pub fn skip_patterns(&self) -> Result<Vec<Regex>> {
        match &self.skip_rows {
            SkipRows::Lines(_) => Ok(Vec::new()),
            SkipRows::Patterns(patterns) => patterns
                .iter()
                .map(|p| {
                    Regex::new(p).map_err(|e| {
                        Error::configuration(format!("Invalid skip-row pattern '{}': {}", p, e))
                    })
                })
                .collect(),
        }
    }

    /// Validate options for consistency
    pub fn validate(&self) -> Result<()> {
        self.date_parser()?;
        self.skip_patterns()?;

        if let Some(delimiter) = &self.delimiter {
            if delimiter.is_empty() {
                return Err(Error::configuration("Delimiter cannot be empty"));
            }
            if delimiter.contains('"') {
                return Err(Error::configuration("Delimiter cannot contain a double quote"));
            }
        }

        if self.user_data_field.trim().is_empty() {
            return Err(Error::configuration(
                "User data field marker cannot be empty",
            ));
        }

        if let RowSelector::Line(0) = self.name_row {
            return Err(Error::configuration("Name row line numbers start at 1"));
        }

        if let SkipRows::Lines(lines) = &self.skip_rows {
            if lines.contains(&0) {
                return Err(Error::configuration("Skip-row line numbers start at 1"));
            }
        }

        Ok(())
    }
}

// =============================================================================
// Layered CLI Configuration
// =============================================================================

/// Runtime settings of the CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Files read concurrently by the multi-file loader
    pub read_concurrency: usize,

    /// Default log level when `RUST_LOG` is not set
    pub log_level: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            read_concurrency: num_cpus::get().clamp(1, DEFAULT_READ_CONCURRENCY),
            log_level: "warn".to_string(),
        }
    }
}

/// Complete CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub load: LoadOptions,
    pub runtime: RuntimeConfig,
}

impl Config {
    /// Default configuration file location (`<config dir>/csv-databank/config.json`)
    pub fn default_config_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
            .ok_or_else(|| Error::configuration("Cannot determine the user config directory"))
    }

    /// Read a JSON configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::io(format!("Failed to read config file {}", path.display()), e)
        })?;
        serde_json::from_str(&text).map_err(|e| {
            Error::configuration(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Defaults, then the config file (if any), then environment variables
    pub fn load_layered(config_file: Option<&Path>) -> Result<Self> {
        let mut config = match config_file {
            Some(path) => {
                debug!("Loading configuration from {}", path.display());
                Self::from_file(path)?
            }
            None => Self::default(),
        };

        if let Ok(value) = std::env::var(READ_CONCURRENCY_ENV) {
            config.runtime.read_concurrency = value.trim().parse().map_err(|_| {
                Error::configuration(format!(
                    "{} must be a positive integer, got '{}'",
                    READ_CONCURRENCY_ENV, value
                ))
            })?;
        }

        Ok(config)
    }

    /// Validate the complete configuration
    pub fn validate(&self) -> Result<()> {
        if self.runtime.read_concurrency == 0 {
            return Err(Error::configuration(
                "Read concurrency must be greater than 0",
            ));
        }
        if self.runtime.read_concurrency > MAX_READ_CONCURRENCY {
            return Err(Error::configuration(format!(
                "Read concurrency cannot exceed {}",
                MAX_READ_CONCURRENCY
            )));
        }
        self.load.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let options = LoadOptions::default();
        assert_eq!(options.date_format, "YYYYFP");
        assert_eq!(options.nan, vec!["NaN".to_string()]);
        assert_eq!(options.user_data_field, ".");
        assert!(matches!(options.name_row, RowSelector::Labels(ref l) if l.len() == 2));
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_validation_failures() {
        assert!(LoadOptions::default().with_date_format("PP").validate().is_err());
        assert!(LoadOptions::default().with_skip_patterns(["(unclosed"]).validate().is_err());
        assert!(LoadOptions::default().with_delimiter("").validate().is_err());
        assert!(LoadOptions::default().with_name_row_line(0).validate().is_err());
        assert!(LoadOptions::default().with_skip_lines([0, 2]).validate().is_err());
    }

    #[test]
    fn test_name_case() {
        assert_eq!(NameCase::Lower.apply("GDP_Real"), "gdp_real");
        assert_eq!(NameCase::Upper.apply("gdp"), "GDP");
        assert_eq!(NameCase::None.apply("Gdp"), "Gdp");
    }

    #[test]
    fn test_deserialize_untagged_options() {
        let json = r#"{
            "name_row": 3,
            "skip_rows": ["^Source", "^Notes"],
            "user_data_field_list": [".source", 5],
            "freq": "quarterly",
            "case": "lower"
        }"#;
        let options: LoadOptions = serde_json::from_str(json).unwrap();
        assert_eq!(options.name_row, RowSelector::Line(3));
        assert!(matches!(options.skip_rows, SkipRows::Patterns(ref p) if p.len() == 2));
        assert_eq!(
            options.user_data_field_list,
            vec![RowRef::Label(".source".to_string()), RowRef::Line(5)]
        );
        assert_eq!(options.freq, Some(Frequency::Quarterly));
        assert_eq!(options.case, NameCase::Lower);
        assert_eq!(options.date_format, "YYYYFP");
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"load": {{"nan": ["NA", "n.a."]}}, "runtime": {{"read_concurrency": 2}}}}"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.load.nan, vec!["NA", "n.a."]);
        assert_eq!(config.runtime.read_concurrency, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.runtime.read_concurrency = 0;
        assert!(config.validate().is_err());
    }
}
