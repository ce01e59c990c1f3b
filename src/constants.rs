//! Application constants for the CSV databank loader
//!
//! This module contains the default markers, labels and tokens recognized in
//! databank CSV files, plus runtime defaults used by the CLI.

// =============================================================================
// Header Row Markers
// =============================================================================

/// Identifier labels recognized as the name row (compared case-insensitively,
/// whitespace and a trailing `->` ignored)
pub const DEFAULT_NAME_ROW_LABELS: &[&str] = &["", "Variables->"];

/// Identifier labels recognized as the comment row
pub const DEFAULT_COMMENT_ROW_LABELS: &[&str] = &["Comment", "Comments"];

/// Prefix identifying the class/size row (e.g. `Class[Size] ->`)
pub const CLASS_ROW_MARKER: &str = "class";

/// Token identifying the file-level user data row
pub const USER_DATA_ROW_TOKEN: &str = "userdata";

/// Token identifying unit rows, which are discarded
pub const UNITS_ROW_TOKEN: &str = "units";

/// Leading marker identifying per-entry user data field rows (e.g. `.source`)
pub const DEFAULT_USER_DATA_FIELD_MARKER: &str = ".";

/// Leading marker for header rows that are skipped outright
pub const DEFAULT_COMMENT_SKIP_MARKER: &str = "#";

/// Field name used for the file-level user data when neither the row nor the
/// caller names one
pub const DEFAULT_USER_DATA_FIELD_NAME: &str = "UserData";

// =============================================================================
// Data Region Tokens
// =============================================================================

/// Default missing-value tokens
pub const DEFAULT_MISSING_TOKENS: &[&str] = &["NaN"];

/// Token every configured missing-value token is rewritten to before parsing
pub const MISSING_SENTINEL: &str = "NaN";

/// Highlight marker cells, rewritten to empty cells before parsing
pub const HIGHLIGHT_MARKER: &str = "***";

// =============================================================================
// Dates
// =============================================================================

/// Default date layout: four-digit year, frequency letter, period
pub const DEFAULT_DATE_FORMAT: &str = "YYYYFP";

/// Default frequency letters used in date strings
pub const DEFAULT_FREQUENCY_LETTERS: &[(char, &str)] = &[
    ('Y', "yearly"),
    ('A', "yearly"),
    ('H', "halfyearly"),
    ('Q', "quarterly"),
    ('B', "bimonthly"),
    ('M', "monthly"),
    ('W', "weekly"),
    ('D', "daily"),
];

/// Two-digit years below this pivot are read as 20xx, others as 19xx
pub const TWO_DIGIT_YEAR_PIVOT: i32 = 50;

// =============================================================================
// Names and Types
// =============================================================================

/// Class identifiers that denote a time series
pub const SERIES_TYPE_NAMES: &[&str] = &["tseries", "series", "timeseries", "ts"];

/// Longest legal entry name; longer names are truncated during repair
pub const MAX_NAME_LENGTH: usize = 63;

/// Widest column group a class annotation may declare; wider dims are unreadable
pub const MAX_GROUP_COLUMNS: usize = 1 << 16;

/// Longest period axis, and most rows a typed array may declare
pub const MAX_AXIS_LENGTH: usize = 10_000_000;

/// Most values one entry may hold
pub const MAX_ENTRY_ELEMENTS: usize = 100_000_000;

/// Prefix prepended to repaired names that do not start with a letter
pub const REPAIRED_NAME_PREFIX: &str = "x";

// =============================================================================
// Runtime Defaults
// =============================================================================

/// Default number of files read concurrently by the multi-file loader
pub const DEFAULT_READ_CONCURRENCY: usize = 4;

/// Maximum number of files read concurrently
pub const MAX_READ_CONCURRENCY: usize = 64;

/// Configuration file name inside the user config directory
pub const CONFIG_DIR_NAME: &str = "csv-databank";
pub const CONFIG_FILE_NAME: &str = "config.json";
