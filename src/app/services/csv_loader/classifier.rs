//! Header row classification
//!
//! Lines are consumed one at a time until the first data line. Every earlier
//! line gets exactly one [`RowRole`]. The rules, first match wins:
//!
//! 1. a numeric name row line that has not been reached yet is discarded
//! 2. a line number in the skip set is discarded
//! 3. the first line matching the name row labels (or line number) is the name row
//! 4. any other line starts the data region unless its identifier is
//!    a. a user data field marker or listed field row
//!    b. empty or the comment-skip marker
//!    c. a file-level user data row
//!    d. the class row marker
//!    e. a comment row label
//!    f. a units row
//!    g. matched by a skip pattern

use super::tokenizer::Tokenizer;
use crate::app::models::UserData;
use crate::config::{LoadOptions, RowRef, RowSelector, SkipRows};
use crate::constants::{DEFAULT_USER_DATA_FIELD_NAME, UNITS_ROW_TOKEN, USER_DATA_ROW_TOKEN};
use crate::{Error, Result};
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

const FIELD_HINT_PATTERN: &str = r"\[(.*?)\]";

/// Role assigned to one input line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "role", content = "key", rename_all = "snake_case")]
pub enum RowRole {
    /// Before a configured name row line number
    NotReached,
    /// Listed in the skip-row line numbers
    SkippedLine,
    Name,
    /// Per-entry user data field, stored under the sanitized key
    UserDataField(String),
    /// Empty identifier or comment-skip marker
    Comment,
    FileUserData,
    Class,
    CommentRow,
    Units,
    /// Matched a skip-row pattern
    SkippedPattern,
    /// First line of the data region
    Data,
}

/// One classified header line
#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedLine {
    /// One-based line number in the (pre-processed) text
    pub line: usize,
    pub identifier: String,
    pub role: RowRole,
}

/// Metadata rows, aligned with the name row
#[derive(Debug, Clone, Default, Serialize)]
pub struct HeaderBundle {
    /// Cells of the name row after the identifier
    pub names: Vec<String>,

    /// Class/shape annotations, one per name
    pub class_specs: Vec<String>,

    /// Comments, one per name
    pub comments: Vec<String>,

    /// Per-entry user data fields in row order, each aligned with `names`
    pub user_data_fields: Vec<(String, Vec<String>)>,

    /// File-level user data
    pub user_data: Option<UserData>,
}

/// One line of the data region
#[derive(Debug, Clone, Serialize)]
pub struct DataRow {
    pub line: usize,
    pub cells: Vec<String>,
}

impl DataRow {
    /// Leading date cell
    pub fn date(&self) -> &str {
        self.cells.first().map(String::as_str).unwrap_or("")
    }

    /// Data cells after the date column
    pub fn values(&self) -> &[String] {
        self.cells.get(1..).unwrap_or(&[])
    }
}

/// Result of classifying a whole text
#[derive(Debug, Clone, Default, Serialize)]
pub struct Classification {
    pub header: HeaderBundle,
    pub lines: Vec<ClassifiedLine>,
    pub data: Vec<DataRow>,
}

impl Classification {
    /// Number of header lines with the given role
    pub fn count(&self, matches: impl Fn(&RowRole) -> bool) -> usize {
        self.lines.iter().filter(|l| matches(&l.role)).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    Header,
    Data,
}

/// Mutable state threaded through classification
#[derive(Debug)]
struct ClassifierState {
    line: usize,
    region: Region,
    name_found: bool,
    class_row: Option<Vec<String>>,
    comment_row: Option<Vec<String>>,
    field_keys: HashSet<String>,
    result: Classification,
}

impl ClassifierState {
    fn new() -> Self {
        Self {
            line: 0,
            region: Region::Header,
            name_found: false,
            class_row: None,
            comment_row: None,
            field_keys: HashSet::new(),
            result: Classification::default(),
        }
    }

    fn shelve(&mut self, identifier: &str, role: RowRole) {
        self.result.lines.push(ClassifiedLine {
            line: self.line,
            identifier: identifier.to_string(),
            role,
        });
    }

    fn unique_field_key(&mut self, base: String) -> String {
        let mut key = base.clone();
        let mut suffix = 0;
        while self.field_keys.contains(&key) {
            suffix += 1;
            key = format!("{}_{}", base, suffix);
        }
        self.field_keys.insert(key.clone());
        key
    }
}

/// Classifies header lines according to the load options
#[derive(Debug)]
pub struct RowClassifier<'a> {
    options: &'a LoadOptions,
    tokenizer: &'a Tokenizer,
    name_labels: Vec<String>,
    comment_labels: Vec<String>,
    skip_patterns: Vec<Regex>,
    field_hint: Regex,
    class_marker: String,
    field_marker: String,
}

impl<'a> RowClassifier<'a> {
    pub fn new(options: &'a LoadOptions, tokenizer: &'a Tokenizer) -> Result<Self> {
        let name_labels = match &options.name_row {
            RowSelector::Labels(labels) => labels.iter().map(|l| normalize_label(l)).collect(),
            RowSelector::Line(_) => Vec::new(),
        };

        Ok(Self {
            options,
            tokenizer,
            name_labels,
            comment_labels: options.comment_row.iter().map(|l| normalize_label(l)).collect(),
            skip_patterns: options.skip_patterns()?,
            field_hint: Regex::new(FIELD_HINT_PATTERN)
                .map_err(|e| Error::configuration(e.to_string()))?,
            class_marker: options.class_row_marker.to_lowercase(),
            field_marker: options.user_data_field.to_lowercase(),
        })
    }

    /// Classify every line of `text`
    pub fn classify(&self, text: &str, file: &str) -> Result<Classification> {
        let mut state = ClassifierState::new();

        for raw in text.lines() {
            state.line += 1;
            if raw.trim().is_empty() {
                continue;
            }

            let cells = self.tokenizer.split(raw, file, state.line)?;
            if state.region == Region::Data {
                state.result.data.push(DataRow {
                    line: state.line,
                    cells,
                });
                continue;
            }

            self.classify_header_line(&mut state, raw, cells, file)?;
        }

        self.finish(state)
    }

    fn classify_header_line(
        &self,
        state: &mut ClassifierState,
        raw: &str,
        cells: Vec<String>,
        file: &str,
    ) -> Result<()> {
        let identifier = cells.first().cloned().unwrap_or_default();

        if let RowSelector::Line(name_line) = self.options.name_row {
            if state.line < name_line {
                state.shelve(&identifier, RowRole::NotReached);
                return Ok(());
            }
        }

        if let SkipRows::Lines(lines) = &self.options.skip_rows {
            if lines.contains(&state.line) {
                state.shelve(&identifier, RowRole::SkippedLine);
                return Ok(());
            }
        }

        if !state.name_found && self.is_name_row(state.line, &identifier) {
            state.name_found = true;
            state.result.header.names = tail(cells);
            state.shelve(&identifier, RowRole::Name);
            return Ok(());
        }

        let label = normalize_label(&identifier);
        let lowered = identifier.to_lowercase();

        if self.is_user_data_field(state.line, &identifier, &lowered) {
            let key = state.unique_field_key(field_key(&identifier, &self.options.user_data_field));
            state.result.header.user_data_fields.push((key.clone(), tail(cells)));
            state.shelve(&identifier, RowRole::UserDataField(key));
            return Ok(());
        }

        if identifier.is_empty() || identifier.starts_with(&self.options.comment_skip_marker) {
            state.shelve(&identifier, RowRole::Comment);
            return Ok(());
        }

        if lowered.contains(USER_DATA_ROW_TOKEN) {
            let user_data = self.parse_user_data(raw, &identifier, file)?;
            state.result.header.user_data = Some(user_data);
            state.shelve(&identifier, RowRole::FileUserData);
            return Ok(());
        }

        if !self.class_marker.is_empty() && label.starts_with(&self.class_marker) {
            state.class_row = Some(tail(cells));
            state.shelve(&identifier, RowRole::Class);
            return Ok(());
        }

        if self.comment_labels.contains(&label) {
            state.comment_row = Some(tail(cells));
            state.shelve(&identifier, RowRole::CommentRow);
            return Ok(());
        }

        if lowered.contains(UNITS_ROW_TOKEN) {
            state.shelve(&identifier, RowRole::Units);
            return Ok(());
        }

        if self.skip_patterns.iter().any(|p| p.is_match(&identifier)) {
            state.shelve(&identifier, RowRole::SkippedPattern);
            return Ok(());
        }

        state.shelve(&identifier, RowRole::Data);
        state.region = Region::Data;
        state.result.data.push(DataRow {
            line: state.line,
            cells,
        });
        Ok(())
    }

    fn is_name_row(&self, line: usize, identifier: &str) -> bool {
        match &self.options.name_row {
            RowSelector::Line(name_line) => line == *name_line,
            RowSelector::Labels(_) => self.name_labels.contains(&normalize_label(identifier)),
        }
    }

    fn is_user_data_field(&self, line: usize, identifier: &str, lowered: &str) -> bool {
        if !self.field_marker.is_empty() && lowered.starts_with(&self.field_marker) {
            return true;
        }
        self.options.user_data_field_list.iter().any(|row| match row {
            RowRef::Line(n) => *n == line,
            RowRef::Label(label) => label.trim().eq_ignore_ascii_case(identifier),
        })
    }

    fn parse_user_data(&self, raw: &str, identifier: &str, file: &str) -> Result<UserData> {
        let expression = user_data_expression(self.tokenizer.after_first_cell(raw));
        let value = if expression.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&expression).map_err(|e| Error::invalid_user_data(file, e))?
        };

        let hint = self
            .field_hint
            .captures(identifier)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|h| !h.is_empty());

        let field = self
            .options
            .user_data
            .clone()
            .or(hint)
            .unwrap_or_else(|| DEFAULT_USER_DATA_FIELD_NAME.to_string());

        debug!("File-level user data stored under '{}'", field);
        Ok(UserData { field, value })
    }

    fn finish(&self, state: ClassifierState) -> Result<Classification> {
        let ClassifierState {
            class_row,
            comment_row,
            mut result,
            ..
        } = state;

        let width = result.header.names.len();
        result.header.class_specs = aligned(class_row.unwrap_or_default(), width);
        result.header.comments = aligned(comment_row.unwrap_or_default(), width);
        for (_, values) in result.header.user_data_fields.iter_mut() {
            let taken = std::mem::take(values);
            *values = aligned(taken, width);
        }

        debug!(
            "Classified {} header lines, {} names, {} data rows",
            result.lines.len(),
            width,
            result.data.len()
        );
        Ok(result)
    }
}

/// Identifier label used for marker comparison: no whitespace, no trailing `->`, lowercase
pub fn normalize_label(label: &str) -> String {
    let compact: String = label.chars().filter(|c| !c.is_whitespace()).collect();
    compact
        .strip_suffix("->")
        .unwrap_or(&compact)
        .to_lowercase()
}

/// Text after the identifier cell with quoting removed
fn user_data_expression(rest: Option<&str>) -> String {
    let Some(rest) = rest else {
        return String::new();
    };
    let rest = rest.trim().trim_end_matches(|c: char| c == ',' || c.is_whitespace());
    let unquoted = rest
        .strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .unwrap_or(rest);
    unquoted.replace("\"\"", "\"")
}

/// Field key: marker stripped, reduced to a valid identifier
fn field_key(identifier: &str, marker: &str) -> String {
    let stripped = if identifier
        .get(..marker.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(marker))
    {
        &identifier[marker.len()..]
    } else {
        identifier
    };

    let mut key: String = stripped
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if !key.starts_with(|c: char| c.is_ascii_alphabetic()) {
        key.insert(0, 'x');
    }
    key
}

fn tail(mut cells: Vec<String>) -> Vec<String> {
    if cells.is_empty() {
        cells
    } else {
        cells.split_off(1)
    }
}

fn aligned(mut cells: Vec<String>, width: usize) -> Vec<String> {
    cells.resize(width, String::new());
    cells
}
