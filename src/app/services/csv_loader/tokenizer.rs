//! Line splitting and cell substitution
//!
//! Lines are split on commas with double-quoted spans kept atomic (the `csv`
//! crate does the quote handling). A configured non-comma delimiter is
//! substituted with commas over the whole text beforehand; quoted text that
//! contains the delimiter is corrupted by that substitution.

use crate::config::LoadOptions;
use crate::constants::{HIGHLIGHT_MARKER, MISSING_SENTINEL};
use crate::{Error, Result};
use regex::Regex;
use std::borrow::Cow;

/// Splits raw lines into cells and normalizes data cells
#[derive(Debug)]
pub struct Tokenizer {
    delimiter: Option<String>,
    missing: Option<Regex>,
    builder: csv::ReaderBuilder,
}

impl Tokenizer {
    /// Build a tokenizer for the delimiter and missing-value tokens of `options`
    pub fn new(options: &LoadOptions) -> Result<Self> {
        let tokens: Vec<String> = options
            .nan
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(regex::escape)
            .collect();

        let missing = if tokens.is_empty() {
            None
        } else {
            let pattern = format!("(?i)^(?:{})$", tokens.join("|"));
            Some(Regex::new(&pattern).map_err(|e| {
                Error::configuration(format!("Invalid missing-value tokens: {}", e))
            })?)
        };

        let delimiter = options
            .delimiter
            .clone()
            .filter(|d| !d.is_empty() && d != ",");

        let mut builder = csv::ReaderBuilder::new();
        builder
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All);

        Ok(Self {
            delimiter,
            missing,
            builder,
        })
    }

    /// Replace the configured delimiter with commas
    pub fn normalize_delimiter<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match &self.delimiter {
            Some(delimiter) => Cow::Owned(text.replace(delimiter.as_str(), ",")),
            None => Cow::Borrowed(text),
        }
    }

    /// Split one line into trimmed cells with one layer of quotes removed
    pub fn split(&self, line: &str, file: &str, line_number: usize) -> Result<Vec<String>> {
        let mut reader = self.builder.from_reader(line.as_bytes());
        let mut record = csv::StringRecord::new();
        match reader.read_record(&mut record) {
            Ok(true) => Ok(record.iter().map(str::to_string).collect()),
            Ok(false) => Ok(Vec::new()),
            Err(e) => Err(Error::invalid_format(
                file,
                format!("line {}: {}", line_number, e),
            )),
        }
    }

    /// Raw text after the first cell of `line`; `None` for a single-cell line
    ///
    /// A leading quote opens a quoted cell, in which commas and doubled
    /// quotes do not end the cell, matching how [`Tokenizer::split`] reads it.
    pub fn after_first_cell<'a>(&self, line: &'a str) -> Option<&'a str> {
        let mut chars = line.char_indices().peekable();
        let mut quoted = line.starts_with('"');
        if quoted {
            chars.next();
        }

        while let Some((index, c)) = chars.next() {
            match c {
                '"' if quoted => {
                    if chars.next_if(|&(_, next)| next == '"').is_none() {
                        quoted = false;
                    }
                }
                ',' if !quoted => return Some(&line[index + 1..]),
                _ => {}
            }
        }
        None
    }

    /// Normalize a data cell before numeric parsing
    ///
    /// Highlight markers become empty and missing-value tokens become the
    /// internal missing sentinel.
    pub fn substitute<'a>(&self, cell: &'a str) -> Cow<'a, str> {
        let cell = cell.trim();
        if cell == HIGHLIGHT_MARKER {
            return Cow::Borrowed("");
        }
        match &self.missing {
            Some(missing) if missing.is_match(cell) => Cow::Borrowed(MISSING_SENTINEL),
            _ => Cow::Borrowed(cell),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenizer(options: &LoadOptions) -> Tokenizer {
        Tokenizer::new(options).unwrap()
    }

    #[test]
    fn test_quoted_cells_are_atomic() {
        let t = tokenizer(&LoadOptions::default());
        let cells = t.split(r#"a,"b,c","", d "#, "f.csv", 1).unwrap();
        assert_eq!(cells, vec!["a", "b,c", "", "d"]);
    }

    #[test]
    fn test_empty_line_yields_no_cells() {
        let t = tokenizer(&LoadOptions::default());
        assert!(t.split("", "f.csv", 1).unwrap().is_empty());
    }

    #[test]
    fn test_delimiter_substitution() {
        let t = tokenizer(&LoadOptions::default().with_delimiter(";"));
        let text = t.normalize_delimiter("x;1;2");
        assert_eq!(text, "x,1,2");

        let plain = tokenizer(&LoadOptions::default());
        assert!(matches!(plain.normalize_delimiter("x;1"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_delimiter_inside_quotes_is_substituted_too() {
        let t = tokenizer(&LoadOptions::default().with_delimiter(";"));
        let text = t.normalize_delimiter(r#"x;"a;b";1"#);
        let cells = t.split(&text, "f.csv", 1).unwrap();
        assert_eq!(cells, vec!["x", "a,b", "1"]);
    }

    #[test]
    fn test_after_first_cell_skips_quoted_commas() {
        let t = tokenizer(&LoadOptions::default());
        assert_eq!(t.after_first_cell("a,b,c"), Some("b,c"));
        assert_eq!(t.after_first_cell(r#""x,""y"",z",1"#), Some("1"));
        assert_eq!(t.after_first_cell(r#""a,b""#), None);
        assert_eq!(t.after_first_cell("single"), None);
    }

    #[test]
    fn test_missing_tokens_are_case_insensitive_and_literal() {
        let t = tokenizer(&LoadOptions::default().with_nan(["n.a.", "NA"]));
        assert_eq!(t.substitute("N.A."), MISSING_SENTINEL);
        assert_eq!(t.substitute("na"), MISSING_SENTINEL);
        assert_eq!(t.substitute("nxa"), "nxa");
        assert_eq!(t.substitute("***"), "");
        assert_eq!(t.substitute(" 1.5 "), "1.5");
    }
}
