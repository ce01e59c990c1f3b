//! Date string layouts and parsing
//!
//! A layout is a pattern made of the tokens below; every other character is
//! matched literally. Matching is case-insensitive.
//!
//! | Token | Meaning |
//! |---|---|
//! | `YYYY` | four-digit year |
//! | `YY` | two-digit year |
//! | `F` | frequency letter (`Y`, `H`, `Q`, `B`, `M`, `W`, `D`, plus aliases) |
//! | `P` / `PP` | period within the year (any digits / exactly two) |
//! | `M` / `MM` | month number (one or two digits / exactly two) |
//! | `Mmm` | three-letter month name |
//! | `D` / `DD` | day of month (one or two digits / exactly two) |
//!
//! Strings that do not match the layout fall back to ISO calendar dates
//! (`2000-01-31`) and plain integers (undated observations).

use super::codec::{self, Serial};
use super::frequency::Frequency;
use crate::constants::{DEFAULT_FREQUENCY_LETTERS, TWO_DIGIT_YEAR_PIVOT};
use crate::{Error, Result};
use chrono::NaiveDate;
use regex::{Captures, Regex};
use std::collections::{BTreeMap, HashMap};

const MONTH_NAMES: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// A successfully parsed date string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedDate {
    pub frequency: Frequency,
    pub serial: Serial,
}

/// Parser for the leading date column
#[derive(Debug, Clone)]
pub struct DateParser {
    pattern: Regex,
    forced: Option<Frequency>,
    letters: HashMap<char, Frequency>,
}

impl DateParser {
    /// Compile a layout, optionally forcing a frequency and adding letter aliases
    pub fn new(
        layout: &str,
        forced: Option<Frequency>,
        aliases: &BTreeMap<String, Frequency>,
    ) -> Result<Self> {
        let mut letters = HashMap::new();
        for (letter, name) in DEFAULT_FREQUENCY_LETTERS {
            letters.insert(*letter, name.parse::<Frequency>()?);
        }
        for (alias, freq) in aliases {
            let mut chars = alias.trim().chars();
            match (chars.next(), chars.next()) {
                (Some(letter), None) => {
                    letters.insert(letter.to_ascii_uppercase(), *freq);
                }
                _ => {
                    return Err(Error::configuration(format!(
                        "Frequency letter alias '{}' must be a single character",
                        alias
                    )));
                }
            }
        }

        Ok(Self {
            pattern: compile_layout(layout)?,
            forced,
            letters,
        })
    }

    /// Frequency every parsed date is converted to, if forced
    pub fn forced_frequency(&self) -> Option<Frequency> {
        self.forced
    }

    /// Parse one date string; `None` when it is empty or unrecognized
    pub fn parse(&self, text: &str) -> Option<ParsedDate> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        if self.forced == Some(Frequency::Integer) {
            return parse_integer(text).map(|serial| ParsedDate {
                frequency: Frequency::Integer,
                serial,
            });
        }

        if let Some(captures) = self.pattern.captures(text) {
            if let Some(parsed) = self.from_captures(&captures) {
                return Some(parsed);
            }
        }

        self.parse_fallback(text)
    }

    fn from_captures(&self, captures: &Captures<'_>) -> Option<ParsedDate> {
        let year = capture_year(captures)?;
        let month = capture_month(captures);

        if let Some(day) = captures.name("day") {
            let day: u32 = day.as_str().parse().ok()?;
            let date = NaiveDate::from_ymd_opt(year, month?, day)?;
            return self.from_calendar(date, Frequency::Daily);
        }

        if let Some(month) = month {
            let date = NaiveDate::from_ymd_opt(year, month, 1)?;
            return self.from_calendar(date, Frequency::Monthly);
        }

        let letter_freq = match captures.name("freq") {
            Some(letter) => {
                let letter = letter.as_str().chars().next()?.to_ascii_uppercase();
                Some(*self.letters.get(&letter)?)
            }
            None => None,
        };
        let period_text = captures.name("period").map(|m| m.as_str()).unwrap_or("");

        let frequency = match (self.forced, letter_freq) {
            (Some(forced), _) => forced,
            (None, Some(freq)) => freq,
            (None, None) if period_text.is_empty() => Frequency::Yearly,
            (None, None) => return None,
        };
        let period = if period_text.is_empty() {
            1
        } else {
            period_text.parse().ok()?
        };

        let serial = codec::serial(frequency, year, period).ok()?;
        Some(ParsedDate { frequency, serial })
    }

    fn from_calendar(&self, date: NaiveDate, natural: Frequency) -> Option<ParsedDate> {
        let frequency = self.forced.unwrap_or(natural);
        let serial = codec::calendar_to_serial(frequency, date).ok()?;
        Some(ParsedDate { frequency, serial })
    }

    fn parse_fallback(&self, text: &str) -> Option<ParsedDate> {
        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            return self.from_calendar(date, Frequency::Daily);
        }

        let value = parse_integer(text)?;
        match self.forced {
            None => Some(ParsedDate {
                frequency: Frequency::Integer,
                serial: value,
            }),
            Some(forced) if forced.periods_per_year().is_some() => {
                let year = i32::try_from(value).ok()?;
                let serial = codec::serial(forced, year, 1).ok()?;
                Some(ParsedDate {
                    frequency: forced,
                    serial,
                })
            }
            Some(_) => None,
        }
    }
}

fn parse_integer(text: &str) -> Option<i64> {
    text.parse::<i64>().ok()
}

fn capture_year(captures: &Captures<'_>) -> Option<i32> {
    if let Some(year) = captures.name("year") {
        return year.as_str().parse().ok();
    }
    let short: i32 = captures.name("yy")?.as_str().parse().ok()?;
    Some(if short < TWO_DIGIT_YEAR_PIVOT {
        2000 + short
    } else {
        1900 + short
    })
}

fn capture_month(captures: &Captures<'_>) -> Option<u32> {
    if let Some(month) = captures.name("month") {
        return month.as_str().parse().ok().filter(|m| (1..=12).contains(m));
    }
    let name = captures.name("monthname")?.as_str().to_ascii_lowercase();
    MONTH_NAMES
        .iter()
        .position(|m| *m == name)
        .map(|index| index as u32 + 1)
}

/// Translate a layout into an anchored, case-insensitive regular expression
fn compile_layout(layout: &str) -> Result<Regex> {
    const TOKENS: &[(&str, &str, &str)] = &[
        ("YYYY", "year", r"(?P<year>\d{4})"),
        ("YY", "yy", r"(?P<yy>\d{2})"),
        ("Mmm", "monthname", r"(?P<monthname>[A-Za-z]{3})"),
        ("MM", "month", r"(?P<month>\d{2})"),
        ("M", "month", r"(?P<month>\d{1,2})"),
        ("DD", "day", r"(?P<day>\d{2})"),
        ("D", "day", r"(?P<day>\d{1,2})"),
        ("PP", "period", r"(?P<period>\d{2})"),
        ("P", "period", r"(?P<period>\d*)"),
        ("F", "freq", r"(?P<freq>[A-Za-z])"),
    ];

    if layout.trim().is_empty() {
        return Err(Error::configuration("Date format cannot be empty"));
    }

    let mut pattern = String::from(r"(?i)^\s*");
    let mut used: Vec<&str> = Vec::new();
    let mut rest = layout;

    'outer: while !rest.is_empty() {
        for (token, group, regex) in TOKENS {
            let matches = if *token == "Mmm" {
                rest.get(..3)
                    .is_some_and(|head| head.eq_ignore_ascii_case("mmm"))
            } else {
                rest.starts_with(token)
            };
            if matches {
                if used.contains(group) {
                    return Err(Error::configuration(format!(
                        "Date format '{}' uses the {} field more than once",
                        layout, group
                    )));
                }
                used.push(group);
                pattern.push_str(regex);
                rest = &rest[token.len()..];
                continue 'outer;
            }
        }

        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            pattern.push_str(&regex::escape(&c.to_string()));
        }
        rest = chars.as_str();
    }
    pattern.push_str(r"\s*$");

    let has_year = used.contains(&"year") || used.contains(&"yy");
    if !has_year {
        return Err(Error::configuration(format!(
            "Date format '{}' must contain a year (YYYY or YY)",
            layout
        )));
    }
    if used.contains(&"day") && !(used.contains(&"month") || used.contains(&"monthname")) {
        return Err(Error::configuration(format!(
            "Date format '{}' has a day without a month",
            layout
        )));
    }

    Regex::new(&pattern).map_err(|e| {
        Error::configuration(format!("Date format '{}' is not usable: {}", layout, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_DATE_FORMAT;

    fn default_parser() -> DateParser {
        DateParser::new(DEFAULT_DATE_FORMAT, None, &BTreeMap::new()).unwrap()
    }

    #[test]
    fn test_default_layout_frequencies() {
        let parser = default_parser();
        let q = parser.parse("2000Q3").unwrap();
        assert_eq!(q.frequency, Frequency::Quarterly);
        assert_eq!(codec::year_period(q.frequency, q.serial), (2000, 3));

        let m = parser.parse("2000m01").unwrap();
        assert_eq!(m.frequency, Frequency::Monthly);

        let y = parser.parse("1999Y").unwrap();
        assert_eq!(y.frequency, Frequency::Yearly);
        assert_eq!(codec::year_period(y.frequency, y.serial), (1999, 1));
    }

    #[test]
    fn test_fallbacks() {
        let parser = default_parser();
        let d = parser.parse("2000-02-29").unwrap();
        assert_eq!(d.frequency, Frequency::Daily);
        let i = parser.parse("17").unwrap();
        assert_eq!(i, ParsedDate { frequency: Frequency::Integer, serial: 17 });
        assert!(parser.parse("").is_none());
        assert!(parser.parse("not a date").is_none());
        assert!(parser.parse("2000Q9").is_none());
    }

    #[test]
    fn test_forced_frequency_converts_calendar_dates() {
        let parser =
            DateParser::new("YYYY-MM-DD", Some(Frequency::Quarterly), &BTreeMap::new()).unwrap();
        let q = parser.parse("2001-08-15").unwrap();
        assert_eq!(q.frequency, Frequency::Quarterly);
        assert_eq!(codec::year_period(q.frequency, q.serial), (2001, 3));
    }

    #[test]
    fn test_month_name_layout() {
        let parser = DateParser::new("Mmm-YYYY", None, &BTreeMap::new()).unwrap();
        let m = parser.parse("Mar-2004").unwrap();
        assert_eq!(m.frequency, Frequency::Monthly);
        assert_eq!(codec::year_period(m.frequency, m.serial), (2004, 3));
    }

    #[test]
    fn test_letter_aliases() {
        let mut aliases = BTreeMap::new();
        aliases.insert("K".to_string(), Frequency::Quarterly);
        let parser = DateParser::new(DEFAULT_DATE_FORMAT, None, &aliases).unwrap();
        assert_eq!(parser.parse("2000K2").unwrap().frequency, Frequency::Quarterly);

        aliases.insert("too long".to_string(), Frequency::Monthly);
        assert!(DateParser::new(DEFAULT_DATE_FORMAT, None, &aliases).is_err());
    }

    #[test]
    fn test_invalid_layouts() {
        assert!(DateParser::new("", None, &BTreeMap::new()).is_err());
        assert!(DateParser::new("FP", None, &BTreeMap::new()).is_err());
        assert!(DateParser::new("YYYY-DD", None, &BTreeMap::new()).is_err());
        assert!(DateParser::new("YYYYPP-P", None, &BTreeMap::new()).is_err());
    }
}
