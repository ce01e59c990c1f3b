//! Class/shape annotations: `identifier[dims]`
//!
//! Dimensions are written `2-by-3`, `2x3` or as a legacy bracket chain
//! `[2][3]`. A placeholder dimension (`Inf`, `N`, `*` or empty) stands for
//! the row count. An annotation whose dimensions cannot be read keeps its
//! identifier and gets no dimensions.

use crate::app::models::NumericType;
use crate::constants::{MAX_AXIS_LENGTH, MAX_GROUP_COLUMNS, SERIES_TYPE_NAMES};
use crate::{Error, Result};
use regex::Regex;

const CLASS_PATTERN: &str = r"^\s*([A-Za-z_][\w.]*)?\s*((?:\[[^\]]*\])*)\s*$";
const BRACKET_PATTERN: &str = r"\[([^\]]*)\]";

/// What a column group becomes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Series,
    Array(NumericType),
}

/// Parsed class annotation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSpec {
    pub kind: EntryKind,
    /// Declared dimensions; `None` marks a row-count placeholder
    pub dims: Vec<Option<usize>>,
}

impl ClassSpec {
    /// Trailing shape of a series (everything after the period axis)
    pub fn series_shape(&self) -> Vec<usize> {
        let declared = match self.dims.split_first() {
            Some((None, rest)) => rest,
            _ => &self.dims[..],
        };
        concrete(declared).unwrap_or_else(|| vec![1])
    }

    /// Row count (`None` for all rows) and trailing shape of a typed array
    pub fn array_shape(&self) -> (Option<usize>, Vec<usize>) {
        match self.dims.split_first() {
            None => (None, vec![1]),
            Some((rows, [])) => (*rows, vec![1]),
            Some((rows, rest)) => match concrete(rest) {
                Some(trailing) => (*rows, trailing),
                None => (None, vec![1]),
            },
        }
    }

    /// Number of data columns the group consumes
    pub fn width(&self) -> usize {
        match self.kind {
            EntryKind::Series => self.series_shape().iter().product(),
            EntryKind::Array(_) => self.array_shape().1.iter().product(),
        }
    }

    /// Whether the declared shape stays within the group and axis limits
    pub fn is_bounded(&self) -> bool {
        let rows_ok = match self.kind {
            EntryKind::Series => true,
            EntryKind::Array(_) => self.array_shape().0.is_none_or(|rows| rows <= MAX_AXIS_LENGTH),
        };
        rows_ok && self.width() <= MAX_GROUP_COLUMNS
    }

    /// Same kind with the dims dropped, as for an unreadable annotation
    pub fn without_dims(&self) -> Self {
        Self {
            kind: self.kind,
            dims: Vec::new(),
        }
    }
}

/// Compiled annotation parser
#[derive(Debug, Clone)]
pub struct ClassSpecParser {
    class: Regex,
    bracket: Regex,
}

impl ClassSpecParser {
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| Error::configuration(e.to_string()))
        };
        Ok(Self {
            class: compile(CLASS_PATTERN)?,
            bracket: compile(BRACKET_PATTERN)?,
        })
    }

    /// Parse one class cell; an unknown numeric type name is fatal
    pub fn parse(&self, text: &str, file: &str) -> Result<ClassSpec> {
        let (identifier, dims) = match self.class.captures(text) {
            Some(captures) => {
                let identifier = captures.get(1).map(|m| m.as_str()).unwrap_or("");
                let brackets = captures.get(2).map(|m| m.as_str()).unwrap_or("");
                (identifier.to_string(), self.parse_dims(brackets))
            }
            None => {
                let identifier = text.split('[').next().unwrap_or("").trim();
                (identifier.to_string(), Vec::new())
            }
        };

        let kind = if identifier.is_empty() || is_series_name(&identifier) {
            EntryKind::Series
        } else {
            match NumericType::lookup(&identifier) {
                Some(numeric) => EntryKind::Array(numeric),
                None => return Err(Error::unknown_numeric_type(file, identifier)),
            }
        };

        Ok(ClassSpec { kind, dims })
    }

    fn parse_dims(&self, brackets: &str) -> Vec<Option<usize>> {
        let groups: Vec<&str> = self
            .bracket
            .captures_iter(brackets)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect();

        let tokens: Vec<String> = match groups.as_slice() {
            [] => return Vec::new(),
            [single] => split_dims(single),
            chain => chain.iter().map(|g| g.trim().to_string()).collect(),
        };

        tokens
            .iter()
            .map(|token| parse_dim(token))
            .collect::<Option<Vec<_>>>()
            .unwrap_or_default()
    }
}

fn is_series_name(identifier: &str) -> bool {
    SERIES_TYPE_NAMES
        .iter()
        .any(|name| name.eq_ignore_ascii_case(identifier))
}

fn split_dims(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase().replace("-by-", "x");
    lowered
        .split(['x', '×'])
        .map(|t| t.trim().to_string())
        .collect()
}

/// `Some(Some(n))` for a number, `Some(None)` for a placeholder, `None` when unreadable
fn parse_dim(token: &str) -> Option<Option<usize>> {
    let token = token.trim();
    if token.is_empty() || token == "*" || token.eq_ignore_ascii_case("n") || token.eq_ignore_ascii_case("inf") {
        return Some(None);
    }
    token.parse::<usize>().ok().map(Some)
}

/// Concrete dims whose element count fits in `usize`
fn concrete(dims: &[Option<usize>]) -> Option<Vec<usize>> {
    if dims.is_empty() {
        return None;
    }
    let dims: Vec<usize> = dims.iter().copied().collect::<Option<_>>()?;
    dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))?;
    Some(dims)
}
