//! Numeric table reader
//!
//! The data region is parsed twice. Pass 1 fills unparsable or empty cells
//! with negative infinity, pass 2 fills them with NaN. A cell is missing iff
//! it reads as negative infinity in pass 1 and as NaN in pass 2, so a literal
//! `-Inf` in the source survives as a genuine value.

use super::tokenizer::Tokenizer;
use crate::constants::MISSING_SENTINEL;
use crate::{Error, Result};
use num_complex::Complex64;
use std::ops::Range;
use tracing::debug;

/// Fill policy for cells that do not parse as numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    NegInfinity,
    NaN,
}

impl Fill {
    fn value(self) -> Complex64 {
        match self {
            Fill::NegInfinity => Complex64::new(f64::NEG_INFINITY, 0.0),
            Fill::NaN => Complex64::new(f64::NAN, 0.0),
        }
    }
}

/// Parsed data region, column-major
#[derive(Debug, Clone)]
pub struct NumericTable {
    rows: usize,
    cols: usize,
    values: Vec<Complex64>,
    missing: Vec<bool>,
}

impl NumericTable {
    /// Parse data cells (date column excluded) into a `rows x cols` table
    ///
    /// Short rows are filled like empty cells; cells past `cols` are ignored.
    pub fn read(
        rows: &[&[String]],
        cols: usize,
        tokenizer: &Tokenizer,
        file: &str,
    ) -> Result<Self> {
        let cells: Vec<Vec<String>> = rows
            .iter()
            .map(|row| {
                row.iter()
                    .take(cols)
                    .map(|cell| tokenizer.substitute(cell).into_owned())
                    .collect()
            })
            .collect();

        let first = parse_pass(&cells, cols, Fill::NegInfinity);
        let second = parse_pass(&cells, cols, Fill::NaN);

        let missing: Vec<bool> = first
            .iter()
            .zip(&second)
            .map(|(a, b)| a.re == f64::NEG_INFINITY && b.re.is_nan())
            .collect();

        let parsed = missing.iter().filter(|m| !**m).count();
        let unparsable = cells
            .iter()
            .flatten()
            .filter(|cell| {
                !cell.is_empty() && cell.as_str() != MISSING_SENTINEL && parse_cell(cell).is_none()
            })
            .count();
        if parsed == 0 && unparsable > 0 {
            return Err(Error::invalid_format(
                file,
                format!(
                    "data region has {} non-numeric cells and no numeric values",
                    unparsable
                ),
            ));
        }

        debug!(
            "Numeric table {}x{}: {} values, {} missing",
            rows.len(),
            cols,
            parsed,
            missing.len() - parsed
        );

        Ok(Self {
            rows: rows.len(),
            cols,
            values: second,
            missing,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Value at (row, col); NaN for missing or out-of-range cells
    pub fn value(&self, row: usize, col: usize) -> Complex64 {
        match self.offset(row, col) {
            Some(offset) if !self.missing[offset] => self.values[offset],
            _ => Fill::NaN.value(),
        }
    }

    /// Whether (row, col) was a missing cell
    pub fn is_missing(&self, row: usize, col: usize) -> bool {
        self.offset(row, col).is_some_and(|offset| self.missing[offset])
    }

    /// Whether any live value in the column range has an imaginary part
    pub fn is_complex(&self, cols: Range<usize>) -> bool {
        cols.filter(|&col| col < self.cols).any(|col| {
            (0..self.rows).any(|row| {
                let offset = row + col * self.rows;
                !self.missing[offset] && self.values[offset].im != 0.0
            })
        })
    }

    /// Number of missing cells
    pub fn missing_count(&self) -> usize {
        self.missing.iter().filter(|m| **m).count()
    }

    fn offset(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.rows && col < self.cols).then(|| row + col * self.rows)
    }
}

/// One full pass over the table with the given fill for unparsable cells
fn parse_pass(cells: &[Vec<String>], cols: usize, fill: Fill) -> Vec<Complex64> {
    let rows = cells.len();
    let mut values = vec![fill.value(); rows * cols];
    for (row, row_cells) in cells.iter().enumerate() {
        for (col, cell) in row_cells.iter().enumerate() {
            if let Some(value) = parse_cell(cell) {
                values[row + col * rows] = value;
            }
        }
    }
    values
}

/// Parse a real or complex literal; NaN text counts as unparsable
pub fn parse_cell(text: &str) -> Option<Complex64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(re) = text.parse::<f64>() {
        return (!re.is_nan()).then(|| Complex64::new(re, 0.0));
    }

    parse_complex(text)
}

/// `a+bi`, `a-bj`, `bi`, `+i`, `-j`
fn parse_complex(text: &str) -> Option<Complex64> {
    let body = text
        .strip_suffix(['i', 'j', 'I', 'J'])?
        .trim_end();

    let split = body
        .char_indices()
        .filter(|&(index, c)| {
            (c == '+' || c == '-')
                && index > 0
                && !matches!(body[..index].chars().last(), Some('e' | 'E'))
        })
        .map(|(index, _)| index)
        .last();

    let (re, im) = match split {
        Some(index) => (body[..index].trim().parse::<f64>().ok()?, &body[index..]),
        None => (0.0, body),
    };

    let im = match im.trim() {
        "" | "+" => 1.0,
        "-" => -1.0,
        other => other.replace(' ', "").parse::<f64>().ok()?,
    };

    (!re.is_nan() && !im.is_nan()).then(|| Complex64::new(re, im))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_real_and_complex_literals() {
        assert_eq!(parse_cell("1.5"), Some(Complex64::new(1.5, 0.0)));
        assert_eq!(parse_cell("-Inf"), Some(Complex64::new(f64::NEG_INFINITY, 0.0)));
        assert_eq!(parse_cell("1e-3"), Some(Complex64::new(0.001, 0.0)));
        assert_eq!(parse_cell("1+2i"), Some(Complex64::new(1.0, 2.0)));
        assert_eq!(parse_cell("1.5e-3-2j"), Some(Complex64::new(0.0015, -2.0)));
        assert_eq!(parse_cell("3i"), Some(Complex64::new(0.0, 3.0)));
        assert_eq!(parse_cell("-i"), Some(Complex64::new(0.0, -1.0)));
        assert_eq!(parse_cell("NaN"), None);
        assert_eq!(parse_cell("abc"), None);
        assert_eq!(parse_cell(""), None);
    }
}
