//! Entry reconstruction
//!
//! Walks the name row left to right. Each non-empty name starts a column
//! group whose width comes from its class annotation; the group becomes a
//! series on the date axis or a typed array sliced from the raw table.

use super::class_spec::{ClassSpec, ClassSpecParser, EntryKind};
use super::classifier::HeaderBundle;
use super::date_column::DateAxis;
use super::numeric_table::NumericTable;
use crate::app::models::{Entry, NdArray, Series, SeriesData};
use crate::constants::MAX_ENTRY_ELEMENTS;
use crate::{Error, Result};
use num_complex::Complex64;
use std::collections::BTreeMap;
use std::ops::Range;
use tracing::{debug, warn};

/// Entries built from one file, in column order
#[derive(Debug, Default)]
pub struct Reconstruction {
    pub entries: Vec<(String, Entry)>,
    pub series_created: usize,
    pub arrays_created: usize,
    /// Groups dropped by the selection filter
    pub dropped: usize,
}

/// Inputs shared by every column group of one file
pub struct Reconstructor<'a> {
    pub header: &'a HeaderBundle,
    /// Final entry name per name-row cell; `None` when the group is not kept
    pub names: &'a [Option<String>],
    pub table: Option<&'a NumericTable>,
    pub axis: &'a DateAxis,
    pub file: &'a str,
}

impl Reconstructor<'_> {
    /// Rebuild every column group
    pub fn run(&self) -> Result<Reconstruction> {
        let parser = ClassSpecParser::new()?;
        let mut result = Reconstruction::default();
        let mut col = 0;

        while col < self.header.names.len() {
            if self.header.names[col].trim().is_empty() {
                col += 1;
                continue;
            }

            let class_text = self.header.class_specs.get(col).map(String::as_str).unwrap_or("");
            let spec = parser.parse(class_text, self.file)?;
            let spec = if spec.is_bounded() {
                spec
            } else {
                warn!(
                    "Shape '{}' of '{}' is too large, reading it as one column",
                    class_text, self.header.names[col]
                );
                spec.without_dims()
            };
            let width = spec.width();
            let columns = col..col + width;

            match self.names.get(col).cloned().flatten() {
                Some(name) => {
                    let entry = match spec.kind {
                        EntryKind::Series => {
                            result.series_created += 1;
                            Entry::Series(self.build_series(&spec, columns)?)
                        }
                        EntryKind::Array(numeric) => {
                            result.arrays_created += 1;
                            Entry::Array(numeric.coerce(&self.build_array(&spec, columns)?))
                        }
                    };
                    debug!("Built entry '{}' ({}) from {} columns", name, entry.kind_label(), width);
                    result.entries.push((name, entry));
                }
                None => result.dropped += 1,
            }

            col += width.max(1);
        }

        Ok(result)
    }

    fn build_series(&self, spec: &ClassSpec, columns: Range<usize>) -> Result<Series> {
        let trailing = spec.series_shape();
        let comments = self.metadata(&self.header.comments, &columns, &trailing)?;

        let mut user_data = BTreeMap::new();
        for (key, values) in &self.header.user_data_fields {
            user_data.insert(key.clone(), self.metadata(values, &columns, &trailing)?);
        }

        let (table, start) = match (self.table, self.axis.start) {
            (Some(table), Some(start)) => (table, start),
            _ => {
                let mut series = Series::placeholder(trailing, comments);
                series.user_data = user_data;
                return Ok(series);
            }
        };

        let n = self.axis.n_periods;
        let width = columns.len();
        let total = self.element_count(n, width)?;
        let nan = Complex64::new(f64::NAN, 0.0);
        let mut values = vec![nan; total];
        for (row, period) in self.axis.row_periods.iter().enumerate() {
            let Some(period) = *period else { continue };
            for (k, col) in columns.clone().enumerate() {
                values[period + k * n] = table.value(row, col);
            }
        }

        let mut shape = vec![n];
        shape.extend(trailing);
        let values = NdArray::from_shape_vec(shape, values)?;
        let data = if table.is_complex(columns) {
            SeriesData::Complex(values)
        } else {
            SeriesData::Real(values.map(|v| v.re))
        };

        Ok(Series {
            frequency: self.axis.frequency,
            start: Some(start),
            data,
            comments,
            user_data,
        })
    }

    fn build_array(&self, spec: &ClassSpec, columns: Range<usize>) -> Result<NdArray<Complex64>> {
        let (rows, trailing) = spec.array_shape();
        let available = self.table.map(NumericTable::rows).unwrap_or(0);
        let rows = rows.unwrap_or(available);
        let nan = Complex64::new(f64::NAN, 0.0);

        let mut values = Vec::with_capacity(self.element_count(rows, columns.len())?);
        for col in columns {
            for row in 0..rows {
                values.push(self.table.map_or(nan, |t| t.value(row, col)));
            }
        }

        let mut shape = vec![rows];
        shape.extend(trailing);
        NdArray::from_shape_vec(shape, values)
    }

    /// `rows * width`, rejected past the per-entry element limit
    fn element_count(&self, rows: usize, width: usize) -> Result<usize> {
        rows.checked_mul(width)
            .filter(|&total| total <= MAX_ENTRY_ELEMENTS)
            .ok_or_else(|| {
                Error::invalid_format(
                    self.file,
                    format!("entry of {} rows by {} columns is too large", rows, width),
                )
            })
    }

    /// Metadata cells of a group, shaped like the trailing dimensions
    fn metadata(
        &self,
        cells: &[String],
        columns: &Range<usize>,
        trailing: &[usize],
    ) -> Result<NdArray<String>> {
        let values = columns
            .clone()
            .map(|col| cells.get(col).cloned().unwrap_or_default())
            .collect();
        NdArray::from_shape_vec(trailing.to_vec(), values)
    }
}
