//! Date column parsing
//!
//! Converts the leading cell of every data row into a serial date and maps
//! each row onto a dense period axis `[start, end]`. Rows whose date is empty
//! or unrecognized are excluded from the axis; their values are still
//! available to typed arrays.

use crate::app::services::dates::{DateParser, Frequency, Serial, format_serial};
use crate::constants::MAX_AXIS_LENGTH;
use crate::{Error, Result};
use tracing::{debug, warn};

/// Dense period axis of the data region
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateAxis {
    /// Common frequency of all valid dates
    pub frequency: Option<Frequency>,

    /// Earliest serial date
    pub start: Option<Serial>,

    /// Number of periods from the earliest to the latest date
    pub n_periods: usize,

    /// Period index of each data row; `None` for excluded rows
    pub row_periods: Vec<Option<usize>>,

    /// Rows excluded from the axis
    pub excluded: usize,
}

impl DateAxis {
    /// Latest serial date
    pub fn end(&self) -> Option<Serial> {
        match self.start {
            Some(start) if self.n_periods > 0 => Some(start + self.n_periods as i64 - 1),
            _ => None,
        }
    }

    /// Range as text, e.g. `2000Q1:2001Q4`
    pub fn label(&self) -> String {
        match (self.frequency, self.start, self.end()) {
            (Some(freq), Some(start), Some(end)) => {
                format!("{}:{}", format_serial(freq, start), format_serial(freq, end))
            }
            _ => "none".to_string(),
        }
    }
}

/// Parse the date cells of all data rows
pub fn parse_date_column(
    dates: &[&str],
    parser: &DateParser,
    first_date_only: bool,
    file: &str,
) -> Result<DateAxis> {
    let parsed: Vec<Option<(Frequency, Serial)>> = if first_date_only {
        synthesize_from_first(dates, parser)
    } else {
        dates
            .iter()
            .map(|text| parser.parse(text).map(|d| (d.frequency, d.serial)))
            .collect()
    };

    let mut frequencies: Vec<Frequency> = Vec::new();
    for (freq, _) in parsed.iter().flatten() {
        if !frequencies.contains(freq) {
            frequencies.push(*freq);
        }
    }
    if frequencies.len() > 1 {
        let names: Vec<&str> = frequencies.iter().map(|f| f.name()).collect();
        return Err(Error::mixed_frequency(file, names.join(", ")));
    }

    let excluded = parsed.iter().filter(|p| p.is_none()).count();
    if excluded > 0 {
        debug!("{} data rows have no valid date", excluded);
    }

    let serials = parsed.iter().flatten().map(|(_, serial)| *serial);
    let (min, max) = match (serials.clone().min(), serials.max()) {
        (Some(min), Some(max)) => (min, max),
        _ => {
            return Ok(DateAxis {
                row_periods: vec![None; dates.len()],
                excluded,
                ..DateAxis::default()
            });
        }
    };

    let n_periods = max
        .checked_sub(min)
        .and_then(|span| span.checked_add(1))
        .and_then(|span| usize::try_from(span).ok())
        .filter(|&span| span <= MAX_AXIS_LENGTH)
        .ok_or_else(|| {
            Error::invalid_format(
                file,
                format!("date range {}..{} exceeds {} periods", min, max, MAX_AXIS_LENGTH),
            )
        })?;
    // Every serial lies in [min, max], so the offsets fit below n_periods
    let row_periods = parsed
        .iter()
        .map(|p| p.map(|(_, serial)| serial.abs_diff(min) as usize))
        .collect();

    Ok(DateAxis {
        frequency: frequencies.first().copied(),
        start: Some(min),
        n_periods,
        row_periods,
        excluded,
    })
}

fn synthesize_from_first(dates: &[&str], parser: &DateParser) -> Vec<Option<(Frequency, Serial)>> {
    match dates.first().and_then(|first| parser.parse(first)) {
        Some(first) => (0..dates.len())
            .map(|i| {
                i64::try_from(i)
                    .ok()
                    .and_then(|offset| first.serial.checked_add(offset))
                    .map(|serial| (first.frequency, serial))
            })
            .collect(),
        None => {
            if !dates.is_empty() {
                warn!("First date '{}' is not recognized; no dates synthesized", dates[0]);
            }
            vec![None; dates.len()]
        }
    }
}
