//! Frequency and serial date codec
//!
//! Pure functions mapping calendar positions to a linear serial date number
//! per frequency, and a date-string parser driven by a layout pattern.
//!
//! - [`frequency`] - Supported sampling frequencies
//! - [`codec`] - Serial date arithmetic (year/period, calendar, decimal year)
//! - [`format`] - Date string layouts and parsing

pub mod codec;
pub mod format;
pub mod frequency;

pub use codec::{
    Serial, calendar_to_serial, decimal_year_to_serial, format_serial, serial,
    serial_to_calendar, serial_to_decimal_year, year_period,
};
pub use format::{DateParser, ParsedDate};
pub use frequency::Frequency;
