//! Serial date arithmetic
//!
//! A serial date number orders the periods of one frequency on a line:
//! consecutive periods differ by exactly one. Serials of different
//! frequencies are not comparable.
//!
//! - Regular frequencies (yearly to monthly): `year * periods_per_year + period - 1`
//! - Weekly: ISO weeks counted from the Monday of 0001-01-01
//! - Daily: days from the common era (`chrono`'s `num_days_from_ce`)
//! - Integer: the plain integer, carried in the year slot

use super::frequency::Frequency;
use crate::{Error, Result};
use chrono::{Datelike, NaiveDate, Weekday};

/// Serial date number
pub type Serial = i64;

/// Serial number of `period` within `year` at the given frequency
///
/// For [`Frequency::Integer`] the year slot carries the value and `period`
/// is ignored.
pub fn serial(freq: Frequency, year: i32, period: u32) -> Result<Serial> {
    if let Some(ppy) = freq.periods_per_year() {
        if period < 1 || period > ppy {
            return Err(Error::invalid_date(format!(
                "period {} out of range 1..={} for {} frequency",
                period, ppy, freq
            )));
        }
        return Ok(i64::from(year) * i64::from(ppy) + i64::from(period) - 1);
    }

    match freq {
        Frequency::Integer => Ok(i64::from(year)),
        Frequency::Weekly => {
            let monday = NaiveDate::from_isoywd_opt(year, period, Weekday::Mon).ok_or_else(|| {
                Error::invalid_date(format!("week {} does not exist in {}", period, year))
            })?;
            Ok(weekly_serial(monday))
        }
        Frequency::Daily => {
            let date = NaiveDate::from_yo_opt(year, period).ok_or_else(|| {
                Error::invalid_date(format!("day {} does not exist in {}", period, year))
            })?;
            Ok(daily_serial(date))
        }
        _ => Err(Error::invalid_date(format!("no period rule for {} frequency", freq))),
    }
}

/// Inverse of [`serial`]
pub fn year_period(freq: Frequency, serial: Serial) -> (i32, u32) {
    if let Some(ppy) = freq.periods_per_year() {
        let ppy = i64::from(ppy);
        return (serial.div_euclid(ppy) as i32, (serial.rem_euclid(ppy) + 1) as u32);
    }

    match freq {
        Frequency::Weekly => match weekly_monday(serial) {
            Some(monday) => {
                let week = monday.iso_week();
                (week.year(), week.week())
            }
            None => (0, 1),
        },
        Frequency::Daily => match daily_date(serial) {
            Some(date) => (date.year(), date.ordinal()),
            None => (0, 1),
        },
        _ => (serial as i32, 1),
    }
}

/// Serial number of the period containing a calendar date
pub fn calendar_to_serial(freq: Frequency, date: NaiveDate) -> Result<Serial> {
    if let Some(ppy) = freq.periods_per_year() {
        let period = date.month0() * ppy / 12 + 1;
        return serial(freq, date.year(), period);
    }

    match freq {
        Frequency::Weekly => Ok(daily_to_weekly(daily_serial(date))),
        Frequency::Daily => Ok(daily_serial(date)),
        _ => Err(Error::invalid_date(format!(
            "calendar date {} has no {} serial",
            date, freq
        ))),
    }
}

/// First calendar day of the period a serial number denotes
pub fn serial_to_calendar(freq: Frequency, serial: Serial) -> Option<NaiveDate> {
    if let Some(ppy) = freq.periods_per_year() {
        let (year, period) = year_period(freq, serial);
        let month = (period - 1) * 12 / ppy + 1;
        return NaiveDate::from_ymd_opt(year, month, 1);
    }

    match freq {
        Frequency::Weekly => weekly_monday(serial),
        Frequency::Daily => daily_date(serial),
        _ => None,
    }
}

/// Decimal-year representation of a serial number (start of the period)
pub fn serial_to_decimal_year(freq: Frequency, serial: Serial) -> f64 {
    if let Some(ppy) = freq.periods_per_year() {
        return serial as f64 / f64::from(ppy);
    }

    match freq {
        Frequency::Weekly => weekly_monday(serial)
            .map(date_to_decimal_year)
            .unwrap_or(f64::NAN),
        Frequency::Daily => daily_date(serial)
            .map(date_to_decimal_year)
            .unwrap_or(f64::NAN),
        _ => serial as f64,
    }
}

/// Serial number of the period containing a decimal year
pub fn decimal_year_to_serial(freq: Frequency, decimal_year: f64) -> Result<Serial> {
    if !decimal_year.is_finite() {
        return Err(Error::invalid_date(format!(
            "decimal year {} is not finite",
            decimal_year
        )));
    }

    if let Some(ppy) = freq.periods_per_year() {
        return Ok((decimal_year * f64::from(ppy) + 1e-9).floor() as i64);
    }

    match freq {
        Frequency::Integer => Ok(decimal_year.round() as i64),
        Frequency::Weekly | Frequency::Daily => {
            let year = decimal_year.floor() as i32;
            let days = days_in_year(year).ok_or_else(|| {
                Error::invalid_date(format!("year {} is out of calendar range", year))
            })?;
            let fraction = decimal_year - f64::from(year);
            let ordinal = ((fraction * f64::from(days) + 1e-9).floor() as u32 + 1).min(days);
            let date = NaiveDate::from_yo_opt(year, ordinal).ok_or_else(|| {
                Error::invalid_date(format!("day {} does not exist in {}", ordinal, year))
            })?;
            let daily = daily_serial(date);
            Ok(if freq == Frequency::Weekly {
                daily_to_weekly(daily)
            } else {
                daily
            })
        }
        _ => Err(Error::invalid_date(format!("no period rule for {} frequency", freq))),
    }
}

/// Human-readable date string, e.g. `2000Q1`, `2000M03`, `2000W05`, `2000-01-15`
pub fn format_serial(freq: Frequency, serial: Serial) -> String {
    match freq {
        Frequency::Integer => serial.to_string(),
        Frequency::Daily => match daily_date(serial) {
            Some(date) => date.format("%Y-%m-%d").to_string(),
            None => format!("D{}", serial),
        },
        Frequency::Yearly => format!("{}Y", year_period(freq, serial).0),
        Frequency::Monthly | Frequency::Weekly => {
            let (year, period) = year_period(freq, serial);
            let letter = freq.letter().unwrap_or('?');
            format!("{}{}{:02}", year, letter, period)
        }
        _ => {
            let (year, period) = year_period(freq, serial);
            let letter = freq.letter().unwrap_or('?');
            format!("{}{}{}", year, letter, period)
        }
    }
}

fn daily_serial(date: NaiveDate) -> Serial {
    i64::from(date.num_days_from_ce())
}

fn daily_date(serial: Serial) -> Option<NaiveDate> {
    i32::try_from(serial)
        .ok()
        .and_then(NaiveDate::from_num_days_from_ce_opt)
}

// 0001-01-01 is day 1 of the common era and a Monday.
fn daily_to_weekly(daily: Serial) -> Serial {
    (daily - 1).div_euclid(7)
}

fn weekly_serial(monday: NaiveDate) -> Serial {
    daily_to_weekly(daily_serial(monday))
}

fn weekly_monday(serial: Serial) -> Option<NaiveDate> {
    daily_date(serial * 7 + 1)
}

fn days_in_year(year: i32) -> Option<u32> {
    NaiveDate::from_ymd_opt(year, 12, 31).map(|d| d.ordinal())
}

fn date_to_decimal_year(date: NaiveDate) -> f64 {
    let days = days_in_year(date.year()).unwrap_or(365);
    f64::from(date.year()) + f64::from(date.ordinal() - 1) / f64::from(days)
}
