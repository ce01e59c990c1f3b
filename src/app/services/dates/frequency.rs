//! Sampling frequencies of time series

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sampling cadence of a time series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Undated observations indexed by plain integers
    #[serde(alias = "undated", alias = "zero")]
    Integer,
    #[serde(alias = "annual")]
    Yearly,
    #[serde(alias = "semiannual")]
    HalfYearly,
    Quarterly,
    Bimonthly,
    Monthly,
    Weekly,
    Daily,
}

impl Frequency {
    /// All frequencies, lowest to highest
    pub const ALL: [Frequency; 8] = [
        Frequency::Integer,
        Frequency::Yearly,
        Frequency::HalfYearly,
        Frequency::Quarterly,
        Frequency::Bimonthly,
        Frequency::Monthly,
        Frequency::Weekly,
        Frequency::Daily,
    ];

    /// Periods per year for the frequencies that divide a year evenly
    pub fn periods_per_year(self) -> Option<u32> {
        match self {
            Frequency::Yearly => Some(1),
            Frequency::HalfYearly => Some(2),
            Frequency::Quarterly => Some(4),
            Frequency::Bimonthly => Some(6),
            Frequency::Monthly => Some(12),
            Frequency::Integer | Frequency::Weekly | Frequency::Daily => None,
        }
    }

    /// Letter used for this frequency in `YYYYFP` date strings
    pub fn letter(self) -> Option<char> {
        match self {
            Frequency::Integer => None,
            Frequency::Yearly => Some('Y'),
            Frequency::HalfYearly => Some('H'),
            Frequency::Quarterly => Some('Q'),
            Frequency::Bimonthly => Some('B'),
            Frequency::Monthly => Some('M'),
            Frequency::Weekly => Some('W'),
            Frequency::Daily => Some('D'),
        }
    }

    /// Whether dates of this frequency map onto the calendar
    pub fn is_calendar(self) -> bool {
        !matches!(self, Frequency::Integer)
    }

    /// Lowercase name, as accepted by [`FromStr`]
    pub fn name(self) -> &'static str {
        match self {
            Frequency::Integer => "integer",
            Frequency::Yearly => "yearly",
            Frequency::HalfYearly => "halfyearly",
            Frequency::Quarterly => "quarterly",
            Frequency::Bimonthly => "bimonthly",
            Frequency::Monthly => "monthly",
            Frequency::Weekly => "weekly",
            Frequency::Daily => "daily",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Frequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let frequency = match s.trim().to_ascii_lowercase().as_str() {
            "integer" | "undated" | "zero" | "0" => Frequency::Integer,
            "yearly" | "annual" | "y" | "a" | "1" => Frequency::Yearly,
            "halfyearly" | "semiannual" | "h" | "2" => Frequency::HalfYearly,
            "quarterly" | "q" | "4" => Frequency::Quarterly,
            "bimonthly" | "b" | "6" => Frequency::Bimonthly,
            "monthly" | "m" | "12" => Frequency::Monthly,
            "weekly" | "w" | "52" => Frequency::Weekly,
            "daily" | "d" | "365" => Frequency::Daily,
            other => {
                return Err(Error::configuration(format!(
                    "Unknown frequency '{}'. Expected one of: {}",
                    other,
                    Frequency::ALL.map(Frequency::name).join(", ")
                )));
            }
        };
        Ok(frequency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_aliases() {
        assert_eq!("Q".parse::<Frequency>().unwrap(), Frequency::Quarterly);
        assert_eq!("annual".parse::<Frequency>().unwrap(), Frequency::Yearly);
        assert_eq!("12".parse::<Frequency>().unwrap(), Frequency::Monthly);
        assert_eq!("undated".parse::<Frequency>().unwrap(), Frequency::Integer);
        assert!("fortnightly".parse::<Frequency>().is_err());
    }

    #[test]
    fn test_serde_names() {
        let freq: Frequency = serde_json::from_str("\"annual\"").unwrap();
        assert_eq!(freq, Frequency::Yearly);
        assert_eq!(
            serde_json::to_string(&Frequency::HalfYearly).unwrap(),
            "\"halfyearly\""
        );
    }
}
