//! Calendar date scalar (ASN.1 DATE)

use crate::error::{BerError, BerResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Month enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Month {
    January = 1,
    February = 2,
    March = 3,
    April = 4,
    May = 5,
    June = 6,
    July = 7,
    August = 8,
    September = 9,
    October = 10,
    November = 11,
    December = 12,
}

impl Month {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Month::January),
            2 => Some(Month::February),
            3 => Some(Month::March),
            4 => Some(Month::April),
            5 => Some(Month::May),
            6 => Some(Month::June),
            7 => Some(Month::July),
            8 => Some(Month::August),
            9 => Some(Month::September),
            10 => Some(Month::October),
            11 => Some(Month::November),
            12 => Some(Month::December),
            _ => None,
        }
    }

    pub fn value(&self) -> u8 {
        *self as u8
    }

    /// Number of days in this month for the given year
    pub fn days(&self, year: u16) -> u8 {
        match self {
            Month::February if is_leap_year(year) => 29,
            Month::February => 28,
            Month::April | Month::June | Month::September | Month::November => 30,
            _ => 31,
        }
    }
}

fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Parse a fixed-width run of ASCII digits
pub(crate) fn parse_digits(text: &str, name: &str) -> BerResult<u16> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(BerError::Validation(format!(
            "{} is not a decimal number: {:?}",
            name, text
        )));
    }
    text.parse::<u16>()
        .map_err(|e| BerError::Validation(format!("{} is out of range: {}", name, e)))
}

/// Class representing a calendar date
///
/// Encoded on the wire as the X.680 DATE character form `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BerDate {
    year: u16,
    month: u8,
    day: u8,
}

impl BerDate {
    /// Length of the `YYYY-MM-DD` text form
    pub const LENGTH: usize = 10;

    /// Constructs a date
    ///
    /// # Arguments
    ///
    /// * `year` - The year from 1 to 9999
    /// * `month` - The month from 1 to 12
    /// * `day` - The day of the month, checked against the month length
    ///
    /// # Errors
    ///
    /// Returns an error if parameters are out of range
    pub fn new(year: u16, month: u8, day: u8) -> BerResult<Self> {
        Self::verify_year(year)?;
        let month_value = Month::from_u8(month).ok_or_else(|| {
            BerError::Validation(format!("Parameter month is out of range, got {}", month))
        })?;
        let days = month_value.days(year);
        if day < 1 || day > days {
            return Err(BerError::Validation(format!(
                "Parameter day of month is out of range [1, {}], got {}",
                days, day
            )));
        }
        Ok(Self { year, month, day })
    }

    /// Constructs a date with month enum
    pub fn new_with_month(year: u16, month: Month, day: u8) -> BerResult<Self> {
        Self::new(year, month.value(), day)
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    fn verify_year(year: u16) -> BerResult<()> {
        if year < 1 || year > 9999 {
            Err(BerError::Validation(format!(
                "Parameter year is out of range [1, 9999], got {}",
                year
            )))
        } else {
            Ok(())
        }
    }
}

impl Default for BerDate {
    fn default() -> Self {
        Self {
            year: 1,
            month: 1,
            day: 1,
        }
    }
}

impl fmt::Display for BerDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl FromStr for BerDate {
    type Err = BerError;

    fn from_str(text: &str) -> BerResult<Self> {
        let bytes = text.as_bytes();
        if bytes.len() != Self::LENGTH || bytes[4] != b'-' || bytes[7] != b'-' {
            return Err(BerError::Validation(format!(
                "Expected date in YYYY-MM-DD form, got {:?}",
                text
            )));
        }
        let year = parse_digits(&text[0..4], "Year")?;
        let month = parse_digits(&text[5..7], "Month")?;
        let day = parse_digits(&text[8..10], "Day")?;
        Self::new(year, month as u8, day as u8)
    }
}
