//! Combined date and time scalar (ASN.1 DATE-TIME)

use crate::datatypes::date::BerDate;
use crate::datatypes::time::BerTime;
use crate::error::{BerError, BerResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Class representing a date and time of day
///
/// Encoded on the wire as the X.680 DATE-TIME character form
/// `YYYY-MM-DDTHH:MM:SS`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BerDateTime {
    date: BerDate,
    time: BerTime,
}

impl BerDateTime {
    /// Length of the `YYYY-MM-DDTHH:MM:SS` text form
    pub const LENGTH: usize = BerDate::LENGTH + 1 + BerTime::LENGTH;

    /// Constructs a date time from its fields
    ///
    /// # Arguments
    ///
    /// * `year` - The year from 1 to 9999
    /// * `month` - The month from 1 to 12
    /// * `day` - The day of the month
    /// * `hour` - The hour from 0 to 23
    /// * `minute` - The minute from 0 to 59
    /// * `second` - The second from 0 to 59
    pub fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> BerResult<Self> {
        Ok(Self {
            date: BerDate::new(year, month, day)?,
            time: BerTime::new(hour, minute, second)?,
        })
    }

    pub fn from_parts(date: BerDate, time: BerTime) -> Self {
        Self { date, time }
    }

    pub fn date(&self) -> BerDate {
        self.date
    }

    pub fn time(&self) -> BerTime {
        self.time
    }
}

impl fmt::Display for BerDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}T{}", self.date, self.time)
    }
}

impl FromStr for BerDateTime {
    type Err = BerError;

    fn from_str(text: &str) -> BerResult<Self> {
        match text.split_once('T') {
            Some((date, time)) => Ok(Self {
                date: date.parse()?,
                time: time.parse()?,
            }),
            None => Err(BerError::Validation(format!(
                "Expected date time in YYYY-MM-DDTHH:MM:SS form, got {:?}",
                text
            ))),
        }
    }
}
