//! Time-of-day scalar (ASN.1 TIME-OF-DAY)

use crate::datatypes::date::parse_digits;
use crate::error::{BerError, BerResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Class representing a time of day with second precision
///
/// Encoded on the wire as the X.680 TIME-OF-DAY character form `HH:MM:SS`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BerTime {
    hour: u8,
    minute: u8,
    second: u8,
}

impl BerTime {
    /// Length of the `HH:MM:SS` text form
    pub const LENGTH: usize = 8;

    /// Constructs a time of day
    ///
    /// # Arguments
    ///
    /// * `hour` - The hour from 0 to 23
    /// * `minute` - The minute from 0 to 59
    /// * `second` - The second from 0 to 59
    pub fn new(hour: u8, minute: u8, second: u8) -> BerResult<Self> {
        Self::verify(hour, "Hour", 23)?;
        Self::verify(minute, "Minute", 59)?;
        Self::verify(second, "Second", 59)?;
        Ok(Self {
            hour,
            minute,
            second,
        })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn second(&self) -> u8 {
        self.second
    }

    fn verify(value: u8, name: &str, upper_bound: u8) -> BerResult<()> {
        if value > upper_bound {
            Err(BerError::Validation(format!(
                "{} is out of range [0, {}], got {}",
                name, upper_bound, value
            )))
        } else {
            Ok(())
        }
    }
}

impl fmt::Display for BerTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}

impl FromStr for BerTime {
    type Err = BerError;

    fn from_str(text: &str) -> BerResult<Self> {
        let bytes = text.as_bytes();
        if bytes.len() != Self::LENGTH || bytes[2] != b':' || bytes[5] != b':' {
            return Err(BerError::Validation(format!(
                "Expected time in HH:MM:SS form, got {:?}",
                text
            )));
        }
        let hour = parse_digits(&text[0..2], "Hour")?;
        let minute = parse_digits(&text[3..5], "Minute")?;
        let second = parse_digits(&text[6..8], "Second")?;
        Self::new(hour as u8, minute as u8, second as u8)
    }
}
