//! BER encoding types (Tag, Length, etc.)

use ber_core::{BerError, BerResult};
use std::fmt;

/// Universal tag numbers assigned by ITU-T X.680
pub mod universal {
    pub const END_OF_CONTENTS: u32 = 0;
    pub const BOOLEAN: u32 = 1;
    pub const INTEGER: u32 = 2;
    pub const BIT_STRING: u32 = 3;
    pub const OCTET_STRING: u32 = 4;
    pub const NULL: u32 = 5;
    pub const OBJECT_IDENTIFIER: u32 = 6;
    pub const REAL: u32 = 9;
    pub const ENUMERATED: u32 = 10;
    pub const UTF8_STRING: u32 = 12;
    pub const SEQUENCE: u32 = 16;
    pub const SET: u32 = 17;
    pub const VISIBLE_STRING: u32 = 26;
    pub const DATE: u32 = 31;
    pub const TIME_OF_DAY: u32 = 32;
    pub const DATE_TIME: u32 = 33;
}

/// Class bits of an identifier octet
///
/// Sequence members and Choice alternatives are tagged context-specific
/// unless their [`MemberInfo`](crate::category::MemberInfo) names another
/// class; everything written by the universal visitor is `Universal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BerTagClass {
    Universal = 0,
    Application = 1,
    ContextSpecific = 2,
    Private = 3,
}

impl BerTagClass {
    /// Class encoded in the top two bits of `bits`
    pub fn from_bits(bits: u8) -> Self {
        match (bits >> 6) & 0x03 {
            0 => BerTagClass::Universal,
            1 => BerTagClass::Application,
            2 => BerTagClass::ContextSpecific,
            _ => BerTagClass::Private,
        }
    }

    /// Class bits shifted into identifier octet position
    pub fn to_bits(self) -> u8 {
        (self as u8) << 6
    }
}

impl fmt::Display for BerTagClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BerTagClass::Universal => "UNIVERSAL",
            BerTagClass::Application => "APPLICATION",
            BerTagClass::ContextSpecific => "CONTEXT_SPECIFIC",
            BerTagClass::Private => "PRIVATE",
        };
        f.write_str(name)
    }
}

/// Identifier octets of a TLV
///
/// Numbers up to 30 fit the low five bits of a single octet. Larger numbers
/// set those bits to `11111` and follow with base-128 groups, most
/// significant first, each but the last carrying the `0x80` continuation bit:
///
/// ```text
/// [CONTEXT_SPECIFIC 200 constructed]  =>  BF 81 48
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BerTag {
    class: BerTagClass,
    constructed: bool,
    number: u32,
}

impl BerTag {
    pub fn new(class: BerTagClass, constructed: bool, number: u32) -> Self {
        Self {
            class,
            constructed,
            number,
        }
    }

    /// Tag of a universal type such as INTEGER or SEQUENCE
    pub fn universal(constructed: bool, number: u32) -> Self {
        Self::new(BerTagClass::Universal, constructed, number)
    }

    pub fn application(constructed: bool, number: u32) -> Self {
        Self::new(BerTagClass::Application, constructed, number)
    }

    /// Default tag of a Sequence member or Choice alternative
    pub fn context_specific(constructed: bool, number: u32) -> Self {
        Self::new(BerTagClass::ContextSpecific, constructed, number)
    }

    pub fn private(constructed: bool, number: u32) -> Self {
        Self::new(BerTagClass::Private, constructed, number)
    }

    pub fn class(&self) -> BerTagClass {
        self.class
    }

    /// Whether the contents are a series of nested TLVs
    pub fn is_constructed(&self) -> bool {
        self.constructed
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    /// Whether class and number match, ignoring the constructed bit
    pub fn matches(&self, class: BerTagClass, number: u32) -> bool {
        self.class == class && self.number == number
    }

    /// Whether this tag is the first octet of an end-of-contents marker
    pub fn is_end_of_contents(&self) -> bool {
        self.class == BerTagClass::Universal
            && !self.constructed
            && self.number == universal::END_OF_CONTENTS
    }

    /// Identifier octets for this tag
    pub fn encode(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(self.encoded_len());

        let leading = self.class.to_bits() | if self.constructed { 0x20 } else { 0 };

        if self.number <= 30 {
            result.push(leading | self.number as u8);
            return result;
        }

        result.push(leading | 0x1F);
        let groups = self.encoded_len() - 1;
        for shift in (0..groups).rev() {
            let group = ((self.number >> (shift * 7)) & 0x7F) as u8;
            result.push(if shift == 0 { group } else { group | 0x80 });
        }
        result
    }

    /// Number of identifier octets this tag encodes to
    pub fn encoded_len(&self) -> usize {
        if self.number <= 30 {
            1
        } else {
            let bits = 32 - self.number.leading_zeros() as usize;
            1 + bits.div_ceil(7)
        }
    }

    /// Parse the identifier octets at the start of `data`
    ///
    /// Returns the tag and the number of octets it occupied. Fails with
    /// `LengthViolation` on truncated input and `InvalidData` when the
    /// number overflows 32 bits.
    pub fn decode(data: &[u8]) -> BerResult<(Self, usize)> {
        let Some(&first_byte) = data.first() else {
            return Err(BerError::LengthViolation(
                "Empty buffer for tag decoding".to_string(),
            ));
        };

        let class = BerTagClass::from_bits(first_byte);
        let constructed = first_byte & 0x20 != 0;
        if first_byte & 0x1F != 0x1F {
            return Ok((Self::new(class, constructed, u32::from(first_byte & 0x1F)), 1));
        }

        let mut tag_number = 0u32;
        let mut pos = 1;
        loop {
            let Some(&byte) = data.get(pos) else {
                return Err(BerError::LengthViolation(
                    "Incomplete extended tag encoding".to_string(),
                ));
            };
            if tag_number > (u32::MAX >> 7) {
                return Err(BerError::InvalidData(
                    "Tag number too large or invalid encoding".to_string(),
                ));
            }
            tag_number = (tag_number << 7) | u32::from(byte & 0x7F);
            pos += 1;
            if byte & 0x80 == 0 {
                break;
            }
        }

        Ok((Self::new(class, constructed, tag_number), pos))
    }
}

impl fmt::Display for BerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} {}{}]",
            self.class,
            self.number,
            if self.constructed { " constructed" } else { "" }
        )
    }
}

/// Length octets of a TLV
///
/// Lengths below 128 take one octet. Longer ones take a `0x80 | n` octet
/// followed by `n` big-endian length octets. The indefinite form `0x80`
/// is accepted on input only; its contents run until a `00 00`
/// end-of-contents marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BerLength {
    Short(u8),
    Long(usize),
    Indefinite,
}

impl BerLength {
    /// Largest number of subsequent length octets accepted on input
    pub const MAX_LENGTH_OCTETS: usize = 4;

    /// Definite length in the shortest form
    pub fn new(length: usize) -> Self {
        if length < 128 {
            BerLength::Short(length as u8)
        } else {
            BerLength::Long(length)
        }
    }

    /// Get the length value, `None` for the indefinite form
    pub fn value(&self) -> Option<usize> {
        match self {
            BerLength::Short(l) => Some(*l as usize),
            BerLength::Long(l) => Some(*l),
            BerLength::Indefinite => None,
        }
    }

    pub fn is_indefinite(&self) -> bool {
        matches!(self, BerLength::Indefinite)
    }

    /// Length octets for this length
    pub fn encode(&self) -> Vec<u8> {
        match self {
            BerLength::Short(length) => vec![*length],
            BerLength::Indefinite => vec![0x80],
            BerLength::Long(length) => {
                let octets = length.to_be_bytes();
                let skip = octets.iter().take_while(|&&b| b == 0).count().min(octets.len() - 1);
                let mut result = Vec::with_capacity(1 + octets.len() - skip);
                result.push(0x80 | (octets.len() - skip) as u8);
                result.extend_from_slice(&octets[skip..]);
                result
            }
        }
    }

    /// Parse the length octets at the start of `data`
    ///
    /// Returns the length and the number of octets it occupied. The reserved
    /// octet `0xFF` and values needing more than `MAX_LENGTH_OCTETS`
    /// significant octets are rejected.
    pub fn decode(data: &[u8]) -> BerResult<(Self, usize)> {
        let Some(&first_byte) = data.first() else {
            return Err(BerError::LengthViolation(
                "Empty buffer for length decoding".to_string(),
            ));
        };

        if first_byte < 0x80 {
            return Ok((BerLength::Short(first_byte), 1));
        }

        let num_bytes = (first_byte & 0x7F) as usize;
        if num_bytes == 0 {
            return Ok((BerLength::Indefinite, 1));
        }
        if num_bytes == 0x7F {
            return Err(BerError::InvalidData(
                "Reserved length octet 0xFF".to_string(),
            ));
        }

        // Leading zero octets do not count against the limit
        let Some(octets) = data.get(1..1 + num_bytes) else {
            return Err(BerError::LengthViolation(format!(
                "Buffer too short for long form length: need {} bytes, got {}",
                1 + num_bytes,
                data.len()
            )));
        };
        let significant = octets.iter().skip_while(|&&b| b == 0).count();
        if significant > Self::MAX_LENGTH_OCTETS {
            return Err(BerError::LengthViolation(format!(
                "Length encoding too large: {} bytes (max {})",
                significant,
                Self::MAX_LENGTH_OCTETS
            )));
        }

        let length = octets
            .iter()
            .fold(0usize, |acc, &b| (acc << 8) | (b as usize));

        Ok((BerLength::Long(length), 1 + num_bytes))
    }
}
