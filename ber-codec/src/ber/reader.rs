//! BER reader for ASN.1 structures
//!
//! This module splits a byte buffer into TLV elements and decodes the
//! contents of primitive values.
//!
//! Every element handed out by [`BerReader::read_element`] carries a
//! contents slice that is bounded by the element's own length, so decoding
//! one element can never read into its siblings. Indefinite-length elements
//! are scanned up to their end-of-contents marker first and then presented
//! the same way.
//!
//! # Usage Example
//!
//! ```rust
//! use ber_codec::ber::{BerReader, NestingLimit, reader};
//!
//! let data = [0x02, 0x02, 0x30, 0x39];
//! let mut r = BerReader::new(&data);
//! let element = r.read_element(NestingLimit::new(32)).unwrap();
//! assert_eq!(reader::decode_integer(element.contents()).unwrap(), 12345);
//! ```

use crate::ber::types::{BerLength, BerTag, BerTagClass, universal};
use crate::ber::writer::check_visible;
use ber_core::{BerError, BerResult};
use std::borrow::Cow;

/// Nesting budget for scanning indefinite-length elements
///
/// `depth` and `max` count constructed levels. `configured` is the limit
/// reported by `DepthExceeded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NestingLimit {
    /// Current nesting depth
    pub depth: usize,
    /// Maximum permitted depth
    pub max: usize,
    /// Caller-facing limit
    pub configured: usize,
}

impl NestingLimit {
    pub const fn new(max: usize) -> Self {
        Self {
            depth: 0,
            max,
            configured: max,
        }
    }

    /// Budget for the contents of an element at this depth
    pub fn nested(self) -> BerResult<Self> {
        if self.depth >= self.max {
            return Err(BerError::DepthExceeded(self.configured));
        }
        Ok(Self {
            depth: self.depth + 1,
            ..self
        })
    }
}

/// One TLV element with its contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BerElement<'a> {
    tag: BerTag,
    contents: &'a [u8],
    indefinite: bool,
}

impl<'a> BerElement<'a> {
    pub fn tag(&self) -> BerTag {
        self.tag
    }

    /// Contents octets, excluding any end-of-contents marker
    pub fn contents(&self) -> &'a [u8] {
        self.contents
    }

    /// Whether the element used the indefinite length form
    pub fn is_indefinite(&self) -> bool {
        self.indefinite
    }

    /// Whether this is a universal NULL
    pub fn is_null(&self) -> bool {
        self.tag == BerTag::universal(false, universal::NULL)
    }
}

/// BER reader over a byte buffer
///
/// # Position Tracking
///
/// The reader maintains a position pointer that advances as elements are
/// read. This allows sequential decoding of multiple values from the same
/// buffer.
///
/// # Error Handling
///
/// Truncated input and malformed length octets are reported as
/// `LengthViolation`, malformed identifier octets as `InvalidData`.
#[derive(Debug, Clone)]
pub struct BerReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> BerReader<'a> {
    /// Create a new BER reader
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    /// Get current position in buffer
    pub fn position(&self) -> usize {
        self.position
    }

    /// Get remaining bytes
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Check if there is more data to decode
    pub fn has_remaining(&self) -> bool {
        self.position < self.buffer.len()
    }

    /// Whether the next two octets are an end-of-contents marker
    pub fn at_end_of_contents(&self) -> bool {
        self.buffer.get(self.position..self.position + 2) == Some(&[0x00, 0x00][..])
    }

    /// Peek at the next tag without consuming it
    pub fn peek_tag(&self) -> BerResult<Option<BerTag>> {
        if !self.has_remaining() {
            return Ok(None);
        }
        BerTag::decode(&self.buffer[self.position..]).map(|(tag, _)| Some(tag))
    }

    /// Read multiple bytes from the buffer
    ///
    /// # Error Handling
    /// Returns error if buffer doesn't have enough bytes.
    fn read_bytes(&mut self, count: usize) -> BerResult<&'a [u8]> {
        if count > self.remaining() {
            return Err(BerError::LengthViolation(format!(
                "Declared length {} exceeds remaining {} bytes",
                count,
                self.remaining()
            )));
        }
        let start = self.position;
        self.position += count;
        Ok(&self.buffer[start..start + count])
    }

    /// Read the next element
    ///
    /// # Decoding Process
    /// 1. Decode tag
    /// 2. Decode length
    /// 3. Slice the contents (definite form) or scan nested elements up to
    ///    the end-of-contents marker (indefinite form)
    ///
    /// The reader only advances when the whole element is available.
    pub fn read_element(&mut self, limit: NestingLimit) -> BerResult<BerElement<'a>> {
        let start = self.position;
        let result = self.read_element_inner(limit);
        if result.is_err() {
            self.position = start;
        }
        result
    }

    fn read_element_inner(&mut self, limit: NestingLimit) -> BerResult<BerElement<'a>> {
        let (tag, tag_bytes) = BerTag::decode(&self.buffer[self.position..])?;
        self.position += tag_bytes;

        let (length, length_bytes) = BerLength::decode(&self.buffer[self.position..])?;
        self.position += length_bytes;

        if let Some(value_len) = length.value() {
            let contents = self.read_bytes(value_len)?;
            return Ok(BerElement {
                tag,
                contents,
                indefinite: false,
            });
        }

        if !tag.is_constructed() {
            return Err(BerError::LengthViolation(format!(
                "Indefinite length on primitive element {}",
                tag
            )));
        }

        let nested = limit.nested()?;
        let mut inner = BerReader::new(&self.buffer[self.position..]);
        loop {
            if inner.at_end_of_contents() {
                break;
            }
            if !inner.has_remaining() {
                return Err(BerError::LengthViolation(format!(
                    "Missing end-of-contents marker for {}",
                    tag
                )));
            }
            inner.read_element(nested)?;
        }

        let contents = &self.buffer[self.position..self.position + inner.position];
        self.position += inner.position + 2;
        Ok(BerElement {
            tag,
            contents,
            indefinite: true,
        })
    }

    /// Skip one element, including nested indefinite-length contents
    ///
    /// # Returns
    /// Returns the number of bytes skipped.
    pub fn skip_element(&mut self, limit: NestingLimit) -> BerResult<usize> {
        let start = self.position;
        self.read_element(limit)?;
        Ok(self.position - start)
    }
}

/// Decode BOOLEAN contents
pub fn decode_boolean(contents: &[u8]) -> BerResult<bool> {
    match contents {
        [byte] => Ok(*byte != 0x00),
        _ => Err(BerError::LengthViolation(format!(
            "BOOLEAN must have 1 content byte, got {}",
            contents.len()
        ))),
    }
}

/// Decode NULL contents
pub fn decode_null(contents: &[u8]) -> BerResult<()> {
    if contents.is_empty() {
        Ok(())
    } else {
        Err(BerError::LengthViolation(format!(
            "NULL must have no content bytes, got {}",
            contents.len()
        )))
    }
}

/// Decode INTEGER (or ENUMERATED) contents
///
/// Converts big-endian two's complement bytes to i128. Values wider than
/// 128 bits are well-formed BER but fit no supported type, so they are a
/// validation failure rather than a length violation.
pub fn decode_integer(contents: &[u8]) -> BerResult<i128> {
    if contents.is_empty() {
        return Err(BerError::LengthViolation(
            "Empty integer encoding".to_string(),
        ));
    }
    if contents.len() > 16 {
        return Err(BerError::Validation(format!(
            "Integer too large: {} bytes (max 16)",
            contents.len()
        )));
    }

    let negative = contents[0] & 0x80 != 0;
    let mut value: i128 = if negative { -1 } else { 0 };
    for &byte in contents {
        value = (value << 8) | byte as i128;
    }
    Ok(value)
}

/// Decode REAL contents (X.690 8.5)
///
/// Supports the binary form with base 2, 8 and 16 and any scale factor,
/// the decimal NR1/NR2/NR3 forms, and the special values.
pub fn decode_real(contents: &[u8]) -> BerResult<f64> {
    let Some(&first) = contents.first() else {
        return Ok(0.0);
    };

    if first & 0x80 != 0 {
        return decode_binary_real(first, &contents[1..]);
    }

    if first & 0x40 != 0 {
        if contents.len() != 1 {
            return Err(BerError::LengthViolation(format!(
                "Special REAL value must have 1 content byte, got {}",
                contents.len()
            )));
        }
        return match first {
            0x40 => Ok(f64::INFINITY),
            0x41 => Ok(f64::NEG_INFINITY),
            0x42 => Ok(f64::NAN),
            0x43 => Ok(-0.0),
            other => Err(BerError::Validation(format!(
                "Unknown special REAL value 0x{:02X}",
                other
            ))),
        };
    }

    let form = first & 0x3F;
    if !(1..=3).contains(&form) {
        return Err(BerError::Validation(format!(
            "Unknown decimal REAL form {}",
            form
        )));
    }
    let text = std::str::from_utf8(&contents[1..])
        .map_err(|e| BerError::Validation(format!("Decimal REAL is not ASCII: {}", e)))?;
    text.trim()
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|e| BerError::Validation(format!("Invalid decimal REAL {:?}: {}", text, e)))
}

fn decode_binary_real(first: u8, rest: &[u8]) -> BerResult<f64> {
    let negative = first & 0x40 != 0;
    let bits_per_digit: i64 = match (first >> 4) & 0x03 {
        0 => 1,
        1 => 3,
        2 => 4,
        _ => {
            return Err(BerError::Validation(
                "Reserved REAL base encoding".to_string(),
            ));
        }
    };
    let scale = ((first >> 2) & 0x03) as i64;

    let (exponent_len, rest) = match first & 0x03 {
        0 => (1, rest),
        1 => (2, rest),
        2 => (3, rest),
        _ => match rest.split_first() {
            Some((&len, tail)) => (len as usize, tail),
            None => {
                return Err(BerError::LengthViolation(
                    "Missing REAL exponent length".to_string(),
                ));
            }
        },
    };
    if exponent_len == 0 || rest.len() <= exponent_len {
        return Err(BerError::LengthViolation(format!(
            "REAL needs {} exponent bytes and a mantissa, got {} bytes",
            exponent_len,
            rest.len()
        )));
    }
    if exponent_len > 8 {
        return Err(BerError::Validation(format!(
            "REAL exponent too large: {} bytes",
            exponent_len
        )));
    }

    let (exponent_bytes, mantissa_bytes) = rest.split_at(exponent_len);
    let exponent = decode_integer(exponent_bytes)? as i64;

    let significant: Vec<u8> = mantissa_bytes
        .iter()
        .copied()
        .skip_while(|&b| b == 0)
        .collect();
    let (mantissa, dropped_bytes) = if significant.len() <= 8 {
        (
            significant.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64),
            0,
        )
    } else {
        (
            significant[..8].iter().fold(0u64, |acc, &b| (acc << 8) | b as u64),
            (significant.len() - 8) as i64,
        )
    };

    let binary_exponent = exponent
        .saturating_mul(bits_per_digit)
        .saturating_add(scale)
        .saturating_add(dropped_bytes * 8);
    let magnitude = scale_by_power_of_two(mantissa as f64, binary_exponent);
    Ok(if negative { -magnitude } else { magnitude })
}

/// `value * 2^exponent` without intermediate overflow or underflow
fn scale_by_power_of_two(mut value: f64, mut exponent: i64) -> f64 {
    if value == 0.0 {
        return value;
    }
    let step = 1000;
    while exponent > step {
        value *= 2f64.powi(step as i32);
        exponent -= step;
        if value.is_infinite() {
            return value;
        }
    }
    while exponent < -step {
        value *= 2f64.powi(-step as i32);
        exponent += step;
        if value == 0.0 {
            return value;
        }
    }
    value * 2f64.powi(exponent as i32)
}

/// Decode UTF8String contents
pub fn decode_utf8(contents: &[u8]) -> BerResult<String> {
    std::str::from_utf8(contents)
        .map(str::to_owned)
        .map_err(|e| BerError::Validation(format!("Invalid UTF-8 string: {}", e)))
}

/// Decode VisibleString contents
pub fn decode_visible(contents: &[u8]) -> BerResult<String> {
    check_visible(contents)?;
    decode_utf8(contents)
}

/// Contents of a string-like element, reassembling the constructed form
///
/// A constructed encoding (X.690 8.7.3) is a series of nested segments of
/// the same universal type; they are concatenated in order.
pub fn string_contents<'a>(
    element: &BerElement<'a>,
    limit: NestingLimit,
) -> BerResult<Cow<'a, [u8]>> {
    if !element.tag.is_constructed() {
        return Ok(Cow::Borrowed(element.contents));
    }

    let nested = limit.nested()?;
    let mut reader = BerReader::new(element.contents);
    let mut assembled = Vec::with_capacity(element.contents.len());
    while reader.has_remaining() {
        let segment = reader.read_element(nested)?;
        if !segment
            .tag
            .matches(BerTagClass::Universal, element.tag.number())
        {
            return Err(BerError::SchemaMismatch(format!(
                "Segment {} inside constructed {}",
                segment.tag, element.tag
            )));
        }
        assembled.extend_from_slice(&string_contents(&segment, nested)?);
    }
    Ok(Cow::Owned(assembled))
}
