//! BER writer for primitive and constructed TLVs
//!
//! This module provides the low-level TLV output used by the encoder engine.
//! Constructed values are produced by encoding their contents into a nested
//! writer first, so the definite length is known before the wrapper header
//! is written.
//!
//! # Usage Example
//!
//! ```rust
//! use ber_codec::ber::BerWriter;
//!
//! let mut elements = BerWriter::new();
//! elements.encode_integer(12345).unwrap();
//! let mut writer = BerWriter::new();
//! writer.encode_sequence(elements.as_bytes()).unwrap();
//! assert_eq!(writer.as_bytes(), &[0x30, 0x04, 0x02, 0x02, 0x30, 0x39]);
//! ```

use crate::ber::types::{BerLength, BerTag, universal};
use ber_core::{BerError, BerResult};

/// BER writer for ASN.1 structures
///
/// This writer follows the BER encoding rules as specified in ITU-T X.690.
/// Each encoded value consists of a TLV (Tag-Length-Value) triplet, always
/// with a definite length.
#[derive(Debug, Default, Clone)]
pub struct BerWriter {
    buffer: Vec<u8>,
}

impl BerWriter {
    /// Create a new BER writer
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Create a new BER writer with initial capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Encode a TLV (Tag-Length-Value) triplet
    ///
    /// # Arguments
    /// * `tag` - BER tag
    /// * `value` - Value bytes (already encoded)
    pub fn encode_tlv(&mut self, tag: &BerTag, value: &[u8]) -> BerResult<()> {
        self.buffer.extend_from_slice(&tag.encode());
        self.buffer
            .extend_from_slice(&BerLength::new(value.len()).encode());
        self.buffer.extend_from_slice(value);
        Ok(())
    }

    /// Encode a BOOLEAN (0xFF for true, as DER and CER also require)
    pub fn encode_boolean(&mut self, value: bool) -> BerResult<()> {
        let tag = BerTag::universal(false, universal::BOOLEAN);
        self.encode_tlv(&tag, &[if value { 0xFF } else { 0x00 }])
    }

    /// Encode an INTEGER
    ///
    /// # Encoding Format
    /// - Tag: Universal, Primitive, tag 2
    /// - Value: Two's complement representation (big-endian, minimal encoding)
    ///
    /// `i128` covers every signed and unsigned width up to 64 bits.
    pub fn encode_integer(&mut self, value: i128) -> BerResult<()> {
        let tag = BerTag::universal(false, universal::INTEGER);
        self.encode_tlv(&tag, &integer_contents(value))
    }

    /// Encode an ENUMERATED value
    pub fn encode_enumerated(&mut self, value: i64) -> BerResult<()> {
        let tag = BerTag::universal(false, universal::ENUMERATED);
        self.encode_tlv(&tag, &integer_contents(value as i128))
    }

    /// Encode a NULL (`05 00`)
    pub fn encode_null(&mut self) -> BerResult<()> {
        let tag = BerTag::universal(false, universal::NULL);
        self.encode_tlv(&tag, &[])
    }

    /// Encode a REAL
    ///
    /// Finite values use the X.690 binary form with base 2 and an odd
    /// mantissa; zero, infinities and NaN use their dedicated encodings.
    pub fn encode_real(&mut self, value: f64) -> BerResult<()> {
        let tag = BerTag::universal(false, universal::REAL);
        self.encode_tlv(&tag, &real_contents(value))
    }

    /// Encode an OCTET STRING
    pub fn encode_octet_string(&mut self, value: &[u8]) -> BerResult<()> {
        let tag = BerTag::universal(false, universal::OCTET_STRING);
        self.encode_tlv(&tag, value)
    }

    /// Encode a UTF8String
    pub fn encode_utf8_string(&mut self, value: &str) -> BerResult<()> {
        let tag = BerTag::universal(false, universal::UTF8_STRING);
        self.encode_tlv(&tag, value.as_bytes())
    }

    /// Encode a VisibleString
    ///
    /// # Error Handling
    /// Returns a validation error if the text contains characters outside
    /// the printable ASCII range 0x20-0x7E.
    pub fn encode_visible_string(&mut self, value: &str) -> BerResult<()> {
        check_visible(value.as_bytes())?;
        let tag = BerTag::universal(false, universal::VISIBLE_STRING);
        self.encode_tlv(&tag, value.as_bytes())
    }

    /// Encode a SEQUENCE (or SEQUENCE OF) around already encoded elements
    pub fn encode_sequence(&mut self, elements: &[u8]) -> BerResult<()> {
        let tag = BerTag::universal(true, universal::SEQUENCE);
        self.encode_tlv(&tag, elements)
    }

    /// Encode a context-specific tag
    ///
    /// # Arguments
    /// * `tag_number` - Context-specific tag number
    /// * `value` - Encoded value bytes
    /// * `constructed` - Whether this is a constructed type
    pub fn encode_context_specific(
        &mut self,
        tag_number: u32,
        value: &[u8],
        constructed: bool,
    ) -> BerResult<()> {
        let tag = BerTag::context_specific(constructed, tag_number);
        self.encode_tlv(&tag, value)
    }

    /// Number of bytes written so far
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Get the encoded bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Get a reference to the encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Clear the writer buffer
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

/// Minimal two's complement, big-endian contents of an INTEGER
pub fn integer_contents(value: i128) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    // Drop a leading octet while the next one still carries the same sign
    while start < bytes.len() - 1 {
        let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
            || (bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    bytes[start..].to_vec()
}

/// Contents octets of a REAL (X.690 8.5)
pub fn real_contents(value: f64) -> Vec<u8> {
    if value.is_nan() {
        return vec![0x42];
    }
    if value.is_infinite() {
        return vec![if value > 0.0 { 0x40 } else { 0x41 }];
    }
    if value == 0.0 {
        return if value.is_sign_negative() {
            vec![0x43]
        } else {
            Vec::new()
        };
    }

    let bits = value.to_bits();
    let negative = bits >> 63 != 0;
    let biased_exponent = ((bits >> 52) & 0x7FF) as i64;
    let fraction = bits & ((1u64 << 52) - 1);
    let (mut mantissa, mut exponent) = if biased_exponent == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), biased_exponent - 1075)
    };
    let shift = mantissa.trailing_zeros();
    mantissa >>= shift;
    exponent += shift as i64;

    let exponent_octets = integer_contents(exponent as i128);
    let mut first = 0x80;
    if negative {
        first |= 0x40;
    }
    // Base 2, scale factor 0; the exponent always fits in one or two octets
    first |= (exponent_octets.len() - 1) as u8;

    let mantissa_bytes = mantissa.to_be_bytes();
    let leading = mantissa_bytes.iter().take_while(|&&b| b == 0).count();

    let mut contents = Vec::with_capacity(1 + exponent_octets.len() + 8 - leading);
    contents.push(first);
    contents.extend_from_slice(&exponent_octets);
    contents.extend_from_slice(&mantissa_bytes[leading..]);
    contents
}

/// Check that bytes form a valid VisibleString
pub fn check_visible(bytes: &[u8]) -> BerResult<()> {
    match bytes.iter().position(|b| !(0x20..=0x7E).contains(b)) {
        Some(pos) => Err(BerError::Validation(format!(
            "Character 0x{:02X} at offset {} is not allowed in a VisibleString",
            bytes[pos], pos
        ))),
        None => Ok(()),
    }
}
