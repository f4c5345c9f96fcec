//! Generic BER codec for schema-generated value graphs
//!
//! This library encodes and decodes values by their type category, using
//! the Basic Encoding Rules of ITU-T X.690.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `ber-core`: error taxonomy and the date/time scalar types
//! - `ber-codec`: tag/length codec, category dispatcher, encoder and
//!   decoder engines
//!
//! # Usage
//!
//! ```rust
//! use ber::{DecoderOptions, EncoderOptions, decode_from_slice, encode_to_vec};
//!
//! let values = vec![Some(7i32), None];
//! let bytes = encode_to_vec(&values, &EncoderOptions::default()).unwrap();
//! assert_eq!(bytes, vec![0x30, 0x05, 0x02, 0x01, 0x07, 0x05, 0x00]);
//!
//! let mut decoded: Vec<Option<i32>> = Vec::new();
//! let consumed = decode_from_slice(&bytes, &mut decoded, &DecoderOptions::default()).unwrap();
//! assert_eq!(consumed, bytes.len());
//! assert_eq!(decoded, values);
//! ```

// Re-export core types
pub use ber_core::{BerDate, BerDateTime, BerError, BerResult, BerTime, Month};

// Re-export codec API
pub use ber_codec::{
    Array, AttributeInfo, BerDecoder, BerEncoder, BerValue, Category, Choice, CustomizedType,
    DecoderOptions, Diagnostics, DynamicType, EncoderOptions, Enumeration, FormattingMode,
    LogEntry, MemberInfo, Nullable, Scalar, ScalarKind, ScalarMut, ScalarRef, SelectionInfo,
    Sequence, Severity, ValueMut, ValueRef,
};

/// Wire-level building blocks
pub mod wire {
    pub use ber_codec::ber::*;
}

/// Encode `value` into a new buffer
///
/// Any logged error fails the call; use [`BerEncoder`] directly to keep the
/// partial output and inspect the diagnostics.
pub fn encode_to_vec(value: &dyn BerValue, options: &EncoderOptions) -> BerResult<Vec<u8>> {
    let mut encoder = BerEncoder::with_options(options.clone());
    let mut buffer = bytes::BytesMut::new();
    encoder.encode(&mut buffer, value)?;
    Ok(buffer.to_vec())
}

/// Decode one element of `data` into `value`
///
/// # Returns
/// The number of bytes consumed.
pub fn decode_from_slice(
    data: &[u8],
    value: &mut dyn BerValue,
    options: &DecoderOptions,
) -> BerResult<usize> {
    let mut decoder = BerDecoder::with_options(options.clone());
    let mut source = data;
    decoder.decode(&mut source, value)?;
    Ok(data.len() - source.len())
}
