//! BER (Basic Encoding Rules) TLV layer
//!
//! This module provides the wire-level building blocks for the codec
//! engines: tag and length octets, a writer for primitive values, and a
//! bounded reader that splits a buffer into elements.
//!
//! # ASN.1 BER Encoding Overview
//!
//! Each ASN.1 value is encoded as a TLV (Tag-Length-Value) triplet:
//!
//! ```text
//! [Tag] [Length] [Value]
//! ```
//!
//! ## Tag Encoding
//!
//! ```text
//! Bits: 8 7 6 5 4 3 2 1
//!       C C P T T T T T
//! ```
//! Where:
//! - CC = Class (00=Universal, 01=Application, 10=Context, 11=Private)
//! - P = Primitive (0) or Constructed (1)
//! - TTTTT = Tag number (0-30), or 11111 followed by base-128 octets
//!
//! ## Length Encoding
//!
//! - **Short form** (1 byte): lengths 0-127
//! - **Long form**: `0x80 | n` followed by `n` big-endian length bytes
//! - **Indefinite form** (`0x80`): constructed contents terminated by
//!   `00 00`. Accepted on input only; the writer always emits definite
//!   lengths.

pub mod reader;
pub mod types;
pub mod writer;

pub use reader::{BerElement, BerReader, NestingLimit};
pub use types::{BerLength, BerTag, BerTagClass, universal};
pub use writer::BerWriter;
