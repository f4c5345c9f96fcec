//! Category-driven BER (ITU-T X.690) codec
//!
//! This crate serializes strongly-typed value graphs into BER TLV streams
//! and parses them back. It is generic over the *type category* of a value
//! rather than over concrete types: every value implements
//! [`category::BerValue`] and reports whether it is a Sequence, Choice,
//! Array, Enumeration, CustomizedType, NullableValue, Simple or DynamicType
//! value, so one traversal serves any schema.
//!
//! # Modules
//!
//! - `ber`: tag/length octets, TLV writer and bounded reader
//! - `category`: the category dispatcher and its capability traits
//! - `scalar`: Simple values and the built-in implementations
//! - `codec`: the encoder and decoder engines
//! - `diagnostics`: severity and the per-call log
//! - `depth`: nesting depth guard
//! - `options`: encoder and decoder options
//!
//! # Implementation Status
//!
//! ## ✅ 已完成
//! - 标签/长度编码（多字节标签、长格式长度、不定长输入）
//! - 编码器/解码器引擎（显式标签、未知元素跳过、深度限制）
//! - REAL 完整二进制编码，DATE / TIME-OF-DAY / DATE-TIME
//!
//! ## 📋 不支持
//! - DER/CER 规范化
//! - 以复合类型为基类型的 CustomizedType

pub mod ber;
pub mod category;
pub mod codec;
pub mod depth;
pub mod diagnostics;
pub mod options;
pub mod scalar;

pub use ber::{BerElement, BerLength, BerReader, BerTag, BerTagClass, BerWriter};
pub use category::{
    Array, AttributeInfo, BerValue, Category, Choice, CustomizedType, DynamicType, Enumeration,
    FormattingMode, MemberInfo, Nullable, SelectionInfo, Sequence, ValueMut, ValueRef,
};
pub use codec::{BerDecoder, BerEncoder};
pub use diagnostics::{Diagnostics, LogEntry, Severity};
pub use options::{DecoderOptions, EncoderOptions};
pub use scalar::{Scalar, ScalarKind, ScalarMut, ScalarRef};
