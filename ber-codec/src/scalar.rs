//! Simple category: scalar kinds and the built-in value implementations
//!
//! # Universal Tag Mapping
//!
//! | Kind | Universal tag |
//! |---|---|
//! | `Bool` | BOOLEAN (1) |
//! | `I8`..`I64`, `U8`..`U64` | INTEGER (2) |
//! | `F32`, `F64` | REAL (9) |
//! | `String` | UTF8String (12), or VisibleString (26) with `VISIBLE_STRING` |
//! | `Bytes` | OCTET STRING (4) |
//! | `Date` | DATE (31) |
//! | `Time` | TIME-OF-DAY (32) |
//! | `DateTime` | DATE-TIME (33) |
//!
//! `Vec<u8>` is an Array whose elements are bytes; the engines write it as a
//! single OCTET STRING rather than a SEQUENCE OF one-byte INTEGERs.

use crate::ber::types::{BerTag, universal};
use crate::category::{Array, BerValue, FormattingMode, Nullable, ValueMut, ValueRef};
use ber_core::{BerDate, BerDateTime, BerError, BerResult, BerTime};

/// Concrete kind of a Simple value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    String,
    Bytes,
    Date,
    Time,
    DateTime,
}

impl ScalarKind {
    /// Universal tag number for this kind under `mode`
    pub fn universal_number(self, mode: FormattingMode) -> u32 {
        match self {
            Self::Bool => universal::BOOLEAN,
            Self::I8 | Self::I16 | Self::I32 | Self::I64 => universal::INTEGER,
            Self::U8 | Self::U16 | Self::U32 | Self::U64 => universal::INTEGER,
            Self::F32 | Self::F64 => universal::REAL,
            Self::String if mode.contains(FormattingMode::VISIBLE_STRING) => {
                universal::VISIBLE_STRING
            }
            Self::String => universal::UTF8_STRING,
            Self::Bytes => universal::OCTET_STRING,
            Self::Date => universal::DATE,
            Self::Time => universal::TIME_OF_DAY,
            Self::DateTime => universal::DATE_TIME,
        }
    }

    /// Primitive universal tag for this kind under `mode`
    pub fn universal_tag(self, mode: FormattingMode) -> BerTag {
        BerTag::universal(false, self.universal_number(mode))
    }

    pub fn is_integer(self) -> bool {
        self.universal_number(FormattingMode::DEFAULT) == universal::INTEGER
    }
}

/// Owned scalar, used by customized-type conversions and by the decoder
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    Date(BerDate),
    Time(BerTime),
    DateTime(BerDateTime),
}

impl Scalar {
    pub fn kind(&self) -> ScalarKind {
        self.borrowed().kind()
    }

    pub fn borrowed(&self) -> ScalarRef<'_> {
        match self {
            Self::Bool(v) => ScalarRef::Bool(*v),
            Self::I8(v) => ScalarRef::I8(*v),
            Self::I16(v) => ScalarRef::I16(*v),
            Self::I32(v) => ScalarRef::I32(*v),
            Self::I64(v) => ScalarRef::I64(*v),
            Self::U8(v) => ScalarRef::U8(*v),
            Self::U16(v) => ScalarRef::U16(*v),
            Self::U32(v) => ScalarRef::U32(*v),
            Self::U64(v) => ScalarRef::U64(*v),
            Self::F32(v) => ScalarRef::F32(*v),
            Self::F64(v) => ScalarRef::F64(*v),
            Self::String(v) => ScalarRef::Str(v),
            Self::Bytes(v) => ScalarRef::Bytes(v),
            Self::Date(v) => ScalarRef::Date(*v),
            Self::Time(v) => ScalarRef::Time(*v),
            Self::DateTime(v) => ScalarRef::DateTime(*v),
        }
    }
}

/// Borrowed view of a scalar for encoding
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScalarRef<'a> {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Str(&'a str),
    Bytes(&'a [u8]),
    Date(BerDate),
    Time(BerTime),
    DateTime(BerDateTime),
}

impl ScalarRef<'_> {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Self::Bool(_) => ScalarKind::Bool,
            Self::I8(_) => ScalarKind::I8,
            Self::I16(_) => ScalarKind::I16,
            Self::I32(_) => ScalarKind::I32,
            Self::I64(_) => ScalarKind::I64,
            Self::U8(_) => ScalarKind::U8,
            Self::U16(_) => ScalarKind::U16,
            Self::U32(_) => ScalarKind::U32,
            Self::U64(_) => ScalarKind::U64,
            Self::F32(_) => ScalarKind::F32,
            Self::F64(_) => ScalarKind::F64,
            Self::Str(_) => ScalarKind::String,
            Self::Bytes(_) => ScalarKind::Bytes,
            Self::Date(_) => ScalarKind::Date,
            Self::Time(_) => ScalarKind::Time,
            Self::DateTime(_) => ScalarKind::DateTime,
        }
    }
}

/// Mutable slot of a scalar for decoding
#[derive(Debug)]
pub enum ScalarMut<'a> {
    Bool(&'a mut bool),
    I8(&'a mut i8),
    I16(&'a mut i16),
    I32(&'a mut i32),
    I64(&'a mut i64),
    U8(&'a mut u8),
    U16(&'a mut u16),
    U32(&'a mut u32),
    U64(&'a mut u64),
    F32(&'a mut f32),
    F64(&'a mut f64),
    String(&'a mut String),
    Date(&'a mut BerDate),
    Time(&'a mut BerTime),
    DateTime(&'a mut BerDateTime),
}

impl ScalarMut<'_> {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Self::Bool(_) => ScalarKind::Bool,
            Self::I8(_) => ScalarKind::I8,
            Self::I16(_) => ScalarKind::I16,
            Self::I32(_) => ScalarKind::I32,
            Self::I64(_) => ScalarKind::I64,
            Self::U8(_) => ScalarKind::U8,
            Self::U16(_) => ScalarKind::U16,
            Self::U32(_) => ScalarKind::U32,
            Self::U64(_) => ScalarKind::U64,
            Self::F32(_) => ScalarKind::F32,
            Self::F64(_) => ScalarKind::F64,
            Self::String(_) => ScalarKind::String,
            Self::Date(_) => ScalarKind::Date,
            Self::Time(_) => ScalarKind::Time,
            Self::DateTime(_) => ScalarKind::DateTime,
        }
    }

    /// Store a decoded scalar of the same kind
    pub fn assign(self, value: Scalar) -> BerResult<()> {
        match (self, value) {
            (Self::Bool(slot), Scalar::Bool(v)) => *slot = v,
            (Self::I8(slot), Scalar::I8(v)) => *slot = v,
            (Self::I16(slot), Scalar::I16(v)) => *slot = v,
            (Self::I32(slot), Scalar::I32(v)) => *slot = v,
            (Self::I64(slot), Scalar::I64(v)) => *slot = v,
            (Self::U8(slot), Scalar::U8(v)) => *slot = v,
            (Self::U16(slot), Scalar::U16(v)) => *slot = v,
            (Self::U32(slot), Scalar::U32(v)) => *slot = v,
            (Self::U64(slot), Scalar::U64(v)) => *slot = v,
            (Self::F32(slot), Scalar::F32(v)) => *slot = v,
            (Self::F64(slot), Scalar::F64(v)) => *slot = v,
            (Self::String(slot), Scalar::String(v)) => *slot = v,
            (Self::Date(slot), Scalar::Date(v)) => *slot = v,
            (Self::Time(slot), Scalar::Time(v)) => *slot = v,
            (Self::DateTime(slot), Scalar::DateTime(v)) => *slot = v,
            (slot, value) => {
                return Err(BerError::Validation(format!(
                    "Cannot store {:?} in a {:?} value",
                    value.kind(),
                    slot.kind()
                )));
            }
        }
        Ok(())
    }
}

macro_rules! simple_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl BerValue for $ty {
                fn as_value(&self) -> ValueRef<'_> {
                    ValueRef::Simple(ScalarRef::$variant(*self))
                }

                fn as_value_mut(&mut self) -> ValueMut<'_> {
                    ValueMut::Simple(ScalarMut::$variant(self))
                }
            }
        )*
    };
}

simple_value!(
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    BerDate => Date,
    BerTime => Time,
    BerDateTime => DateTime,
);

impl BerValue for u8 {
    fn as_value(&self) -> ValueRef<'_> {
        ValueRef::Simple(ScalarRef::U8(*self))
    }

    fn as_value_mut(&mut self) -> ValueMut<'_> {
        ValueMut::Simple(ScalarMut::U8(self))
    }

    fn octets(items: &[Self]) -> Option<&[u8]> {
        Some(items)
    }

    fn octets_mut(items: &mut Vec<Self>) -> Option<&mut Vec<u8>> {
        Some(items)
    }
}

impl BerValue for String {
    fn as_value(&self) -> ValueRef<'_> {
        ValueRef::Simple(ScalarRef::Str(self))
    }

    fn as_value_mut(&mut self) -> ValueMut<'_> {
        ValueMut::Simple(ScalarMut::String(self))
    }
}

impl<T: BerValue + Default> Nullable for Option<T> {
    fn value(&self) -> Option<&dyn BerValue> {
        self.as_ref().map(|v| v as &dyn BerValue)
    }

    fn make_value(&mut self) -> &mut dyn BerValue {
        self.insert(T::default())
    }

    fn reset(&mut self) {
        *self = None;
    }
}

impl<T: BerValue + Default> BerValue for Option<T> {
    fn as_value(&self) -> ValueRef<'_> {
        ValueRef::Nullable(self)
    }

    fn as_value_mut(&mut self) -> ValueMut<'_> {
        ValueMut::Nullable(self)
    }
}

impl<T: BerValue + Default> Array for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn element(&self, index: usize) -> Option<&dyn BerValue> {
        self.get(index).map(|v| v as &dyn BerValue)
    }

    fn push_default(&mut self) -> &mut dyn BerValue {
        self.push(T::default());
        let last = Vec::len(self) - 1;
        &mut self[last]
    }

    fn clear(&mut self) {
        Vec::clear(self);
    }

    fn as_octets(&self) -> Option<&[u8]> {
        T::octets(self)
    }

    fn set_octets(&mut self, octets: &[u8]) -> bool {
        match T::octets_mut(self) {
            Some(bytes) => {
                bytes.clear();
                bytes.extend_from_slice(octets);
                true
            }
            None => false,
        }
    }
}

impl<T: BerValue + Default> BerValue for Vec<T> {
    fn as_value(&self) -> ValueRef<'_> {
        ValueRef::Array(self)
    }

    fn as_value_mut(&mut self) -> ValueMut<'_> {
        ValueMut::Array(self)
    }
}

impl<T: BerValue + ?Sized> BerValue for Box<T> {
    fn as_value(&self) -> ValueRef<'_> {
        (**self).as_value()
    }

    fn as_value_mut(&mut self) -> ValueMut<'_> {
        (**self).as_value_mut()
    }
}
