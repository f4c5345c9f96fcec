//! Type categories and the capability traits behind them
//!
//! Every value the codec handles implements [`BerValue`], which reports the
//! value's shape as a [`ValueRef`] (for encoding) or [`ValueMut`] (for
//! decoding). The engines match on that tag and use the per-category trait
//! object it carries; they never inspect concrete types.
//!
//! # Categories
//!
//! | Category | Trait | Wire form |
//! |---|---|---|
//! | Sequence | [`Sequence`] | SEQUENCE of explicitly tagged members |
//! | Choice | [`Choice`] | SEQUENCE holding the tagged active alternative |
//! | Array | [`Array`] | SEQUENCE OF, or OCTET STRING for bytes |
//! | Enumeration | [`Enumeration`] | ENUMERATED, or UTF8String with `TEXT` |
//! | CustomizedType | [`CustomizedType`] | the universal TLV of its base scalar |
//! | NullableValue | [`Nullable`] | the contained value, nothing, or NULL |
//! | Simple | `ScalarRef`/`ScalarMut` | the scalar's universal TLV |
//! | DynamicType | [`DynamicType`] | whatever it resolves to |
//!
//! Schema-generated types implement these traits by hand or through a code
//! generator; the implementations for Rust primitives, `String`, `Option`,
//! `Vec` and `Box` live in [`crate::scalar`].

use crate::ber::types::{BerTag, BerTagClass};
use crate::scalar::{Scalar, ScalarKind, ScalarMut, ScalarRef};
use ber_core::{BerError, BerResult};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Closed classification of a value's shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Sequence,
    Choice,
    Array,
    Enumeration,
    CustomizedType,
    NullableValue,
    Simple,
    DynamicType,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sequence => "Sequence",
            Self::Choice => "Choice",
            Self::Array => "Array",
            Self::Enumeration => "Enumeration",
            Self::CustomizedType => "CustomizedType",
            Self::NullableValue => "NullableValue",
            Self::Simple => "Simple",
            Self::DynamicType => "DynamicType",
        };
        write!(f, "{}", name)
    }
}

/// Per-member flags controlling encoding choices
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FormattingMode(u32);

impl FormattingMode {
    pub const DEFAULT: Self = Self(0);
    /// Strings use VisibleString instead of UTF8String
    pub const VISIBLE_STRING: Self = Self(0x1);
    /// Enumerations use their name instead of their integer value
    pub const TEXT: Self = Self(0x2);
    /// Absent values are written as NULL
    pub const NILLABLE: Self = Self(0x4);
    /// The member has a default value and may be elided when it holds it
    pub const DEFAULT_VALUE: Self = Self(0x8);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl BitOr for FormattingMode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for FormattingMode {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

/// Metadata for one Sequence member or Choice alternative
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberInfo {
    pub name: &'static str,
    pub class: BerTagClass,
    pub number: u32,
    pub formatting_mode: FormattingMode,
}

impl MemberInfo {
    /// Member tagged `[number]` in the context-specific class
    pub const fn new(name: &'static str, number: u32) -> Self {
        Self {
            name,
            class: BerTagClass::ContextSpecific,
            number,
            formatting_mode: FormattingMode::DEFAULT,
        }
    }

    pub const fn with_class(self, class: BerTagClass) -> Self {
        Self { class, ..self }
    }

    pub const fn with_formatting_mode(self, formatting_mode: FormattingMode) -> Self {
        Self {
            formatting_mode,
            ..self
        }
    }

    /// The constructed tag that wraps the member's value
    pub fn wrapper_tag(&self) -> BerTag {
        BerTag::new(self.class, true, self.number)
    }
}

pub type AttributeInfo = MemberInfo;
pub type SelectionInfo = MemberInfo;

/// Capability implemented by every encodable and decodable value
pub trait BerValue {
    fn as_value(&self) -> ValueRef<'_>;

    fn as_value_mut(&mut self) -> ValueMut<'_>;

    fn category(&self) -> Category {
        self.as_value().category()
    }

    /// `items` viewed as octets, when this is the byte type
    ///
    /// An array whose element type answers here is written as one
    /// OCTET STRING.
    fn octets(_items: &[Self]) -> Option<&[u8]>
    where
        Self: Sized,
    {
        None
    }

    /// Mutable counterpart of [`BerValue::octets`]
    fn octets_mut(_items: &mut Vec<Self>) -> Option<&mut Vec<u8>>
    where
        Self: Sized,
    {
        None
    }
}

/// Read access to a value, tagged by category
#[derive(Clone, Copy)]
pub enum ValueRef<'a> {
    Sequence(&'a dyn Sequence),
    Choice(&'a dyn Choice),
    Array(&'a dyn Array),
    Enumeration(&'a dyn Enumeration),
    Customized(&'a dyn CustomizedType),
    Nullable(&'a dyn Nullable),
    Simple(ScalarRef<'a>),
    Dynamic(&'a dyn DynamicType),
}

impl ValueRef<'_> {
    pub fn category(&self) -> Category {
        match self {
            Self::Sequence(_) => Category::Sequence,
            Self::Choice(_) => Category::Choice,
            Self::Array(_) => Category::Array,
            Self::Enumeration(_) => Category::Enumeration,
            Self::Customized(_) => Category::CustomizedType,
            Self::Nullable(_) => Category::NullableValue,
            Self::Simple(_) => Category::Simple,
            Self::Dynamic(_) => Category::DynamicType,
        }
    }
}

/// Write access to a value, tagged by category
pub enum ValueMut<'a> {
    Sequence(&'a mut dyn Sequence),
    Choice(&'a mut dyn Choice),
    Array(&'a mut dyn Array),
    Enumeration(&'a mut dyn Enumeration),
    Customized(&'a mut dyn CustomizedType),
    Nullable(&'a mut dyn Nullable),
    Simple(ScalarMut<'a>),
    Dynamic(&'a mut dyn DynamicType),
}

impl ValueMut<'_> {
    pub fn category(&self) -> Category {
        match self {
            Self::Sequence(_) => Category::Sequence,
            Self::Choice(_) => Category::Choice,
            Self::Array(_) => Category::Array,
            Self::Enumeration(_) => Category::Enumeration,
            Self::Customized(_) => Category::CustomizedType,
            Self::Nullable(_) => Category::NullableValue,
            Self::Simple(_) => Category::Simple,
            Self::Dynamic(_) => Category::DynamicType,
        }
    }
}

/// Record of named, tagged members in declaration order
pub trait Sequence {
    fn type_name(&self) -> &'static str;

    fn attributes(&self) -> &'static [AttributeInfo];

    fn attribute(&self, index: usize) -> Option<&dyn BerValue>;

    fn attribute_mut(&mut self, index: usize) -> Option<&mut dyn BerValue>;

    /// Whether the member currently holds its default value
    fn is_attribute_default(&self, _index: usize) -> bool {
        false
    }

    /// Restore the member's default value
    fn reset_attribute(&mut self, _index: usize) {}
}

/// Tagged union with at most one active alternative
pub trait Choice {
    fn type_name(&self) -> &'static str;

    fn selections(&self) -> &'static [SelectionInfo];

    fn selection_index(&self) -> Option<usize>;

    fn selection(&self) -> Option<&dyn BerValue>;

    /// Activate alternative `index` with a default value and return it
    fn make_selection(&mut self, index: usize) -> BerResult<&mut dyn BerValue>;

    /// Return to the unselected state
    fn reset(&mut self);
}

/// Homogeneous sequence of elements
pub trait Array {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn element(&self, index: usize) -> Option<&dyn BerValue>;

    /// Append a default element and return it for decoding
    fn push_default(&mut self) -> &mut dyn BerValue;

    fn clear(&mut self);

    /// The elements as raw bytes, when the element type is a byte
    fn as_octets(&self) -> Option<&[u8]> {
        None
    }

    /// Replace the contents with raw bytes; false when the element type is
    /// not a byte
    fn set_octets(&mut self, _octets: &[u8]) -> bool {
        false
    }
}

/// Closed set of enumerators with integer and name forms
pub trait Enumeration {
    fn type_name(&self) -> &'static str;

    /// Integer value, or `None` when the value is not a known enumerator
    fn to_int(&self) -> Option<i32>;

    fn to_name(&self) -> Option<&'static str>;

    fn from_int(&mut self, value: i32) -> BerResult<()>;

    fn from_name(&mut self, name: &str) -> BerResult<()>;
}

/// Value represented on the wire by a Simple base with validated
/// conversions in both directions
pub trait CustomizedType {
    fn type_name(&self) -> &'static str;

    fn base_kind(&self) -> ScalarKind;

    fn to_base(&self) -> BerResult<Scalar>;

    fn from_base(&mut self, base: Scalar) -> BerResult<()>;
}

/// Optional value
pub trait Nullable {
    fn value(&self) -> Option<&dyn BerValue>;

    /// Make the value present with its default and return it for decoding
    fn make_value(&mut self) -> &mut dyn BerValue;

    fn reset(&mut self);

    fn is_null(&self) -> bool {
        self.value().is_none()
    }
}

/// Value whose category is only known at run time
pub trait DynamicType {
    fn resolve(&self) -> &dyn BerValue;

    fn resolve_mut(&mut self) -> &mut dyn BerValue;
}

/// Category of `value`, looking through one DynamicType
pub fn resolve(value: &dyn BerValue) -> BerResult<ValueRef<'_>> {
    match value.as_value() {
        ValueRef::Dynamic(dynamic) => match dynamic.resolve().as_value() {
            ValueRef::Dynamic(_) => Err(dynamic_loop()),
            resolved => Ok(resolved),
        },
        other => Ok(other),
    }
}

/// Mutable counterpart of [`resolve`]
pub fn resolve_mut(value: &mut dyn BerValue) -> BerResult<ValueMut<'_>> {
    match value.as_value_mut() {
        ValueMut::Dynamic(dynamic) => match dynamic.resolve_mut().as_value_mut() {
            ValueMut::Dynamic(_) => Err(dynamic_loop()),
            resolved => Ok(resolved),
        },
        other => Ok(other),
    }
}

fn dynamic_loop() -> BerError {
    BerError::Validation("Dynamic type resolved to another dynamic type".to_string())
}
