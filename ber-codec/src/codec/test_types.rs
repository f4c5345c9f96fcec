//! Schema types in the shape a code generator emits, for engine tests

use crate::category::{
    AttributeInfo, BerValue, Choice, CustomizedType, DynamicType, Enumeration, FormattingMode,
    SelectionInfo, Sequence, ValueMut, ValueRef,
};
use crate::scalar::{Scalar, ScalarKind};
use ber_core::{BerDateTime, BerError, BerResult};

macro_rules! sequence_type {
    ($ty:ident { $($index:literal => $field:ident : $info:expr),* $(,)? }) => {
        impl Sequence for $ty {
            fn type_name(&self) -> &'static str {
                stringify!($ty)
            }

            fn attributes(&self) -> &'static [AttributeInfo] {
                const ATTRIBUTES: &[AttributeInfo] = &[$($info),*];
                ATTRIBUTES
            }

            fn attribute(&self, index: usize) -> Option<&dyn BerValue> {
                match index {
                    $($index => Some(&self.$field as &dyn BerValue),)*
                    _ => None,
                }
            }

            fn attribute_mut(&mut self, index: usize) -> Option<&mut dyn BerValue> {
                match index {
                    $($index => Some(&mut self.$field as &mut dyn BerValue),)*
                    _ => None,
                }
            }
        }

        impl BerValue for $ty {
            fn as_value(&self) -> ValueRef<'_> {
                ValueRef::Sequence(self)
            }

            fn as_value_mut(&mut self) -> ValueMut<'_> {
                ValueMut::Sequence(self)
            }
        }
    };
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Greeting {
    pub name: String,
}

sequence_type!(Greeting {
    0 => name: AttributeInfo::new("name", 0),
});

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Person {
    pub name: String,
    pub age: Option<i32>,
    pub emails: Vec<String>,
    pub nickname: Option<String>,
}

sequence_type!(Person {
    0 => name: AttributeInfo::new("name", 0),
    1 => age: AttributeInfo::new("age", 1),
    2 => emails: AttributeInfo::new("emails", 2),
    3 => nickname: AttributeInfo::new("nickname", 3)
        .with_formatting_mode(FormattingMode::VISIBLE_STRING),
});

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

sequence_type!(Point {
    0 => x: AttributeInfo::new("x", 0),
    1 => y: AttributeInfo::new("y", 1),
});

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub shape: Shape,
    pub label: String,
}

sequence_type!(Frame {
    0 => shape: AttributeInfo::new("shape", 0),
    1 => label: AttributeInfo::new("label", 1),
});

/// Recursive list used to exercise the depth limit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    pub value: i32,
    pub child: Option<Box<Node>>,
}

impl Node {
    pub fn chain(levels: i32) -> Self {
        let mut node = Node {
            value: levels,
            child: None,
        };
        for value in (1..levels).rev() {
            node = Node {
                value,
                child: Some(Box::new(node)),
            };
        }
        node
    }
}

sequence_type!(Node {
    0 => value: AttributeInfo::new("value", 0),
    1 => child: AttributeInfo::new("child", 1),
});

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Drawing {
    pub title: String,
    pub color: Color,
    pub accent: Color,
    pub shapes: Vec<Shape>,
    pub owner: Option<Email>,
    pub thumbnail: Vec<u8>,
    pub created: BerDateTime,
    pub scale: f32,
    pub visible: bool,
    pub id: u64,
    pub revision: i8,
    pub settings: Settings,
    pub history: Vec<Option<i32>>,
}

sequence_type!(Drawing {
    0 => title: AttributeInfo::new("title", 0),
    1 => color: AttributeInfo::new("color", 1),
    2 => accent: AttributeInfo::new("accent", 2).with_formatting_mode(FormattingMode::TEXT),
    3 => shapes: AttributeInfo::new("shapes", 3),
    4 => owner: AttributeInfo::new("owner", 4),
    5 => thumbnail: AttributeInfo::new("thumbnail", 5),
    6 => created: AttributeInfo::new("created", 6),
    7 => scale: AttributeInfo::new("scale", 7),
    8 => visible: AttributeInfo::new("visible", 8),
    9 => id: AttributeInfo::new("id", 9),
    10 => revision: AttributeInfo::new("revision", 10),
    11 => settings: AttributeInfo::new("settings", 11),
    12 => history: AttributeInfo::new("history", 40),
});

/// Sequence with a defaulted member
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub retries: u8,
    pub label: String,
}

impl Settings {
    pub const DEFAULT_RETRIES: u8 = 3;

    const ATTRIBUTES: &'static [AttributeInfo] = &[
        AttributeInfo::new("retries", 0).with_formatting_mode(FormattingMode::DEFAULT_VALUE),
        AttributeInfo::new("label", 1),
    ];
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            retries: Self::DEFAULT_RETRIES,
            label: String::new(),
        }
    }
}

impl Sequence for Settings {
    fn type_name(&self) -> &'static str {
        "Settings"
    }

    fn attributes(&self) -> &'static [AttributeInfo] {
        Self::ATTRIBUTES
    }

    fn attribute(&self, index: usize) -> Option<&dyn BerValue> {
        match index {
            0 => Some(&self.retries as &dyn BerValue),
            1 => Some(&self.label as &dyn BerValue),
            _ => None,
        }
    }

    fn attribute_mut(&mut self, index: usize) -> Option<&mut dyn BerValue> {
        match index {
            0 => Some(&mut self.retries as &mut dyn BerValue),
            1 => Some(&mut self.label as &mut dyn BerValue),
            _ => None,
        }
    }

    fn is_attribute_default(&self, index: usize) -> bool {
        index == 0 && self.retries == Self::DEFAULT_RETRIES
    }

    fn reset_attribute(&mut self, index: usize) {
        if index == 0 {
            self.retries = Self::DEFAULT_RETRIES;
        }
    }
}

impl BerValue for Settings {
    fn as_value(&self) -> ValueRef<'_> {
        ValueRef::Sequence(self)
    }

    fn as_value_mut(&mut self) -> ValueMut<'_> {
        ValueMut::Sequence(self)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Color {
    #[default]
    Red,
    Green,
    Blue,
    /// Out-of-set value, as produced by a bad conversion
    Invalid(i32),
}

impl Enumeration for Color {
    fn type_name(&self) -> &'static str {
        "Color"
    }

    fn to_int(&self) -> Option<i32> {
        match self {
            Color::Red => Some(0),
            Color::Green => Some(1),
            Color::Blue => Some(2),
            Color::Invalid(_) => None,
        }
    }

    fn to_name(&self) -> Option<&'static str> {
        match self {
            Color::Red => Some("Red"),
            Color::Green => Some("Green"),
            Color::Blue => Some("Blue"),
            Color::Invalid(_) => None,
        }
    }

    fn from_int(&mut self, value: i32) -> BerResult<()> {
        *self = match value {
            0 => Color::Red,
            1 => Color::Green,
            2 => Color::Blue,
            other => {
                return Err(BerError::Validation(format!(
                    "Unknown Color enumerator {}",
                    other
                )));
            }
        };
        Ok(())
    }

    fn from_name(&mut self, name: &str) -> BerResult<()> {
        *self = match name {
            "Red" => Color::Red,
            "Green" => Color::Green,
            "Blue" => Color::Blue,
            other => {
                return Err(BerError::Validation(format!(
                    "Unknown Color enumerator {:?}",
                    other
                )));
            }
        };
        Ok(())
    }
}

impl BerValue for Color {
    fn as_value(&self) -> ValueRef<'_> {
        ValueRef::Enumeration(self)
    }

    fn as_value_mut(&mut self) -> ValueMut<'_> {
        ValueMut::Enumeration(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Shape {
    #[default]
    Undefined,
    Circle(f64),
    Label(String),
    Point(Point),
}

impl Shape {
    const SELECTIONS: &'static [SelectionInfo] = &[
        SelectionInfo::new("circle", 0),
        SelectionInfo::new("label", 1),
        SelectionInfo::new("point", 2),
    ];
}

impl Choice for Shape {
    fn type_name(&self) -> &'static str {
        "Shape"
    }

    fn selections(&self) -> &'static [SelectionInfo] {
        Self::SELECTIONS
    }

    fn selection_index(&self) -> Option<usize> {
        match self {
            Shape::Undefined => None,
            Shape::Circle(_) => Some(0),
            Shape::Label(_) => Some(1),
            Shape::Point(_) => Some(2),
        }
    }

    fn selection(&self) -> Option<&dyn BerValue> {
        match self {
            Shape::Undefined => None,
            Shape::Circle(radius) => Some(radius as &dyn BerValue),
            Shape::Label(text) => Some(text as &dyn BerValue),
            Shape::Point(point) => Some(point as &dyn BerValue),
        }
    }

    fn make_selection(&mut self, index: usize) -> BerResult<&mut dyn BerValue> {
        *self = match index {
            0 => Shape::Circle(0.0),
            1 => Shape::Label(String::new()),
            2 => Shape::Point(Point::default()),
            other => {
                return Err(BerError::Validation(format!(
                    "Shape has no alternative {}",
                    other
                )));
            }
        };
        match self {
            Shape::Circle(radius) => Ok(radius as &mut dyn BerValue),
            Shape::Label(text) => Ok(text as &mut dyn BerValue),
            Shape::Point(point) => Ok(point as &mut dyn BerValue),
            Shape::Undefined => Err(BerError::Validation("Shape is unselected".to_string())),
        }
    }

    fn reset(&mut self) {
        *self = Shape::Undefined;
    }
}

impl BerValue for Shape {
    fn as_value(&self) -> ValueRef<'_> {
        ValueRef::Choice(self)
    }

    fn as_value_mut(&mut self) -> ValueMut<'_> {
        ValueMut::Choice(self)
    }
}

/// String restricted to values containing '@'
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Email(String);

impl Email {
    pub fn new(address: &str) -> Self {
        Self(address.to_string())
    }
}

impl CustomizedType for Email {
    fn type_name(&self) -> &'static str {
        "Email"
    }

    fn base_kind(&self) -> ScalarKind {
        ScalarKind::String
    }

    fn to_base(&self) -> BerResult<Scalar> {
        if self.0.contains('@') {
            Ok(Scalar::String(self.0.clone()))
        } else {
            Err(BerError::Validation(format!(
                "Invalid email address {:?}",
                self.0
            )))
        }
    }

    fn from_base(&mut self, base: Scalar) -> BerResult<()> {
        match base {
            Scalar::String(address) if address.contains('@') => {
                self.0 = address;
                Ok(())
            }
            other => Err(BerError::Validation(format!(
                "Invalid email address {:?}",
                other
            ))),
        }
    }
}

impl BerValue for Email {
    fn as_value(&self) -> ValueRef<'_> {
        ValueRef::Customized(self)
    }

    fn as_value_mut(&mut self) -> ValueMut<'_> {
        ValueMut::Customized(self)
    }
}

/// Value whose wire type depends on the active variant
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    Count(u32),
    Text(String),
}

impl Default for Reading {
    fn default() -> Self {
        Reading::Count(0)
    }
}

impl DynamicType for Reading {
    fn resolve(&self) -> &dyn BerValue {
        match self {
            Reading::Count(count) => count as &dyn BerValue,
            Reading::Text(text) => text as &dyn BerValue,
        }
    }

    fn resolve_mut(&mut self) -> &mut dyn BerValue {
        match self {
            Reading::Count(count) => count as &mut dyn BerValue,
            Reading::Text(text) => text as &mut dyn BerValue,
        }
    }
}

impl BerValue for Reading {
    fn as_value(&self) -> ValueRef<'_> {
        ValueRef::Dynamic(self)
    }

    fn as_value_mut(&mut self) -> ValueMut<'_> {
        ValueMut::Dynamic(self)
    }
}
