//! BER decoder engine
//!
//! # Decoding Process
//!
//! 1. Reset the diagnostics of the previous call
//! 2. Read one top-level element from the source (indefinite-length
//!    elements are scanned to their end-of-contents marker first)
//! 3. Visit the target value with the universal visitor, populating it in
//!    place
//! 4. Advance the source past the consumed element
//!
//! Every element is decoded from a slice bounded by its own length, so a
//! malformed member cannot disturb its siblings.
//!
//! # Error Handling
//!
//! Schema mismatches and validation failures are logged against the nearest
//! member or array element and decoding continues with the next sibling;
//! the call then returns `Asn1Decoding`. Length violations, exceeded depth
//! and resource limits abort the call with that error.
//!
//! # Usage Example
//!
//! ```rust
//! use ber_codec::codec::BerDecoder;
//!
//! let data = [0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x02];
//! let mut source = &data[..];
//! let mut values: Vec<i32> = Vec::new();
//! BerDecoder::new().decode(&mut source, &mut values).unwrap();
//! assert_eq!(values, vec![1, 2]);
//! assert!(source.is_empty());
//! ```

use crate::ber::reader::{self, BerElement, BerReader};
use crate::ber::types::{BerTag, BerTagClass, universal};
use crate::category::{
    Array, AttributeInfo, BerValue, Choice, Enumeration, FormattingMode, MemberInfo, Sequence,
    ValueMut, resolve_mut,
};
use crate::codec::universal_number;
use crate::depth::DepthCounter;
use crate::diagnostics::{Diagnostics, Location, Severity};
use crate::options::DecoderOptions;
use crate::scalar::{Scalar, ScalarKind};
use ber_core::{BerError, BerResult};
use bytes::Buf;
use std::borrow::Cow;
use std::io::IoSlice;
use std::str::FromStr;

/// BER decoder
///
/// Holds the options and the diagnostics of the last call. One instance
/// must not be used from several threads at once; separate instances are
/// independent.
#[derive(Debug, Clone, Default)]
pub struct BerDecoder {
    options: DecoderOptions,
    diagnostics: Diagnostics,
    num_unknown_elements_skipped: usize,
}

impl BerDecoder {
    /// Create a decoder with default (lenient) options
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: DecoderOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    /// Severity of the last call
    pub fn error_severity(&self) -> Severity {
        self.diagnostics.severity()
    }

    /// Log of the last call, one entry per line
    pub fn logged_messages(&self) -> String {
        self.diagnostics.logged_messages()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Unknown elements skipped during the last call
    pub fn num_unknown_elements_skipped(&self) -> usize {
        self.num_unknown_elements_skipped
    }

    /// Decode one element from `source` into `value`
    ///
    /// Contiguous sources such as `&[u8]`, `Bytes` and `BytesMut` are read
    /// in place; a source spread over several chunks is gathered into one
    /// buffer first. On success, and when only recoverable errors were
    /// logged, the source is advanced past the element. After a fatal error
    /// it is left untouched.
    pub fn decode<B: Buf>(&mut self, source: &mut B, value: &mut dyn BerValue) -> BerResult<()> {
        self.diagnostics.reset();
        self.num_unknown_elements_skipped = 0;

        let consumed = {
            let data = contiguous(source);
            log::debug!("Decoding {} value from {} bytes", value.category(), data.len());

            let mut context = DecodeContext {
                options: &self.options,
                diagnostics: &mut self.diagnostics,
                depth: DepthCounter::bounded(self.options.max_depth),
                skipped: 0,
            };
            let outcome = context.decode_top(&data, value);
            debug_assert_eq!(context.depth.current(), 0);
            self.num_unknown_elements_skipped = context.skipped;
            outcome?
        };
        source.advance(consumed);
        log::debug!("Decoded {} bytes", consumed);

        match self.diagnostics.severity() {
            Severity::Success => Ok(()),
            Severity::Error => Err(BerError::Asn1Decoding(format!(
                "{} error(s) while decoding",
                self.diagnostics.error_count()
            ))),
        }
    }
}

/// All remaining bytes of `source`, without consuming them
fn contiguous<B: Buf>(source: &B) -> Cow<'_, [u8]> {
    let chunk = source.chunk();
    if chunk.len() >= source.remaining() {
        return Cow::Borrowed(chunk);
    }

    let mut slices = vec![IoSlice::new(&[]); 4];
    loop {
        let filled = source.chunks_vectored(&mut slices);
        if filled < slices.len() {
            let mut data = Vec::with_capacity(source.remaining());
            for slice in &slices[..filled] {
                data.extend_from_slice(slice);
            }
            log::trace!("Gathered {} chunks into {} bytes", filled, data.len());
            return Cow::Owned(data);
        }
        slices.resize(slices.len() * 2, IoSlice::new(&[]));
    }
}

/// Per-call traversal state
struct DecodeContext<'a> {
    options: &'a DecoderOptions,
    diagnostics: &'a mut Diagnostics,
    depth: DepthCounter,
    skipped: usize,
}

impl DecodeContext<'_> {
    /// Decode the first element of `data`; returns the bytes consumed
    fn decode_top(&mut self, data: &[u8], value: &mut dyn BerValue) -> BerResult<usize> {
        if data.is_empty() {
            if let Ok(ValueMut::Nullable(nullable)) = resolve_mut(value) {
                nullable.reset();
                return Ok(0);
            }
        }

        let location = Location::universal(universal_number(value, FormattingMode::DEFAULT));
        let mut reader = BerReader::new(data);
        let result = reader
            .read_element(self.depth.nesting_limit())
            .and_then(|element| self.visit_universal(&element, value, FormattingMode::DEFAULT));
        self.diagnostics.absorb(&location, result)?;
        Ok(reader.position())
    }

    /// Universal visitor: decode `element` into `value` by its category
    fn visit_universal(
        &mut self,
        element: &BerElement<'_>,
        value: &mut dyn BerValue,
        mode: FormattingMode,
    ) -> BerResult<()> {
        match resolve_mut(value)? {
            ValueMut::Sequence(sequence) => self.decode_sequence(element, sequence),
            ValueMut::Choice(choice) => self.decode_choice(element, choice),
            ValueMut::Array(array) => self.decode_array(element, array, mode),
            ValueMut::Enumeration(enumeration) => self.decode_enumeration(element, enumeration),
            ValueMut::Customized(customized) => {
                let base = self.decode_scalar(element, customized.base_kind(), mode)?;
                customized.from_base(base)
            }
            ValueMut::Nullable(nullable) => {
                if element.is_null() {
                    nullable.reset();
                    Ok(())
                } else {
                    self.visit_universal(element, nullable.make_value(), mode)
                }
            }
            ValueMut::Simple(slot) => {
                let scalar = self.decode_scalar(element, slot.kind(), mode)?;
                slot.assign(scalar)
            }
            ValueMut::Dynamic(_) => Err(BerError::Validation(
                "Unresolved dynamic type".to_string(),
            )),
        }
    }

    /// Member visitor: unwrap the member's tag and decode the single
    /// element inside it
    fn visit_member(
        &mut self,
        element: &BerElement<'_>,
        info: &MemberInfo,
        value: &mut dyn BerValue,
    ) -> BerResult<()> {
        if !element.tag().is_constructed() {
            return Err(BerError::SchemaMismatch(format!(
                "Expected a constructed wrapper for {}, found {}",
                info.name,
                element.tag()
            )));
        }

        if element.contents().is_empty() {
            return match resolve_mut(value)? {
                ValueMut::Nullable(nullable) => {
                    nullable.reset();
                    Ok(())
                }
                _ => Err(BerError::SchemaMismatch(format!(
                    "Empty wrapper for {}",
                    info.name
                ))),
            };
        }

        let mut reader = BerReader::new(element.contents());
        let inner = reader.read_element(self.depth.nesting_limit())?;
        if reader.has_remaining() {
            return Err(BerError::LengthViolation(format!(
                "{} trailing bytes in the wrapper of {}",
                reader.remaining(),
                info.name
            )));
        }
        self.visit_universal(&inner, value, info.formatting_mode)
    }

    fn decode_sequence(
        &mut self,
        element: &BerElement<'_>,
        sequence: &mut dyn Sequence,
    ) -> BerResult<()> {
        expect_sequence(element)?;
        let _guard = self.depth.enter()?;

        let type_name = sequence.type_name();
        let attributes = sequence.attributes();
        let mut seen = vec![false; attributes.len()];
        let mut next = 0;
        let mut reader = BerReader::new(element.contents());

        while reader.has_remaining() {
            let member = reader.read_element(self.depth.nesting_limit())?;
            let tag = member.tag();
            let Some(index) = find_attribute(attributes, next, &tag) else {
                self.unknown_element(&tag);
                continue;
            };
            let info = &attributes[index];
            let location = Location::member(info);

            if seen[index] {
                self.diagnostics
                    .log_at(&location, format!("Duplicate element {}", tag));
                continue;
            }
            seen[index] = true;
            next = index + 1;

            let Some(target) = sequence.attribute_mut(index) else {
                self.diagnostics.log_at(
                    &location,
                    format!("{} has no member at index {}", type_name, index),
                );
                continue;
            };
            let result = self.visit_member(&member, info, target);
            self.diagnostics.absorb(&location, result)?;
        }

        for (index, info) in attributes.iter().enumerate() {
            if !seen[index] {
                self.missing_attribute(sequence, index, info);
            }
        }
        Ok(())
    }

    fn unknown_element(&mut self, tag: &BerTag) {
        if self.options.skip_unknown_elements {
            log::debug!("Skipping unknown element {}", tag);
            self.skipped += 1;
        } else {
            self.diagnostics
                .log_at(&Location::from_tag(tag), format!("Unknown element {}", tag));
        }
    }

    fn missing_attribute(&mut self, sequence: &mut dyn Sequence, index: usize, info: &MemberInfo) {
        if info.formatting_mode.contains(FormattingMode::DEFAULT_VALUE) {
            sequence.reset_attribute(index);
            return;
        }
        let missing = match sequence.attribute_mut(index).map(resolve_mut) {
            Some(Ok(ValueMut::Nullable(nullable))) => {
                nullable.reset();
                false
            }
            Some(Ok(ValueMut::Array(array))) => {
                array.clear();
                false
            }
            _ => true,
        };
        if missing {
            self.diagnostics
                .log_at(&Location::member(info), "Missing required element");
        }
    }

    fn decode_choice(&mut self, element: &BerElement<'_>, choice: &mut dyn Choice) -> BerResult<()> {
        expect_sequence(element)?;
        let _guard = self.depth.enter()?;

        let type_name = choice.type_name();
        choice.reset();
        let mut reader = BerReader::new(element.contents());
        if !reader.has_remaining() {
            return Err(BerError::SchemaMismatch(format!(
                "No alternative present for choice {}",
                type_name
            )));
        }

        let alternative = reader.read_element(self.depth.nesting_limit())?;
        let tag = alternative.tag();
        let selections = choice.selections();
        let Some(index) = selections
            .iter()
            .position(|info| tag.matches(info.class, info.number))
        else {
            return Err(BerError::SchemaMismatch(format!(
                "Element {} matches no alternative of choice {}",
                tag, type_name
            )));
        };

        let info = &selections[index];
        let target = choice.make_selection(index)?;
        let result = self.visit_member(&alternative, info, target);
        self.diagnostics.absorb(&Location::member(info), result)?;

        if reader.has_remaining() {
            return Err(BerError::SchemaMismatch(format!(
                "More than one alternative present for choice {}",
                type_name
            )));
        }
        Ok(())
    }

    fn decode_array(
        &mut self,
        element: &BerElement<'_>,
        array: &mut dyn Array,
        mode: FormattingMode,
    ) -> BerResult<()> {
        array.clear();

        if element
            .tag()
            .matches(BerTagClass::Universal, universal::OCTET_STRING)
        {
            let octets = self.string_contents(element)?;
            return if array.set_octets(&octets) {
                Ok(())
            } else {
                Err(BerError::SchemaMismatch(
                    "OCTET STRING for an array of non-byte elements".to_string(),
                ))
            };
        }

        expect_sequence(element)?;
        let _guard = self.depth.enter()?;
        let element_mode = mode | FormattingMode::NILLABLE;
        let mut reader = BerReader::new(element.contents());
        let mut count = 0;

        while reader.has_remaining() {
            let item = reader.read_element(self.depth.nesting_limit())?;
            if count >= self.options.max_sequence_size {
                return Err(BerError::Resource(format!(
                    "Array exceeds {} elements",
                    self.options.max_sequence_size
                )));
            }
            let target = array.push_default();
            let result = self.visit_universal(&item, target, element_mode);
            self.diagnostics.absorb(&Location::element(count), result)?;
            count += 1;
        }
        Ok(())
    }

    fn decode_enumeration(
        &mut self,
        element: &BerElement<'_>,
        enumeration: &mut dyn Enumeration,
    ) -> BerResult<()> {
        let tag = element.tag();
        if !tag.is_constructed()
            && (tag.matches(BerTagClass::Universal, universal::ENUMERATED)
                || tag.matches(BerTagClass::Universal, universal::INTEGER))
        {
            let raw = reader::decode_integer(element.contents())?;
            let value = i32::try_from(raw).map_err(|_| {
                BerError::Validation(format!(
                    "Enumerator {} of {} is out of range",
                    raw,
                    enumeration.type_name()
                ))
            })?;
            return enumeration.from_int(value);
        }

        if is_string_tag(&tag) {
            let contents = self.string_contents(element)?;
            let name = reader::decode_utf8(&contents)?;
            return enumeration.from_name(&name);
        }

        Err(BerError::SchemaMismatch(format!(
            "Expected ENUMERATED for {}, found {}",
            enumeration.type_name(),
            tag
        )))
    }

    fn decode_scalar(
        &mut self,
        element: &BerElement<'_>,
        kind: ScalarKind,
        mode: FormattingMode,
    ) -> BerResult<Scalar> {
        let tag = element.tag();
        let accepted = match kind {
            ScalarKind::String => is_string_tag(&tag),
            _ => tag.matches(BerTagClass::Universal, kind.universal_number(mode)),
        };
        if !accepted {
            return Err(BerError::SchemaMismatch(format!(
                "Expected [UNIVERSAL {}] for {:?}, found {}",
                kind.universal_number(mode),
                kind,
                tag
            )));
        }

        if tag.is_constructed() && !matches!(kind, ScalarKind::String | ScalarKind::Bytes) {
            return Err(BerError::SchemaMismatch(format!(
                "Constructed encoding of primitive {}",
                tag
            )));
        }

        let contents = element.contents();
        Ok(match kind {
            ScalarKind::Bool => Scalar::Bool(reader::decode_boolean(contents)?),
            ScalarKind::I8 => Scalar::I8(narrow(contents, kind)?),
            ScalarKind::I16 => Scalar::I16(narrow(contents, kind)?),
            ScalarKind::I32 => Scalar::I32(narrow(contents, kind)?),
            ScalarKind::I64 => Scalar::I64(narrow(contents, kind)?),
            ScalarKind::U8 => Scalar::U8(narrow(contents, kind)?),
            ScalarKind::U16 => Scalar::U16(narrow(contents, kind)?),
            ScalarKind::U32 => Scalar::U32(narrow(contents, kind)?),
            ScalarKind::U64 => Scalar::U64(narrow(contents, kind)?),
            ScalarKind::F32 => Scalar::F32(reader::decode_real(contents)? as f32),
            ScalarKind::F64 => Scalar::F64(reader::decode_real(contents)?),
            ScalarKind::String => {
                let text = self.string_contents(element)?;
                if tag.number() == universal::VISIBLE_STRING {
                    Scalar::String(reader::decode_visible(&text)?)
                } else {
                    Scalar::String(reader::decode_utf8(&text)?)
                }
            }
            ScalarKind::Bytes => Scalar::Bytes(self.string_contents(element)?.into_owned()),
            ScalarKind::Date => Scalar::Date(parse_text(contents)?),
            ScalarKind::Time => Scalar::Time(parse_text(contents)?),
            ScalarKind::DateTime => Scalar::DateTime(parse_text(contents)?),
        })
    }

    /// Contents of a string element, reassembled when segmented
    fn string_contents<'e>(&self, element: &BerElement<'e>) -> BerResult<Cow<'e, [u8]>> {
        let contents = reader::string_contents(element, self.depth.nesting_limit())?;
        if contents.len() > self.options.max_sequence_size {
            return Err(BerError::Resource(format!(
                "String of {} bytes exceeds the limit of {}",
                contents.len(),
                self.options.max_sequence_size
            )));
        }
        Ok(contents)
    }
}

/// Index of the member tagged `tag`, trying `next` first
fn find_attribute(attributes: &[AttributeInfo], next: usize, tag: &BerTag) -> Option<usize> {
    match attributes.get(next) {
        Some(info) if tag.matches(info.class, info.number) => Some(next),
        _ => attributes
            .iter()
            .position(|info| tag.matches(info.class, info.number)),
    }
}

fn expect_sequence(element: &BerElement<'_>) -> BerResult<()> {
    let tag = element.tag();
    if tag.is_constructed() && tag.matches(BerTagClass::Universal, universal::SEQUENCE) {
        Ok(())
    } else {
        Err(BerError::SchemaMismatch(format!(
            "Expected SEQUENCE, found {}",
            tag
        )))
    }
}

fn is_string_tag(tag: &BerTag) -> bool {
    tag.matches(BerTagClass::Universal, universal::UTF8_STRING)
        || tag.matches(BerTagClass::Universal, universal::VISIBLE_STRING)
}

fn narrow<T: TryFrom<i128>>(contents: &[u8], kind: ScalarKind) -> BerResult<T> {
    let value = reader::decode_integer(contents)?;
    T::try_from(value)
        .map_err(|_| BerError::Validation(format!("Integer {} is out of range for {:?}", value, kind)))
}

fn parse_text<T: FromStr<Err = BerError>>(contents: &[u8]) -> BerResult<T> {
    std::str::from_utf8(contents)
        .map_err(|e| BerError::Validation(format!("Invalid character form: {}", e)))?
        .parse()
}
