//! BER encoder engine
//!
//! # Encoding Process
//!
//! 1. Reset the diagnostics of the previous call
//! 2. Visit the value with the universal visitor into an in-memory writer
//! 3. Copy the bytes to the sink
//!
//! Constructed values are always buffered: the contents of a Sequence,
//! Choice or Array are encoded into a nested [`BerWriter`] first, and only
//! then prefixed with their tag and definite length.
//!
//! # Error Handling
//!
//! Validation failures (unknown enumerator, rejected customized-type
//! conversion, unselected Choice) are logged against the nearest member or
//! array element, which is then left out; its siblings are still encoded and
//! the bytes are written. The call returns `Asn1Encoding` in that case. A
//! fatal error writes nothing.
//!
//! # Usage Example
//!
//! ```rust
//! use ber_codec::codec::BerEncoder;
//!
//! let mut encoder = BerEncoder::new();
//! let mut sink: Vec<u8> = Vec::new();
//! encoder.encode(&mut sink, &vec![1i32, 2]).unwrap();
//! assert_eq!(sink, vec![0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x02]);
//! ```

use crate::ber::types::BerTag;
use crate::ber::writer::BerWriter;
use crate::category::{
    Array, BerValue, Choice, Enumeration, FormattingMode, MemberInfo, Sequence, ValueRef,
    resolve,
};
use crate::codec::universal_number;
use crate::depth::DepthCounter;
use crate::diagnostics::{Diagnostics, Location, Severity};
use crate::options::EncoderOptions;
use crate::scalar::ScalarRef;
use ber_core::{BerError, BerResult};
use bytes::BufMut;

/// BER encoder
///
/// Holds the options and the diagnostics of the last call. One instance
/// must not be used from several threads at once; separate instances are
/// independent.
#[derive(Debug, Clone, Default)]
pub struct BerEncoder {
    options: EncoderOptions,
    diagnostics: Diagnostics,
}

impl BerEncoder {
    /// Create an encoder with default options
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: EncoderOptions) -> Self {
        Self {
            options,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn options(&self) -> &EncoderOptions {
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

    /// Encode `value` and append it to `sink`
    ///
    /// # Returns
    /// `Ok(())` when no error was logged. Otherwise the bytes that could be
    /// produced are still written and `Asn1Encoding` is returned, unless the
    /// error was fatal, in which case nothing is written and that error is
    /// returned.
    pub fn encode<B: BufMut>(&mut self, sink: &mut B, value: &dyn BerValue) -> BerResult<()> {
        self.diagnostics.reset();
        log::debug!("Encoding {} value", value.category());

        let location = Location::universal(universal_number(value, FormattingMode::DEFAULT));
        let mut writer = BerWriter::new();
        let mut context = EncodeContext {
            options: &self.options,
            diagnostics: &mut self.diagnostics,
            depth: DepthCounter::unbounded(),
        };
        let result = context.visit_universal(value, FormattingMode::DEFAULT, &mut writer);
        let result = context.diagnostics.absorb(&location, result);
        debug_assert_eq!(context.depth.current(), 0);
        result?;

        let bytes = writer.into_bytes();
        if sink.remaining_mut() < bytes.len() {
            let error = BerError::Resource(format!(
                "Sink has room for {} bytes, {} needed",
                sink.remaining_mut(),
                bytes.len()
            ));
            self.diagnostics.absorb(&location, Err(error))?;
        }
        sink.put_slice(&bytes);
        log::debug!("Encoded {} bytes", bytes.len());

        match self.diagnostics.severity() {
            Severity::Success => Ok(()),
            Severity::Error => Err(BerError::Asn1Encoding(format!(
                "{} error(s) while encoding",
                self.diagnostics.error_count()
            ))),
        }
    }
}

/// Per-call traversal state
struct EncodeContext<'a> {
    options: &'a EncoderOptions,
    diagnostics: &'a mut Diagnostics,
    depth: DepthCounter,
}

impl EncodeContext<'_> {
    /// Universal visitor: write `value` with the tag of its category
    fn visit_universal(
        &mut self,
        value: &dyn BerValue,
        mode: FormattingMode,
        out: &mut BerWriter,
    ) -> BerResult<()> {
        match resolve(value)? {
            ValueRef::Sequence(sequence) => self.encode_sequence(sequence, out),
            ValueRef::Choice(choice) => self.encode_choice(choice, out),
            ValueRef::Array(array) => self.encode_array(array, mode, out),
            ValueRef::Enumeration(enumeration) => encode_enumeration(enumeration, mode, out),
            ValueRef::Customized(customized) => {
                let base = customized.to_base()?;
                if base.kind() != customized.base_kind() {
                    return Err(BerError::Validation(format!(
                        "{} produced a {:?} base, expected {:?}",
                        customized.type_name(),
                        base.kind(),
                        customized.base_kind()
                    )));
                }
                encode_scalar(base.borrowed(), mode, out)
            }
            ValueRef::Nullable(nullable) => match nullable.value() {
                Some(inner) => self.visit_universal(inner, mode, out),
                None if self.options.explicit_nulls
                    || mode.contains(FormattingMode::NILLABLE) =>
                {
                    out.encode_null()
                }
                None => Ok(()),
            },
            ValueRef::Simple(scalar) => encode_scalar(scalar, mode, out),
            ValueRef::Dynamic(_) => Err(BerError::Validation(
                "Unresolved dynamic type".to_string(),
            )),
        }
    }

    /// Member visitor: write `value` inside the member's wrapper tag
    ///
    /// A member that produces no bytes gets no wrapper.
    fn visit_member(
        &mut self,
        info: &MemberInfo,
        value: &dyn BerValue,
        out: &mut BerWriter,
    ) -> BerResult<()> {
        let mut inner = BerWriter::new();
        let result = self.visit_universal(value, info.formatting_mode, &mut inner);
        let failed = result.is_err();
        self.diagnostics.absorb(&Location::member(info), result)?;
        if failed || inner.is_empty() {
            return Ok(());
        }
        out.encode_tlv(&info.wrapper_tag(), inner.as_bytes())
    }

    fn encode_sequence(&mut self, sequence: &dyn Sequence, out: &mut BerWriter) -> BerResult<()> {
        let _guard = self.depth.enter()?;
        let mut contents = BerWriter::new();

        for (index, info) in sequence.attributes().iter().enumerate() {
            let Some(member) = sequence.attribute(index) else {
                self.diagnostics.log_at(
                    &Location::member(info),
                    format!("{} has no member at index {}", sequence.type_name(), index),
                );
                continue;
            };

            if self.options.elide_default_values
                && info.formatting_mode.contains(FormattingMode::DEFAULT_VALUE)
                && sequence.is_attribute_default(index)
            {
                log::trace!("Eliding default member {}", info.name);
                continue;
            }

            if !self.options.encode_empty_arrays && is_empty_array(member) {
                log::trace!("Omitting empty array member {}", info.name);
                continue;
            }

            self.visit_member(info, member, &mut contents)?;
        }

        out.encode_sequence(contents.as_bytes())
    }

    fn encode_choice(&mut self, choice: &dyn Choice, out: &mut BerWriter) -> BerResult<()> {
        let (Some(index), Some(value)) = (choice.selection_index(), choice.selection()) else {
            return Err(BerError::Validation(format!(
                "No alternative selected for choice {}",
                choice.type_name()
            )));
        };
        let info = choice.selections().get(index).ok_or_else(|| {
            BerError::Validation(format!(
                "Choice {} has no alternative {}",
                choice.type_name(),
                index
            ))
        })?;

        let _guard = self.depth.enter()?;
        // An absent alternative is written as NULL so the selection survives
        let info = info.with_formatting_mode(info.formatting_mode | FormattingMode::NILLABLE);
        let mut contents = BerWriter::new();
        self.visit_member(&info, value, &mut contents)?;
        out.encode_sequence(contents.as_bytes())
    }

    fn encode_array(
        &mut self,
        array: &dyn Array,
        mode: FormattingMode,
        out: &mut BerWriter,
    ) -> BerResult<()> {
        if let Some(octets) = array.as_octets() {
            return out.encode_octet_string(octets);
        }

        let _guard = self.depth.enter()?;
        // Absent elements are written as NULL to keep positions
        let element_mode = mode | FormattingMode::NILLABLE;
        let mut contents = BerWriter::new();
        for index in 0..array.len() {
            let Some(element) = array.element(index) else {
                continue;
            };
            let result = self.visit_universal(element, element_mode, &mut contents);
            self.diagnostics.absorb(&Location::element(index), result)?;
        }
        out.encode_sequence(contents.as_bytes())
    }
}

fn is_empty_array(value: &dyn BerValue) -> bool {
    matches!(resolve(value), Ok(ValueRef::Array(array)) if array.is_empty())
}

fn encode_enumeration(
    enumeration: &dyn Enumeration,
    mode: FormattingMode,
    out: &mut BerWriter,
) -> BerResult<()> {
    let invalid = || {
        BerError::Validation(format!(
            "Value is not a valid {} enumerator",
            enumeration.type_name()
        ))
    };
    if mode.contains(FormattingMode::TEXT) {
        let name = enumeration.to_name().ok_or_else(invalid)?;
        out.encode_utf8_string(name)
    } else {
        let value = enumeration.to_int().ok_or_else(invalid)?;
        out.encode_enumerated(i64::from(value))
    }
}

fn encode_scalar(scalar: ScalarRef<'_>, mode: FormattingMode, out: &mut BerWriter) -> BerResult<()> {
    match scalar {
        ScalarRef::Bool(v) => out.encode_boolean(v),
        ScalarRef::I8(v) => out.encode_integer(i128::from(v)),
        ScalarRef::I16(v) => out.encode_integer(i128::from(v)),
        ScalarRef::I32(v) => out.encode_integer(i128::from(v)),
        ScalarRef::I64(v) => out.encode_integer(i128::from(v)),
        ScalarRef::U8(v) => out.encode_integer(i128::from(v)),
        ScalarRef::U16(v) => out.encode_integer(i128::from(v)),
        ScalarRef::U32(v) => out.encode_integer(i128::from(v)),
        ScalarRef::U64(v) => out.encode_integer(i128::from(v)),
        ScalarRef::F32(v) => out.encode_real(f64::from(v)),
        ScalarRef::F64(v) => out.encode_real(v),
        ScalarRef::Str(v) if mode.contains(FormattingMode::VISIBLE_STRING) => {
            out.encode_visible_string(v)
        }
        ScalarRef::Str(v) => out.encode_utf8_string(v),
        ScalarRef::Bytes(v) => out.encode_octet_string(v),
        ScalarRef::Date(v) => encode_text(scalar, mode, &v.to_string(), out),
        ScalarRef::Time(v) => encode_text(scalar, mode, &v.to_string(), out),
        ScalarRef::DateTime(v) => encode_text(scalar, mode, &v.to_string(), out),
    }
}

/// Date and time kinds use their X.680 character form as contents
fn encode_text(
    scalar: ScalarRef<'_>,
    mode: FormattingMode,
    text: &str,
    out: &mut BerWriter,
) -> BerResult<()> {
    let tag: BerTag = scalar.kind().universal_tag(mode);
    out.encode_tlv(&tag, text.as_bytes())
}
