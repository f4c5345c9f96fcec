//! Encoder and decoder engines
//!
//! Both engines walk the value tree depth first through the category
//! dispatcher. Two visitors drive the traversal:
//!
//! - the **universal visitor** handles a top-level value or an array
//!   element, choosing the universal tag from the value's category;
//! - the **member visitor** handles a Sequence member or the active Choice
//!   alternative, wrapping the universal TLV in the member's constructed
//!   (context-specific by default) tag.
//!
//! Per-call state (diagnostics, depth counter) lives in a context struct
//! passed through the traversal; the engine instances only keep the last
//! call's diagnostics for the caller to inspect.

pub mod decoder;
pub mod encoder;

#[cfg(test)]
pub(crate) mod test_types;

pub use decoder::BerDecoder;
pub use encoder::BerEncoder;

use crate::ber::types::universal;
use crate::category::{BerValue, FormattingMode, ValueRef, resolve};

/// Universal tag number `value` is written with, for diagnostics
pub(crate) fn universal_number(value: &dyn BerValue, mode: FormattingMode) -> u32 {
    match resolve(value) {
        Ok(ValueRef::Sequence(_)) | Ok(ValueRef::Choice(_)) => universal::SEQUENCE,
        Ok(ValueRef::Array(array)) if array.as_octets().is_some() => universal::OCTET_STRING,
        Ok(ValueRef::Array(_)) => universal::SEQUENCE,
        Ok(ValueRef::Enumeration(_)) if mode.contains(FormattingMode::TEXT) => {
            universal::UTF8_STRING
        }
        Ok(ValueRef::Enumeration(_)) => universal::ENUMERATED,
        Ok(ValueRef::Customized(customized)) => customized.base_kind().universal_number(mode),
        Ok(ValueRef::Simple(scalar)) => scalar.kind().universal_number(mode),
        Ok(ValueRef::Nullable(nullable)) => nullable
            .value()
            .map_or(universal::NULL, |inner| universal_number(inner, mode)),
        Ok(ValueRef::Dynamic(_)) | Err(_) => universal::NULL,
    }
}

#[cfg(test)]
mod tests {
    use super::test_types::*;
    use super::*;
    use crate::diagnostics::Severity;
    use crate::options::{DecoderOptions, EncoderOptions};
    use ber_core::{BerDateTime, BerError};
    use proptest::prelude::*;

    fn encode(value: &dyn BerValue) -> Vec<u8> {
        let mut sink: Vec<u8> = Vec::new();
        BerEncoder::new().encode(&mut sink, value).unwrap();
        sink
    }

    fn decode_into<T: BerValue>(bytes: &[u8], mut value: T) -> T {
        let mut source = bytes;
        BerDecoder::new().decode(&mut source, &mut value).unwrap();
        assert!(source.is_empty());
        value
    }

    fn drawing() -> Drawing {
        Drawing {
            title: "Garden plan".to_string(),
            color: Color::Green,
            accent: Color::Blue,
            shapes: vec![
                Shape::Circle(2.5),
                Shape::Label("pond".to_string()),
                Shape::Point(Point { x: -3, y: 70000 }),
            ],
            owner: Some(Email::new("ana@example.org")),
            thumbnail: vec![0x89, 0x50, 0x4E, 0x47],
            created: BerDateTime::new(2024, 3, 9, 18, 45, 5).unwrap(),
            scale: 0.75,
            visible: true,
            id: u64::MAX,
            revision: -12,
            settings: Settings {
                retries: 5,
                label: "fast".to_string(),
            },
            history: vec![Some(1), None, Some(-1)],
        }
    }

    #[test]
    fn test_universal_number() {
        assert_eq!(universal_number(&Point::default(), FormattingMode::DEFAULT), 16);
        assert_eq!(universal_number(&vec![1u8], FormattingMode::DEFAULT), 4);
        assert_eq!(universal_number(&Color::Red, FormattingMode::TEXT), 12);
        assert_eq!(universal_number(&None::<i32>, FormattingMode::DEFAULT), 5);
        assert_eq!(universal_number(&Email::default(), FormattingMode::DEFAULT), 12);
    }

    #[test]
    fn test_scenario_member_wrapper() {
        let greeting = Greeting {
            name: "Bob".to_string(),
        };
        assert_eq!(
            encode(&greeting),
            vec![0x30, 0x07, 0xA0, 0x05, 0x0C, 0x03, b'B', b'o', b'b']
        );
    }

    #[test]
    fn test_scenario_empty_array() {
        let empty: Vec<i32> = Vec::new();
        let bytes = encode(&empty);
        assert_eq!(bytes, vec![0x30, 0x00]);
        assert!(decode_into(&bytes, vec![5i32]).is_empty());
    }

    #[test]
    fn test_scenario_absent_nullable() {
        let person = Person {
            name: "Bob".to_string(),
            ..Person::default()
        };
        let bytes = encode(&person);
        assert_eq!(
            bytes,
            vec![
                0x30, 0x0B, 0xA0, 0x05, 0x0C, 0x03, b'B', b'o', b'b', 0xA2, 0x02, 0x30, 0x00
            ]
        );

        let stale = Person {
            age: Some(5),
            nickname: Some("x".to_string()),
            ..Person::default()
        };
        assert_eq!(decode_into(&bytes, stale), person);
    }

    #[test]
    fn test_scenario_unknown_element_lenient() {
        let bytes = [
            0x30, 0x11, 0xA0, 0x05, 0x0C, 0x03, b'B', b'o', b'b', 0x9F, 0x20, 0x02, 0xAB, 0xCD,
            0xA1, 0x03, 0x02, 0x01, 0x2A,
        ];
        let mut decoder = BerDecoder::new();
        let mut person = Person::default();
        decoder.decode(&mut &bytes[..], &mut person).unwrap();
        assert_eq!(person.name, "Bob");
        assert_eq!(person.age, Some(42));
        assert_eq!(decoder.num_unknown_elements_skipped(), 1);
        assert_eq!(decoder.error_severity(), Severity::Success);
    }

    #[test]
    fn test_scenario_unknown_element_strict() {
        let bytes = [
            0x30, 0x11, 0xA0, 0x05, 0x0C, 0x03, b'B', b'o', b'b', 0x9F, 0x20, 0x02, 0xAB, 0xCD,
            0xA1, 0x03, 0x02, 0x01, 0x2A,
        ];
        let options = DecoderOptions::new().with_skip_unknown_elements(false);
        let mut decoder = BerDecoder::with_options(options);
        let mut person = Person::default();
        let err = decoder.decode(&mut &bytes[..], &mut person).unwrap_err();
        assert!(matches!(err, BerError::Asn1Decoding(_)));
        assert_eq!(decoder.error_severity(), Severity::Error);
        assert!(decoder.logged_messages().contains("CONTEXT_SPECIFIC 32"));
        // Known members are still populated
        assert_eq!(person.age, Some(42));
    }

    #[test]
    fn test_scenario_unselected_choice() {
        let mut encoder = BerEncoder::new();
        let mut sink: Vec<u8> = Vec::new();
        let err = encoder.encode(&mut sink, &Shape::Undefined).unwrap_err();
        assert_ne!(err.status_code(), 0);
        assert!(sink.is_empty());
        assert_eq!(encoder.error_severity(), Severity::Error);
        assert!(encoder.logged_messages().contains("Shape"));
    }

    #[test]
    fn test_unselected_choice_member_is_named() {
        let frame = Frame {
            shape: Shape::Undefined,
            label: "x".to_string(),
        };
        let mut encoder = BerEncoder::new();
        let mut sink: Vec<u8> = Vec::new();
        assert!(encoder.encode(&mut sink, &frame).is_err());
        // Siblings are still written
        assert_eq!(sink, vec![0x30, 0x05, 0xA1, 0x03, 0x0C, 0x01, b'x']);
        let entry = &encoder.diagnostics().messages()[0];
        assert_eq!(entry.name.as_deref(), Some("shape"));
        assert_eq!(entry.number, 0);
    }

    #[test]
    fn test_truncated_buffer() {
        let bytes = [0x30, 0x07, 0xA0, 0x05, 0x0C, 0x03, b'B', b'o'];
        let mut decoder = BerDecoder::new();
        let mut source = &bytes[..];
        let err = decoder
            .decode(&mut source, &mut Greeting::default())
            .unwrap_err();
        assert!(matches!(err, BerError::LengthViolation(_)));
        assert_eq!(err.status_code(), 4);
        assert_eq!(source.len(), bytes.len());
        assert_eq!(decoder.diagnostics().error_count(), 1);
    }

    #[test]
    fn test_truncated_member() {
        // Outer length is consistent, the member's inner TLV is not
        let bytes = [0x30, 0x06, 0xA0, 0x04, 0x0C, 0x03, b'B', b'o'];
        let err = BerDecoder::new()
            .decode(&mut &bytes[..], &mut Greeting::default())
            .unwrap_err();
        assert!(matches!(err, BerError::LengthViolation(_)));
    }

    #[test]
    fn test_round_trip_drawing() {
        let original = drawing();
        let bytes = encode(&original);
        let decoded = decode_into(&bytes, Drawing::default());
        assert_eq!(decoded, original);
        assert_eq!(encode(&decoded), bytes);
    }

    #[test]
    fn test_round_trip_indefinite_input() {
        let person = Person {
            name: "Al".to_string(),
            age: Some(30),
            emails: vec!["a@b".to_string()],
            nickname: None,
        };
        // Same value with every constructed element in indefinite form
        let bytes = [
            0x30, 0x80, 0xA0, 0x80, 0x0C, 0x02, b'A', b'l', 0x00, 0x00, 0xA1, 0x80, 0x02, 0x01,
            0x1E, 0x00, 0x00, 0xA2, 0x80, 0x30, 0x80, 0x0C, 0x03, b'a', b'@', b'b', 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
        ];
        assert_eq!(decode_into(&bytes, Person::default()), person);
    }

    /// `node` with every sequence and child wrapper in indefinite form
    fn indefinite_node(node: &Node) -> Vec<u8> {
        let value = encode(&node.value);
        let mut out = vec![0x30, 0x80, 0xA0, value.len() as u8];
        out.extend(value);
        if let Some(child) = &node.child {
            out.extend([0xA1, 0x80]);
            out.extend(indefinite_node(child));
            out.extend([0x00, 0x00]);
        }
        out.extend([0x00, 0x00]);
        out
    }

    #[test]
    fn test_indefinite_wrappers_do_not_count_as_depth() {
        let chain = Node::chain(20);
        assert_eq!(decode_into(&indefinite_node(&chain), Node::default()), chain);

        let deepest = Node::chain(32);
        assert_eq!(decode_into(&indefinite_node(&deepest), Node::default()), deepest);

        let err = BerDecoder::new()
            .decode(&mut &indefinite_node(&Node::chain(33))[..], &mut Node::default())
            .unwrap_err();
        assert!(matches!(err, BerError::DepthExceeded(32)));
    }

    #[test]
    fn test_adversarial_nesting() {
        let bytes: Vec<u8> = std::iter::repeat_n([0x30u8, 0x80], 5000).flatten().collect();
        let mut decoder = BerDecoder::new();
        let err = decoder.decode(&mut &bytes[..], &mut Node::default()).unwrap_err();
        assert!(matches!(err, BerError::DepthExceeded(32)));
    }

    #[test]
    fn test_depth_limit_on_definite_input() {
        let chain = Node::chain(40);
        let bytes = encode(&chain);

        let err = BerDecoder::new()
            .decode(&mut &bytes[..], &mut Node::default())
            .unwrap_err();
        assert!(matches!(err, BerError::DepthExceeded(32)));

        let mut decoder = BerDecoder::with_options(DecoderOptions::new().with_max_depth(64));
        let mut decoded = Node::default();
        decoder.decode(&mut &bytes[..], &mut decoded).unwrap();
        assert_eq!(decoded, chain);
    }

    #[test]
    fn test_severity_accumulates() {
        let mut broken = drawing();
        broken.owner = Some(Email::new("nobody"));
        broken.color = Color::Invalid(9);

        let mut encoder = BerEncoder::new();
        let mut sink: Vec<u8> = Vec::new();
        assert!(encoder.encode(&mut sink, &broken).is_err());
        assert_eq!(encoder.diagnostics().error_count(), 2);
        assert_eq!(encoder.error_severity(), Severity::Error);

        // The next call starts clean
        encoder.encode(&mut Vec::<u8>::new(), &drawing()).unwrap();
        assert_eq!(encoder.error_severity(), Severity::Success);
        assert!(encoder.logged_messages().is_empty());
    }

    #[test]
    fn test_explicit_nulls_round_trip() {
        let person = Person {
            name: "Bob".to_string(),
            ..Person::default()
        };
        let mut encoder = BerEncoder::with_options(EncoderOptions::new().with_explicit_nulls(true));
        let mut bytes: Vec<u8> = Vec::new();
        encoder.encode(&mut bytes, &person).unwrap();
        assert_eq!(
            bytes,
            vec![
                0x30, 0x13, 0xA0, 0x05, 0x0C, 0x03, b'B', b'o', b'b', 0xA1, 0x02, 0x05, 0x00,
                0xA2, 0x02, 0x30, 0x00, 0xA3, 0x02, 0x05, 0x00
            ]
        );
        assert_eq!(decode_into(&bytes, Person::default()), person);
    }

    #[test]
    fn test_default_elision() {
        let settings = Settings {
            retries: Settings::DEFAULT_RETRIES,
            label: "a".to_string(),
        };
        assert_eq!(
            encode(&settings),
            vec![0x30, 0x0A, 0xA0, 0x03, 0x02, 0x01, 0x03, 0xA1, 0x03, 0x0C, 0x01, b'a']
        );

        let mut encoder =
            BerEncoder::with_options(EncoderOptions::new().with_elide_default_values(true));
        let mut bytes: Vec<u8> = Vec::new();
        encoder.encode(&mut bytes, &settings).unwrap();
        assert_eq!(bytes, vec![0x30, 0x05, 0xA1, 0x03, 0x0C, 0x01, b'a']);

        let stale = Settings {
            retries: 9,
            label: String::new(),
        };
        assert_eq!(decode_into(&bytes, stale), settings);
    }

    #[test]
    fn test_omit_empty_arrays() {
        let person = Person {
            name: "Bob".to_string(),
            ..Person::default()
        };
        let mut encoder =
            BerEncoder::with_options(EncoderOptions::new().with_encode_empty_arrays(false));
        let mut bytes: Vec<u8> = Vec::new();
        encoder.encode(&mut bytes, &person).unwrap();
        assert_eq!(bytes, vec![0x30, 0x07, 0xA0, 0x05, 0x0C, 0x03, b'B', b'o', b'b']);

        let stale = Person {
            emails: vec!["old@x".to_string()],
            ..Person::default()
        };
        assert_eq!(decode_into(&bytes, stale), person);
    }

    #[test]
    fn test_missing_required_member() {
        // Person without its name
        let bytes = [0x30, 0x05, 0xA1, 0x03, 0x02, 0x01, 0x07];
        let mut decoder = BerDecoder::new();
        let mut person = Person::default();
        let err = decoder.decode(&mut &bytes[..], &mut person).unwrap_err();
        assert!(matches!(err, BerError::Asn1Decoding(_)));
        assert_eq!(person.age, Some(7));
        let entry = &decoder.diagnostics().messages()[0];
        assert_eq!(entry.name.as_deref(), Some("name"));
    }

    #[test]
    fn test_duplicate_member() {
        let bytes = [
            0x30, 0x0A, 0xA1, 0x03, 0x02, 0x01, 0x07, 0xA1, 0x03, 0x02, 0x01, 0x08,
        ];
        let mut decoder = BerDecoder::new();
        let mut person = Person::default();
        assert!(decoder.decode(&mut &bytes[..], &mut person).is_err());
        assert_eq!(person.age, Some(7));
        assert!(decoder.logged_messages().contains("Duplicate"));
    }

    #[test]
    fn test_members_out_of_order() {
        let bytes = [
            0x30, 0x0A, 0xA1, 0x03, 0x02, 0x01, 0x02, 0xA0, 0x03, 0x02, 0x01, 0x01,
        ];
        assert_eq!(decode_into(&bytes, Point::default()), Point { x: 1, y: 2 });
    }

    #[test]
    fn test_dynamic_type_round_trip() {
        let reading = Reading::Text("hi".to_string());
        let bytes = encode(&reading);
        assert_eq!(bytes, vec![0x0C, 0x02, b'h', b'i']);
        assert_eq!(
            decode_into(&bytes, Reading::Text(String::new())),
            reading
        );

        let count = Reading::Count(300);
        assert_eq!(encode(&count), vec![0x02, 0x02, 0x01, 0x2C]);
    }

    proptest! {
        #[test]
        fn prop_person_round_trip(
            name in ".{0,40}",
            age in proptest::option::of(any::<i32>()),
            emails in proptest::collection::vec("[a-z]{1,8}@[a-z]{1,8}", 0..4),
            nickname in proptest::option::of("[ -~]{0,12}"),
        ) {
            let person = Person { name, age, emails, nickname };
            let bytes = encode(&person);
            let decoded = decode_into(&bytes, Person::default());
            prop_assert_eq!(&decoded, &person);
            prop_assert_eq!(encode(&decoded), bytes);
        }

        #[test]
        fn prop_point_list_round_trip(points in proptest::collection::vec((any::<i64>(), any::<i64>()), 0..8)) {
            let points: Vec<Point> = points.into_iter().map(|(x, y)| Point { x, y }).collect();
            let bytes = encode(&points);
            prop_assert_eq!(decode_into(&bytes, Vec::<Point>::new()), points);
        }
    }
}
