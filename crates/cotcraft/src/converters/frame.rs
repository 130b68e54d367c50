//! Header and trailer fields: message type, frame length and checksum.

use crate::{
    bits::{read_be, write_be, xor_fold},
    compiled::CompiledField,
    converters::resolution,
    errors::{DecodeError, EncodeError},
    transcoder::{Decoder, Encoder},
};

pub(super) fn decode_message_type(dec: &mut Decoder<'_>, field: &CompiledField) -> Result<(), DecodeError> {
    dec.skip(field, field.length)?;
    dec.event.event_type = dec.message.type_name.clone();

    Ok(())
}

/// Cuts the frame to its declared length.
pub(super) fn decode_length(dec: &mut Decoder<'_>, field: &CompiledField) -> Result<(), DecodeError> {
    let at = field
        .offset
        .ok_or_else(|| DecodeError::MissingAttribute(field.name.clone()))?;
    let declared = read_be(dec.peek(field, at, field.length)?) as usize;
    let buf = dec.buf;
    if buf.len() < declared {
        return Err(DecodeError::IncompleteMessage {
            declared,
            actual: buf.len(),
        });
    }

    dec.buf = &buf[..declared];
    Ok(())
}

/// The XOR fold of a valid frame, checksum included, is all zeros.
pub(super) fn decode_checksum(dec: &mut Decoder<'_>, field: &CompiledField) -> Result<(), DecodeError> {
    if xor_fold(dec.buf, field.length).iter().any(|byte| *byte != 0) {
        return Err(DecodeError::ChecksumFailed);
    }

    Ok(())
}

pub(super) fn encode_length(enc: &mut Encoder<'_>, field: &CompiledField) -> Result<(), EncodeError> {
    let at = enc.frame_slot(field)?;
    let len = enc.buf.len();
    if len as u64 > resolution(field.length) {
        return Err(EncodeError::FrameTooLong {
            len,
            width: field.length,
        });
    }

    write_be(&mut enc.buf[at..at + field.length], len as u64);
    Ok(())
}

pub(super) fn encode_checksum(enc: &mut Encoder<'_>, field: &CompiledField) -> Result<(), EncodeError> {
    let at = enc.frame_slot(field)?;
    let width = field.length;
    enc.buf[at..at + width].fill(0);

    // Each checksum byte cancels the fold lane it lands in.
    let fold = xor_fold(&enc.buf, width);
    for i in 0..width {
        enc.buf[at + i] = fold[(at + i) % width];
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        compiled::{Converter, FieldKind, Target, HEAD_REF, SHORT_PREFIX, TAIL_REF},
        converters::testing::{attr, decode, decode_with, encode, schema},
        event::{Event, Node},
        field::{Field, MessageLayout, Reference},
        interpreter::Options,
        lookup::LookupTables,
        schema::Schema,
    };

    fn framed(checksum_offset: Option<usize>) -> Schema {
        let refs = vec![
            Reference {
                name: HEAD_REF.to_string(),
                content: vec![
                    Field::new("reserved", "placeHolderConverter", 1),
                    Field::new("type", "messageTypeConverter", 1),
                    Field::new("length", "placeHolderConverter", 2),
                ],
                converter: None,
            },
            Reference {
                name: TAIL_REF.to_string(),
                content: vec![
                    Field {
                        offset: Some(2),
                        ..Field::new("messageLength", "msgLengthConverter", 2)
                    },
                    Field {
                        offset: checksum_offset,
                        ..Field::new("checksum", "msgCheckSumConverter", 1)
                    },
                ],
                converter: None,
            },
        ];

        let head = Field {
            field_type: "a-f-G".to_string(),
            type_match: "prefix".to_string(),
            ..Field::new(HEAD_REF, "", 0)
        };
        let callsign = Field {
            size_limit: SHORT_PREFIX,
            ..Field::new("detail/contact.callsign", "stringConverter", 0)
        };

        Schema::compile(
            &refs,
            &[MessageLayout {
                content: vec![head, callsign],
            }],
        )
        .unwrap()
    }

    fn contact(callsign: &str) -> Event {
        Event {
            event_type: "a-f-G".to_string(),
            detail: Some(
                Node::new("detail").with_child(Node::new("contact").with_attr("callsign", callsign)),
            ),
            ..Default::default()
        }
    }

    const FRAME: [u8; 8] = [0, 0, 0, 8, 2, b'A', b'B', 9];

    #[test]
    fn test_encode_framed() {
        let schema = framed(None);
        let data = encode(&schema, &LookupTables::default(), &contact("AB")).unwrap();
        assert_eq!(data, FRAME);
    }

    #[test]
    fn test_decode_framed() {
        let schema = framed(None);
        let mut data = FRAME.to_vec();
        data.extend([0xEE, 0xEE]);

        let event = decode(&schema, &LookupTables::default(), &data).unwrap();
        assert_eq!(event.event_type, "a-f-G");
        assert_eq!(attr(&event, &["contact"], "callsign"), Some("AB"));
    }

    #[test]
    fn test_checksum_failure() {
        let schema = framed(None);
        let mut data = FRAME.to_vec();
        data[5] ^= 0x01;

        assert_eq!(
            decode(&schema, &LookupTables::default(), &data),
            Err(DecodeError::ChecksumFailed)
        );
    }

    #[test]
    fn test_incomplete_message() {
        let schema = framed(None);
        assert_eq!(
            decode(&schema, &LookupTables::default(), &FRAME[..7]),
            Err(DecodeError::IncompleteMessage {
                declared: 8,
                actual: 7
            })
        );
    }

    #[test]
    fn test_checksum_at_fixed_offset() {
        let schema = framed(Some(0));
        let data = encode(&schema, &LookupTables::default(), &contact("AB")).unwrap();

        assert_eq!(data.len(), 7);
        assert!(xor_fold(&data, 1).iter().all(|byte| *byte == 0));
        assert!(decode(&schema, &LookupTables::default(), &data).is_ok());
    }

    #[test]
    fn test_wide_checksum_cancels_every_lane() {
        let mut buf = vec![1, 2, 3, 4, 5, 0, 0];
        let field = CompiledField {
            name: "checksum".to_string(),
            kind: FieldKind::Scalar(Converter::Checksum),
            target: Target::None,
            length: 2,
            offset: Some(5),
            relative_offset: 0,
            size_limit: 0,
            range_min: 0.0,
            range_max: 0.0,
            selections: vec![],
            value: None,
            source: None,
        };
        let schema = schema(vec![], vec![]);
        let event = Event::default();
        let tables = LookupTables::default();
        let mut enc = Encoder::new(&schema, &tables, 0, &schema.messages[0], &event);
        enc.buf.append(&mut buf);

        encode_checksum(&mut enc, &field).unwrap();
        assert_eq!(xor_fold(&enc.buf, 2), vec![0, 0]);
    }

    #[test]
    fn test_degraded_converter() {
        let schema = schema(
            vec![],
            vec![
                Field::new("detail/_medevac_.hazard", "hazardConverter", 2),
                Field::new("detail/track.speed", "intConverter", 1),
            ],
        );
        let tables = LookupTables::default();

        let event = decode(&schema, &tables, &[0xAA, 0xBB, 3]).unwrap();
        assert_eq!(attr(&event, &["track"], "speed"), Some("3"));
        assert_eq!(encode(&schema, &tables, &event).unwrap(), vec![0, 0, 3]);
    }

    #[test]
    fn test_missing_detail_without_fill() {
        let schema = schema(vec![], vec![Field::new("detail/track.speed", "intConverter", 1)]);
        let options = Options {
            auto_fill: false,
            ..Options::default()
        };

        assert_eq!(
            decode_with(&schema, &LookupTables::default(), &options, &[3]),
            Err(DecodeError::MissingNode("track".to_string()))
        );
    }
}
