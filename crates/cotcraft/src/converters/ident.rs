//! Event identifiers.

use uuid::Uuid;

use crate::{
    bits::{fnv1a32, push_be},
    compiled::{AttrPath, CompiledField},
    cursor::Cursor,
    errors::{DecodeError, EncodeError},
    filler::ALL_CHAT_ROOMS,
    transcoder::{Decoder, Encoder},
    tree,
};

pub(super) fn decode_uid(dec: &mut Decoder<'_>, field: &CompiledField) -> Result<(), DecodeError> {
    dec.event.uid = hex::encode(dec.take(field, field.length)?);
    Ok(())
}

/// Chat uids are rebuilt from the sender callsign; the wire bytes only identify the device.
pub(super) fn decode_chat_uid(dec: &mut Decoder<'_>, field: &CompiledField) -> Result<(), DecodeError> {
    decode_uid(dec, field)?;

    let sender = AttrPath {
        nodes: vec!["__chat".to_string()],
        attr: "senderCallsign".to_string(),
    };
    let callsign = tree::read_attr(&dec.event, &sender, &Cursor::single())
        .filter(|callsign| !callsign.is_empty())
        .or_else(|| field.value.clone())
        .ok_or_else(|| DecodeError::MissingAttribute(sender.to_string()))?;

    dec.event.uid = format!("GeoChat.{callsign}.{ALL_CHAT_ROOMS}.{}", Uuid::new_v4());
    Ok(())
}

/// Group uids hash the whole frame, so they are stable for identical frames.
pub(super) fn decode_group_uid(dec: &mut Decoder<'_>, field: &CompiledField) -> Result<(), DecodeError> {
    let group = dec.take(field, 1)?[0];
    let digest = fnv1a32(dec.buf).to_be_bytes();
    dec.event.uid = format!("{}@{group}", hex::encode(digest));

    Ok(())
}

pub(super) fn encode_uid(enc: &mut Encoder<'_>, field: &CompiledField) -> Result<(), EncodeError> {
    let uid = enc.event.uid.as_str();
    let value = u64::from_str_radix(uid, 16).unwrap_or_else(|_| fnv1a32(uid.as_bytes()) as u64);
    push_be(&mut enc.buf, value, field.length);

    Ok(())
}

pub(super) fn encode_group_uid(enc: &mut Encoder<'_>) -> Result<(), EncodeError> {
    let group = enc
        .event
        .uid
        .rsplit_once('@')
        .and_then(|(_, group)| group.parse::<u8>().ok())
        .unwrap_or(0);
    enc.buf.push(group);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        compiled::SHORT_PREFIX,
        converters::testing::{decode, encode, schema},
        event::Event,
        field::Field,
        lookup::LookupTables,
    };

    #[test]
    fn test_uid_hex() {
        let schema = schema(vec![], vec![Field::new("uid", "uidConverter", 4)]);
        let tables = LookupTables::default();

        let event = decode(&schema, &tables, &[0xDE, 0xAD, 0xBE, 0xEF]).unwrap();
        assert_eq!(event.uid, "deadbeef");
        assert_eq!(encode(&schema, &tables, &event).unwrap(), vec![0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn test_uid_hash_fallback() {
        let schema = schema(vec![], vec![Field::new("uid", "uidConverter", 4)]);
        let event = Event::new("a-f-G", "ANDROID-42");

        let data = encode(&schema, &LookupTables::default(), &event).unwrap();
        assert_eq!(data, fnv1a32(b"ANDROID-42").to_be_bytes());
    }

    #[test]
    fn test_chat_uid() {
        let schema = schema(
            vec![],
            vec![
                Field {
                    size_limit: SHORT_PREFIX,
                    ..Field::new("detail/__chat.senderCallsign", "stringConverter", 0)
                },
                Field::new("uid", "chatUidConverter", 2),
            ],
        );

        let event = decode(&schema, &LookupTables::default(), b"\x05ALPHA\x00\x01").unwrap();
        let prefix = "GeoChat.ALPHA.All Chat Rooms.";
        assert!(event.uid.starts_with(prefix), "{}", event.uid);
        assert!(Uuid::parse_str(&event.uid[prefix.len()..]).is_ok());
    }

    #[test]
    fn test_chat_uid_needs_callsign() {
        let schema = schema(vec![], vec![Field::new("uid", "chatUidConverter", 2)]);
        assert_eq!(
            decode(&schema, &LookupTables::default(), &[0, 1]),
            Err(DecodeError::MissingAttribute("detail/__chat.senderCallsign".to_string()))
        );
    }

    #[test]
    fn test_group_uid() {
        let schema = schema(vec![], vec![Field::new("uid", "uidCodecConverter", 1)]);
        let tables = LookupTables::default();

        let event = decode(&schema, &tables, &[3]).unwrap();
        let digest = hex::encode(fnv1a32(&[3]).to_be_bytes());
        assert_eq!(event.uid, format!("{digest}@3"));
        assert_eq!(encode(&schema, &tables, &event).unwrap(), vec![3]);

        let plain = Event::new("a-f-G", "no-group");
        assert_eq!(encode(&schema, &tables, &plain).unwrap(), vec![0]);
    }
}
