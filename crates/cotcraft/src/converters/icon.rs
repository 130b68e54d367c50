//! Icon set paths carried as a pair of lookup table ids.

use crate::{
    bits::{push_be, read_be},
    compiled::CompiledField,
    cursor::Cursor,
    errors::{DecodeError, EncodeError},
    transcoder::{Decoder, Encoder},
};

pub(super) fn decode(
    dec: &mut Decoder<'_>,
    field: &CompiledField,
    cursor: &Cursor<'_>,
) -> Result<(), DecodeError> {
    let path_id = read_be(dec.take(field, 2)?) as u16;
    let file_id = read_be(dec.take(field, 2)?) as u16;

    let path = dec
        .tables
        .icon_paths
        .key(path_id as usize)
        .ok_or(DecodeError::UnknownIcon {
            table: "icon path",
            id: path_id,
        })?;
    let file = dec
        .tables
        .icon_files
        .key(file_id as usize)
        .ok_or(DecodeError::UnknownIcon {
            table: "icon file",
            id: file_id,
        })?;

    dec.insert(field, cursor, format!("{path}/{file}"))
}

pub(super) fn encode(
    enc: &mut Encoder<'_>,
    field: &CompiledField,
    cursor: &Cursor<'_>,
) -> Result<(), EncodeError> {
    let value = enc.read_or(field, cursor, "")?;
    let not_indexed = || EncodeError::IconNotIndexed(value.clone());

    let (path, file) = value.rsplit_once('/').ok_or_else(not_indexed)?;
    let path_id = enc.tables.icon_paths.id(path).ok_or_else(not_indexed)?;
    let file_id = enc.tables.icon_files.id(file).ok_or_else(not_indexed)?;

    push_be(&mut enc.buf, path_id as u64, 2);
    push_be(&mut enc.buf, file_id as u64, 2);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        converters::testing::{attr, decode as decode_frame, encode as encode_event, schema},
        event::{Event, Node},
        field::Field,
        lookup::LookupTables,
    };

    const UUID: &str = "6d781afb-89a6-4c07-b2b9-a89748b6a38f";

    fn tables() -> LookupTables {
        LookupTables::from_rows(
            &[
                vec!["Military", "Ground", UUID],
                vec!["Military", "Air", UUID],
            ],
            &[vec!["Tank.png"], vec!["Jet.png"], vec!["Helo.png"]],
            &[] as &[Vec<&str>],
        )
        .unwrap()
    }

    fn usericon(path: &str) -> Event {
        Event {
            detail: Some(Node::new("detail").with_child(Node::new("usericon").with_attr("iconsetpath", path))),
            ..Default::default()
        }
    }

    #[test]
    fn test_icon_round_trip() {
        let schema = schema(vec![], vec![Field::new("detail/usericon.iconsetpath", "pathIconConverter", 4)]);
        let tables = tables();

        let path = format!("{UUID}/Air/Helo.png");
        let data = encode_event(&schema, &tables, &usericon(&path)).unwrap();
        assert_eq!(data, vec![0, 1, 0, 2]);

        let event = decode_frame(&schema, &tables, &data).unwrap();
        assert_eq!(attr(&event, &["usericon"], "iconsetpath"), Some(path.as_str()));
    }

    #[test]
    fn test_icon_not_indexed() {
        let schema = schema(vec![], vec![Field::new("detail/usericon.iconsetpath", "pathIconConverter", 4)]);
        let tables = tables();

        let path = format!("{UUID}/Air/Boat.png");
        assert_eq!(
            encode_event(&schema, &tables, &usericon(&path)),
            Err(EncodeError::IconNotIndexed(path))
        );
        assert_eq!(
            decode_frame(&schema, &tables, &[0, 0, 0, 9]),
            Err(DecodeError::UnknownIcon {
                table: "icon file",
                id: 9
            })
        );
        assert_eq!(
            decode_frame(&schema, &tables, &[0, 5, 0, 0]),
            Err(DecodeError::UnknownIcon {
                table: "icon path",
                id: 5
            })
        );
    }
}
