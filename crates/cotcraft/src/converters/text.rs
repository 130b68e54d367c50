//! Length-prefixed strings, constants and text synthesised from other fields.

use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::{
    bits::{push_be, read_be},
    compiled::{prefix_width, AttrPath, CompiledField, Target, TERRAIN_REF},
    cursor::Cursor,
    errors::{DecodeError, EncodeError},
    event::Primitive,
    transcoder::{Decoder, Encoder},
    tree,
};

fn primitive(field: &CompiledField) -> Option<Primitive> {
    match field.target {
        Target::Primitive(primitive) => Some(primitive),
        _ => None,
    }
}

fn read_text(dec: &mut Decoder<'_>, field: &CompiledField) -> Result<String, DecodeError> {
    let width = prefix_width(field.size_limit).unwrap_or(1);
    let len = read_be(dec.take(field, width)?) as usize;
    let bytes = dec.take(field, len)?;
    String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidText(field.name.clone()))
}

fn write_text(enc: &mut Encoder<'_>, field: &CompiledField, text: &str) -> Result<(), EncodeError> {
    if text.len() > field.size_limit {
        return Err(EncodeError::SizeLimitExceeded {
            field: field.name.clone(),
            limit: field.size_limit,
            actual: text.len(),
        });
    }

    let width = prefix_width(field.size_limit).unwrap_or(1);
    push_be(&mut enc.buf, text.len() as u64, width);
    enc.buf.extend_from_slice(text.as_bytes());
    Ok(())
}

pub(super) fn decode_string(
    dec: &mut Decoder<'_>,
    field: &CompiledField,
    cursor: &Cursor<'_>,
) -> Result<(), DecodeError> {
    let text = read_text(dec, field)?;
    dec.insert(field, cursor, text)
}

pub(super) fn encode_string(
    enc: &mut Encoder<'_>,
    field: &CompiledField,
    cursor: &Cursor<'_>,
) -> Result<(), EncodeError> {
    let text = enc.read_or(field, cursor, "")?;
    write_text(enc, field, &text)
}

/// With a constant value the primitive is set on decode and nothing goes on the wire.
pub(super) fn decode_primitive(dec: &mut Decoder<'_>, field: &CompiledField) -> Result<(), DecodeError> {
    let primitive = primitive(field).ok_or_else(|| DecodeError::MissingNode(field.name.clone()))?;
    let value = match &field.value {
        Some(value) => value.clone(),
        None => read_text(dec, field)?,
    };
    dec.event.set_primitive(primitive, value);

    Ok(())
}

pub(super) fn encode_primitive(enc: &mut Encoder<'_>, field: &CompiledField) -> Result<(), EncodeError> {
    if field.value.is_some() {
        return Ok(());
    }

    let primitive =
        primitive(field).ok_or_else(|| EncodeError::MissingAttribute(field.name.clone()))?;
    let event = enc.event;
    write_text(enc, field, event.primitive(primitive))
}

pub(super) fn decode_const(
    dec: &mut Decoder<'_>,
    field: &CompiledField,
    cursor: &Cursor<'_>,
) -> Result<(), DecodeError> {
    let value = match &field.source {
        Some(source) => tree::read_attr(&dec.event, source, cursor)
            .ok_or_else(|| DecodeError::MissingAttribute(source.to_string()))?,
        None => field.value.clone().unwrap_or_default(),
    };

    dec.insert(field, cursor, value)
}

pub(super) fn decode_zmist_title(
    dec: &mut Decoder<'_>,
    field: &CompiledField,
    cursor: &Cursor<'_>,
) -> Result<(), DecodeError> {
    dec.insert(field, cursor, format!("ZMIST{}", cursor.index() + 1))
}

/// Everything left in the frame goes into the attribute as base64.
pub(super) fn decode_remarks(
    dec: &mut Decoder<'_>,
    field: &CompiledField,
    cursor: &Cursor<'_>,
) -> Result<(), DecodeError> {
    let rest = dec.buf.len().saturating_sub(dec.offset);
    let text = STANDARD.encode(dec.take(field, rest)?);
    dec.insert(field, cursor, text)
}

pub(super) fn encode_remarks(
    enc: &mut Encoder<'_>,
    field: &CompiledField,
    cursor: &Cursor<'_>,
) -> Result<(), EncodeError> {
    let text = enc.read_or(field, cursor, "")?;
    let bytes = STANDARD
        .decode(text.trim())
        .map_err(|_| EncodeError::InvalidBase64(field.name.clone()))?;
    enc.buf.extend(bytes);
    Ok(())
}

fn terrain_line(dec: &Decoder<'_>, path: &AttrPath, cursor: &Cursor<'_>) -> Option<String> {
    let line = match path.attr.as_str() {
        "terrain_none" => "None".to_string(),
        "terrain_slope" => {
            let direction = AttrPath {
                nodes: path.nodes.clone(),
                attr: "terrain_slope_dir".to_string(),
            };
            let direction = tree::read_attr(&dec.event, &direction, cursor).unwrap_or_default();
            format!("Sloping terrain to the {direction}")
        }
        "terrain_rough" => "Rough terrain".to_string(),
        "terrain_loose" => "Loose sand/dirt".to_string(),
        "terrain_other" => "Other (Specify)".to_string(),
        _ => return None,
    };

    Some(line)
}

/// One line per terrain flag already decoded as `true`, in terrain reference order.
pub(super) fn decode_obstacles(
    dec: &mut Decoder<'_>,
    field: &CompiledField,
    cursor: &Cursor<'_>,
) -> Result<(), DecodeError> {
    let schema = dec.schema;
    let terrain = schema
        .reference(TERRAIN_REF)
        .map(|reference| reference.fields.as_slice())
        .unwrap_or_default();

    let mut lines = Vec::new();
    for flag in terrain {
        let Some(path) = flag.path() else {
            continue;
        };
        if tree::read_attr(&dec.event, path, cursor).as_deref() != Some("true") {
            continue;
        }
        lines.extend(terrain_line(dec, path, cursor));
    }

    dec.insert(field, cursor, lines.join("\n"))
}
