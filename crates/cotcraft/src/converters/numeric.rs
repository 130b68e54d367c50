//! Integers, quantized floats, IEEE floats, booleans and colors.

use crate::{
    bits::{push_be, read_be, sign_extend},
    compiled::{CompiledField, Target},
    cursor::Cursor,
    errors::{DecodeError, EncodeError},
    event::{Node, PointAxis},
    transcoder::{decode_path, Decoder, Encoder},
    tree,
};

/// Largest raw value of a `length`-byte unsigned field.
pub fn resolution(length: usize) -> u64 {
    if length >= 8 {
        u64::MAX
    } else {
        (1u64 << (8 * length)) - 1
    }
}

/// Maps a raw value linearly onto `[min, max]`.
pub fn dequantize(raw: u64, length: usize, min: f64, max: f64) -> f64 {
    min + (max - min) * raw as f64 / resolution(length) as f64
}

/// Maps `value` onto the nearest raw step, clamped to the field width.
pub fn quantize(value: f64, length: usize, min: f64, max: f64) -> u64 {
    let res = resolution(length) as f64;
    let scaled = ((value - min) / (max - min) * res).round();
    if scaled.is_nan() {
        return 0;
    }

    scaled.clamp(0.0, res) as u64
}

fn invalid_number(field: &CompiledField, literal: &str) -> EncodeError {
    EncodeError::InvalidNumber {
        field: field.name.clone(),
        literal: literal.to_string(),
    }
}

fn point_axis(field: &CompiledField) -> Option<PointAxis> {
    match field.target {
        Target::Point(axis) => Some(axis),
        _ => None,
    }
}

pub(super) fn decode_int(
    dec: &mut Decoder<'_>,
    field: &CompiledField,
    cursor: &Cursor<'_>,
) -> Result<(), DecodeError> {
    let raw = read_be(dec.take(field, field.length)?);
    let value = sign_extend(raw, 8 * field.length);
    dec.insert(field, cursor, value.to_string())
}

pub(super) fn encode_int(
    enc: &mut Encoder<'_>,
    field: &CompiledField,
    cursor: &Cursor<'_>,
) -> Result<(), EncodeError> {
    let literal = enc.read_or(field, cursor, "0")?;
    let value: i64 = literal
        .trim()
        .parse()
        .map_err(|_| invalid_number(field, &literal))?;

    // Signed or unsigned readings of the width are both accepted.
    let bits = 8 * field.length as u32;
    let min = -(1i64 << (bits - 1));
    let max = (1i64 << bits) - 1;
    if !(min..=max).contains(&value) {
        return Err(EncodeError::ValueOutOfRange {
            field: field.name.clone(),
            value,
            width: field.length,
        });
    }

    push_be(&mut enc.buf, value as u64, field.length);
    Ok(())
}

pub(super) fn decode_scaled(
    dec: &mut Decoder<'_>,
    field: &CompiledField,
    cursor: &Cursor<'_>,
) -> Result<(), DecodeError> {
    let raw = read_be(dec.take(field, field.length)?);
    let value = dequantize(raw, field.length, field.range_min, field.range_max);
    dec.insert(field, cursor, value.to_string())
}

pub(super) fn encode_scaled(
    enc: &mut Encoder<'_>,
    field: &CompiledField,
    cursor: &Cursor<'_>,
) -> Result<(), EncodeError> {
    let literal = enc.read_or(field, cursor, "0.0")?;
    let value: f64 = literal
        .trim()
        .parse()
        .map_err(|_| invalid_number(field, &literal))?;

    let raw = quantize(value, field.length, field.range_min, field.range_max);
    push_be(&mut enc.buf, raw, field.length);
    Ok(())
}

pub(super) fn decode_point(dec: &mut Decoder<'_>, field: &CompiledField) -> Result<(), DecodeError> {
    let raw = read_be(dec.take(field, field.length)?);
    let axis = point_axis(field).ok_or_else(|| DecodeError::MissingNode(field.name.clone()))?;
    dec.event
        .point
        .set(axis, dequantize(raw, field.length, field.range_min, field.range_max));

    Ok(())
}

pub(super) fn encode_point(enc: &mut Encoder<'_>, field: &CompiledField) -> Result<(), EncodeError> {
    let axis = point_axis(field).ok_or_else(|| EncodeError::MissingAttribute(field.name.clone()))?;
    let value = enc.event.point.get(axis);
    let raw = quantize(value, field.length, field.range_min, field.range_max);
    push_be(&mut enc.buf, raw, field.length);

    Ok(())
}

pub(super) fn decode_float32(
    dec: &mut Decoder<'_>,
    field: &CompiledField,
    cursor: &Cursor<'_>,
) -> Result<(), DecodeError> {
    let raw = read_be(dec.take(field, 4)?) as u32;
    dec.insert(field, cursor, f32::from_bits(raw).to_string())
}

pub(super) fn encode_float32(
    enc: &mut Encoder<'_>,
    field: &CompiledField,
    cursor: &Cursor<'_>,
) -> Result<(), EncodeError> {
    let literal = enc.read_or(field, cursor, "0")?;
    let value: f32 = literal
        .trim()
        .parse()
        .map_err(|_| invalid_number(field, &literal))?;

    push_be(&mut enc.buf, value.to_bits() as u64, 4);
    Ok(())
}

pub(super) fn decode_boolean(
    dec: &mut Decoder<'_>,
    field: &CompiledField,
    cursor: &Cursor<'_>,
) -> Result<(), DecodeError> {
    let value = dec.take(field, 1)?[0] != 0;
    dec.insert(field, cursor, value.to_string())
}

pub(super) fn encode_boolean(
    enc: &mut Encoder<'_>,
    field: &CompiledField,
    cursor: &Cursor<'_>,
) -> Result<(), EncodeError> {
    let value = enc.read_or(field, cursor, "false")?;
    enc.buf.push(u8::from(value.trim() == "true"));
    Ok(())
}

/// Adds the color, stroke and fill nodes a drawn shape carries next to the field's node.
pub(super) fn decode_color(
    dec: &mut Decoder<'_>,
    field: &CompiledField,
    cursor: &Cursor<'_>,
) -> Result<(), DecodeError> {
    let raw = read_be(dec.take(field, 4)?) as u32;
    let color = (raw as i32).to_string();
    let stroke = ((raw | 0xFF00_0000) as i32).to_string();

    let path = decode_path(field)?;
    let fill = dec.fill();
    let parent = tree::resolve_parent(&mut dec.event, path.parents(), cursor, fill)?;
    let node = dec
        .event
        .node_mut(&parent)
        .ok_or_else(|| DecodeError::MissingNode(path.leaf().to_string()))?;

    node.children.extend([
        Node::new("color").with_attr("value", color.as_str()),
        Node::new("strokeColor").with_attr("value", stroke),
        Node::new("strokeWidth").with_attr("value", "4.0"),
        Node::new("fillColor").with_attr("value", color),
    ]);

    Ok(())
}

pub(super) fn encode_color(
    enc: &mut Encoder<'_>,
    field: &CompiledField,
    cursor: &Cursor<'_>,
) -> Result<(), EncodeError> {
    let literal = enc.read_or(field, cursor, "0")?;
    let value: i64 = literal
        .trim()
        .parse()
        .map_err(|_| invalid_number(field, &literal))?;

    if !(i32::MIN as i64..=u32::MAX as i64).contains(&value) {
        return Err(EncodeError::ValueOutOfRange {
            field: field.name.clone(),
            value,
            width: 4,
        });
    }

    push_be(&mut enc.buf, value as u64, 4);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        converters::testing::{attr, decode, encode, schema},
        event::Event,
        field::Field,
        lookup::LookupTables,
    };

    fn scaled(name: &str, converter: &str, length: usize, min: f64, max: f64) -> Field {
        Field {
            range_min: min,
            range_max: max,
            ..Field::new(name, converter, length)
        }
    }

    fn event_with(detail: Node) -> Event {
        Event {
            detail: Some(detail),
            ..Default::default()
        }
    }

    #[test]
    fn test_quantize_bounds() {
        assert_eq!(quantize(0.0, 2, 0.0, 100.0), 0);
        assert_eq!(quantize(100.0, 2, 0.0, 100.0), 65535);
        assert_eq!(quantize(-5.0, 2, 0.0, 100.0), 0);
        assert_eq!(quantize(250.0, 2, 0.0, 100.0), 65535);
        assert_eq!(quantize(f64::NAN, 2, 0.0, 100.0), 0);

        let back = dequantize(quantize(50.0, 2, 0.0, 100.0), 2, 0.0, 100.0);
        assert!((back - 50.0).abs() <= 100.0 / 65535.0);
    }

    #[test]
    fn test_int_round_trip() {
        let schema = schema(vec![], vec![Field::new("detail/track.speed", "intConverter", 2)]);
        let tables = LookupTables::default();

        let data = [0, 0xFF, 0x38];
        let event = decode(&schema, &tables, &data[1..]).unwrap();
        assert_eq!(attr(&event, &["track"], "speed"), Some("-200"));
        assert_eq!(encode(&schema, &tables, &event).unwrap(), vec![0xFF, 0x38]);
    }

    #[test]
    fn test_int_defaults_and_limits() {
        let mut field = Field::new("detail/track.speed", "intConverter", 1);
        let schema_zero = schema(vec![], vec![field.clone()]);
        field.value = Some("7".to_string());
        let schema_const = schema(vec![], vec![field]);
        let tables = LookupTables::default();

        let empty = event_with(Node::new("detail").with_child(Node::new("track")));
        assert_eq!(encode(&schema_zero, &tables, &empty).unwrap(), vec![0]);
        assert_eq!(encode(&schema_const, &tables, &empty).unwrap(), vec![7]);

        let big = event_with(Node::new("detail").with_child(Node::new("track").with_attr("speed", "256")));
        assert_eq!(
            encode(&schema_zero, &tables, &big),
            Err(EncodeError::ValueOutOfRange {
                field: "detail/track.speed".to_string(),
                value: 256,
                width: 1
            })
        );

        let bad = event_with(Node::new("detail").with_child(Node::new("track").with_attr("speed", "fast")));
        assert_eq!(
            encode(&schema_zero, &tables, &bad),
            Err(EncodeError::InvalidNumber {
                field: "detail/track.speed".to_string(),
                literal: "fast".to_string()
            })
        );
    }

    #[test]
    fn test_missing_node_without_default() {
        let schema = schema(vec![], vec![Field::new("detail/track.speed", "intConverter", 1)]);
        let event = event_with(Node::new("detail"));

        assert_eq!(
            encode(&schema, &LookupTables::default(), &event),
            Err(EncodeError::MissingAttribute("detail/track.speed".to_string()))
        );
    }

    #[test]
    fn test_scaled_float() {
        let schema = schema(
            vec![],
            vec![scaled("detail/track.course", "lengthLimitedFloatConverter", 2, 0.0, 100.0)],
        );
        let tables = LookupTables::default();

        let event = event_with(
            Node::new("detail").with_child(Node::new("track").with_attr("course", "100")),
        );
        assert_eq!(encode(&schema, &tables, &event).unwrap(), vec![0xFF, 0xFF]);

        let decoded = decode(&schema, &tables, &[0, 0]).unwrap();
        assert_eq!(attr(&decoded, &["track"], "course"), Some("0"));
    }

    #[test]
    fn test_point_float() {
        let schema = schema(
            vec![],
            vec![
                scaled("point.lat", "pointLengthLimitedFloatConverter", 4, -90.0, 90.0),
                scaled("point.lon", "pointLengthLimitedFloatConverter", 4, -180.0, 180.0),
            ],
        );
        let tables = LookupTables::default();

        let mut event = Event::default();
        event.point.lat = 48.8566;
        event.point.lon = 2.3522;

        let data = encode(&schema, &tables, &event).unwrap();
        assert_eq!(data.len(), 8);

        let decoded = decode(&schema, &tables, &data).unwrap();
        assert!((decoded.point.lat - 48.8566).abs() <= 180.0 / u32::MAX as f64);
        assert!((decoded.point.lon - 2.3522).abs() <= 360.0 / u32::MAX as f64);
    }

    #[test]
    fn test_float32() {
        let schema = schema(vec![], vec![Field::new("detail/track.speed", "floatConverter", 4)]);
        let tables = LookupTables::default();

        let event = event_with(
            Node::new("detail").with_child(Node::new("track").with_attr("speed", "1.5")),
        );
        let data = encode(&schema, &tables, &event).unwrap();
        assert_eq!(data, 1.5f32.to_bits().to_be_bytes());

        let decoded = decode(&schema, &tables, &data).unwrap();
        assert_eq!(attr(&decoded, &["track"], "speed"), Some("1.5"));
    }

    #[test]
    fn test_boolean() {
        let schema = schema(vec![], vec![Field::new("detail/status.ready", "booleanConverter", 1)]);
        let tables = LookupTables::default();

        let decoded = decode(&schema, &tables, &[2]).unwrap();
        assert_eq!(attr(&decoded, &["status"], "ready"), Some("true"));
        assert_eq!(encode(&schema, &tables, &decoded).unwrap(), vec![1]);

        let decoded = decode(&schema, &tables, &[0]).unwrap();
        assert_eq!(attr(&decoded, &["status"], "ready"), Some("false"));
    }

    #[test]
    fn test_color_nodes() {
        let schema = schema(vec![], vec![Field::new("detail/color.argb", "colorConverter", 4)]);
        let tables = LookupTables::default();

        let decoded = decode(&schema, &tables, &[0x00, 0x11, 0x22, 0x33]).unwrap();
        let detail = decoded.detail.as_ref().unwrap();
        let value = |name: &str| detail.first_child(name).and_then(|n| n.attr("value"));

        assert_eq!(value("color"), Some("1122867"));
        assert_eq!(value("strokeColor"), Some(((0xFF11_2233u32) as i32).to_string().as_str()));
        assert_eq!(value("strokeWidth"), Some("4.0"));
        assert_eq!(value("fillColor"), Some("1122867"));

        let event = event_with(
            Node::new("detail").with_child(Node::new("color").with_attr("argb", "-1")),
        );
        assert_eq!(encode(&schema, &tables, &event).unwrap(), vec![0xFF; 4]);
    }
}
